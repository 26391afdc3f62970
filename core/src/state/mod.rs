// core/src/state/mod.rs
pub mod tracker;
