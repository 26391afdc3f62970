// core/src/notify/mod.rs
pub mod composer;
