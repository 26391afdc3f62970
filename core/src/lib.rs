// core/src/lib.rs
pub mod gpu;
pub mod job;
pub mod notify;
pub mod state;
pub mod utils;
