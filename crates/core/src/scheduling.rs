//! Scheduling algorithms. Everything here is synchronous and side-effect free;
//! the engine feeds it snapshots read from the store.

pub mod assignment;
pub mod availability;
pub mod conflict;
pub mod lifecycle;
pub mod window;

pub use window::TimeWindow;
