//! # SalonSync Core
//!
//! Domain types and the booking capacity engine for multi-tenant salons.
//!
//! - **models**: capacity configuration, braiders, bookings and derived time slots
//! - **scheduling**: the pure algorithms (availability, conflict checking,
//!   braider assignment, booking lifecycle)
//! - **store**: the persistence boundary the engine runs against
//! - **engine**: the atomic public operations, serialized per salon and day

pub mod clock;
pub mod engine;
pub mod errors;
pub mod models;
pub mod scheduling;
pub mod store;

pub use engine::{BookingEngine, EngineSettings, UnassignedPolicy};
pub use errors::{Rejection, SalonError, SalonResult};
