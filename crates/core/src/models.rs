pub mod booking;
pub mod braider;
pub mod capacity;
pub mod hours;
pub mod service_style;
pub mod time_slot;
