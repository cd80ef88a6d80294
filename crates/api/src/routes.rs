pub mod availability;
pub mod booking;
pub mod braider;
pub mod capacity;
pub mod health;
