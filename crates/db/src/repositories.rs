pub mod booking;
pub mod braider;
pub mod salon;
