pub mod availability_override;
pub mod booking;
pub mod rule;
pub mod session_type;
pub mod slot;
