pub mod bookings;
pub mod health;
pub mod overrides;
pub mod rules;
pub mod session_types;
pub mod slots;
