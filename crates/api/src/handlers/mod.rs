pub mod bookings;
pub mod rules;
pub mod session_types;
pub mod slots;

use serde::Serialize;

/// Body for operations that have nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
