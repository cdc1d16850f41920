//! HTTP route handlers.

use serde::Serialize;

pub mod commands;
pub mod devices;
pub mod health;
pub mod live_status;

/// `{ "success": true }` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
