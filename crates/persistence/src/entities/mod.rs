//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod control_command;
pub mod device;
pub mod live_app_status;

pub use control_command::ControlCommandEntity;
pub use device::{DeviceEntity, UpsertedDeviceEntity};
pub use live_app_status::LiveAppStatusEntity;
