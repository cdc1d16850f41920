//! Repository implementations for database operations.

pub mod control_command;
pub mod device;
pub mod live_app_status;

pub use control_command::ControlCommandRepository;
pub use device::{DeviceRepository, DeviceWrite};
pub use live_app_status::{AppSighting, LiveAppStatusRepository};
