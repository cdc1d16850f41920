//! Domain models for device synchronization.

pub mod command;
pub mod device;
pub mod live_status;

pub use command::{
    CommandAction, CommandHistoryQuery, CommandHistoryResponse, ControlCommand, Delivery,
    IssueCommandRequest, NewCommand, PendingCommand,
};
pub use device::{
    Device, DeviceRegistration, DeviceResponse, DeviceUpsert, IdentityHints,
    RegisterDeviceRequest,
};
pub use live_status::{
    LiveAppResponse, LiveAppStatus, LiveStatusQuery, LiveStatusReport, ReportedApp,
    SnapshotEntry,
};
