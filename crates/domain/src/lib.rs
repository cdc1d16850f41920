//! Domain layer for the agent synchronization server.
//!
//! This crate contains:
//! - Domain models (Device, ControlCommand, LiveAppStatus)
//! - The storage seam and an in-memory implementation
//! - Identity resolution, command ledger and presence services
//! - Domain error types and the clock abstraction

pub mod clock;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DomainError;
pub use store::{InMemorySyncStore, SyncStore};
