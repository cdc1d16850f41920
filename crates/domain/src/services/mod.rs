//! Synchronization engine services.
//!
//! [`SyncService`] is the entry point used by the HTTP layer; the ledger,
//! reconciler and resolver are its building blocks.

pub mod commands;
pub mod identity;
pub mod presence;
pub mod sync;

pub use commands::CommandLedger;
pub use identity::{IdentityResolver, LookupKey};
pub use presence::PresenceReconciler;
pub use sync::{SyncLimits, SyncService};
