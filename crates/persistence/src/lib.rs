//! Persistence layer for the agent synchronization server.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - [`PgSyncStore`], the PostgreSQL-backed sync store

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::PgSyncStore;
