//! Shared utilities and common types for the agent sync backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Token hashing for the bearer-token gate
//! - Offset pagination math
//! - Common validation and normalization helpers

pub mod crypto;
pub mod pagination;
pub mod validation;
