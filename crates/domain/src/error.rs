//! Domain error taxonomy.

use thiserror::Error;

/// Errors surfaced by the synchronization engine.
///
/// All variants are local and synchronous. None of them is retried by the
/// server; agents retry on their next poll cycle.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Caller-supplied input violates a required-field or format rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// None of the supplied identity hints resolves to a known device.
    #[error("Device not found")]
    DeviceNotFound,

    /// A specific entity addressed by id or key does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique identity key is already held by another record.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => {
                    DomainError::Conflict("Identity already registered to another device".into())
                }
                Some("23503") => DomainError::NotFound("Referenced device not found".into()),
                _ => DomainError::Storage(format!("Database error: {}", db_err)),
            },
            _ => DomainError::Storage(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();

        if messages.is_empty() {
            DomainError::Validation("Invalid request".into())
        } else {
            DomainError::Validation(messages.join("; "))
        }
    }
}
