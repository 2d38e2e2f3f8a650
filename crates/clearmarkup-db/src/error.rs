//! Error types for clearmarkup-db.

use clearmarkup_config::error::ConfigError;
use miette::Diagnostic;
use thiserror::Error;

/// Database error type for clearmarkup-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error(transparent)]
    #[diagnostic(
        code(clearmarkup_db::sqlite),
        help("Check the query and the database schema")
    )]
    Sqlite(#[from] rusqlite::Error),

    #[error("No table selected for the query")]
    #[diagnostic(
        code(clearmarkup_db::missing_table),
        help("Call `table(..)` before running the query")
    )]
    MissingTable,

    #[error("Invalid condition `{key}`: {reason}")]
    #[diagnostic(
        code(clearmarkup_db::invalid_condition),
        help("Supported operators are [!], [>], [>=], [<], [<=], [~], [!~], [<>] and [><]")
    )]
    InvalidCondition { key: String, reason: String },

    #[error("Update on `{0}` has no data to set")]
    #[diagnostic(code(clearmarkup_db::empty_update))]
    EmptyUpdate(String),

    #[error("Unsupported database driver: {0}")]
    #[diagnostic(
        code(clearmarkup_db::unsupported_driver),
        help("Only the `sqlite` driver is available")
    )]
    UnsupportedDriver(String),

    #[error("Invalid duration: {0}")]
    #[diagnostic(
        code(clearmarkup_db::invalid_duration),
        help("Use a duration like `30s`, `15m`, `1h` or `1d12h`")
    )]
    InvalidDuration(String),

    #[error("Failed to serialize data: {0}")]
    #[diagnostic(code(clearmarkup_db::serialization))]
    Serialization(#[from] serde_json::Error),

    #[error("Database connection lock is poisoned")]
    #[diagnostic(code(clearmarkup_db::poisoned))]
    PoisonError,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl DbError {
    pub(crate) fn invalid_condition(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCondition {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Short category of the failure, suitable for showing to end users
    /// without leaking query details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingTable
            | Self::InvalidCondition { .. }
            | Self::EmptyUpdate(_)
            | Self::InvalidDuration(_) => "Invalid argument",
            Self::Sqlite(_) | Self::PoisonError | Self::Serialization(_) => "Runtime error",
            Self::UnsupportedDriver(_) | Self::Config(_) => "General exception",
        }
    }
}

/// Result type alias for clearmarkup-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
