use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// User-supplied local part sanitized down to nothing
    #[error("invalid name: nothing left after sanitization")]
    InvalidName,

    /// Requested address is already owned by a different user
    #[error("address is already taken")]
    NameTaken,

    /// Random mint could not find a free address within the attempt bound
    #[error("no free address found after {0} attempts")]
    RegistryExhausted(u32),

    /// Webhook shared-secret mismatch
    #[error("webhook secret mismatch")]
    Unauthorized,

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
