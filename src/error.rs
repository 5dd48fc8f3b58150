use thiserror::Error;

/// Main error type for the Rusty Smartsheet library.
/// Aggregates errors from dependencies and from the internal modules.
#[derive(Error, Debug)]
pub enum RustySmartsheetError {
    #[error("{0}")]
    WithContextError(String),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Configuration errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Index module errors
    #[error("{0}")]
    IndexError(#[from] crate::index::IndexError),
}

/// Result alias used across the public API.
pub type Result<T, E = RustySmartsheetError> = std::result::Result<T, E>;

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustySmartsheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustySmartsheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
