//! Error types for audittrail-export

/// Invalid or missing command-line input
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No hostname on the command line or in the environment
    #[error("hostname required: pass --hostname or set DOMINO_HOSTNAME")]
    MissingHostname,

    /// Hostname is not a usable http(s) URL
    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    /// Neither --jwt nor --api-key supplied
    #[error("exactly one credential required: pass either --jwt or --api-key (none given)")]
    MissingCredential,

    /// Both --jwt and --api-key supplied
    #[error("exactly one credential required: pass either --jwt or --api-key, not both")]
    ConflictingCredentials,

    /// Date filter does not parse as `YYYY-MM-DD HH:MM:SS`
    #[error("invalid {field} '{value}': expected format YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp { field: &'static str, value: String },

    /// Start date after end date
    #[error("invalid date range: --start_date {start} is after --end_date {end}")]
    InvalidDateRange { start: String, end: String },
}

/// Custom error type for audittrail-export operations
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audit trail API error
    #[error("Audit trail request failed: {0}")]
    Request(#[from] audittrail_api::AuditTrailError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Process exit code for this error (2 for usage problems, 1 otherwise)
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::Config(_) => 2,
            ExportError::Request(_) | ExportError::Io(_) | ExportError::Csv(_) => 1,
        }
    }
}

/// Result type alias for audittrail-export operations
pub type Result<T> = std::result::Result<T, ExportError>;
