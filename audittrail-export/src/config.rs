//! Export configuration: validation of CLI input and `.env` loading
use crate::cli::Cli;
use crate::datetime::{self, parse_utc_millis};
use crate::error::ConfigError;
use audittrail_api::{AuditEventQuery, AuditTrailConfig, Credential, parse_base_url};
use chrono::Local;
use log::{debug, info, warn};
use secrecy::SecretString;
use std::path::{Path, PathBuf};

/// File read for environment defaults before the CLI is parsed
pub const ENV_FILE: &str = ".env";

/// Validated configuration for one export run
#[derive(Debug)]
pub struct ExportConfig {
    /// Hostname as given (validated, trailing `/` removed)
    pub hostname: String,
    pub credential: Credential,
    pub event: Option<String>,
    pub user_name: Option<String>,
    pub target_name: Option<String>,
    pub project_name: Option<String>,
    /// Lower bound, epoch milliseconds (UTC)
    pub start_timestamp: Option<i64>,
    /// Upper bound, epoch milliseconds (UTC)
    pub end_timestamp: Option<i64>,
    /// Destination of the CSV file
    pub output: PathBuf,
    pub page_size: u32,
    /// Request timeout in seconds
    pub timeout: u64,
    pub validate_certificates: bool,
}

impl ExportConfig {
    /// Validate parsed CLI arguments into an export configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the hostname is missing or invalid, when not
    /// exactly one credential is supplied, or when a date filter is malformed.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let hostname = non_empty(cli.hostname).ok_or(ConfigError::MissingHostname)?;
        let hostname = hostname.trim().trim_end_matches('/').to_string();

        let credential = match (non_empty(cli.jwt), non_empty(cli.api_key)) {
            (Some(jwt), None) => Credential::BearerToken(SecretString::new(jwt.into())),
            (None, Some(key)) => Credential::ApiKey(SecretString::new(key.into())),
            (None, None) => return Err(ConfigError::MissingCredential),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCredentials),
        };

        // Validated here so a bad hostname is a usage error, not a request error
        parse_base_url(&hostname).map_err(|e| ConfigError::InvalidHostname(e.to_string()))?;

        let start_timestamp = cli
            .start_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_utc_millis(s, "--start_date"))
            .transpose()?;
        let end_timestamp = cli
            .end_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_utc_millis(s, "--end_date"))
            .transpose()?;

        if let (Some(start), Some(end)) = (start_timestamp, end_timestamp)
            && start > end
        {
            return Err(ConfigError::InvalidDateRange {
                start: cli.start_date.unwrap_or_default(),
                end: cli.end_date.unwrap_or_default(),
            });
        }

        let output = non_empty(cli.output)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(datetime::default_output_filename(Local::now())));

        Ok(Self {
            hostname,
            credential,
            event: non_empty(cli.event),
            user_name: non_empty(cli.user_name),
            target_name: non_empty(cli.target_name),
            project_name: non_empty(cli.project_name),
            start_timestamp,
            end_timestamp,
            output,
            page_size: cli.page_size,
            timeout: cli.timeout,
            validate_certificates: !cli.insecure,
        })
    }

    /// Filters for the audit events query
    #[must_use]
    pub fn query(&self) -> AuditEventQuery {
        AuditEventQuery {
            event: self.event.clone(),
            actor_name: self.user_name.clone(),
            target_name: self.target_name.clone(),
            project_name: self.project_name.clone(),
            start_timestamp: self.start_timestamp,
            end_timestamp: self.end_timestamp,
        }
    }

    /// Client configuration, consuming the credential
    ///
    /// # Errors
    ///
    /// Returns an error if the hostname cannot be turned into a base URL.
    pub fn into_client_config(
        self,
    ) -> Result<(AuditTrailConfig, AuditEventQuery, PathBuf), ConfigError> {
        let query = self.query();
        let mut client_config = AuditTrailConfig::new(&self.hostname, self.credential)
            .map_err(|e| ConfigError::InvalidHostname(e.to_string()))?
            .with_page_size(self.page_size)
            .with_timeouts(30, self.timeout);

        if !self.validate_certificates {
            warn!("WARNING: Certificate validation disabled for the audit trail API");
            warn!("   This should only be used in development environments!");
            client_config = client_config.with_certificate_validation_disabled();
        }

        Ok((client_config, query, self.output))
    }

    /// Log the effective arguments with credentials masked
    pub fn log_summary(&self) {
        let (jwt, api_key) = match &self.credential {
            Credential::BearerToken(_) => ("*****", "-"),
            Credential::ApiKey(_) => ("-", "*****"),
        };
        let start = self.start_timestamp.and_then(datetime::format_utc_millis);
        let end = self.end_timestamp.and_then(datetime::format_utc_millis);

        info!("Exporting audit trail events using the following arguments:");
        info!("- Hostname: {}", self.hostname);
        info!("- JWT: {jwt}");
        info!("- API Key: {api_key}");
        info!("- Start Date & Time (UTC): {}", start.as_deref().unwrap_or("-"));
        info!("- End Date & Time (UTC): {}", end.as_deref().unwrap_or("-"));
        info!("- Event: {}", self.event.as_deref().unwrap_or("-"));
        info!("- User Name: {}", self.user_name.as_deref().unwrap_or("-"));
        info!("- Target Name: {}", self.target_name.as_deref().unwrap_or("-"));
        info!("- Project Name: {}", self.project_name.as_deref().unwrap_or("-"));
        info!("- Output: {}", self.output.display());
    }
}

/// Load `KEY=value` lines from an env file into the process environment.
///
/// Variables that are already set keep their value. A missing file is not an
/// error; a file that cannot be parsed is logged and skipped.
///
/// Returns whether the file was loaded.
pub fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!("Loaded environment from {}", path.display());
            true
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "No {} file found. Skipping loading environment variables",
                path.display()
            );
            false
        }
        Err(e) => {
            warn!("Failed to load {}: {e}", path.display());
            false
        }
    }
}

/// Treat empty and whitespace-only values as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_cli() -> Cli {
        Cli {
            hostname: Some("https://domino.example.com/".to_string()),
            api_key: Some("key".to_string()),
            page_size: 1000,
            timeout: 300,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let cli = Cli {
            event: Some("Create Project".to_string()),
            user_name: Some("alice".to_string()),
            start_date: Some("2024-10-17 17:16:00".to_string()),
            end_date: Some("2024-10-17 17:18:00".to_string()),
            output: Some("out/export.csv".to_string()),
            ..base_cli()
        };

        let config = ExportConfig::from_cli(cli).unwrap();
        assert_eq!(config.hostname, "https://domino.example.com");
        assert!(matches!(config.credential, Credential::ApiKey(_)));
        assert_eq!(config.start_timestamp, Some(1729185360000));
        assert_eq!(config.end_timestamp, Some(1729185480000));
        assert_eq!(config.output, PathBuf::from("out/export.csv"));
        assert!(config.validate_certificates);

        let query = config.query();
        assert_eq!(query.event.as_deref(), Some("Create Project"));
        assert_eq!(query.actor_name.as_deref(), Some("alice"));
        assert_eq!(query.project_name, None);
    }

    #[test]
    fn test_missing_hostname() {
        let cli = Cli {
            hostname: None,
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::MissingHostname)
        ));

        let cli = Cli {
            hostname: Some("  ".to_string()),
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::MissingHostname)
        ));
    }

    #[test]
    fn test_invalid_hostname() {
        let cli = Cli {
            hostname: Some("ftp://domino.example.com".to_string()),
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::InvalidHostname(_))
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let cli = Cli {
            api_key: None,
            jwt: None,
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::MissingCredential)
        ));

        // Empty values count as absent
        let cli = Cli {
            api_key: Some(String::new()),
            jwt: Some(" ".to_string()),
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn test_both_credentials() {
        let cli = Cli {
            jwt: Some("jwt".to_string()),
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::ConflictingCredentials)
        ));
    }

    #[test]
    fn test_jwt_credential() {
        let cli = Cli {
            jwt: Some("jwt".to_string()),
            api_key: None,
            ..base_cli()
        };
        let config = ExportConfig::from_cli(cli).unwrap();
        assert!(matches!(config.credential, Credential::BearerToken(_)));
    }

    #[test]
    fn test_malformed_start_date_names_field() {
        let cli = Cli {
            start_date: Some("2024-13-40".to_string()),
            ..base_cli()
        };
        match ExportConfig::from_cli(cli) {
            Err(ConfigError::InvalidTimestamp { field, value }) => {
                assert_eq!(field, "--start_date");
                assert_eq!(value, "2024-13-40");
            }
            other => panic!("expected InvalidTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_end_date_names_field() {
        let cli = Cli {
            end_date: Some("tomorrow".to_string()),
            ..base_cli()
        };
        match ExportConfig::from_cli(cli) {
            Err(ConfigError::InvalidTimestamp { field, .. }) => assert_eq!(field, "--end_date"),
            other => panic!("expected InvalidTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_start_after_end() {
        let cli = Cli {
            start_date: Some("2024-10-18 00:00:00".to_string()),
            end_date: Some("2024-10-17 00:00:00".to_string()),
            ..base_cli()
        };
        assert!(matches!(
            ExportConfig::from_cli(cli),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_default_output_name() {
        let config = ExportConfig::from_cli(base_cli()).unwrap();
        let name = config.output.to_string_lossy().to_string();
        assert!(name.starts_with("audit_trail_export_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_into_client_config() {
        let cli = Cli {
            page_size: 25,
            timeout: 60,
            insecure: true,
            ..base_cli()
        };
        let config = ExportConfig::from_cli(cli).unwrap();
        let (client_config, query, _output) = config.into_client_config().unwrap();

        assert_eq!(client_config.page_size, 25);
        assert_eq!(client_config.request_timeout, 60);
        assert!(!client_config.validate_certificates);
        assert_eq!(query, AuditEventQuery::default());
    }

    #[test]
    fn test_load_env_file_missing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(!load_env_file(&temp_dir.path().join(".env")));
    }

    #[test]
    fn test_load_env_file_sets_variables() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let env_path = temp_dir.path().join(".env");
        fs::write(
            &env_path,
            "# comment\nAUDITTRAIL_EXPORT_TEST_HOST=https://from-env-file.example.com\n",
        )
        .unwrap();

        assert!(load_env_file(&env_path));
        assert_eq!(
            std::env::var("AUDITTRAIL_EXPORT_TEST_HOST").unwrap(),
            "https://from-env-file.example.com"
        );
    }
}
