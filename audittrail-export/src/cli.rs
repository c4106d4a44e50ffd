//! CLI argument parsing for audittrail-export
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "audittrail-export",
    version,
    about = "Export audit trail events to a CSV file",
    long_about = "Queries the audit trail API of a deployment, pages through every matching event \
                  (newest first) and writes them to a CSV file.",
    after_help = "AUTHENTICATION:
  Exactly one of --jwt or --api-key must be supplied. Both can also come from
  the environment (JWT, API_KEY) or from a .env file in the working directory.

EXAMPLES:
  # Everything a user did in a project during one day
  audittrail-export --hostname https://domino.example.com --api-key $KEY \\
      --user_name alice --project_name churn-model \\
      --start_date '2024-10-17 00:00:00' --end_date '2024-10-17 23:59:59'

  # Using a .env file with DOMINO_HOSTNAME and JWT set
  audittrail-export --event 'Create Project' --output ./exports/projects.csv"
)]
pub struct Cli {
    /// Deployment hostname, e.g. https://domino.example.com
    #[arg(long, env = "DOMINO_HOSTNAME")]
    pub hostname: Option<String>,

    /// JWT bearer token (cannot be combined with --api-key)
    #[arg(long, env = "JWT", hide_env_values = true)]
    pub jwt: Option<String>,

    /// API key (cannot be combined with --jwt)
    #[arg(long = "api-key", env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Event name
    #[arg(long)]
    pub event: Option<String>,

    /// User name that performed the action
    #[arg(long = "user_name")]
    pub user_name: Option<String>,

    /// Object that received the action
    #[arg(long = "target_name")]
    pub target_name: Option<String>,

    /// Name of the project
    #[arg(long = "project_name")]
    pub project_name: Option<String>,

    /// Timestamp (UTC) from when to start looking for data. Format: YYYY-MM-DD HH:MM:SS
    #[arg(long = "start_date")]
    pub start_date: Option<String>,

    /// Timestamp (UTC) up to when to look for data. Format: YYYY-MM-DD HH:MM:SS
    #[arg(long = "end_date")]
    pub end_date: Option<String>,

    /// Output CSV file. Defaults to audit_trail_export_<YYYY-MM-DD_HH-MM-SS>.csv
    #[arg(short, long)]
    pub output: Option<String>,

    /// Events requested per page (1-1000)
    #[arg(long = "page-size", default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 300, value_parser = validate_timeout)]
    pub timeout: u64,

    /// Disable TLS certificate validation (development deployments only)
    #[arg(long, env = "AUDITTRAIL_DISABLE_CERT_VALIDATION")]
    pub insecure: bool,
}

/// Validate request timeout (> 0)
fn validate_timeout(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    if value == 0 {
        return Err("Timeout must be greater than 0".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "audittrail-export",
            "--hostname",
            "https://domino.example.com",
            "--api-key",
            "key",
            "--event",
            "Create Project",
            "--user_name",
            "alice",
            "--target_name",
            "customers",
            "--project_name",
            "churn-model",
            "--start_date",
            "2024-10-17 00:00:00",
            "--end_date",
            "2024-10-18 00:00:00",
            "--output",
            "out.csv",
            "--page-size",
            "50",
            "--timeout",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.hostname.as_deref(), Some("https://domino.example.com"));
        assert_eq!(cli.api_key.as_deref(), Some("key"));
        assert_eq!(cli.event.as_deref(), Some("Create Project"));
        assert_eq!(cli.user_name.as_deref(), Some("alice"));
        assert_eq!(cli.target_name.as_deref(), Some("customers"));
        assert_eq!(cli.project_name.as_deref(), Some("churn-model"));
        assert_eq!(cli.start_date.as_deref(), Some("2024-10-17 00:00:00"));
        assert_eq!(cli.end_date.as_deref(), Some("2024-10-18 00:00:00"));
        assert_eq!(cli.output.as_deref(), Some("out.csv"));
        assert_eq!(cli.page_size, 50);
        assert_eq!(cli.timeout, 60);
    }

    #[test]
    fn test_page_size_out_of_range() {
        for bad in ["0", "1001", "abc"] {
            let result = Cli::try_parse_from([
                "audittrail-export",
                "--hostname",
                "h",
                "--page-size",
                bad,
            ]);
            assert!(result.is_err(), "page size {bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_timeout() {
        assert_eq!(validate_timeout("30").unwrap(), 30);
        assert!(validate_timeout("0").unwrap_err().contains("greater than 0"));
        assert!(validate_timeout("-1").is_err());
    }

    #[test]
    fn test_underscore_flag_names() {
        // The filter flags keep their underscore spelling
        let result = Cli::try_parse_from(["audittrail-export", "--user-name", "alice"]);
        assert!(result.is_err());
    }
}
