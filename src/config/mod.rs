use crate::core::membership::DEFAULT_WORKERS;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use clap::Parser;

/// All process configuration in one explicit struct. Remote credentials
/// default from the environment but are never read ad hoc elsewhere, so
/// every component stays testable without environment simulation.
#[derive(Debug, Clone, Parser)]
#[command(name = "dept-team-sync")]
#[command(about = "Reconcile a directory user export against remote CMDB teams and memberships")]
pub struct CliConfig {
    /// Directory user export (CN, Email, SAMAccountName, Department)
    #[arg(long, default_value = "data/users.csv")]
    pub users_file: String,

    /// Canonical department catalog
    #[arg(long, default_value = "data/valid-department-list.toml")]
    pub catalog_file: String,

    /// Directory for the generated reports
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Similarity threshold for a confident department match;
    /// 1.0 means exact after normalization
    #[arg(long, default_value = "1.0")]
    pub threshold: f64,

    /// Membership worker pool size
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Remote API endpoint
    #[arg(long, env = "ITOP_API_URL")]
    pub api_url: String,

    #[arg(long, env = "ITOP_API_USER")]
    pub api_user: String,

    #[arg(long, env = "ITOP_API_PWD", hide_env_values = true)]
    pub api_password: String,

    /// Remote API version string
    #[arg(long, env = "ITOP_VERSION", default_value = "1.3")]
    pub api_version: String,

    /// Organization id owning created teams
    #[arg(long, env = "ITOP_ORG_ID")]
    pub org_id: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    /// Accept invalid TLS certificates (self-signed deployments)
    #[arg(long)]
    pub insecure_tls: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        validate_non_empty_string("users_file", &self.users_file)?;
        validate_non_empty_string("catalog_file", &self.catalog_file)?;
        validate_non_empty_string("output_path", &self.output_path)?;
        validate_non_empty_string("org_id", &self.org_id)?;
        validate_range("threshold", self.threshold, 0.0, 1.0)?;
        validate_positive_number("workers", self.workers, 1)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        Ok(())
    }
}
