//! Configuration for AskThem
//!
//! CLI arguments with environment variable fallbacks using clap.

use clap::Parser;
use std::net::SocketAddr;

use crate::signatures::WithdrawalRule;

/// AskThem - questions to elected officials, put to them once enough
/// people have signed on
#[derive(Parser, Debug, Clone)]
#[command(name = "askthem")]
#[command(about = "Signature-threshold service for questions to elected officials")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "askthem")]
    pub mongodb_db: String,

    /// Enable development mode (falls back to an in-memory store when
    /// MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Comparison used to clear threshold_met after a withdrawal
    /// (not-equal or below-threshold)
    #[arg(long, env = "WITHDRAWAL_RULE", default_value = "not-equal")]
    pub withdrawal_rule: WithdrawalRule,
}

impl Args {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.log_format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            ));
        }

        if self.mongodb_db.trim().is_empty() {
            return Err("MONGODB_DB must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["askthem"]).unwrap();
        assert_eq!(args.mongodb_db, "askthem");
        assert_eq!(args.withdrawal_rule, WithdrawalRule::NotEqual);
        assert!(!args.json_logs());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_withdrawal_rule_flag() {
        let args =
            Args::try_parse_from(["askthem", "--withdrawal-rule", "below-threshold"]).unwrap();
        assert_eq!(args.withdrawal_rule, WithdrawalRule::BelowThreshold);

        assert!(Args::try_parse_from(["askthem", "--withdrawal-rule", "sometimes"]).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let args = Args::try_parse_from(["askthem", "--log-format", "xml"]).unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from(["askthem", "--log-format", "JSON"]).unwrap();
        assert!(args.validate().is_ok());
        assert!(args.json_logs());
    }
}
