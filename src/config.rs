//! Environment-driven configuration.
//!
//! Read once at startup, after `.env` loading. Required values are the
//! Google credentials and ids; everything else has a default.

use std::path::PathBuf;

use crate::classifier::ClassifyMode;
use crate::rows::ZeroIdentifierPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth bearer token with Drive read and Sheets write scopes.
    pub access_token: String,
    pub spreadsheet_id: String,
    pub folder_id: String,
    /// Destination worksheet inside the spreadsheet.
    pub worksheet: String,
    /// Only files created inside this window are considered per poll.
    pub lookback_minutes: i64,
    pub classify_mode: ClassifyMode,
    pub zero_identifier_policy: ZeroIdentifierPolicy,
    /// Override for the processed-set location.
    pub processed_set_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            access_token: require("GOOGLE_ACCESS_TOKEN")?,
            spreadsheet_id: require("GOOGLE_SHEETS_SPREADSHEET_ID")?,
            folder_id: require("GOOGLE_DRIVE_FOLDER_ID")?,
            worksheet: var_or("INVOICE_WORKSHEET", "invoice"),
            lookback_minutes: parse_minutes(&var_or("LOOKBACK_MINUTES", "5"))?,
            classify_mode: parse_classify_mode(&var_or("CLASSIFY_MODE", "priority"))?,
            zero_identifier_policy: parse_zero_policy(&var_or("ZERO_IDENTIFIER_POLICY", "skip"))?,
            processed_set_path: std::env::var("PROCESSED_SET_PATH").ok().map(PathBuf::from),
        })
    }
}

fn require(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("missing required environment variable {}", key))
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_minutes(value: &str) -> Result<i64, String> {
    let minutes: i64 = value
        .parse()
        .map_err(|_| format!("LOOKBACK_MINUTES must be a number, got '{}'", value))?;
    if minutes <= 0 {
        return Err(format!("LOOKBACK_MINUTES must be positive, got {}", minutes));
    }
    Ok(minutes)
}

pub fn parse_classify_mode(value: &str) -> Result<ClassifyMode, String> {
    match value {
        "priority" => Ok(ClassifyMode::Priority),
        "strict" => Ok(ClassifyMode::Strict),
        other => Err(format!(
            "CLASSIFY_MODE must be 'priority' or 'strict', got '{}'",
            other
        )),
    }
}

pub fn parse_zero_policy(value: &str) -> Result<ZeroIdentifierPolicy, String> {
    match value {
        "skip" => Ok(ZeroIdentifierPolicy::Skip),
        "placeholder" => Ok(ZeroIdentifierPolicy::Placeholder),
        other => Err(format!(
            "ZERO_IDENTIFIER_POLICY must be 'skip' or 'placeholder', got '{}'",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classify_mode() {
        assert_eq!(parse_classify_mode("priority"), Ok(ClassifyMode::Priority));
        assert_eq!(parse_classify_mode("strict"), Ok(ClassifyMode::Strict));
        assert!(parse_classify_mode("lenient").is_err());
    }

    #[test]
    fn test_parse_zero_policy() {
        assert_eq!(parse_zero_policy("skip"), Ok(ZeroIdentifierPolicy::Skip));
        assert_eq!(
            parse_zero_policy("placeholder"),
            Ok(ZeroIdentifierPolicy::Placeholder)
        );
        assert!(parse_zero_policy("emit").is_err());
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("5"), Ok(5));
        assert_eq!(parse_minutes("1440"), Ok(1440));
        assert!(parse_minutes("0").is_err());
        assert!(parse_minutes("-3").is_err());
        assert!(parse_minutes("soon").is_err());
    }
}
