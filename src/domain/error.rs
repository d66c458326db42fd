//! Domain error types.
//!
//! The analytics computations themselves never fail — short history and
//! malformed cells degrade to documented defaults. Errors exist at the
//! port/adapter/CLI boundary only.

/// Top-level error type for folioscan.
#[derive(Debug, thiserror::Error)]
pub enum FolioscanError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no holdings found in {file}")]
    NoHoldings { file: String },

    #[error("no price history for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FolioscanError> for std::process::ExitCode {
    fn from(err: &FolioscanError) -> Self {
        let code: u8 = match err {
            FolioscanError::Io(_) => 1,
            FolioscanError::ConfigParse { .. }
            | FolioscanError::ConfigMissing { .. }
            | FolioscanError::ConfigInvalid { .. } => 2,
            FolioscanError::Database { .. } | FolioscanError::DatabaseQuery { .. } => 3,
            FolioscanError::NoHoldings { .. } => 4,
            FolioscanError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_holdings_message_names_file() {
        let err = FolioscanError::NoHoldings {
            file: "positions.csv".into(),
        };
        assert_eq!(err.to_string(), "no holdings found in positions.csv");
    }

    #[test]
    fn config_error_messages_name_the_key() {
        let missing = FolioscanError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(missing.to_string(), "missing config key [sqlite] path");

        let invalid = FolioscanError::ConfigInvalid {
            section: "analysis".into(),
            key: "lookback_days".into(),
            reason: "not a number".into(),
        };
        assert_eq!(
            invalid.to_string(),
            "invalid config value [analysis] lookback_days: not a number"
        );
    }
}
