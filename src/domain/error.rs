//! Domain error types.

/// Top-level error type for fundscreen.
#[derive(Debug, thiserror::Error)]
pub enum FundscreenError {
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

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("history request failed: {reason}")]
    History { reason: String },

    #[error("broker rejected {action}: {reason}")]
    Broker { action: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FundscreenError> for std::process::ExitCode {
    fn from(err: &FundscreenError) -> Self {
        let code: u8 = match err {
            FundscreenError::Io(_) => 1,
            FundscreenError::ConfigParse { .. }
            | FundscreenError::ConfigMissing { .. }
            | FundscreenError::ConfigInvalid { .. } => 2,
            FundscreenError::Data { .. } => 3,
            FundscreenError::History { .. } => 4,
            FundscreenError::Broker { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
