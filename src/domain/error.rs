//! Domain error types.

/// Top-level error type for strategylab.
#[derive(Debug, thiserror::Error)]
pub enum StrategylabError {
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

    #[error("unknown strategy '{id}'")]
    UnknownStrategy { id: String },

    #[error("invalid parameter {key} = {value}: {reason}")]
    InvalidParameter {
        key: String,
        value: f64,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StrategylabError {
    pub(crate) fn invalid_param(key: &str, value: f64, reason: &str) -> Self {
        StrategylabError::InvalidParameter {
            key: key.to_string(),
            value,
            reason: reason.to_string(),
        }
    }
}

impl StrategylabError {
    /// Process exit status for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            StrategylabError::Io(_) => 1,
            StrategylabError::ConfigParse { .. }
            | StrategylabError::ConfigMissing { .. }
            | StrategylabError::ConfigInvalid { .. } => 2,
            StrategylabError::Data { .. } => 3,
            StrategylabError::UnknownStrategy { .. }
            | StrategylabError::InvalidParameter { .. } => 4,
            StrategylabError::Export { .. } => 5,
        }
    }
}

impl From<&StrategylabError> for std::process::ExitCode {
    fn from(err: &StrategylabError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
