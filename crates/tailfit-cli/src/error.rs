use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tailfit_core::ValidationError),

    #[error(transparent)]
    Config(#[from] tailfit_core::ConfigError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(tailfit_core::ConfigError::Validation(_)) => 2,
            Self::StrictModeViolation { .. } => 5,
            Self::Config(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
