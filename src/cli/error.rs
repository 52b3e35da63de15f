//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(InfraError::Application(app)) => match app {
                ApplicationError::Config { .. } | ApplicationError::Domain(_) => {
                    crate::exitcode::CONFIG
                }
                ApplicationError::Dataset { .. } => crate::exitcode::DATAERR,
                ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn given_dataset_error_when_mapping_exit_code_then_returns_dataerr() {
        let err: CliError = ApplicationError::dataset("devices.json", "not an array").into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_invalid_tree_options_when_mapping_exit_code_then_returns_config() {
        let err: CliError =
            ApplicationError::from(DomainError::InvalidBuildOptions("empty prefix".into())).into();
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }
}
