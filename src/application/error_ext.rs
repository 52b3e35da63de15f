//! Path context for fallible file operations.

use std::error::Error;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Turns any error into [`ApplicationError::OperationFailed`] naming the file involved.
///
/// ```ignore
/// fs.read_to_string(&path).with_path_context("read dataset", &path)?;
/// ```
pub trait PathContext<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T, E> PathContext<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{} {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn given_io_error_when_adding_context_then_message_names_path() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let err = result
            .with_path_context("read dataset", Path::new("devices.json"))
            .unwrap_err();

        assert_eq!(err.to_string(), "operation failed: read dataset devices.json");
        assert!(err.source().is_some());
    }
}
