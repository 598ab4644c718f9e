//! CLI error types.

use std::path::PathBuf;

use ktw_config::ConfigError;
use ktw_publish::PublishError;
use ktw_site::GenerateError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("cannot change to site directory {}: {source}", path.display())]
    Site {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{count} of {total} documents failed")]
    PartialFailure { count: usize, total: usize },

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("verify is not implemented")]
    VerifyNotImplemented,
}
