//! `ktw verify` command implementation.

use clap::Args;

use crate::GlobalArgs;
use crate::error::CliError;

/// Arguments for the verify command.
#[derive(Args)]
pub(crate) struct VerifyArgs;

impl VerifyArgs {
    #[allow(clippy::unused_self)]
    pub(crate) fn execute(self, _global: &GlobalArgs) -> Result<(), CliError> {
        Err(CliError::VerifyNotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_verify_not_implemented() {
        let global = GlobalArgs {
            config: None,
            site: None,
            verbose: false,
        };
        let err = VerifyArgs.execute(&global).unwrap_err();
        assert_eq!(err.to_string(), "verify is not implemented");
    }
}
