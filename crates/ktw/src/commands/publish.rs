//! `ktw publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use ktw_config::{CliSettings, Config};
use ktw_publish::{PublishConfig, SftpPublisher, resolve_ssh_dir};

use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Directory containing the generated site (default: the output directory).
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Destination URL, e.g. sftp://user@host:22/var/www (overrides config).
    #[arg(short, long)]
    root: Option<String>,
}

impl PublishArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            root: self.root,
            ..CliSettings::default()
        };
        let config = Config::load(global.config.as_deref(), Some(&cli_settings))?;
        let root = config.require_publish_root()?.to_owned();
        let directory = self
            .directory
            .unwrap_or_else(|| config.site_resolved.output_dir().to_path_buf());

        output.info(&format!("Publishing {} to {root}", directory.display()));

        let publisher = SftpPublisher::new(PublishConfig {
            root,
            ssh_dir: resolve_ssh_dir(config.publish.ssh_dir.as_deref()),
            user: std::env::var("USER").ok(),
        });
        let uploaded = publisher.publish(&directory)?;

        output.success(&format!("Published {uploaded} files"));
        Ok(())
    }
}
