//! ktw CLI - Markdown site generator.
//!
//! Provides commands for:
//! - `generate`: Render every Markdown document of a site into HTML
//! - `publish`: Mirror the generated site to an SFTP server
//! - `verify`: Check a site (not implemented)

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GenerateArgs, PublishArgs, VerifyArgs};
use error::CliError;
use output::Output;

/// ktw - Markdown site generator.
#[derive(Parser)]
#[command(name = "ktw", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover ktw.toml).
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Site directory to run in.
    #[arg(short, long, global = true)]
    site: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render Markdown documents into HTML pages.
    Generate(GenerateArgs),
    /// Publish the generated site over SFTP.
    Publish(PublishArgs),
    /// Verify the site.
    Verify(VerifyArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(site) = &cli.global.site {
        std::env::set_current_dir(site).map_err(|source| CliError::Site {
            path: site.clone(),
            source,
        })?;
    }

    match cli.command {
        Commands::Generate(args) => args.execute(&cli.global),
        Commands::Publish(args) => args.execute(&cli.global),
        Commands::Verify(args) => args.execute(&cli.global),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ktw", "generate", "-v", "-c", "site.toml"]).unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.config, Some(PathBuf::from("site.toml")));
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn test_site_flag() {
        let cli = Cli::try_parse_from(["ktw", "--site", "docs", "verify"]).unwrap();
        assert_eq!(cli.global.site, Some(PathBuf::from("docs")));
        assert!(matches!(cli.command, Commands::Verify(_)));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["ktw"]).is_err());
    }
}
