//! `ktw generate` command implementation.

use std::path::PathBuf;

use clap::Args;
use ktw_config::{CliSettings, Config, RenderConfig, SiteConfig, SoftBreakMode};
use ktw_renderer::{Engine, EngineConfig, ParserOptions, RendererOptions, SoftBreak};
use ktw_site::{Cancellation, FailurePolicy, GeneratorConfig, SiteGenerator};

use crate::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Markdown source directory (overrides config).
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Output directory (default: next to the sources).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render every document and report all failures.
    #[arg(short, long)]
    keep_going: bool,

    /// Number of worker threads.
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl GenerateArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            jobs: self.jobs,
            keep_going: self.keep_going.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(global.config.as_deref(), Some(&cli_settings))?;
        let site = &config.site_resolved;

        output.info(&format!("Source: {}", site.source_dir.display()));
        output.info(&format!("Output: {}", site.output_dir().display()));

        let engine = Engine::new(engine_config(&config.render));
        let generator = SiteGenerator::new(&engine, generator_config(site));
        let report = generator.generate(&Cancellation::new())?;

        for failure in &report.failures {
            output.warning(&format!("Failed: {failure}"));
        }
        if !report.is_success() {
            return Err(CliError::PartialFailure {
                count: report.failures.len(),
                total: report.failures.len() + report.generated.len(),
            });
        }

        output.success(&format!("Generated {} pages", report.generated.len()));
        Ok(())
    }
}

/// Build the renderer configuration from `[render]`.
fn engine_config(render: &RenderConfig) -> EngineConfig {
    EngineConfig {
        parser: ParserOptions {
            gfm: render.gfm,
            footnotes: render.footnotes,
            smart_punctuation: render.smart_punctuation,
            heading_attributes: render.heading_attributes,
        },
        renderer: RendererOptions {
            soft_break: match render.soft_break {
                SoftBreakMode::Space => SoftBreak::Space,
                SoftBreakMode::Newline => SoftBreak::Newline,
            },
            raw_html: render.raw_html,
        },
        ..EngineConfig::default()
    }
}

/// Build the generator configuration from the resolved `[site]` section.
fn generator_config(site: &SiteConfig) -> GeneratorConfig {
    GeneratorConfig {
        source_dir: site.source_dir.clone(),
        output_dir: site.output_dir().to_path_buf(),
        source_extension: site.source_extension.clone(),
        output_extension: site.output_extension.clone(),
        jobs: site.jobs,
        policy: if site.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn site(config: &str) -> (TempDir, GlobalArgs) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ktw.toml"), config).unwrap();
        fs::write(
            dir.path().join("index.md"),
            "---\ntitle: Home\n---\nNote: hi\n",
        )
        .unwrap();
        let global = GlobalArgs {
            config: Some(dir.path().join("ktw.toml")),
            site: None,
            verbose: false,
        };
        (dir, global)
    }

    fn args(keep_going: bool) -> GenerateArgs {
        GenerateArgs {
            source_dir: None,
            output_dir: None,
            keep_going,
            jobs: Some(1),
        }
    }

    #[test]
    fn test_execute_writes_pages() {
        let (dir, global) = site("[site]\noutput_dir = \"public\"\n");

        args(false).execute(&global).unwrap();

        let html = fs::read_to_string(dir.path().join("public/index.html")).unwrap();
        assert!(html.contains("<title>Home</title>"));
        assert!(html.contains(r#"<p class="note">hi</p>"#));
    }

    #[test]
    fn test_execute_keep_going_reports_failures() {
        let (dir, global) = site("");
        fs::write(dir.path().join("broken.md"), "# no frontmatter\n").unwrap();

        let err = args(true).execute(&global).unwrap_err();

        assert!(matches!(
            err,
            CliError::PartialFailure { count: 1, total: 2 }
        ));
        assert!(dir.path().join("index.html").is_file());
    }

    #[test]
    fn test_engine_config_defaults_match() {
        let config = engine_config(&RenderConfig::default());
        assert_eq!(config.parser, ParserOptions::default());
        assert_eq!(config.renderer, RendererOptions::default());
    }

    #[test]
    fn test_engine_config_overrides() {
        let config = engine_config(&RenderConfig {
            gfm: false,
            soft_break: SoftBreakMode::Newline,
            raw_html: false,
            ..RenderConfig::default()
        });
        assert!(!config.parser.gfm);
        assert!(config.parser.footnotes);
        assert_eq!(config.renderer.soft_break, SoftBreak::Newline);
        assert!(!config.renderer.raw_html);
    }

    #[test]
    fn test_generator_config_in_place() {
        let site = SiteConfig {
            source_dir: PathBuf::from("/site"),
            ..SiteConfig::default()
        };
        let config = generator_config(&site);
        assert_eq!(config.output_dir, Path::new("/site"));
        assert_eq!(config.source_extension, "md");
        assert_eq!(config.output_extension, "html");
        assert_eq!(config.policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_generator_config_keep_going() {
        let site = SiteConfig {
            output_dir: Some(PathBuf::from("/out")),
            jobs: Some(3),
            keep_going: true,
            ..SiteConfig::default()
        };
        let config = generator_config(&site);
        assert_eq!(config.output_dir, Path::new("/out"));
        assert_eq!(config.jobs, Some(3));
        assert_eq!(config.policy, FailurePolicy::KeepGoing);
    }
}
