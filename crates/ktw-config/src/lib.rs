//! Configuration management for ktw.
//!
//! Parses `ktw.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `publish.root`
//! - `publish.ssh_dir`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override worker thread count.
    pub jobs: Option<usize>,
    /// Override failure policy.
    pub keep_going: Option<bool>,
    /// Override publish destination.
    pub root: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ktw.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Markdown rendering options.
    pub render: RenderConfig,
    /// Publishing destination.
    pub publish: PublishConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    dir: Option<String>,
    output_dir: Option<String>,
    source_extension: Option<String>,
    output_extension: Option<String>,
    jobs: Option<usize>,
    keep_going: Option<bool>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, PartialEq, Eq)]
pub struct SiteConfig {
    /// Directory containing source documents.
    pub source_dir: PathBuf,
    /// Directory receiving generated pages. `None` writes next to the sources.
    pub output_dir: Option<PathBuf>,
    /// Source document extension, without the dot.
    pub source_extension: String,
    /// Generated page extension, without the dot.
    pub output_extension: String,
    /// Worker threads. `None` uses one per CPU.
    pub jobs: Option<usize>,
    /// Render every document and report all failures instead of stopping at
    /// the first one.
    pub keep_going: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl SiteConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            source_dir: base.to_path_buf(),
            output_dir: None,
            source_extension: "md".to_owned(),
            output_extension: "html".to_owned(),
            jobs: None,
            keep_going: false,
        }
    }

    /// Directory receiving generated pages.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.source_dir)
    }
}

/// How soft line breaks are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftBreakMode {
    #[default]
    Space,
    Newline,
}

/// Markdown rendering configuration.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderConfig {
    /// Tables, strikethrough and task lists.
    pub gfm: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
    /// `{#id .class}` blocks after headings.
    pub heading_attributes: bool,
    pub soft_break: SoftBreakMode,
    /// Pass raw HTML through. When false it is escaped.
    pub raw_html: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            footnotes: true,
            smart_punctuation: true,
            heading_attributes: true,
            soft_break: SoftBreakMode::default(),
            raw_html: true,
        }
    }
}

/// Publishing configuration.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Destination URL, e.g. `sftp://deploy@example.com:2222/var/www`.
    pub root: Option<String>,
    /// Directory holding `known_hosts` and private keys.
    pub ssh_dir: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`publish.root`").
        field: String,
        /// Error message (e.g., "${`DEPLOY_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a file extension without a leading dot.
fn require_extension(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "{field} must not start with a dot"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ktw.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, then the
    /// result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.site_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.site_resolved.output_dir = Some(output_dir.clone());
        }
        if let Some(jobs) = settings.jobs {
            self.site_resolved.jobs = Some(jobs);
        }
        if let Some(keep_going) = settings.keep_going {
            self.site_resolved.keep_going = keep_going;
        }
        if let Some(root) = &settings.root {
            self.publish.root = Some(root.clone());
        }
    }

    /// Get the publish destination.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `publish.root` is not set.
    pub fn require_publish_root(&self) -> Result<&str, ConfigError> {
        self.publish
            .root
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("publish.root is required".to_owned()))
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site_resolved: SiteConfig::with_base(base),
            ..Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_publish()?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        let site = &self.site_resolved;
        require_extension(&site.source_extension, "site.source_extension")?;
        require_extension(&site.output_extension, "site.output_extension")?;

        if site.source_extension == site.output_extension
            && site.output_dir() == site.source_dir.as_path()
        {
            return Err(ConfigError::Validation(
                "site.output_extension must differ from site.source_extension when pages are written next to sources".to_owned(),
            ));
        }

        if site.jobs == Some(0) {
            return Err(ConfigError::Validation(
                "site.jobs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_publish(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.publish.root {
            require_non_empty(root, "publish.root")?;
        }
        if let Some(ssh_dir) = &self.publish.ssh_dir {
            require_non_empty(ssh_dir, "publish.ssh_dir")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref root) = self.publish.root {
            self.publish.root = Some(expand::expand_env(root, "publish.root")?);
        }
        if let Some(ref ssh_dir) = self.publish.ssh_dir {
            self.publish.ssh_dir = Some(expand::expand_env(ssh_dir, "publish.ssh_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = SiteConfig::with_base(config_dir);
        let site = &self.site;

        self.site_resolved = SiteConfig {
            source_dir: site
                .dir
                .as_deref()
                .map_or(defaults.source_dir, |dir| config_dir.join(dir)),
            output_dir: site.output_dir.as_deref().map(|dir| config_dir.join(dir)),
            source_extension: site
                .source_extension
                .clone()
                .unwrap_or(defaults.source_extension),
            output_extension: site
                .output_extension
                .clone()
                .unwrap_or(defaults.output_extension),
            jobs: site.jobs,
            keep_going: site.keep_going.unwrap_or(defaults.keep_going),
        };
    }
}
