//! Configuration management for merbro.
//!
//! Parses `merbro.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `browser.executable`
//! - `mermaid.script`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override Chrome executable.
    pub executable: Option<String>,
    /// Override Chrome sandbox flag.
    pub sandbox: Option<bool>,
    /// Override Mermaid bundle location (path or URL).
    pub script: Option<String>,
    /// Override Mermaid theme.
    pub theme: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "merbro.toml";

/// Security levels accepted by `mermaid.initialize`.
const SECURITY_LEVELS: &[&str] = &["strict", "loose", "antiscript", "sandbox"];

/// Application configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Browser configuration.
    pub browser: BrowserConfig,
    /// Mermaid configuration (script is a relative string from TOML).
    mermaid: MermaidConfigRaw,

    /// Resolved Mermaid configuration (set after loading).
    #[serde(skip)]
    pub mermaid_resolved: MermaidConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Headless browser configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary (default: auto-detect).
    pub executable: Option<String>,
    /// Whether Chrome runs with its sandbox.
    pub sandbox: bool,
    /// Timeout for a single DevTools request, in seconds.
    pub request_timeout_secs: u64,
    /// Initial viewport width.
    pub viewport_width: u32,
    /// Initial viewport height.
    pub viewport_height: u32,
    /// Device pixel ratio for PNG capture.
    pub device_scale_factor: f64,
    /// Largest viewport edge when fitting a PNG capture.
    pub max_dimension: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            request_timeout_secs: 30,
            viewport_width: 800,
            viewport_height: 600,
            device_scale_factor: 1.0,
            max_dimension: 16_384,
        }
    }
}

/// Raw Mermaid configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MermaidConfigRaw {
    script: Option<String>,
    theme: Option<String>,
    security_level: Option<String>,
    font_family: Option<String>,
}

/// Resolved Mermaid configuration.
#[derive(Debug, Default)]
pub struct MermaidConfig {
    /// Bundle URL, or absolute path to a local bundle (None: built-in CDN default).
    pub script: Option<String>,
    /// Theme name.
    pub theme: Option<String>,
    /// Security level.
    pub security_level: Option<String>,
    /// Label font family.
    pub font_family: Option<String>,
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
        /// Config field path (e.g., "`mermaid.script`").
        field: String,
        /// Error message (e.g., "${`MERMAID_JS`} not set").
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

/// Whether a script reference is a URL rather than a file path.
fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `merbro.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the result (including CLI overrides) is invalid.
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
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// A relative `script` path is taken relative to the working directory.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(executable) = &settings.executable {
            self.browser.executable = Some(executable.clone());
        }
        if let Some(sandbox) = settings.sandbox {
            self.browser.sandbox = sandbox;
        }
        if let Some(script) = &settings.script {
            self.mermaid_resolved.script = Some(script.clone());
        }
        if let Some(theme) = &settings.theme {
            self.mermaid_resolved.theme = Some(theme.clone());
        }
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

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_browser()?;
        self.validate_mermaid()?;
        Ok(())
    }

    /// Validate browser configuration.
    fn validate_browser(&self) -> Result<(), ConfigError> {
        const MAX_SCALE_FACTOR: f64 = 4.0;
        let browser = &self.browser;

        if let Some(executable) = &browser.executable {
            require_non_empty(executable, "browser.executable")?;
        }

        if browser.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "browser.request_timeout_secs must be greater than 0".to_owned(),
            ));
        }

        if browser.viewport_width == 0 || browser.viewport_height == 0 {
            return Err(ConfigError::Validation(
                "browser.viewport_width and browser.viewport_height must be greater than 0"
                    .to_owned(),
            ));
        }

        if !(browser.device_scale_factor > 0.0 && browser.device_scale_factor <= MAX_SCALE_FACTOR)
        {
            return Err(ConfigError::Validation(format!(
                "browser.device_scale_factor must be in (0, {MAX_SCALE_FACTOR}]"
            )));
        }

        if browser.max_dimension < browser.viewport_width.max(browser.viewport_height) {
            return Err(ConfigError::Validation(
                "browser.max_dimension cannot be smaller than the viewport".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate Mermaid configuration.
    fn validate_mermaid(&self) -> Result<(), ConfigError> {
        let mermaid = &self.mermaid_resolved;

        if let Some(script) = &mermaid.script {
            require_non_empty(script, "mermaid.script")?;
        }

        if let Some(level) = &mermaid.security_level
            && !SECURITY_LEVELS.contains(&level.as_str())
        {
            return Err(ConfigError::Validation(format!(
                "mermaid.security_level must be one of: {}",
                SECURITY_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref executable) = self.browser.executable {
            self.browser.executable =
                Some(expand::expand_env(executable, "browser.executable")?);
        }

        if let Some(ref script) = self.mermaid.script {
            self.mermaid.script = Some(expand::expand_env(script, "mermaid.script")?);
        }

        Ok(())
    }

    /// Resolve the Mermaid script path against the config directory.
    ///
    /// URLs and absolute paths are kept as-is.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let script = self.mermaid.script.as_deref().map(|script| {
            if is_url(script) {
                script.to_owned()
            } else {
                config_dir.join(script).to_string_lossy().into_owned()
            }
        });

        self.mermaid_resolved = MermaidConfig {
            script,
            theme: self.mermaid.theme.clone(),
            security_level: self.mermaid.security_level.clone(),
            font_family: self.mermaid.font_family.clone(),
        };
    }
}
