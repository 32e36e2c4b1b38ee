//! CLI command implementations.

mod parse;
mod png;
mod svg;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use merbro_config::{CliSettings, Config};
use merbro_diagrams::{MermaidOptions, Renderer, RendererConfig, ScriptSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::CliError;

pub(crate) use parse::ParseArgs;
pub(crate) use png::PngArgs;
pub(crate) use svg::SvgArgs;

/// Input path meaning "read from stdin".
const STDIN_INPUT: &str = "-";

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (default: auto-discover merbro.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chrome/Chromium executable (overrides config).
    #[arg(long, env = "MERBRO_CHROME")]
    chrome: Option<String>,

    /// Mermaid bundle path or URL (overrides config).
    #[arg(long, env = "MERBRO_MERMAID")]
    mermaid: Option<String>,

    /// Mermaid theme (overrides config).
    #[arg(long)]
    theme: Option<String>,

    /// Run Chrome without its sandbox (needed in some containers).
    #[arg(long)]
    no_sandbox: bool,

    /// Enable verbose output (session and page logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Load configuration with these arguments applied on top.
    fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            executable: self.chrome.clone(),
            sandbox: self.no_sandbox.then_some(false),
            script: self.mermaid.clone(),
            theme: self.theme.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Build a renderer from the loaded configuration.
    fn renderer(&self) -> Result<Renderer, CliError> {
        let config = self.load_config()?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        Ok(Renderer::new(renderer_config(&config)))
    }
}

/// Convert merbro configuration into renderer configuration.
fn renderer_config(config: &Config) -> RendererConfig {
    let browser = &config.browser;
    let mermaid = &config.mermaid_resolved;

    RendererConfig {
        script: mermaid
            .script
            .as_deref()
            .map(ScriptSource::parse)
            .unwrap_or_default(),
        chrome_executable: browser.executable.as_ref().map(PathBuf::from),
        sandbox: browser.sandbox,
        request_timeout: Duration::from_secs(browser.request_timeout_secs),
        viewport_width: browser.viewport_width,
        viewport_height: browser.viewport_height,
        device_scale_factor: browser.device_scale_factor,
        max_dimension: browser.max_dimension,
        mermaid: MermaidOptions {
            theme: mermaid.theme.clone(),
            security_level: mermaid.security_level.clone(),
            font_family: mermaid.font_family.clone(),
        },
    }
}

/// Read diagram source from a file, or from stdin when `input` is `-`.
async fn read_source(input: &Path) -> Result<String, CliError> {
    let source = if input.as_os_str() == STDIN_INPUT {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(input).await?
    };

    if source.trim().is_empty() {
        return Err(CliError::Validation(format!(
            "no diagram source in {}",
            input.display()
        )));
    }
    Ok(source)
}

/// Write bytes to stdout and flush.
async fn write_stdout(bytes: &[u8]) -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await?;
    Ok(())
}
