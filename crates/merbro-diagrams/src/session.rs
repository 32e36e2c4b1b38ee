//! Browser session lifecycle.
//!
//! A [`Session`] owns one headless Chrome process with its own throwaway
//! profile directory and one page prepared for Mermaid:
//!
//! 1. launch Chrome and drive its DevTools event loop on a tokio task
//! 2. open a page and forward console output and uncaught exceptions to `tracing`
//! 3. load the bootstrap document (`#diagram` mount element)
//! 4. inject the Mermaid bundle and check that `globalThis.mermaid` exists
//!
//! [`OwnedPage::release`] tears all of it down. Callers must invoke it on every
//! path after a successful [`Session::acquire`]; acquisition itself cleans up
//! when a later step fails.

use std::path::Path;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport as ClipRegion};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EvaluateParams, EventConsoleApiCalled, EventExceptionThrown,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::config::{RendererConfig, ScriptSource};
use crate::consts::{BOOTSTRAP_HTML, PAGE_LOG_TARGET};
use crate::error::{DiagramError, Result, from_cdp};
use crate::page::{Clip, DiagramPage, OwnedPage};
use crate::scripts;

/// One isolated browser with a Mermaid-ready page.
pub(crate) struct Session {
    browser: Browser,
    page: Page,
    /// DevTools event loop plus diagnostic forwarders.
    tasks: Vec<JoinHandle<()>>,
    profile: TempDir,
    device_scale_factor: f64,
}

impl Session {
    /// Launch a browser and prepare a page with Mermaid loaded.
    pub(crate) async fn acquire(config: &RendererConfig) -> Result<Self> {
        let profile = tempfile::Builder::new()
            .prefix("merbro-profile-")
            .tempdir()
            .map_err(|e| DiagramError::Launch(format!("failed to create profile directory: {e}")))?;

        let browser_config = browser_config(config, profile.path())?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| DiagramError::Launch(e.to_string()))?;

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "Browser event loop error");
                }
            }
        });
        let mut tasks = vec![event_loop];

        tracing::debug!(profile = %profile.path().display(), "Browser launched");

        match prepare_page(&browser, &config.script, &mut tasks).await {
            Ok(page) => Ok(Self {
                browser,
                page,
                tasks,
                profile,
                device_scale_factor: config.device_scale_factor,
            }),
            Err(err) => {
                shutdown(browser, tasks, profile).await;
                Err(err)
            }
        }
    }
}

impl OwnedPage for Session {
    /// Close the browser and remove the profile directory.
    async fn release(self) {
        let Self {
            browser,
            page,
            tasks,
            profile,
            ..
        } = self;
        drop(page);
        shutdown(browser, tasks, profile).await;
    }
}

impl DiagramPage for Session {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        evaluate_on(&self.page, script).await
    }

    async fn resize_viewport(&self, width: u32, height: u32) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(width),
            i64::from(height),
            self.device_scale_factor,
            false,
        );
        self.page.execute(params).await.map_err(from_cdp)?;
        Ok(())
    }

    async fn capture_png(&self, clip: Clip, beyond_viewport: bool) -> Result<Vec<u8>> {
        let region = ClipRegion {
            x: f64::from(clip.x),
            y: f64::from(clip.y),
            width: f64::from(clip.width),
            height: f64::from(clip.height),
            scale: 1.0,
        };
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(region)
            .capture_beyond_viewport(beyond_viewport)
            .build();
        self.page.screenshot(params).await.map_err(from_cdp)
    }
}

/// Build the Chrome launch configuration.
fn browser_config(config: &RendererConfig, profile: &Path) -> Result<BrowserConfig> {
    let viewport = Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
        device_scale_factor: Some(config.device_scale_factor),
        ..Viewport::default()
    };

    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile)
        .request_timeout(config.request_timeout)
        .window_size(config.viewport_width, config.viewport_height)
        .viewport(viewport);

    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(executable);
    }
    if !config.sandbox {
        builder = builder.no_sandbox();
    }

    builder.build().map_err(DiagramError::Launch)
}

/// Open the page, attach diagnostics, load the bootstrap document and Mermaid.
async fn prepare_page(
    browser: &Browser,
    script: &ScriptSource,
    tasks: &mut Vec<JoinHandle<()>>,
) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| DiagramError::Navigation(e.to_string()))?;

    tasks.extend(forward_diagnostics(&page).await?);

    page.set_content(BOOTSTRAP_HTML)
        .await
        .map_err(|e| DiagramError::Navigation(e.to_string()))?;

    inject_mermaid(&page, script).await?;
    tracing::debug!(script = %script, "Mermaid injected");

    Ok(page)
}

/// Load the Mermaid bundle into the page.
async fn inject_mermaid(page: &Page, script: &ScriptSource) -> Result<()> {
    let injection_error = |message: String| DiagramError::ScriptInjection {
        source_ref: script.to_string(),
        message,
    };

    let expression = match script {
        ScriptSource::Path(path) => {
            let bundle = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| injection_error(e.to_string()))?;
            scripts::inject_inline(&bundle)
        }
        ScriptSource::Url(url) => scripts::inject_url(url),
    };

    let loaded = evaluate_on(page, &expression)
        .await
        .map_err(|e| injection_error(e.to_string()))?;

    if loaded.as_bool() == Some(true) {
        Ok(())
    } else {
        Err(injection_error(
            "bundle did not define globalThis.mermaid".to_owned(),
        ))
    }
}

/// Evaluate an expression with awaited promises and by-value results.
async fn evaluate_on(page: &Page, script: &str) -> Result<serde_json::Value> {
    let mut params = EvaluateParams::new(script);
    params.await_promise = Some(true);
    params.return_by_value = Some(true);

    let result = page.evaluate_expression(params).await.map_err(from_cdp)?;
    Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
}

/// Spawn tasks that turn page console calls and exceptions into `tracing` events.
async fn forward_diagnostics(page: &Page) -> Result<Vec<JoinHandle<()>>> {
    let mut console = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(from_cdp)?;
    let mut exceptions = page
        .event_listener::<EventExceptionThrown>()
        .await
        .map_err(from_cdp)?;

    let console_task = tokio::spawn(async move {
        while let Some(event) = console.next().await {
            log_console(&event);
        }
    });
    let exception_task = tokio::spawn(async move {
        while let Some(event) = exceptions.next().await {
            log_exception(&event);
        }
    });

    Ok(vec![console_task, exception_task])
}

fn log_console(event: &EventConsoleApiCalled) {
    let text = event
        .args
        .iter()
        .map(|arg| console_arg_text(arg.value.as_ref(), arg.description.as_deref()))
        .collect::<Vec<_>>()
        .join(" ");

    match event.r#type {
        ConsoleApiCalledType::Error
        | ConsoleApiCalledType::Assert
        | ConsoleApiCalledType::Warning => {
            tracing::warn!(target: PAGE_LOG_TARGET, kind = ?event.r#type, "{text}");
        }
        ConsoleApiCalledType::Debug | ConsoleApiCalledType::Trace => {
            tracing::debug!(target: PAGE_LOG_TARGET, kind = ?event.r#type, "{text}");
        }
        _ => {
            tracing::info!(target: PAGE_LOG_TARGET, kind = ?event.r#type, "{text}");
        }
    }
}

fn log_exception(event: &EventExceptionThrown) {
    let details = &event.exception_details;
    let description = details
        .exception
        .as_ref()
        .and_then(|exception| exception.description.as_deref())
        .unwrap_or(&details.text);
    tracing::warn!(
        target: PAGE_LOG_TARGET,
        line = details.line_number,
        column = details.column_number,
        "Uncaught page error: {description}"
    );
}

/// Text for one console argument: strings verbatim, other values as JSON,
/// objects without a by-value form by their description.
fn console_arg_text(value: Option<&serde_json::Value>, description: Option<&str>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(value) => value.to_string(),
        None => description.unwrap_or_default().to_owned(),
    }
}

/// Close the browser, stop background tasks and delete the profile.
async fn shutdown(mut browser: Browser, tasks: Vec<JoinHandle<()>>, profile: TempDir) {
    if let Err(err) = browser.close().await {
        tracing::warn!(error = %err, "Failed to close browser, killing process");
        if let Some(Err(err)) = browser.kill().await {
            tracing::warn!(error = %err, "Failed to kill browser process");
        }
    }
    if let Err(err) = browser.wait().await {
        tracing::warn!(error = %err, "Failed to wait for browser exit");
    }

    for task in tasks {
        task.abort();
    }

    if let Err(err) = profile.close() {
        tracing::debug!(error = %err, "Failed to remove browser profile directory");
    }
    tracing::debug!("Browser session released");
}
