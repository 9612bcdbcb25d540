//! Headless Chrome backend built on chromiumoxide
//!
//! Each session launches its own browser process with a private profile
//! directory, so concurrent analyses never share cookies, caches or
//! performance buffers. Launch takes ~1-3s; there is deliberately no reuse.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::{BrowserSession, SessionLauncher};
use crate::config::{BrowserSettings, DeviceProfile};
use crate::error::SessionError;
use crate::throttling::{CpuThrottler, NetworkThrottler};

/// Returns true when the element has a non-empty box and is not hidden
const IS_VISIBLE_FN: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    const style = window.getComputedStyle(this);
    return style.visibility !== 'hidden' && style.display !== 'none';
}"#;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Launches one headless Chrome per session
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// Unique profile directory: PID + counter + timestamp
    fn profile_dir() -> PathBuf {
        let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!(
            "lab-analysis-{}-{}-{}",
            std::process::id(),
            id,
            nanos
        ))
    }

    fn browser_config(
        &self,
        profile: &DeviceProfile,
        profile_dir: &Path,
    ) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .window_size(profile.viewport.width, profile.viewport.height)
            .user_data_dir(profile_dir);

        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in &self.settings.args {
            builder = builder.arg(arg.as_str());
        }

        builder.build().map_err(SessionError::Launch)
    }

    /// Open the page and apply every part of the device profile to it
    async fn open_page(browser: &Browser, profile: &DeviceProfile) -> Result<Page, SessionError> {
        let page = browser.new_page("about:blank").await?;

        page.execute(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
            .await?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(profile.viewport.width),
            i64::from(profile.viewport.height),
            profile.viewport.device_scale_factor,
            profile.viewport.mobile,
        ))
        .await?;

        NetworkThrottler::apply(&page, profile.network).await?;
        if profile.cpu_slowdown > 1.0 {
            CpuThrottler::apply(&page, profile.cpu_slowdown).await?;
        }

        Ok(page)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    #[instrument(skip(self, profile), fields(device = %profile.name))]
    async fn acquire(&self, profile: &DeviceProfile) -> Result<ChromiumSession, SessionError> {
        let profile_dir = Self::profile_dir();
        let config = self.browser_config(profile, &profile_dir)?;

        info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // Drive the CDP connection for the lifetime of the session
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        match Self::open_page(&browser, profile).await {
            Ok(page) => {
                debug!("Browser session ready");
                Ok(ChromiumSession {
                    browser,
                    page,
                    handler_task,
                    profile_dir,
                })
            }
            Err(e) => {
                // Partially configured browsers must not outlive the failed acquire
                if let Err(teardown) = shutdown(browser, handler_task, &profile_dir).await {
                    warn!("Failed to close browser after setup error: {}", teardown);
                }
                Err(e)
            }
        }
    }
}

/// A live headless Chrome process plus its single page
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromiumSession {
    /// The page under analysis
    pub fn page(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    type Element = Element;

    async fn add_init_script(&self, source: &str) -> Result<(), SessionError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(source))
            .await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn visible_elements(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        let candidates = self.page.find_elements(selector).await?;

        let mut visible = Vec::with_capacity(candidates.len());
        for element in candidates {
            // Detached or cross-origin nodes fail the check; treat them as hidden
            let shown = match element.call_js_fn(IS_VISIBLE_FN, false).await {
                Ok(ret) => ret
                    .result
                    .value
                    .as_ref()
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
                Err(_) => false,
            };
            if shown {
                visible.push(element);
            }
        }
        Ok(visible)
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        element.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, SessionError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| SessionError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(self) -> Result<(), SessionError> {
        let ChromiumSession {
            browser,
            page,
            handler_task,
            profile_dir,
        } = self;
        drop(page);
        shutdown(browser, handler_task, &profile_dir).await
    }
}

/// Close the browser, reap the process and remove the profile directory
async fn shutdown(
    mut browser: Browser,
    handler_task: JoinHandle<()>,
    profile_dir: &Path,
) -> Result<(), SessionError> {
    let closed = browser
        .close()
        .await
        .map(|_| ())
        .map_err(|e| SessionError::Teardown(e.to_string()));

    if let Err(e) = browser.wait().await {
        warn!("Failed to reap browser process: {}", e);
    }
    handler_task.abort();

    if let Err(e) = tokio::fs::remove_dir_all(profile_dir).await {
        debug!("Could not remove profile dir {}: {}", profile_dir.display(), e);
    }

    closed
}
