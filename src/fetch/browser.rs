//! Chromium session used to render JavaScript-heavy proceedings pages.
//!
//! The browser process is launched lazily on the first load and lives until
//! [`SessionShutdown::shutdown`]. Every load runs in a fresh browser context
//! so cookies and storage never carry over from one paper to the next.

use std::future::Future;
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use super::{FetchError, LoadStrategy, PageLoader, SessionShutdown};

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub chrome_bin: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_bin: None,
            navigation_timeout_secs: 30,
        }
    }
}

/// Await `work`, then run `release` whatever `work` returned.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn run_then_release<T, W, R, RF>(work: W, release: R) -> T
where
    W: Future<Output = T>,
    R: FnOnce() -> RF,
    RF: Future<Output = ()>,
{
    let out = work.await;
    release().await;
    out
}

/// Pump CDP events until the stream ends. A bad event is logged and skipped
/// so later commands still get their responses. Returns the event count.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn drain_events<S, E>(mut events: S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut seen = 0;
    while let Some(event) = events.next().await {
        seen += 1;
        if let Err(e) = event {
            tracing::debug!("CDP handler error: {}", e);
        }
    }
    seen
}

#[cfg(feature = "browser")]
mod imp {
    use super::*;

    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    /// Extra time after the load event for late XHRs to land.
    const SETTLE_DELAY: Duration = Duration::from_millis(1000);
    const SELECTOR_POLL: Duration = Duration::from_millis(250);

    const CHROME_PATHS: &[&str] = &[
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    struct Running {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    pub struct BrowserSession {
        settings: BrowserSettings,
        running: Mutex<Option<Running>>,
    }

    impl BrowserSession {
        pub fn new(settings: BrowserSettings) -> Self {
            Self {
                settings,
                running: Mutex::new(None),
            }
        }

        fn find_chrome(&self) -> Result<PathBuf, FetchError> {
            if let Some(ref path) = self.settings.chrome_bin {
                return Ok(path.clone());
            }
            for path in CHROME_PATHS {
                let p = std::path::Path::new(path);
                if p.exists() {
                    info!("Found Chrome at: {}", path);
                    return Ok(p.to_path_buf());
                }
            }
            for cmd in &["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"] {
                if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                    if output.status.success() {
                        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                        if !path.is_empty() {
                            info!("Found Chrome in PATH: {}", path);
                            return Ok(PathBuf::from(path));
                        }
                    }
                }
            }
            Err(FetchError::Browser(
                "Chrome/Chromium not found; install it or set CHROME_BIN".to_string(),
            ))
        }

        async fn launch(&self) -> Result<Running, FetchError> {
            let chrome = self.find_chrome()?;
            info!("Launching browser (headless={})", self.settings.headless);

            let mut builder = BrowserConfig::builder()
                .chrome_executable(chrome)
                .request_timeout(Duration::from_secs(self.settings.navigation_timeout_secs))
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--no-sandbox")
                .arg("--disable-gpu");
            if !self.settings.headless {
                builder = builder.with_head();
            }
            let config = builder.build().map_err(FetchError::Browser)?;

            let (browser, handler) = Browser::launch(config)
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to launch browser: {}", e)))?;

            let handler = tokio::spawn(async move {
                let events = drain_events(handler).await;
                debug!("CDP handler stream ended after {} events", events);
            });

            Ok(Running { browser, handler })
        }

        async fn load_isolated(&self, url: &str, strategy: LoadStrategy) -> Result<String, FetchError> {
            let mut guard = self.running.lock().await;
            if guard.is_none() {
                *guard = Some(self.launch().await?);
            }
            let running = guard
                .as_ref()
                .ok_or_else(|| FetchError::Browser("browser not running after launch".to_string()))?;
            let browser = &running.browser;

            let context_id = browser
                .execute(CreateBrowserContextParams::default())
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to create context: {}", e)))?
                .result
                .browser_context_id;

            run_then_release(
                self.load_in_context(browser, context_id.clone(), url, strategy),
                move || async move {
                    if let Err(e) = browser
                        .execute(DisposeBrowserContextParams::new(context_id))
                        .await
                    {
                        warn!(url, "Failed to dispose browser context: {}", e);
                    }
                },
            )
            .await
        }

        async fn load_in_context(
            &self,
            browser: &Browser,
            context_id: BrowserContextId,
            url: &str,
            strategy: LoadStrategy,
        ) -> Result<String, FetchError> {
            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id)
                .build()
                .map_err(FetchError::Browser)?;
            let page = browser
                .new_page(target)
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to open page: {}", e)))?;

            let closing = page.clone();
            run_then_release(self.navigate_and_read(&page, url, strategy), move || async move {
                if let Err(e) = closing.close().await {
                    debug!(url, "Page close failed: {}", e);
                }
            })
            .await
        }

        async fn navigate_and_read(
            &self,
            page: &Page,
            url: &str,
            strategy: LoadStrategy,
        ) -> Result<String, FetchError> {
            info!("Navigating to {}", url);
            let nav_timeout = Duration::from_secs(self.settings.navigation_timeout_secs);
            tokio::time::timeout(nav_timeout, page.goto(url))
                .await
                .map_err(|_| {
                    FetchError::Timeout(format!(
                        "navigation took longer than {}s for {}",
                        self.settings.navigation_timeout_secs, url
                    ))
                })?
                .map_err(|e| FetchError::Browser(format!("Navigation failed for {}: {}", url, e)))?;

            match strategy {
                LoadStrategy::NetworkIdle => tokio::time::sleep(SETTLE_DELAY).await,
                LoadStrategy::ContentLoaded { selector, timeout } => {
                    wait_for_selector(page, selector, timeout).await;
                }
            }

            page.content()
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to read content of {}: {}", url, e)))
        }
    }

    /// Poll for `selector`; a timeout is logged and the page is read anyway.
    async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) {
        debug!("Waiting for selector: {}", selector);
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        };
        if tokio::time::timeout(timeout, poll).await.is_err() {
            warn!("Timeout waiting for {} after {:?}", selector, timeout);
        }
    }

    #[async_trait]
    impl PageLoader for BrowserSession {
        fn name(&self) -> &str {
            "browser"
        }

        async fn load(&self, url: &str, strategy: LoadStrategy) -> Result<Option<String>, FetchError> {
            self.load_isolated(url, strategy).await.map(Some)
        }
    }

    #[async_trait]
    impl SessionShutdown for BrowserSession {
        /// Close the browser and its CDP handler.
        async fn shutdown(&self) {
            let Some(mut running) = self.running.lock().await.take() else {
                return;
            };
            info!("Closing browser");
            if let Err(e) = running.browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            if let Err(e) = running.browser.wait().await {
                warn!("Waiting for browser exit failed: {}", e);
            }
            running.handler.abort();
        }
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
mod imp {
    use super::*;

    pub struct BrowserSession {
        #[allow(dead_code)]
        settings: BrowserSettings,
    }

    impl BrowserSession {
        pub fn new(settings: BrowserSettings) -> Self {
            Self { settings }
        }

    }

    #[async_trait]
    impl SessionShutdown for BrowserSession {
        async fn shutdown(&self) {}
    }

    #[async_trait]
    impl PageLoader for BrowserSession {
        fn name(&self) -> &str {
            "browser"
        }

        async fn load(&self, _url: &str, _strategy: LoadStrategy) -> Result<Option<String>, FetchError> {
            Err(FetchError::BrowserUnavailable)
        }
    }
}

pub use imp::BrowserSession;
