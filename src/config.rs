use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::classify::SiteType;
use crate::extractors::{self, SiteExtractor, SiteSpec};
use crate::fetch::{BrowserSession, BrowserSettings, HttpFetcher, PageLoader};
use crate::rate_limit::RateLimiter;
use crate::update::SiteHandler;

const ARXIV_DELAY: Duration = Duration::from_secs(3);
const BROWSER_SITE_DELAY: Duration = Duration::from_secs(2);

/// How the four JavaScript-rendered sites are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Browser,
    Http,
}

/// Updater configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fetch_mode: FetchMode,
    pub headless: bool,
    pub chrome_bin: Option<PathBuf>,
    pub contact: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let input = var("PAPER_INFO_INPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("papers.json"));
        let output = var("PAPER_INFO_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("papers_updated.json"));

        let fetch_mode = match var("PAPER_INFO_FETCH_MODE").map(|s| s.trim().to_lowercase()) {
            Some(mode) if mode == "http" => FetchMode::Http,
            Some(mode) if mode != "browser" && !mode.is_empty() => {
                tracing::warn!("Unknown PAPER_INFO_FETCH_MODE {:?}, using browser", mode);
                FetchMode::Browser
            }
            _ => FetchMode::Browser,
        };

        let headless = var("PAPER_INFO_HEADLESS")
            .map(|s| !matches!(s.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let chrome_bin = var("CHROME_BIN").filter(|s| !s.is_empty()).map(PathBuf::from);
        let contact = var("PAPER_INFO_CONTACT").filter(|s| !s.is_empty());

        Self {
            input,
            output,
            fetch_mode,
            headless,
            chrome_bin,
            contact,
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            headless: self.headless,
            chrome_bin: self.chrome_bin.clone(),
            ..BrowserSettings::default()
        }
    }

    /// Whether the browser sites will actually go through Chromium.
    pub fn uses_browser(&self) -> bool {
        cfg!(feature = "browser") && self.fetch_mode == FetchMode::Browser
    }

    /// Build the dispatch table: arXiv over HTTP, the rest through the
    /// browser session unless HTTP mode is selected or the browser support
    /// is not compiled in.
    pub fn build_handlers(&self, session: Arc<BrowserSession>) -> anyhow::Result<Vec<SiteHandler>> {
        let http: Arc<dyn PageLoader> = Arc::new(
            HttpFetcher::new(self.contact.as_deref()).context("Failed to build HTTP client")?,
        );
        let rendered: Arc<dyn PageLoader> = if self.uses_browser() {
            session as Arc<dyn PageLoader>
        } else {
            if self.fetch_mode == FetchMode::Browser {
                tracing::warn!("Browser support not compiled in, loading every site over HTTP");
            }
            http.clone()
        };

        let handler = |site: SiteType, spec: &'static SiteSpec, loader: &Arc<dyn PageLoader>, delay| {
            let extractor = SiteExtractor::new(spec, loader.clone(), RateLimiter::new(delay));
            SiteHandler::new(site, Arc::new(extractor))
        };

        Ok(vec![
            handler(SiteType::Arxiv, &extractors::arxiv::SITE, &http, ARXIV_DELAY),
            handler(SiteType::OpenReview, &extractors::openreview::SITE, &rendered, BROWSER_SITE_DELAY),
            handler(SiteType::Acl, &extractors::acl::SITE, &rendered, BROWSER_SITE_DELAY),
            handler(SiteType::Mlr, &extractors::mlr::SITE, &rendered, BROWSER_SITE_DELAY),
            handler(SiteType::NeurIps, &extractors::neurips::SITE, &rendered, BROWSER_SITE_DELAY),
        ])
    }
}
