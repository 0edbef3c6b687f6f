pub mod acl;
pub mod arxiv;
pub mod bibtex;
pub mod mlr;
pub mod neurips;
pub mod openreview;
pub mod text;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::fetch::{FetchError, LoadStrategy, PageLoader};
use crate::rate_limit::RateLimiter;

/// Fields recovered from one page. `None` means "not found", never "empty".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub date: Option<String>,
    pub authors: Option<Vec<String>>,
    pub abstract_text: Option<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.authors.is_none() && self.abstract_text.is_none()
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("No page returned for {0}")]
    NoPage(String),
    #[error("Selector error: {0}")]
    Selector(String),
    #[error("Unparseable date {text:?}: {source}")]
    Date {
        text: String,
        source: chrono::ParseError,
    },
}

/// Recovers bibliographic fields for one hosting site.
#[async_trait]
pub trait PaperExtractor: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self, id: &str) -> Result<ExtractionResult, ExtractError>;
}

/// Parsed page plus the identifier it was loaded for.
pub struct PageContext<'a> {
    pub document: Html,
    pub id: &'a str,
}

impl<'a> PageContext<'a> {
    pub fn parse(html: &str, id: &'a str) -> Self {
        Self {
            document: Html::parse_document(html),
            id,
        }
    }

    /// First element matching `css`, or `None`.
    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>, ExtractError> {
        let sel = selector(css)?;
        Ok(self.document.select(&sel).next())
    }

    pub fn all(&self, css: &str) -> Result<Vec<ElementRef<'_>>, ExtractError> {
        let sel = selector(css)?;
        Ok(self.document.select(&sel).collect())
    }

    /// Normalized text of the first element matching `css`.
    pub fn text_of(&self, css: &str) -> Result<Option<String>, ExtractError> {
        Ok(self
            .first(css)?
            .map(|el| text::element_text(&el))
            .filter(|t| !t.is_empty()))
    }

    /// Non-empty link texts under `css`, in document order.
    pub fn link_texts(&self, css: &str) -> Result<Vec<String>, ExtractError> {
        Ok(self
            .all(css)?
            .iter()
            .map(text::element_text)
            .filter(|t| !t.is_empty() && t != ",")
            .collect())
    }

    /// `content` attribute of every `<meta name=...>` with the given name.
    pub fn meta_values(&self, name: &str) -> Result<Vec<String>, ExtractError> {
        let css = format!("meta[name=\"{}\"]", name);
        Ok(self
            .all(&css)?
            .iter()
            .filter_map(|el| el.value().attr("content"))
            .map(text::collapse_whitespace)
            .filter(|t| !t.is_empty())
            .collect())
    }
}

pub fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {:?}", css, e)))
}

/// One way of recovering a field from a page.
pub type Strategy<T> = fn(&PageContext<'_>) -> Result<Option<T>, ExtractError>;

/// Try `strategies` in order; the first `Some` wins. Errors are logged and
/// the next strategy still runs.
pub fn first_success<T>(
    site: &str,
    field: &str,
    ctx: &PageContext<'_>,
    strategies: &[Strategy<T>],
) -> Option<T> {
    for strategy in strategies {
        match strategy(ctx) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(site, field, id = ctx.id, "Error extracting {} {}: {}", site, field, e);
            }
        }
    }
    tracing::debug!(site, field, id = ctx.id, "No strategy produced a value");
    None
}

/// Per-field strategy chains for one site.
pub struct FieldStrategies {
    pub date: &'static [Strategy<String>],
    pub authors: &'static [Strategy<Vec<String>>],
    pub abstract_text: &'static [Strategy<String>],
}

impl FieldStrategies {
    pub fn run(&self, site: &str, ctx: &PageContext<'_>) -> ExtractionResult {
        ExtractionResult {
            date: first_success(site, "date", ctx, self.date),
            authors: first_success(site, "authors", ctx, self.authors).filter(|a| !a.is_empty()),
            abstract_text: first_success(site, "abstract", ctx, self.abstract_text)
                .filter(|a| !a.is_empty()),
        }
    }
}

/// Everything a site module contributes: where its pages live, how to wait
/// for them, and how to read them.
pub struct SiteSpec {
    pub name: &'static str,
    pub load: LoadStrategy,
    pub page_url: fn(&str) -> String,
    pub fields: FieldStrategies,
}

impl SiteSpec {
    /// Extract from already-loaded HTML.
    pub fn parse_page(&self, html: &str, id: &str) -> ExtractionResult {
        let ctx = PageContext::parse(html, id);
        self.fields.run(self.name, &ctx)
    }
}

/// Extractor that paces requests, loads the page and runs a site's chains.
pub struct SiteExtractor {
    spec: &'static SiteSpec,
    loader: Arc<dyn PageLoader>,
    limiter: RateLimiter,
}

impl SiteExtractor {
    pub fn new(spec: &'static SiteSpec, loader: Arc<dyn PageLoader>, limiter: RateLimiter) -> Self {
        Self {
            spec,
            loader,
            limiter,
        }
    }
}

#[async_trait]
impl PaperExtractor for SiteExtractor {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn extract(&self, id: &str) -> Result<ExtractionResult, ExtractError> {
        self.limiter.wait().await;
        let url = (self.spec.page_url)(id);
        tracing::debug!(
            site = self.spec.name,
            loader = self.loader.name(),
            delay = ?self.limiter.delay(),
            "Loading {}",
            url
        );
        let html = self
            .loader
            .load(&url, self.spec.load)
            .await?
            .ok_or(ExtractError::NoPage(url))?;
        let result = self.spec.parse_page(&html, id);
        if result.is_empty() {
            tracing::warn!(site = self.spec.name, id, "No fields found on page");
        }
        Ok(result)
    }
}
