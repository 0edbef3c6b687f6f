use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::classify::{classify_urls, SiteType};
use crate::extractors::{ExtractionResult, PaperExtractor};
use crate::record::PaperRecord;

static ARXIV_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"arxiv\.org/abs/(\d+\.\d+)").unwrap());
static OPENREVIEW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)$").unwrap());
static ACL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)aclanthology\.org/([a-z0-9.-]+?)(?:\.pdf)?/?$").unwrap()
});
static MLR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"proceedings\.mlr\.press/([a-zA-Z0-9/-]+)").unwrap());
static NEURIPS_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"neurips\.cc/paper(?:_files/paper)?/(\d{4}/[^/]+/[^/?#]+)").unwrap()
});

/// Identifier pattern for each site; the first capture group is the id.
pub fn id_pattern(site: SiteType) -> &'static Regex {
    match site {
        SiteType::Arxiv => &ARXIV_ID,
        SiteType::OpenReview => &OPENREVIEW_ID,
        SiteType::Acl => &ACL_ID,
        SiteType::Mlr => &MLR_ID,
        SiteType::NeurIps => &NEURIPS_ID,
    }
}

fn capture_id(pattern: &Regex, url: &str) -> Option<String> {
    pattern
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// One row of the dispatch table.
pub struct SiteHandler {
    pub site: SiteType,
    pub id_pattern: &'static Regex,
    pub extractor: Arc<dyn PaperExtractor>,
}

impl SiteHandler {
    pub fn new(site: SiteType, extractor: Arc<dyn PaperExtractor>) -> Self {
        Self {
            site,
            id_pattern: id_pattern(site),
            extractor,
        }
    }

    pub fn extract_id(&self, url: &str) -> Option<String> {
        capture_id(self.id_pattern, url)
    }
}

/// Fills missing `date` / `authors` / `abstract` from the record's first URL.
pub struct PaperUpdater {
    handlers: Vec<SiteHandler>,
}

impl PaperUpdater {
    pub fn new(handlers: Vec<SiteHandler>) -> Self {
        Self { handlers }
    }

    fn handler_for(&self, site: SiteType) -> Option<&SiteHandler> {
        self.handlers.iter().find(|h| h.site == site)
    }

    /// Never fails: problems are logged and the record comes back as is.
    pub async fn update_paper_info(&self, mut paper: PaperRecord) -> PaperRecord {
        if paper.is_complete() {
            return paper;
        }

        let urls = paper.urls();
        let Some((site, url)) = classify_urls(&urls) else {
            tracing::debug!(id = %paper.id(), "No URLs to classify");
            return paper;
        };
        let (Some(site), Some(url)) = (site, url) else {
            tracing::debug!(id = %paper.id(), url = ?url, "First URL is not a known site");
            return paper;
        };
        let url = url.to_string();

        let Some(handler) = self.handler_for(site) else {
            tracing::debug!(%site, "No handler registered");
            return paper;
        };
        let Some(paper_id) = handler.extract_id(&url) else {
            tracing::debug!(%site, url = %url, "URL does not carry a {} identifier", site);
            return paper;
        };

        match handler.extractor.extract(&paper_id).await {
            Ok(info) => {
                let filled = merge_missing(&mut paper, info);
                if !filled.is_empty() {
                    tracing::info!(id = %paper.id(), %site, "Filled {}", filled.join(", "));
                }
            }
            Err(e) => {
                tracing::error!(id = %paper.id(), "Error processing {} URL {}: {}", site, url, e);
            }
        }
        paper
    }
}

/// Copy every extracted field the record does not already have.
/// Returns the names of the fields that were filled.
pub fn merge_missing(paper: &mut PaperRecord, info: ExtractionResult) -> Vec<&'static str> {
    let ExtractionResult {
        date,
        authors,
        abstract_text,
    } = info;
    let candidates: [(&'static str, Option<Value>); 3] = [
        ("date", date.map(Value::String)),
        (
            "authors",
            authors.map(|a| Value::Array(a.into_iter().map(Value::String).collect())),
        ),
        ("abstract", abstract_text.map(Value::String)),
    ];

    let mut filled = Vec::new();
    for (field, value) in candidates {
        if let Some(value) = value {
            if paper.fill(field, value) {
                filled.push(field);
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::ExtractError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubExtractor {
        result: Option<ExtractionResult>,
        calls: AtomicUsize,
        seen_ids: Mutex<Vec<String>>,
    }

    impl StubExtractor {
        fn returning(result: ExtractionResult) -> Arc<Self> {
            Arc::new(Self {
                result: Some(result),
                calls: AtomicUsize::new(0),
                seen_ids: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: None,
                calls: AtomicUsize::new(0),
                seen_ids: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PaperExtractor for StubExtractor {
        fn name(&self) -> &str {
            "stub"
        }

        async fn extract(&self, id: &str) -> Result<ExtractionResult, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_ids.lock().unwrap().push(id.to_string());
            self.result
                .clone()
                .ok_or_else(|| ExtractError::NoPage(format!("stub/{}", id)))
        }
    }

    fn full_result() -> ExtractionResult {
        ExtractionResult {
            date: Some("2023-10".to_string()),
            authors: Some(vec!["Alice Smith".to_string(), "Bob Lee".to_string()]),
            abstract_text: Some("Extracted abstract.".to_string()),
        }
    }

    fn record(value: Value) -> PaperRecord {
        serde_json::from_value(value).unwrap()
    }

    fn updater_with(site: SiteType, stub: Arc<StubExtractor>) -> PaperUpdater {
        PaperUpdater::new(vec![SiteHandler::new(site, stub)])
    }

    #[tokio::test]
    async fn test_complete_record_is_untouched() {
        let stub = StubExtractor::returning(full_result());
        let updater = updater_with(SiteType::Arxiv, stub.clone());
        let paper = record(json!({
            "id": 1,
            "date": "2020",
            "authors": ["Someone"],
            "abstract": "Already here.",
            "urls": {"arxiv": "https://arxiv.org/abs/2001.00001"}
        }));
        let updated = updater.update_paper_info(paper.clone()).await;
        assert_eq!(updated, paper);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_first_url_skips_extraction() {
        let stub = StubExtractor::returning(full_result());
        let updater = updater_with(SiteType::Arxiv, stub.clone());
        let paper = record(json!({
            "id": 2,
            "urls": {
                "github": "https://github.com/org/repo",
                "arxiv": "https://arxiv.org/abs/2310.01234"
            }
        }));
        let updated = updater.update_paper_info(paper.clone()).await;
        assert_eq!(updated, paper);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_string_first_url_skips_extraction() {
        let stub = StubExtractor::returning(full_result());
        let updater = updater_with(SiteType::Arxiv, stub.clone());
        let paper = record(json!({
            "id": 8,
            "urls": {
                "code": null,
                "arxiv": "https://arxiv.org/abs/2310.01234"
            }
        }));
        let updated = updater.update_paper_info(paper.clone()).await;
        assert_eq!(updated, paper);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_existing_abstract_is_kept() {
        let stub = StubExtractor::returning(full_result());
        let updater = updater_with(SiteType::Arxiv, stub.clone());
        let paper = record(json!({
            "id": 3,
            "abstract": "Hand-written abstract.",
            "urls": {"arxiv": "https://arxiv.org/abs/2310.01234v2"}
        }));
        let updated = updater.update_paper_info(paper).await;
        assert_eq!(updated.date(), Some("2023-10"));
        assert_eq!(updated.authors().unwrap(), vec!["Alice Smith", "Bob Lee"]);
        assert_eq!(updated.abstract_text(), Some("Hand-written abstract."));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stub.seen_ids.lock().unwrap().as_slice(), ["2310.01234".to_string()]);
    }

    #[tokio::test]
    async fn test_extractor_failure_returns_record() {
        let stub = StubExtractor::failing();
        let updater = updater_with(SiteType::OpenReview, stub.clone());
        let paper = record(json!({
            "id": 4,
            "date": "2022",
            "urls": {"openreview": "https://openreview.net/forum?id=H1-nGgWC-"}
        }));
        let updated = updater.update_paper_info(paper.clone()).await;
        assert_eq!(updated, paper);
        assert_eq!(stub.seen_ids.lock().unwrap().as_slice(), ["H1-nGgWC-".to_string()]);
    }

    #[tokio::test]
    async fn test_url_without_identifier_is_skipped() {
        let stub = StubExtractor::returning(full_result());
        let updater = updater_with(SiteType::Arxiv, stub.clone());
        let paper = record(json!({
            "id": 5,
            "urls": {"arxiv": "https://arxiv.org/list/cs.CL/recent"}
        }));
        let updated = updater.update_paper_info(paper.clone()).await;
        assert_eq!(updated, paper);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_record_without_urls() {
        let updater = updater_with(SiteType::Arxiv, StubExtractor::returning(full_result()));
        let paper = record(json!({"id": 6, "title": "No links"}));
        assert_eq!(updater.update_paper_info(paper.clone()).await, paper);
    }

    #[test]
    fn test_merge_only_fills_missing() {
        let mut paper = record(json!({"id": 7, "date": "", "authors": ["Kept"]}));
        let filled = merge_missing(
            &mut paper,
            ExtractionResult {
                date: Some("2021".to_string()),
                authors: Some(vec!["Other".to_string()]),
                abstract_text: None,
            },
        );
        assert_eq!(filled, vec!["date"]);
        assert_eq!(paper.date(), Some("2021"));
        assert_eq!(paper.authors().unwrap(), vec!["Kept"]);
        assert!(paper.is_missing("abstract"));
    }

    fn extract_id(site: SiteType, url: &str) -> Option<String> {
        capture_id(id_pattern(site), url)
    }

    #[test]
    fn test_identifier_patterns() {
        assert_eq!(
            extract_id(SiteType::Arxiv, "https://arxiv.org/abs/2310.01234v3").as_deref(),
            Some("2310.01234")
        );
        assert_eq!(
            extract_id(SiteType::OpenReview, "https://openreview.net/forum?id=rJ4km2R5t7").as_deref(),
            Some("rJ4km2R5t7")
        );
        assert_eq!(
            extract_id(SiteType::Acl, "https://aclanthology.org/2024.acl-long.572/").as_deref(),
            Some("2024.acl-long.572")
        );
        assert_eq!(
            extract_id(SiteType::Acl, "https://aclanthology.org/2024.acl-long.572.pdf").as_deref(),
            Some("2024.acl-long.572")
        );
        assert_eq!(
            extract_id(SiteType::Acl, "https://aclanthology.org/P19-1002").as_deref(),
            Some("P19-1002")
        );
        assert_eq!(
            extract_id(SiteType::Mlr, "https://proceedings.mlr.press/v202/kim23a.html").as_deref(),
            Some("v202/kim23a")
        );
        assert_eq!(
            extract_id(
                SiteType::NeurIps,
                "https://proceedings.neurips.cc/paper_files/paper/2023/hash/0123abcd-Abstract-Conference.html"
            )
            .as_deref(),
            Some("2023/hash/0123abcd-Abstract-Conference.html")
        );
        assert_eq!(extract_id(SiteType::OpenReview, "https://openreview.net/pdf"), None);
    }
}
