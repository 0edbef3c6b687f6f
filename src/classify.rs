use std::fmt;

/// Publication hosts the updater knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteType {
    Arxiv,
    OpenReview,
    Acl,
    Mlr,
    NeurIps,
}

impl SiteType {
    pub const ALL: [SiteType; 5] = [
        SiteType::Arxiv,
        SiteType::OpenReview,
        SiteType::Acl,
        SiteType::Mlr,
        SiteType::NeurIps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::Arxiv => "arxiv",
            SiteType::OpenReview => "openreview",
            SiteType::Acl => "acl",
            SiteType::Mlr => "mlr",
            SiteType::NeurIps => "neurips",
        }
    }

    /// Host fragment that identifies the site inside a URL.
    fn host_fragment(&self) -> &'static str {
        match self {
            SiteType::Arxiv => "arxiv",
            SiteType::OpenReview => "openreview",
            SiteType::Acl => "aclanthology",
            SiteType::Mlr => "mlr",
            SiteType::NeurIps => "neurips",
        }
    }

    /// Case-insensitive substring match, checked in `ALL` order.
    pub fn from_url(url: &str) -> Option<SiteType> {
        let lower = url.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|site| lower.contains(site.host_fragment()))
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a record's URL map by its **first** entry only.
///
/// Returns `None` for an empty map. When the first URL matches no known
/// site, or is not a string at all, the site is `None` and later entries
/// are not consulted, even if one of them would match.
pub fn classify_urls<'a>(
    urls: &[(&'a str, Option<&'a str>)],
) -> Option<(Option<SiteType>, Option<&'a str>)> {
    let &(_, url) = urls.first()?;
    Some((url.and_then(SiteType::from_url), url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_fragments() {
        assert_eq!(SiteType::from_url("https://arxiv.org/abs/2310.01234"), Some(SiteType::Arxiv));
        assert_eq!(SiteType::from_url("https://openreview.net/forum?id=x"), Some(SiteType::OpenReview));
        assert_eq!(SiteType::from_url("https://aclanthology.org/2024.acl-long.572/"), Some(SiteType::Acl));
        assert_eq!(SiteType::from_url("https://proceedings.mlr.press/v202/a23a.html"), Some(SiteType::Mlr));
        assert_eq!(
            SiteType::from_url("https://proceedings.neurips.cc/paper_files/paper/2023/hash/x"),
            Some(SiteType::NeurIps)
        );
        assert_eq!(SiteType::from_url("https://ARXIV.org/abs/1"), Some(SiteType::Arxiv));
        assert_eq!(SiteType::from_url("https://github.com/org/repo"), None);
    }

    #[test]
    fn test_first_entry_only() {
        let urls = [
            ("github", Some("https://github.com/org/repo")),
            ("arxiv", Some("https://arxiv.org/abs/2310.01234")),
        ];
        assert_eq!(
            classify_urls(&urls),
            Some((None, Some("https://github.com/org/repo")))
        );

        let urls = [
            ("arxiv", Some("https://arxiv.org/abs/2310.01234")),
            ("github", Some("https://github.com/org/repo")),
        ];
        assert_eq!(
            classify_urls(&urls),
            Some((Some(SiteType::Arxiv), Some("https://arxiv.org/abs/2310.01234")))
        );
    }

    #[test]
    fn test_non_string_first_entry_is_unclassified() {
        let urls = [("code", None), ("arxiv", Some("https://arxiv.org/abs/2310.01234"))];
        assert_eq!(classify_urls(&urls), Some((None, None)));
    }

    #[test]
    fn test_empty_map() {
        assert_eq!(classify_urls(&[]), None);
    }
}
