use std::time::Duration;

use async_trait::async_trait;

use super::retry::{retry_with_backoff, RetryPolicy};
use super::{FetchError, LoadStrategy, PageLoader};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Plain HTTP GET loader with retry.
pub struct HttpFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(contact: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent(contact))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            policy: RetryPolicy::default(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

fn user_agent(contact: Option<&str>) -> String {
    let base = format!("paper-info/{}", env!("CARGO_PKG_VERSION"));
    match contact {
        Some(email) if !email.is_empty() => format!("Mozilla/5.0 ({}; mailto:{})", base, email),
        _ => format!("Mozilla/5.0 ({})", base),
    }
}

#[async_trait]
impl PageLoader for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn load(&self, url: &str, _strategy: LoadStrategy) -> Result<Option<String>, FetchError> {
        Ok(retry_with_backoff(&self.policy, url, || self.get_once(url)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_mentions_contact() {
        assert!(user_agent(Some("me@example.org")).contains("mailto:me@example.org"));
        assert!(!user_agent(None).contains("mailto"));
        assert!(!user_agent(Some("")).contains("mailto"));
    }
}
