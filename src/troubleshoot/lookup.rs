use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DocsSettings;

/// Resolves a PostgreSQL error code to a short description.
#[async_trait]
pub trait ErrorCodeLookup: Send + Sync {
    async fn describe(&self, code: &str) -> Option<String>;
}

/// Lookup that never knows anything. Used for offline classification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

#[async_trait]
impl ErrorCodeLookup for NoLookup {
    async fn describe(&self, _code: &str) -> Option<String> {
        None
    }
}

/// Storage for fetched documentation pages, keyed by URL.
pub trait DocCache: Send + Sync {
    fn get(&self, url: &str) -> Option<String>;
    fn put(&self, url: &str, body: String);
}

/// Process-lifetime page cache with no eviction.
#[derive(Default)]
pub struct InMemoryDocCache {
    pages: Mutex<HashMap<String, String>>,
}

impl InMemoryDocCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocCache for InMemoryDocCache {
    fn get(&self, url: &str) -> Option<String> {
        match self.pages.lock() {
            Ok(pages) => pages.get(url).cloned(),
            Err(e) => {
                log::warn!("Documentation cache unavailable: {}", e);
                None
            }
        }
    }

    fn put(&self, url: &str, body: String) {
        match self.pages.lock() {
            Ok(mut pages) => {
                pages.insert(url.to_string(), body);
            }
            Err(e) => log::warn!("Documentation cache unavailable: {}", e),
        }
    }
}

/// Fetches documentation pages over HTTP, reading through a `DocCache`.
pub struct DocFetcher {
    http: reqwest::Client,
    cache: Arc<dyn DocCache>,
    delay: Duration,
}

impl DocFetcher {
    pub fn new(settings: &DocsSettings, cache: Arc<dyn DocCache>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .user_agent(settings.user_agent.clone())
                .build()
                .unwrap_or_default(),
            cache,
            delay: Duration::from_millis(100),
        }
    }

    /// Page body, or `None` when the request fails. Failures are logged.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        if let Some(body) = self.cache.get(url) {
            log::debug!("Documentation cache hit for {}", url);
            return Some(body);
        }

        // Keep request rate low against the docs server.
        tokio::time::sleep(self.delay).await;

        match self.request(url).await {
            Ok(body) => {
                self.cache.put(url, body.clone());
                Some(body)
            }
            Err(e) => {
                log::error!("Error fetching documentation page {}: {:#}", url, e);
                None
            }
        }
    }

    async fn request(&self, url: &str) -> anyhow::Result<String> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

/// Error-code lookup backed by the PostgreSQL error-code appendix.
pub struct PgDocsErrorCodes {
    fetcher: DocFetcher,
    url: String,
}

impl PgDocsErrorCodes {
    pub fn new(fetcher: DocFetcher, url: &str) -> Self {
        Self {
            fetcher,
            url: url.to_string(),
        }
    }

    pub fn from_settings(settings: &DocsSettings, cache: Arc<dyn DocCache>) -> Self {
        Self::new(DocFetcher::new(settings, cache), &settings.error_codes_url)
    }
}

#[async_trait]
impl ErrorCodeLookup for PgDocsErrorCodes {
    async fn describe(&self, code: &str) -> Option<String> {
        let html = self.fetcher.fetch(&self.url).await?;
        let found = find_error_code(&html, code);
        if found.is_none() {
            log::debug!("Error code {} not listed in {}", code, self.url);
        }
        found
    }
}

static ROW_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").ok());
static CELL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").ok());
static TAG_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").ok());

/// Scan table rows; the first row whose first cell contains `code` yields its
/// second cell's text.
pub fn find_error_code(html: &str, code: &str) -> Option<String> {
    let (row_re, cell_re) = (ROW_RE.as_ref()?, CELL_RE.as_ref()?);

    row_re.captures_iter(html).find_map(|row| {
        let mut cells = cell_re
            .captures_iter(&row[1])
            .map(|cell| cell_text(&cell[1]));
        let first = cells.next()?;
        let second = cells.next()?;
        first.contains(code).then_some(second)
    })
}

fn cell_text(fragment: &str) -> String {
    let stripped = match TAG_RE.as_ref() {
        Some(re) => re.replace_all(fragment, "").into_owned(),
        None => fragment.to_string(),
    };
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPENDIX: &str = r#"
<table class="table" summary="PostgreSQL Error Codes">
  <thead><tr><th>Error Code</th><th>Condition Name</th></tr></thead>
  <tbody>
    <tr><td colspan="2"><strong>Class 23 &mdash; Integrity Constraint Violation</strong></td></tr>
    <tr><td><code class="literal">23503</code></td><td><code class="symbol">foreign_key_violation</code></td></tr>
    <tr><td><code class="literal">23505</code></td>
        <td><code class="symbol">unique_violation</code></td></tr>
    <tr><td><code class="literal">42P01</code></td><td><code class="symbol">undefined_table</code> &amp; friends</td></tr>
  </tbody>
</table>"#;

    #[test]
    fn test_find_error_code() {
        assert_eq!(find_error_code(APPENDIX, "23505").as_deref(), Some("unique_violation"));
        assert_eq!(
            find_error_code(APPENDIX, "23503").as_deref(),
            Some("foreign_key_violation")
        );
        assert_eq!(
            find_error_code(APPENDIX, "42P01").as_deref(),
            Some("undefined_table & friends")
        );
        assert_eq!(find_error_code(APPENDIX, "99999"), None);
    }

    #[test]
    fn test_single_cell_rows_are_skipped() {
        // The class header row has one cell and mentions no code.
        assert_eq!(find_error_code(APPENDIX, "Class 23"), None);
    }

    #[test]
    fn test_in_memory_cache() {
        let cache = InMemoryDocCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("https://example.test/a"), None);
        cache.put("https://example.test/a", "body".to_string());
        assert_eq!(cache.get("https://example.test/a").as_deref(), Some("body"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_reads_through_cache() {
        let settings = DocsSettings::default();
        let cache = Arc::new(InMemoryDocCache::new());
        cache.put(&settings.error_codes_url, APPENDIX.to_string());

        let lookup = PgDocsErrorCodes::from_settings(&settings, cache.clone());
        assert_eq!(lookup.describe("23505").await.as_deref(), Some("unique_violation"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_no_lookup() {
        assert_eq!(NoLookup.describe("23505").await, None);
    }
}
