//! Web search over the DuckDuckGo HTML endpoint
//!
//! The result page is fetched through the shared [`PageFetcher`], so search
//! requests get the same retry and user-agent handling as page fetches.
//! Result anchors point at a redirect (`/l/?uddg=<target>`); the target is
//! unwrapped and links back into the engine are dropped.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::domain::errors::{ConfigurationError, FetchError};
use crate::domain::repositories::{PageFetcher, SearchProvider};
use crate::infrastructure::parsing::config::compile_selector;

const RESULT_LINK_SELECTOR: &str = ".result__a";
const ENGINE_HOST: &str = "duckduckgo.com";

pub struct DuckDuckGoSearch {
    fetcher: Arc<dyn PageFetcher>,
    endpoint: String,
    result_selector: Selector,
}

impl DuckDuckGoSearch {
    /// `endpoint` must contain a `{query}` placeholder
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoint: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            fetcher,
            endpoint: endpoint.to_string(),
            result_selector: compile_selector(RESULT_LINK_SELECTOR)?,
        })
    }

    fn search_url(&self, query: &str) -> String {
        self.endpoint.replace("{query}", &urlencoding::encode(query))
    }

    /// Result URLs in page order, unwrapped and deduplicated
    pub fn parse_results(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut urls: Vec<String> = Vec::new();
        for anchor in document.select(&self.result_selector) {
            let Some(target) = anchor.value().attr("href").and_then(unwrap_result_link) else {
                continue;
            };
            if !urls.contains(&target) {
                urls.push(target);
            }
        }
        urls
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, FetchError> {
        let url = self.search_url(query);
        info!("🔍 Searching: '{}'", query);

        let html = self.fetcher.fetch_text(&url).await?;
        let mut results = self.parse_results(&html);
        results.truncate(max_results);

        debug!("Search '{}' returned {} result(s)", query, results.len());
        Ok(results)
    }
}

/// Resolve a result anchor to the page it points at
fn unwrap_result_link(href: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let parsed = base.join(href.trim()).ok()?;

    let target = if is_engine_host(&parsed) {
        let (_, redirect) = parsed.query_pairs().find(|(key, _)| key == "uddg")?;
        Url::parse(&redirect).ok()?
    } else {
        parsed
    };

    if !matches!(target.scheme(), "http" | "https") || is_engine_host(&target) {
        return None;
    }
    Some(target.to_string())
}

fn is_engine_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == ENGINE_HOST || host.ends_with(".duckduckgo.com"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingFetcher {
        body: String,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    const RESULTS_PAGE: &str = r#"
        <div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fsmile.pk%2Fcontact&rut=abc">Smile</a></div>
        <div class="result"><a class="result__a" href="https://brightteeth.pk/">Bright</a></div>
        <div class="result"><a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Ad</a></div>
        <div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fsmile.pk%2Fcontact">Dup</a></div>
        <div class="result"><a class="result__a" href="javascript:void(0)">Bad</a></div>
        <div class="result"><a class="result__a" href="https://dentalcare.pk/">Care</a></div>
    "#;

    fn engine(body: &str) -> (Arc<RecordingFetcher>, DuckDuckGoSearch) {
        let fetcher = Arc::new(RecordingFetcher {
            body: body.to_string(),
            requested: Mutex::new(Vec::new()),
        });
        let search = DuckDuckGoSearch::new(fetcher.clone(), "https://html.duckduckgo.com/html/?q={query}").unwrap();
        (fetcher, search)
    }

    #[test]
    fn test_parse_results_unwraps_and_filters() {
        let (_, search) = engine("");
        assert_eq!(
            search.parse_results(RESULTS_PAGE),
            vec![
                "https://smile.pk/contact".to_string(),
                "https://brightteeth.pk/".to_string(),
                "https://dentalcare.pk/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_encodes_query_and_truncates() {
        let (fetcher, search) = engine(RESULTS_PAGE);
        let results = search.search("dental clinic Lahore email", 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            fetcher.requested.lock().unwrap().as_slice(),
            ["https://html.duckduckgo.com/html/?q=dental%20clinic%20Lahore%20email"]
        );
    }

    #[tokio::test]
    async fn test_empty_result_page() {
        let (_, search) = engine("<html><body>No results.</body></html>");
        assert!(search.search("anything", 10).await.unwrap().is_empty());
    }
}
