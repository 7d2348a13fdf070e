//! Search backends for interview grounding
//!
//! Two backends feed every interview turn:
//! - [`WebSearch`] uses the daedra crate (DuckDuckGo) and scores each hit
//!   with [`classify_source`](crate::tools::quality::classify_source)
//! - [`WikipediaSearch`] queries the MediaWiki search API over reqwest
//!
//! "No results" is an empty vector, never an error. Only transport failures
//! surface as [`AppError::Transport`].

use crate::tools::quality::{ENCYCLOPEDIA_AUTHORITY, classify_source};
use crate::types::{AppError, BackendKind, Result, SearchResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Which backend this is, used for agent naming and logging
    fn kind(&self) -> BackendKind;

    /// Run a query and return hits in backend ranking order
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Web search backend powered by daedra
pub struct WebSearch {
    max_results: usize,
}

impl WebSearch {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl SearchBackend for WebSearch {
    fn kind(&self) -> BackendKind {
        BackendKind::Web
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Transport(format!("Web search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .take(self.max_results)
            .map(|r| {
                let url = r.url.to_string();
                SearchResult {
                    source_id: url.clone(),
                    authority_score: Some(classify_source(&url).score),
                    url,
                    title: r.title.clone(),
                    snippet: r.description.clone(),
                }
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiHit>,
}

#[derive(Debug, Deserialize)]
struct WikiHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Strip the highlight markup MediaWiki wraps around matched terms.
fn clean_snippet(raw: &str) -> String {
    HTML_TAG
        .replace_all(raw, "")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Encyclopedia backend over the MediaWiki search API
pub struct WikipediaSearch {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl WikipediaSearch {
    pub fn new(base_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("research-panel/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results,
        }
    }

    fn article_url(&self, title: &str) -> String {
        format!("{}/wiki/{}", self.base_url, title.replace(' ', "_"))
    }
}

impl Default for WikipediaSearch {
    fn default() -> Self {
        Self::new("https://en.wikipedia.org", 2)
    }
}

#[async_trait]
impl SearchBackend for WikipediaSearch {
    fn kind(&self) -> BackendKind {
        BackendKind::Wikipedia
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let limit = self.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("utf8", "1"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Wikipedia request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Transport(format!("Wikipedia returned an error: {}", e)))?;

        let body: WikiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid Wikipedia response: {}", e)))?;

        Ok(body
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .take(self.max_results)
            .map(|hit| {
                let url = self.article_url(&hit.title);
                SearchResult {
                    source_id: url.clone(),
                    url,
                    snippet: clean_snippet(&hit.snippet),
                    title: hit.title,
                    authority_score: Some(ENCYCLOPEDIA_AUTHORITY),
                }
            })
            .collect())
    }
}
