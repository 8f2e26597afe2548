//! Web search capability with a per-run call budget.
//!
//! [`SearchProvider`] is the seam to the actual search backend (Tavily
//! in production, a scripted double in tests). [`WebSearch`] wraps a
//! provider with the process-wide budget: once the run's searches are
//! spent, further calls get a sentinel telling the caller to proceed
//! with the context it already has instead of an error.

use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TAVILY_API: &str = "https://api.tavily.com/search";

/// Snippet length cap when formatting results for prompts.
const SNIPPET_CHARS: usize = 400;

/// One search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// External search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, SearchError>;
}

/// Search provider backed by the Tavily API.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

impl TavilySearch {
    /// Create a provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
        }
    }

    /// Create a provider from the TAVILY_API_KEY environment variable.
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = std::env::var("TAVILY_API_KEY").map_err(|_| SearchError::NoApiKey)?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let response = self
            .client
            .post(TAVILY_API)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status,
                message: body,
            });
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default = "untitled")]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

fn untitled() -> String {
    "Untitled".to_string()
}

/// A budgeted search surface shared across one top-level run.
///
/// The counter is per-run, not per-pipeline or per-curator: every
/// search in the run draws from the same pool until [`reset`] is called
/// at the start of the next run.
///
/// [`reset`]: WebSearch::reset
pub struct WebSearch {
    provider: Arc<dyn SearchProvider>,
    used: AtomicUsize,
    max_searches: usize,
    max_results: usize,
}

impl WebSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, max_searches: usize, max_results: usize) -> Self {
        Self {
            provider,
            used: AtomicUsize::new(0),
            max_searches,
            max_results,
        }
    }

    /// Reset the budget for a new top-level run.
    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }

    /// Searches consumed so far this run.
    pub fn searches_used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    /// Run one search and format the results for prompt inclusion.
    ///
    /// Returns the budget sentinel once the run's searches are spent,
    /// and degrades to an advisory string on provider failure - the
    /// caller always gets prose it can continue with.
    pub async fn run(&self, query: &str) -> String {
        let previous = self.used.fetch_add(1, Ordering::SeqCst);
        if previous >= self.max_searches {
            self.used.store(self.max_searches, Ordering::SeqCst);
            return format!(
                "Search limit reached ({}). Summarize with current context.",
                self.max_searches
            );
        }

        match self.provider.search(query, self.max_results).await {
            Ok(hits) => format_hits(&hits),
            Err(e) => format!("Search failed ({e}). Proceed with current context."),
        }
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "Search results:\n(no results)".to_string();
    }

    let summaries: Vec<String> = hits
        .iter()
        .map(|hit| {
            let snippet: String = hit.snippet.chars().take(SNIPPET_CHARS).collect();
            format!("- {} :: {}\n  {}", hit.title, hit.url, snippet)
        })
        .collect();

    format!("Search results:\n{}", summaries.join("\n"))
}
