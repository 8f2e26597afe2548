//! Testing utilities for the story engine.
//!
//! Scripted doubles for the two external capabilities, so every
//! component can be exercised deterministically without API calls:
//! - [`ScriptedOracle`] returns queued responses (or failures) in order
//!   and records every request it receives.
//! - [`ScriptedSearch`] returns a fixed or queued set of search hits.

use crate::error::{OracleError, OracleResult, SearchError};
use crate::oracle::{Oracle, OracleRequest};
use crate::search::{SearchHit, SearchProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// One scripted oracle reply.
#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    Failure,
}

/// An oracle that returns scripted responses in order.
///
/// Once the script is exhausted further invocations fail with
/// [`OracleError::Empty`], which exercises the same fallback paths a
/// blank response would.
#[derive(Default)]
pub struct ScriptedOracle {
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    replies: Vec<ScriptedReply>,
    next: usize,
    requests: Vec<OracleRequest>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle preloaded with text responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        for response in responses {
            oracle.queue(response);
        }
        oracle
    }

    /// Queue a text response.
    pub fn queue(&self, text: impl Into<String>) {
        self.state
            .lock()
            .expect("script lock")
            .replies
            .push(ScriptedReply::Text(text.into()));
    }

    /// Queue a failure.
    pub fn queue_failure(&self) {
        self.state
            .lock()
            .expect("script lock")
            .replies
            .push(ScriptedReply::Failure);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.state.lock().expect("script lock").requests.clone()
    }

    /// Number of invocations so far.
    pub fn invocations(&self) -> usize {
        self.state.lock().expect("script lock").requests.len()
    }

    /// Replay the script from the beginning.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("script lock");
        state.next = 0;
        state.requests.clear();
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, request: OracleRequest) -> OracleResult<String> {
        let mut state = self.state.lock().expect("script lock");
        state.requests.push(request);

        let reply = state.replies.get(state.next).cloned();
        state.next += 1;

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure) => {
                Err(OracleError::Network("scripted oracle failure".to_string()))
            }
            None => Err(OracleError::Empty),
        }
    }
}

/// A search provider that returns scripted hits.
#[derive(Default)]
pub struct ScriptedSearch {
    state: Mutex<SearchState>,
}

#[derive(Default)]
struct SearchState {
    /// Per-call scripted results, consumed in order.
    queued: Vec<Vec<SearchHit>>,
    next: usize,
    /// Returned for every call once the queue is exhausted.
    fixed: Vec<SearchHit>,
    queries: Vec<String>,
}

impl ScriptedSearch {
    /// A provider that always returns no results.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that returns the same hits for every call.
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        let search = Self::new();
        search.state.lock().expect("search lock").fixed = hits;
        search
    }

    /// Queue hits for a single upcoming call.
    pub fn queue_hits(&self, hits: Vec<SearchHit>) {
        self.state.lock().expect("search lock").queued.push(hits);
    }

    /// Every query received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().expect("search lock").queries.clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut state = self.state.lock().expect("search lock");
        state.queries.push(query.to_string());

        let hits = state.queued.get(state.next).cloned();
        state.next += 1;

        Ok(hits.unwrap_or_else(|| state.fixed.clone()))
    }
}
