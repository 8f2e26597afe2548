//! Web research synthesized into a creative-writing brief.
//!
//! Two stages: the oracle plans a handful of recency-biased queries,
//! then the budgeted search surface runs them and the oracle condenses
//! the snippets into a SUMMARY / KEY_FACTS / DISCOVERED_TOPICS brief.
//! A malformed query plan falls back to templated queries so the
//! pipeline never stalls on a bad planning response, and the brief
//! itself is best-effort prose: the raw text is authoritative, the
//! section accessors parse leniently and may come back empty.

use crate::oracle::{Oracle, OracleRequest};
use crate::search::WebSearch;
use chrono::{Datelike, Local};
use std::sync::Arc;

const RESEARCH_SYSTEM: &str = include_str!("prompts/research.txt");

/// Queries actually executed per research invocation.
const MAX_EXECUTED_QUERIES: usize = 2;

/// Cap on combined snippet text fed into synthesis.
const SYNTHESIS_INPUT_CHARS: usize = 2000;

/// A research brief for one topic.
#[derive(Debug, Clone)]
pub struct ResearchBrief {
    /// The topic researched.
    pub topic: String,

    /// The queries that were executed.
    pub queries: Vec<String>,

    /// The synthesized brief, as the oracle returned it. Downstream
    /// consumers treat this as prose, not structured data.
    pub raw: String,
}

impl ResearchBrief {
    /// The SUMMARY section, if one can be found.
    pub fn summary(&self) -> String {
        self.section("SUMMARY").join(" ")
    }

    /// KEY_FACTS entries, if any.
    pub fn key_facts(&self) -> Vec<String> {
        self.section("KEY_FACTS")
    }

    /// DISCOVERED_TOPICS entries, if any.
    pub fn discovered_topics(&self) -> Vec<String> {
        self.section("DISCOVERED_TOPICS")
    }

    fn section(&self, header: &str) -> Vec<String> {
        let mut in_section = false;
        let mut lines = Vec::new();
        for line in self.raw.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with(header) {
                in_section = true;
                continue;
            }
            if in_section {
                // A new ALL_CAPS header ends the section.
                if trimmed.ends_with(':') && trimmed.chars().all(|c| !c.is_lowercase()) {
                    break;
                }
                let item = trimmed.trim_start_matches('-').trim_start_matches('*').trim();
                if !item.is_empty() {
                    lines.push(item.to_string());
                }
            }
        }
        lines
    }
}

/// Plans queries, runs searches, and synthesizes the brief.
pub struct Researcher {
    oracle: Arc<dyn Oracle>,
    search: Arc<WebSearch>,
}

impl Researcher {
    pub fn new(oracle: Arc<dyn Oracle>, search: Arc<WebSearch>) -> Self {
        Self { oracle, search }
    }

    /// Research a topic and return the brief.
    ///
    /// Never fails outright: planning falls back to templated queries
    /// and a failed synthesis falls back to the raw snippets.
    pub async fn research(&self, topic: &str) -> ResearchBrief {
        let queries = self.plan_queries(topic).await;

        let mut sections = Vec::new();
        for query in &queries {
            let results = self.search.run(query).await;
            sections.push(format!("Query: {query}\n{results}\n"));
        }
        let combined: String = sections
            .join("\n---\n")
            .chars()
            .take(SYNTHESIS_INPUT_CHARS)
            .collect();

        let prompt = format!(
            "Synthesize research into a creative writing brief.\n\n\
             Topic: {topic}\n\n\
             Search Results:\n{combined}\n\n\
             Use this format:\n\n\
             SUMMARY:\n\
             [2-3 sentences on the most interesting/current aspects]\n\n\
             KEY_FACTS:\n\
             - [Fascinating fact 1 for story inspiration]\n\
             - [Fascinating fact 2 for story inspiration]\n\
             - [Fascinating fact 3 for story inspiration]\n\n\
             DISCOVERED_TOPICS:\n\
             - [Fascinating related topic 1]\n\
             - [Fascinating related topic 2]\n\n\
             Focus on creative inspiration, not academic completeness."
        );

        let request = OracleRequest::new(RESEARCH_SYSTEM, prompt)
            .with_temperature(0.3)
            .with_max_tokens(1024);

        let raw = match self.oracle.invoke(request).await {
            Ok(response) => response.trim().to_string(),
            // Best-effort prose either way: hand downstream the snippets.
            Err(_) => combined,
        };

        ResearchBrief {
            topic: topic.to_string(),
            queries,
            raw,
        }
    }

    /// Ask the oracle for 2-3 focused queries; fall back to templated
    /// ones when the response is not a well-formed JSON array.
    async fn plan_queries(&self, topic: &str) -> Vec<String> {
        let year = Local::now().year();
        let prompt = format!(
            "Generate 2-3 focused search queries for this topic.\n\n\
             Topic: {topic}\n\n\
             Requirements:\n\
             - Explore different angles\n\
             - Include \"{year}\" or \"latest\" for currency\n\
             - Cover developments, applications, implications\n\n\
             Return ONLY a JSON array of query strings.\n\
             Example: [\"query 1\", \"query 2\", \"query 3\"]"
        );

        let request = OracleRequest::new(RESEARCH_SYSTEM, prompt)
            .with_temperature(0.3)
            .with_max_tokens(256);

        let planned = match self.oracle.invoke(request).await {
            Ok(response) => parse_query_array(&response),
            Err(_) => Vec::new(),
        };

        let mut queries = if planned.is_empty() {
            fallback_queries(topic)
        } else {
            planned
        };
        queries.truncate(MAX_EXECUTED_QUERIES);
        queries
    }
}

/// Deterministic substitutes when query planning fails.
fn fallback_queries(topic: &str) -> Vec<String> {
    let year = Local::now().year();
    vec![
        format!("{topic} latest developments {year}"),
        format!("{topic} recent breakthroughs"),
    ]
}

fn parse_query_array(response: &str) -> Vec<String> {
    let trimmed = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(queries) => queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}
