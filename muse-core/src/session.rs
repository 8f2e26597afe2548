//! StorySession - the primary public API for the story engine.
//!
//! Wires the oracle, the budgeted search surface, the project
//! workspace, the three identity curators, the memory store, and the
//! writer pipeline into one facade. The session exposes the operations
//! a host runtime invokes; deciding *when* to invoke them stays with
//! the host. `begin_run` resets the per-run search budget.

use crate::curator::{Curator, CuratorRole, Retrieved};
use crate::error::SessionError;
use crate::memory::{ConsolidateOutcome, MemoryStore, StoreReport};
use crate::oracle::{ClaudeOracle, Oracle};
use crate::research::{ResearchBrief, Researcher};
use crate::search::{SearchProvider, TavilySearch, WebSearch};
use crate::tools::{timestamp, Workspace};
use crate::writer::{StoryInputs, StoryOutput, WriterConfig, WriterPipeline};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for creating a story session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Project root; identity files and `stories/` live under it.
    pub root: PathBuf,

    /// Model override for the oracle.
    pub model: Option<String>,

    /// Search budget per top-level run.
    pub max_searches: usize,

    /// Results requested per search.
    pub search_results: usize,

    /// Identity file names, relative to the root.
    pub topics_file: String,
    pub emotions_file: String,
    pub personality_file: String,
    pub memories_file: String,

    /// Token targets for the writer pipeline.
    pub writer: WriterConfig,
}

impl SessionConfig {
    /// Create a config rooted at the given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            model: None,
            max_searches: 3,
            search_results: 5,
            topics_file: "topics.txt".to_string(),
            emotions_file: "emotions.txt".to_string(),
            personality_file: "personality.txt".to_string(),
            memories_file: "memories.txt".to_string(),
            writer: WriterConfig::default(),
        }
    }

    /// Apply MUSE_MODEL, MAX_SEARCHES, and DEFAULT_SEARCH_MAX_RESULTS
    /// from the environment where set.
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(root);
        if let Ok(model) = std::env::var("MUSE_MODEL") {
            config.model = Some(model);
        }
        if let Some(max) = env_usize("MAX_SEARCHES") {
            config.max_searches = max;
        }
        if let Some(results) = env_usize("DEFAULT_SEARCH_MAX_RESULTS") {
            config.search_results = results;
        }
        config
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the per-run search budget.
    pub fn with_max_searches(mut self, max_searches: usize) -> Self {
        self.max_searches = max_searches;
        self
    }

    /// Set the writer token targets.
    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// The identity lists as a writer-facing snapshot.
#[derive(Debug, Clone)]
pub struct IdentitySnapshot {
    pub topics: Retrieved,
    pub emotions: Retrieved,
    pub personality: Retrieved,
}

/// Reports from one identity evolution pass.
#[derive(Debug, Clone)]
pub struct IdentityEvolution {
    pub topics: crate::curator::EvolveReport,
    pub emotions: crate::curator::EvolveReport,
    pub personality: crate::curator::EvolveReport,
}

impl IdentityEvolution {
    /// One line per curator, for the host's run log.
    pub fn summaries(&self) -> Vec<String> {
        vec![
            self.topics.summary.clone(),
            self.emotions.summary.clone(),
            self.personality.summary.clone(),
        ]
    }
}

/// A creative-writing session over one project directory.
pub struct StorySession {
    workspace: Arc<Workspace>,
    search: Arc<WebSearch>,
    topics: Curator,
    emotions: Curator,
    personality: Curator,
    memory: MemoryStore,
    researcher: Researcher,
    writer: WriterPipeline,
}

impl StorySession {
    /// Create a session with production capabilities.
    ///
    /// Requires `ANTHROPIC_API_KEY` and `TAVILY_API_KEY` to be set.
    pub async fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let mut oracle = ClaudeOracle::from_env().map_err(|_| SessionError::NoApiKey)?;
        if let Some(ref model) = config.model {
            oracle = oracle.with_model(model);
        }
        let provider = TavilySearch::from_env()?;
        Self::with_components(config, Arc::new(oracle), Arc::new(provider)).await
    }

    /// Create a session over explicit oracle and search implementations.
    pub async fn with_components(
        config: SessionConfig,
        oracle: Arc<dyn Oracle>,
        provider: Arc<dyn SearchProvider>,
    ) -> Result<Self, SessionError> {
        let workspace = Arc::new(Workspace::new(&config.root));
        let search = Arc::new(WebSearch::new(
            provider,
            config.max_searches,
            config.search_results,
        ));

        let topics = Curator::open(
            CuratorRole::Topics,
            config.root.join(&config.topics_file),
            oracle.clone(),
        )
        .await?;
        let emotions = Curator::open(
            CuratorRole::Emotions,
            config.root.join(&config.emotions_file),
            oracle.clone(),
        )
        .await?;
        let personality = Curator::open(
            CuratorRole::Personality,
            config.root.join(&config.personality_file),
            oracle.clone(),
        )
        .await?;
        let memory =
            MemoryStore::open(config.root.join(&config.memories_file), oracle.clone()).await?;

        let researcher = Researcher::new(oracle.clone(), search.clone());
        let writer =
            WriterPipeline::new(oracle, workspace.clone()).with_config(config.writer.clone());

        Ok(Self {
            workspace,
            search,
            topics,
            emotions,
            personality,
            memory,
            researcher,
            writer,
        })
    }

    /// Reset per-run counters. Call once at the start of each
    /// top-level run, before any research.
    pub fn begin_run(&self) {
        self.search.reset();
    }

    /// Research a topic into a brief.
    pub async fn research(&self, topic: &str) -> ResearchBrief {
        self.researcher.research(topic).await
    }

    /// Snapshot the identity lists for prompt assembly.
    pub async fn identity(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            topics: self.topics.retrieve().await,
            emotions: self.emotions.retrieve().await,
            personality: self.personality.retrieve().await,
        }
    }

    /// Write and persist a story on `topic` using the given brief, the
    /// current identity, and a relevant memory excerpt.
    pub async fn write_story(
        &self,
        topic: &str,
        brief: &ResearchBrief,
    ) -> Result<StoryOutput, SessionError> {
        let identity = self.identity().await;
        let memories = self.memory.retrieve(topic).await;

        let inputs = StoryInputs {
            topic: topic.to_string(),
            research: brief.raw.clone(),
            personality: identity.personality.text(),
            emotions: identity.emotions.text(),
            memories,
            timestamp: timestamp(),
        };

        Ok(self.writer.run(inputs).await?)
    }

    /// Evolve all three identity lists from the finished story and the
    /// research that fed it. Each curator clamps its own store; a
    /// failed evolution leaves that store unchanged.
    pub async fn evolve_identity(
        &self,
        topic: &str,
        story: &str,
        brief: &ResearchBrief,
    ) -> Result<IdentityEvolution, SessionError> {
        let topics = self
            .topics
            .evolve(&format!(
                "Just explored: {topic}\n\nResearch insights:\n{}",
                brief.raw
            ))
            .await?;

        let emotions = self
            .emotions
            .evolve(&format!("Story just written:\n{story}"))
            .await?;

        let personality = self
            .personality
            .evolve(&format!("Story (topic: {topic}):\n{story}"))
            .await?;

        Ok(IdentityEvolution {
            topics,
            emotions,
            personality,
        })
    }

    /// Record an experience in long-term memory.
    pub async fn remember(
        &self,
        experience: &str,
        context: &str,
    ) -> Result<StoreReport, SessionError> {
        Ok(self.memory.store(experience, context).await?)
    }

    /// Recall memories relevant to a query.
    pub async fn recall(&self, query: &str) -> String {
        self.memory.retrieve(query).await
    }

    /// Consolidate long-term memory.
    pub async fn consolidate(&self) -> Result<ConsolidateOutcome, SessionError> {
        Ok(self.memory.consolidate().await?)
    }

    /// The topics curator.
    pub fn topics(&self) -> &Curator {
        &self.topics
    }

    /// The emotions curator.
    pub fn emotions(&self) -> &Curator {
        &self.emotions
    }

    /// The personality curator.
    pub fn personality(&self) -> &Curator {
        &self.personality
    }

    /// The memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// The project workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Searches consumed in the current run.
    pub fn searches_used(&self) -> usize {
        self.search.searches_used()
    }
}
