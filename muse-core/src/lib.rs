//! Self-evolving creative writing engine.
//!
//! This crate provides:
//! - Bounded identity stores (topics, emotions, personality) that
//!   survive free-text rewrites from a non-deterministic oracle
//! - Role-specific curators with rotate/refine evolution policies
//! - Long-term episodic memory with lossy consolidation
//! - A two-stage research synthesizer over a budgeted search surface
//! - A strict outline -> draft -> refine -> persist writer pipeline
//!   with a deterministic formatting pass
//!
//! # Quick Start
//!
//! ```ignore
//! use muse_core::{SessionConfig, StorySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = StorySession::new(SessionConfig::from_env(".")).await?;
//!     session.begin_run();
//!
//!     let brief = session.research("tidal locking").await;
//!     let output = session.write_story("tidal locking", &brief).await?;
//!     println!("{}", output.story);
//!
//!     session.evolve_identity("tidal locking", &output.story, &brief).await?;
//!     session.remember("Wrote about tidal locking", "astronomy").await?;
//!     Ok(())
//! }
//! ```

pub mod curator;
pub mod error;
pub mod format;
pub mod memory;
pub mod oracle;
pub mod research;
pub mod search;
pub mod session;
pub mod store;
pub mod testing;
pub mod tools;
pub mod writer;

// Primary public API
pub use curator::{Curator, CuratorRole, EvolveReport, Retrieved, CORE_EMOTIONS};
pub use error::{OracleError, SearchError, SessionError, StoreError, WorkspaceError, WriterError};
pub use memory::{ConsolidateOutcome, MemoryStore, StoreReport, NO_RELEVANT_MEMORIES};
pub use oracle::{ClaudeOracle, Oracle, OracleRequest};
pub use research::{ResearchBrief, Researcher};
pub use search::{SearchHit, SearchProvider, TavilySearch, WebSearch};
pub use session::{IdentityEvolution, IdentitySnapshot, SessionConfig, StorySession};
pub use store::{BoundedStore, CommitReceipt, StoreLimits};
pub use tools::{Workspace, WriteMode};
pub use writer::{StoryInputs, StoryOutput, WriterConfig, WriterPipeline};
