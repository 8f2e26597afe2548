//! Long-term episodic memory with natural imperfection.
//!
//! The memory store keeps 15-20 single-line experiences. Storing at the
//! ceiling asks the oracle to merge or drop rather than append;
//! consolidation deliberately lets details drift (reconstructive memory
//! is a design property here, not a bug) while the prompt asks for
//! emotionally salient entries to survive - that part is instructed,
//! not enforced. The same clamp as every bounded store guards the size
//! invariant against whatever the oracle actually returns.

use crate::error::{StoreError, StoreResult};
use crate::oracle::{Oracle, OracleRequest};
use crate::store::{sanitize_response, BoundedStore, StoreLimits};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Target count after consolidation.
pub const MEMORY_FLOOR: usize = 15;

/// Hard ceiling on stored memories.
pub const MEMORY_CEILING: usize = 20;

/// Below this count consolidation is a no-op: merging a small list
/// destroys information for no size benefit.
pub const CONSOLIDATE_MIN: usize = 10;

/// Sentinel returned when retrieval finds nothing.
pub const NO_RELEVANT_MEMORIES: &str = "No relevant memories found.";

const MEMORY_SYSTEM: &str = include_str!("prompts/memory.txt");

/// Result of a `store` call.
#[derive(Debug, Clone)]
pub struct StoreReport {
    /// The full memory list after the store.
    pub memories: Vec<String>,

    /// The oracle produced nothing usable; the raw experience line was
    /// kept alongside the existing memories instead.
    pub used_fallback: bool,
}

/// Result of a `consolidate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidateOutcome {
    /// Memories were rewritten; counts before and after.
    Consolidated { before: usize, after: usize },

    /// Too few memories to consolidate; nothing changed.
    NotEnough { count: usize },
}

/// Bounded episodic memory backed by a flat text file.
pub struct MemoryStore {
    store: Mutex<BoundedStore>,
    oracle: Arc<dyn Oracle>,
}

impl MemoryStore {
    /// Open the memory store at `path`, loading any persisted records.
    pub async fn open(path: impl Into<PathBuf>, oracle: Arc<dyn Oracle>) -> StoreResult<Self> {
        let mut store =
            BoundedStore::new(path, StoreLimits::new(MEMORY_FLOOR, MEMORY_CEILING));
        store.load().await?;
        Ok(Self {
            store: Mutex::new(store),
            oracle,
        })
    }

    /// Current memory count.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Current memories, in order.
    pub async fn memories(&self) -> Vec<String> {
        self.store.lock().await.items().to_vec()
    }

    /// Record a new experience.
    ///
    /// The oracle sees the full current list and is told to merge or
    /// drop rather than only append once at the ceiling. If its response
    /// yields zero usable lines the raw experience is kept verbatim next
    /// to the existing records, so `store` can never be a no-op.
    pub async fn store(&self, experience: &str, context: &str) -> StoreResult<StoreReport> {
        let experience = experience.trim();
        if experience.is_empty() {
            return Err(StoreError::EmptyExperience);
        }

        let mut store = self.store.lock().await;
        let current = store.items().to_vec();

        let prompt = format!(
            "Add this new experience to your memory.\n\n\
             Current memories ({}):\n{}\n\n\
             New experience to store:\n{}\n\n\
             Context: {}\n\n\
             Instructions:\n\
             - Add this experience as a new memory (one concise line)\n\
             - If you already have 20+ memories, merge similar ones or remove the least significant\n\
             - Keep total between 15-20 memories\n\
             - Return ONLY the complete updated list of memories, one per line\n\
             - No explanations, just the memory list",
            current.len(),
            if current.is_empty() {
                "(No memories yet)".to_string()
            } else {
                current.join("\n")
            },
            experience,
            if context.trim().is_empty() {
                "General"
            } else {
                context
            },
        );

        let request = OracleRequest::new(MEMORY_SYSTEM, prompt)
            .with_temperature(0.5)
            .with_max_tokens(1024);

        let lines = match self.oracle.invoke(request).await {
            Ok(response) => sanitize_response(&response),
            Err(_) => Vec::new(),
        };

        // Never lose the list to a bad response: fall back to what we
        // had plus the one line we were asked to keep. At the ceiling
        // the oldest memory makes room, so the new line always lands.
        let (candidate, used_fallback) = if lines.is_empty() {
            let mut fallback = current.clone();
            while fallback.len() >= MEMORY_CEILING {
                fallback.remove(0);
            }
            fallback.push(experience.to_string());
            (fallback, true)
        } else {
            (lines, false)
        };

        let receipt = store.commit(candidate).await?;

        Ok(StoreReport {
            memories: receipt.items,
            used_fallback,
        })
    }

    /// Select memories relevant to a query. Read-only: the store is
    /// never mutated, and failures degrade to the sentinel.
    pub async fn retrieve(&self, query: &str) -> String {
        let store = self.store.lock().await;
        if store.is_empty() {
            return NO_RELEVANT_MEMORIES.to_string();
        }
        if query.trim().is_empty() {
            return "No query provided for retrieval.".to_string();
        }

        let prompt = format!(
            "Retrieve memories relevant to this query.\n\n\
             Query: {}\n\n\
             All memories:\n{}\n\n\
             Return 3-5 most relevant memories, or \"{}\" if none match.\n\
             Memories may have slight imperfections - that's natural.",
            query,
            store.items().join("\n"),
            NO_RELEVANT_MEMORIES,
        );

        let request = OracleRequest::new(MEMORY_SYSTEM, prompt)
            .with_temperature(0.5)
            .with_max_tokens(512);

        match self.oracle.invoke(request).await {
            Ok(response) if !response.trim().is_empty() => response.trim().to_string(),
            _ => NO_RELEVANT_MEMORIES.to_string(),
        }
    }

    /// Merge similar memories and simplify verbose ones.
    ///
    /// Refuses to run below [`CONSOLIDATE_MIN`] records. Oracle failure
    /// re-commits the current list unchanged.
    pub async fn consolidate(&self) -> StoreResult<ConsolidateOutcome> {
        let mut store = self.store.lock().await;
        let before = store.len();
        if before < CONSOLIDATE_MIN {
            return Ok(ConsolidateOutcome::NotEnough { count: before });
        }

        let current = store.items().to_vec();
        let prompt = format!(
            "Consolidate memories like a human mind over time.\n\n\
             Current memories ({}):\n{}\n\n\
             Tasks:\n\
             1. Merge similar memories into one\n\
             2. Simplify overly detailed memories\n\
             3. Keep emotionally significant moments vivid\n\
             4. Forget trivial details\n\
             5. Allow slight creative shifts (memory isn't perfect)\n\n\
             Return consolidated list (15-20 memories), one per line.",
            before,
            current.join("\n"),
        );

        let request = OracleRequest::new(MEMORY_SYSTEM, prompt)
            .with_temperature(0.5)
            .with_max_tokens(1024);

        let candidate = match self.oracle.invoke(request).await {
            Ok(response) => {
                let lines = sanitize_response(&response);
                if lines.is_empty() {
                    current
                } else {
                    lines
                }
            }
            Err(_) => current,
        };

        let receipt = store.commit(candidate).await?;

        Ok(ConsolidateOutcome::Consolidated {
            before,
            after: receipt.items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;
    use tempfile::TempDir;

    async fn memory_with(
        dir: &TempDir,
        seed: &[&str],
        oracle: Arc<ScriptedOracle>,
    ) -> MemoryStore {
        let path = dir.path().join("memories.txt");
        if !seed.is_empty() {
            let mut content = seed.join("\n");
            content.push('\n');
            std::fs::write(&path, content).unwrap();
        }
        MemoryStore::open(path, oracle).await.unwrap()
    }

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Memory number {i}")).collect()
    }

    #[tokio::test]
    async fn test_store_fallback_on_unusable_response() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        // Scaffolding only; sanitization leaves nothing.
        oracle.queue("Here is the updated list:\n\n");

        let memory = memory_with(&dir, &[], oracle).await;
        let report = memory.store("Learned about tidal locking", "astronomy").await.unwrap();

        assert!(report.used_fallback);
        assert_eq!(report.memories, vec!["Learned about tidal locking"]);
    }

    #[tokio::test]
    async fn test_store_fallback_keeps_existing_memories() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.queue_failure();

        let memory = memory_with(&dir, &["Old tide memory", "Old moth memory"], oracle).await;
        let report = memory.store("New storm memory", "").await.unwrap();

        assert!(report.used_fallback);
        assert_eq!(
            report.memories,
            vec!["Old tide memory", "Old moth memory", "New storm memory"]
        );
    }

    #[tokio::test]
    async fn test_store_never_exceeds_ceiling() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        // The oracle misbehaves and returns 25 lines.
        let oversized: Vec<String> = (0..25).map(|i| format!("Runaway memory {i}")).collect();
        oracle.queue(&oversized.join("\n"));

        let seed = numbered(MEMORY_CEILING);
        let seed_refs: Vec<&str> = seed.iter().map(String::as_str).collect();
        let memory = memory_with(&dir, &seed_refs, oracle).await;

        let report = memory.store("One more", "").await.unwrap();
        assert_eq!(report.memories.len(), MEMORY_CEILING);
        assert_eq!(memory.len().await, MEMORY_CEILING);
    }

    #[tokio::test]
    async fn test_store_rejects_blank_experience() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        let memory = memory_with(&dir, &[], oracle).await;

        let result = memory.store("   ", "context").await;
        assert!(matches!(result, Err(StoreError::EmptyExperience)));
    }

    #[tokio::test]
    async fn test_retrieve_empty_store_sentinel() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        let memory = memory_with(&dir, &[], oracle).await;

        assert_eq!(memory.retrieve("tides").await, NO_RELEVANT_MEMORIES);
    }

    #[tokio::test]
    async fn test_retrieve_does_not_mutate() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.queue("Old tide memory");

        let memory = memory_with(&dir, &["Old tide memory", "Old moth memory"], oracle).await;
        let reply = memory.retrieve("tides").await;

        assert_eq!(reply, "Old tide memory");
        assert_eq!(
            memory.memories().await,
            vec!["Old tide memory", "Old moth memory"]
        );
    }

    #[tokio::test]
    async fn test_consolidate_refuses_below_floor() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        let seed = numbered(CONSOLIDATE_MIN - 1);
        let seed_refs: Vec<&str> = seed.iter().map(String::as_str).collect();
        let memory = memory_with(&dir, &seed_refs, oracle).await;

        let outcome = memory.consolidate().await.unwrap();
        assert_eq!(
            outcome,
            ConsolidateOutcome::NotEnough {
                count: CONSOLIDATE_MIN - 1
            }
        );
        assert_eq!(memory.len().await, CONSOLIDATE_MIN - 1);
    }

    #[tokio::test]
    async fn test_consolidate_rewrites_list() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        let merged: Vec<String> = (0..15).map(|i| format!("Merged memory {i}")).collect();
        oracle.queue(&merged.join("\n"));

        let seed = numbered(MEMORY_CEILING);
        let seed_refs: Vec<&str> = seed.iter().map(String::as_str).collect();
        let memory = memory_with(&dir, &seed_refs, oracle).await;

        let outcome = memory.consolidate().await.unwrap();
        assert_eq!(
            outcome,
            ConsolidateOutcome::Consolidated {
                before: 20,
                after: 15
            }
        );
        assert_eq!(memory.memories().await, merged);
    }

    #[tokio::test]
    async fn test_consolidate_oracle_failure_keeps_list() {
        let dir = TempDir::new().unwrap();
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.queue_failure();

        let seed = numbered(12);
        let seed_refs: Vec<&str> = seed.iter().map(String::as_str).collect();
        let memory = memory_with(&dir, &seed_refs, oracle).await;

        let outcome = memory.consolidate().await.unwrap();
        assert_eq!(
            outcome,
            ConsolidateOutcome::Consolidated {
                before: 12,
                after: 12
            }
        );
        assert_eq!(memory.memories().await, seed);
    }
}
