//! Identity curators.
//!
//! A curator binds one bounded store to an evolution policy: topics and
//! emotions rotate, personality refines. `retrieve` never touches the
//! oracle; `evolve` runs the full read -> oracle -> clamp -> persist
//! cycle under the store's lock, so concurrent evolve calls against the
//! same store serialize instead of racing on the backing file.

use crate::error::StoreResult;
use crate::oracle::{Oracle, OracleRequest};
use crate::store::{sanitize_response, BoundedStore, StoreLimits};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The three identity lists a session curates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuratorRole {
    /// What to write about next - rotates with research discoveries.
    Topics,
    /// Emotional palette - rotates around a protected core.
    Emotions,
    /// Writing voice traits - refined slowly, replace one to add one.
    Personality,
}

/// Emotions every palette keeps, whatever the oracle proposes.
pub const CORE_EMOTIONS: [&str; 3] = [
    "Wonder and curiosity",
    "Melancholy hope",
    "Quiet intensity",
];

impl CuratorRole {
    /// Short plural noun for summaries and sentinels.
    pub fn noun(&self) -> &'static str {
        match self {
            CuratorRole::Topics => "topics",
            CuratorRole::Emotions => "emotions",
            CuratorRole::Personality => "personality traits",
        }
    }

    /// Sentinel returned by `retrieve` on an empty store.
    pub fn sentinel(&self) -> &'static str {
        match self {
            CuratorRole::Topics => "No topics defined yet.",
            CuratorRole::Emotions => "No emotions defined yet.",
            CuratorRole::Personality => "No personality traits defined yet.",
        }
    }

    /// Size range the store enforces for this role.
    pub fn limits(&self) -> StoreLimits {
        match self {
            CuratorRole::Topics => StoreLimits::new(5, 6),
            CuratorRole::Emotions => StoreLimits::new(4, 5),
            CuratorRole::Personality => StoreLimits::new(10, 12),
        }
    }

    /// Protected core phrases, if any.
    pub fn core(&self) -> &'static [&'static str] {
        match self {
            CuratorRole::Emotions => &CORE_EMOTIONS,
            _ => &[],
        }
    }

    /// Oracle temperature for evolve calls. Personality runs coolest
    /// because it is meant to drift slowest.
    pub fn temperature(&self) -> f32 {
        match self {
            CuratorRole::Topics | CuratorRole::Emotions => 0.4,
            CuratorRole::Personality => 0.3,
        }
    }

    /// How much of the context payload goes into the evolve prompt.
    pub fn context_preview_chars(&self) -> usize {
        match self {
            CuratorRole::Topics => 600,
            CuratorRole::Emotions | CuratorRole::Personality => 400,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            CuratorRole::Topics => include_str!("prompts/topics_curator.txt"),
            CuratorRole::Emotions => include_str!("prompts/emotions_curator.txt"),
            CuratorRole::Personality => include_str!("prompts/personality_curator.txt"),
        }
    }

    fn evolve_recap(&self) -> &'static str {
        match self {
            CuratorRole::Topics => {
                "Evolve the topics list. Keep 5-6 items. Replace stale with fresh discoveries.\n\
                 If adding a new topic, remove a less interesting one to maintain the limit.\n\n\
                 Updated list (5-6 topics):"
            }
            CuratorRole::Emotions => {
                "Evolve the emotions list. Keep 4-5 items total. Rotate content, don't just add.\n\
                 Always keep the core 3, rotate the remaining 1-2 slots.\n\n\
                 Updated list (4-5 emotions):"
            }
            CuratorRole::Personality => {
                "Refine the personality. Keep 10-12 traits. Evolve gradually, don't overhaul.\n\
                 Only add a new trait if removing one that no longer fits.\n\n\
                 Updated list (10-12 traits):"
            }
        }
    }
}

/// Result of a `retrieve` call.
#[derive(Debug, Clone)]
pub enum Retrieved {
    /// The store's current items, verbatim.
    Items(Vec<String>),
    /// Nothing defined yet; carries the role's sentinel.
    Empty { sentinel: &'static str },
}

impl Retrieved {
    /// Render for prompt inclusion: one item per line, or the sentinel.
    pub fn text(&self) -> String {
        match self {
            Retrieved::Items(items) => items.join("\n"),
            Retrieved::Empty { sentinel } => (*sentinel).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Retrieved::Empty { .. })
    }
}

/// Result of an `evolve` call.
#[derive(Debug, Clone)]
pub struct EvolveReport {
    /// The committed items.
    pub items: Vec<String>,

    /// Human-readable delta, e.g. `Evolved topics: 5 (was 6)`.
    pub summary: String,

    /// The oracle failed or produced nothing usable; the previous items
    /// were re-committed unchanged.
    pub fell_back: bool,
}

/// Role-specific wrapper over one bounded store.
pub struct Curator {
    role: CuratorRole,
    store: Mutex<BoundedStore>,
    oracle: Arc<dyn Oracle>,
}

impl Curator {
    /// Open a curator over the store file at `path`, loading any
    /// persisted items. A missing file is an empty store, not an error.
    pub async fn open(
        role: CuratorRole,
        path: impl Into<PathBuf>,
        oracle: Arc<dyn Oracle>,
    ) -> StoreResult<Self> {
        let mut store = BoundedStore::new(path, role.limits())
            .with_core(role.core().iter().copied());
        store.load().await?;
        Ok(Self {
            role,
            store: Mutex::new(store),
            oracle,
        })
    }

    pub fn role(&self) -> CuratorRole {
        self.role
    }

    /// Current items, verbatim. No oracle call.
    pub async fn retrieve(&self) -> Retrieved {
        let store = self.store.lock().await;
        if store.is_empty() {
            Retrieved::Empty {
                sentinel: self.role.sentinel(),
            }
        } else {
            Retrieved::Items(store.items().to_vec())
        }
    }

    /// Rewrite the list through the oracle and clamp the result.
    ///
    /// The store lock is held across the whole read -> oracle -> commit
    /// cycle. On oracle failure or an unusable response the current
    /// items are re-committed unchanged: evolution failure never shrinks
    /// the store or deletes content.
    pub async fn evolve(&self, context: &str) -> StoreResult<EvolveReport> {
        let mut store = self.store.lock().await;
        let before = store.len();
        let current = store.items().to_vec();

        let prompt = self.build_evolve_prompt(&current, context);
        let request = OracleRequest::new(self.role.system_prompt(), prompt)
            .with_temperature(self.role.temperature())
            .with_max_tokens(512);

        let (candidate, fell_back) = match self.oracle.invoke(request).await {
            Ok(response) => {
                let lines = sanitize_response(&response);
                if lines.is_empty() {
                    (current.clone(), true)
                } else {
                    (lines, false)
                }
            }
            Err(_) => (current.clone(), true),
        };

        let receipt = store.commit(candidate).await?;
        let summary = format!(
            "Evolved {}: {} (was {})",
            self.role.noun(),
            receipt.items.len(),
            before
        );

        Ok(EvolveReport {
            items: receipt.items,
            summary,
            fell_back,
        })
    }

    fn build_evolve_prompt(&self, current: &[String], context: &str) -> String {
        let listing = if current.is_empty() {
            format!("(no {} yet)", self.role.noun())
        } else {
            current.join("\n")
        };

        let preview: String = context
            .chars()
            .take(self.role.context_preview_chars())
            .collect();

        format!(
            "Current {} ({} items):\n{}\n\n{}\n\n{}",
            self.role.noun(),
            current.len(),
            listing,
            preview,
            self.role.evolve_recap()
        )
    }
}
