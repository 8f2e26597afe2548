//! Bounded text stores with enforced size invariants.
//!
//! A [`BoundedStore`] holds an ordered list of single-line phrases,
//! persisted one item per line. Oracle output is free text; the commit
//! path sanitizes it, re-injects any protected core phrases, and clamps
//! the result to the store's size range before anything touches disk.
//! Size limits are hard because the list is fed verbatim into future
//! generation prompts.

use crate::error::{StoreError, StoreResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Size range a store must satisfy after every commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Minimum item count. Falling below it is flagged, never padded.
    pub min: usize,
    /// Maximum item count. Exceeding it is truncated from the tail.
    pub max: usize,
}

impl StoreLimits {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Receipt returned by [`BoundedStore::commit`].
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// The committed items, exactly as persisted.
    pub items: Vec<String>,

    /// Item count before this commit.
    pub before: usize,

    /// Candidate lines dropped by the size clamp.
    pub dropped: usize,

    /// The candidate sanitized to fewer than `min` items and was
    /// committed as-is rather than padded with fabricated content.
    pub under_minimum: bool,
}

/// An ordered, size-bounded list of short text items backed by a flat
/// text file (one item per line, UTF-8, trailing newline).
#[derive(Debug)]
pub struct BoundedStore {
    path: PathBuf,
    limits: StoreLimits,
    core: Vec<String>,
    items: Vec<String>,
}

impl BoundedStore {
    /// Create a store over the given file path. Call [`load`] before use.
    ///
    /// [`load`]: BoundedStore::load
    pub fn new(path: impl Into<PathBuf>, limits: StoreLimits) -> Self {
        Self {
            path: path.into(),
            limits,
            core: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Protect a set of phrases: every commit guarantees their presence.
    pub fn with_core<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core = phrases.into_iter().map(Into::into).collect();
        self
    }

    /// Read items from the backing file. A missing or empty file yields
    /// an empty store, not an error.
    pub async fn load(&mut self) -> StoreResult<&[String]> {
        self.items = match fs::read_to_string(&self.path).await {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(&self.items)
    }

    /// Current items, in order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The store's size range.
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Protected core phrases (may be empty).
    pub fn core(&self) -> &[String] {
        &self.core
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitize, clamp, persist, and adopt a candidate item list.
    ///
    /// Steps, in order: drop non-content lines; append any missing core
    /// phrase; drop later non-core items until the count fits `max`;
    /// flag (never pad) a result below `min`. Idempotent: committing an
    /// already-committed list returns it unchanged.
    pub async fn commit(&mut self, candidate: Vec<String>) -> StoreResult<CommitReceipt> {
        let before = self.items.len();

        let mut lines: Vec<String> = candidate
            .iter()
            .filter_map(|l| sanitize_line(l))
            .collect();

        for phrase in &self.core {
            if !lines.iter().any(|l| l == phrase) {
                lines.push(phrase.clone());
            }
        }

        let mut dropped = 0;
        while lines.len() > self.limits.max {
            // Later candidates go first; core phrases always survive.
            let victim = lines.iter().rposition(|l| !self.core.contains(l));
            match victim {
                Some(idx) => {
                    lines.remove(idx);
                    dropped += 1;
                }
                None => break,
            }
        }

        let under_minimum = lines.len() < self.limits.min;

        self.persist(&lines).await?;
        self.items = lines;

        Ok(CommitReceipt {
            items: self.items.clone(),
            before,
            dropped,
            under_minimum,
        })
    }

    /// Write items to disk via a temp file and rename, so other readers
    /// never observe a partial write.
    async fn persist(&self, lines: &[String]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Reduce free-form oracle output to candidate item lines.
///
/// Keeps content, discards scaffolding: blank lines, section headers,
/// and echoes of the instructions are dropped; bullet and numbering
/// markers are stripped from otherwise-valid items.
pub fn sanitize_response(text: &str) -> Vec<String> {
    text.lines().filter_map(sanitize_line).collect()
}

fn sanitize_line(line: &str) -> Option<String> {
    let mut line = line.trim();

    // Strip list markers but keep the item behind them.
    loop {
        let stripped = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .or_else(|| line.strip_prefix("\u{2022} "))
            .or_else(|| strip_number_marker(line));
        match stripped {
            Some(rest) => line = rest.trim_start(),
            None => break,
        }
    }

    if line.is_empty() {
        return None;
    }

    // Headers and prompt echoes are not content.
    if line.ends_with(':') {
        return None;
    }

    const INSTRUCTION_PREFIXES: [&str; 8] = [
        "Current ",
        "New experience",
        "Context:",
        "Instructions:",
        "Return ",
        "Please ",
        "Updated ",
        "Here ",
    ];
    if INSTRUCTION_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return None;
    }

    Some(line.to_string())
}

fn strip_number_marker(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn open_store(dir: &TempDir, name: &str, limits: StoreLimits) -> BoundedStore {
        let mut store = BoundedStore::new(dir.path().join(name), limits);
        store.load().await.expect("load should succeed");
        store
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, "topics.txt", StoreLimits::new(5, 6)).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_commit_truncates_from_tail() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, "topics.txt", StoreLimits::new(2, 3)).await;

        let receipt = store
            .commit(lines(&["one", "two", "three", "four", "five"]))
            .await
            .unwrap();

        assert_eq!(receipt.items, lines(&["one", "two", "three"]));
        assert_eq!(receipt.dropped, 2);
        assert!(!receipt.under_minimum);
    }

    #[tokio::test]
    async fn test_commit_injects_missing_core() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, "emotions.txt", StoreLimits::new(4, 5))
            .await
            .with_core(["Wonder and curiosity", "Melancholy hope", "Quiet intensity"]);

        // Oracle dropped every core phrase; the clamp restores them and
        // keeps the earliest novel lines.
        let receipt = store
            .commit(lines(&[
                "Fierce longing",
                "Restless awe",
                "Bitter nostalgia",
                "Gentle defiance",
                "Electric dread",
                "Weightless joy",
                "Slow burning anger",
            ]))
            .await
            .unwrap();

        assert_eq!(receipt.items.len(), 5);
        for phrase in store.core() {
            assert!(receipt.items.contains(phrase), "missing core: {phrase}");
        }
        assert_eq!(receipt.items[0], "Fierce longing");
        assert_eq!(receipt.items[1], "Restless awe");
    }

    #[tokio::test]
    async fn test_commit_under_minimum_flagged_not_padded() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, "personality.txt", StoreLimits::new(10, 12)).await;

        let receipt = store.commit(lines(&["lone trait"])).await.unwrap();

        assert!(receipt.under_minimum);
        assert_eq!(receipt.items, lines(&["lone trait"]));
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, "emotions.txt", StoreLimits::new(4, 5))
            .await
            .with_core(["Wonder and curiosity"]);

        let first = store
            .commit(lines(&[
                "- Quiet intensity",
                "Melancholy hope",
                "",
                "Updated list:",
                "Restless awe",
                "Gentle defiance",
            ]))
            .await
            .unwrap();

        let second = store.commit(first.items.clone()).await.unwrap();
        assert_eq!(first.items, second.items);
        assert_eq!(second.dropped, 0);
    }

    #[tokio::test]
    async fn test_commit_persists_one_item_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("topics.txt");
        let mut store = BoundedStore::new(&path, StoreLimits::new(1, 3));
        store.load().await.unwrap();

        store.commit(lines(&["tidal locking", "slime molds"])).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "tidal locking\nslime molds\n");

        // A fresh store sees the same items.
        let mut reloaded = BoundedStore::new(&path, StoreLimits::new(1, 3));
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.items(), store.items());
    }

    #[test]
    fn test_sanitize_strips_markers_and_scaffolding() {
        let text = "Updated list (5-6 topics):\n\
                    - Deep sea bioluminescence\n\
                    * Urban rewilding\n\
                    1. Tidal locking\n\
                    2) Slime mold computing\n\
                    \n\
                    Here is the evolved list:\n\
                    Return ONLY the final list\n\
                    Fungal networks";

        let items = sanitize_response(text);
        assert_eq!(
            items,
            lines(&[
                "Deep sea bioluminescence",
                "Urban rewilding",
                "Tidal locking",
                "Slime mold computing",
                "Fungal networks",
            ])
        );
    }

    #[test]
    fn test_sanitize_keeps_items_resembling_prefixes() {
        let items = sanitize_response("Returning to the sea\nContextual storytelling");
        assert_eq!(
            items,
            lines(&["Returning to the sea", "Contextual storytelling"])
        );
    }
}
