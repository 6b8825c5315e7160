//! Per-owner save index.
//!
//! The index is a recency-ordered list of [`SaveSummary`] values. It is the
//! same structure on the server and in the client mirror; only the
//! `storage_location` of its entries differs.

use serde::{Deserialize, Serialize};

use crate::model::SaveSummary;

/// Ordered catalog of one owner's saves, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveIndex {
    #[serde(default = "current_index_version")]
    version: u32,
    #[serde(default)]
    saves: Vec<SaveSummary>,
}

fn current_index_version() -> u32 {
    SaveIndex::VERSION
}

impl SaveIndex {
    /// Current artifact version.
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            saves: Vec::new(),
        }
    }

    /// Build an index from unordered summaries. Later duplicates of a
    /// save id replace earlier ones.
    pub fn from_summaries(summaries: impl IntoIterator<Item = SaveSummary>) -> Self {
        let mut index = Self::new();
        for summary in summaries {
            index.upsert(summary);
        }
        index
    }

    /// Parse an index artifact.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let mut index: SaveIndex = serde_json::from_slice(bytes)?;
        index.sort();
        Ok(index)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Insert or replace the entry for `summary.save_id`.
    ///
    /// A replacement never moves the entry's timestamp backward.
    pub fn upsert(&mut self, mut summary: SaveSummary) {
        if let Some(previous) = self.remove(&summary.save_id) {
            if previous.timestamp > summary.timestamp {
                summary.timestamp = previous.timestamp;
            }
        }
        self.saves.push(summary);
        self.sort();
    }

    /// Remove the entry for `save_id`, returning it if present.
    pub fn remove(&mut self, save_id: &str) -> Option<SaveSummary> {
        let position = self.saves.iter().position(|s| s.save_id == save_id)?;
        Some(self.saves.remove(position))
    }

    /// Look up an entry.
    pub fn get(&self, save_id: &str) -> Option<&SaveSummary> {
        self.saves.iter().find(|s| s.save_id == save_id)
    }

    pub fn contains(&self, save_id: &str) -> bool {
        self.get(save_id).is_some()
    }

    /// Keep only the entries for which `keep` returns true. Returns the
    /// removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<SaveSummary>
    where
        F: FnMut(&SaveSummary) -> bool,
    {
        let (kept, removed): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.saves).into_iter().partition(|s| keep(s));
        self.saves = kept;
        removed
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[SaveSummary] {
        &self.saves
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    // Descending timestamp; ties broken by id so the order is stable
    // across processes.
    fn sort(&mut self) {
        self.saves.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.save_id.cmp(&b.save_id))
        });
    }
}

impl Default for SaveIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for SaveIndex {
    type Item = SaveSummary;
    type IntoIter = std::vec::IntoIter<SaveSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.saves.into_iter()
    }
}
