//! User session context
//!
//! Everything the pipeline remembers between submissions for one user: the
//! prosody baseline, the entries recorded so far and the cached knowledge
//! index. Nothing is persisted here; the caller stores entry records.

use crate::knowledge::{ChunkIndex, KnowledgeIndexer, SourceDocument};
use crate::models::EntryRecord;
use crate::voice::BaselineTracker;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-user state
#[derive(Debug, Default)]
pub struct UserSession {
    baseline: BaselineTracker,
    entries: Vec<EntryRecord>,
    knowledge: Option<Arc<ChunkIndex>>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session from previously stored entries
    pub fn with_entries(entries: Vec<EntryRecord>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn baseline(&self) -> &BaselineTracker {
        &self.baseline
    }

    pub fn baseline_mut(&mut self) -> &mut BaselineTracker {
        &mut self.baseline
    }

    /// Forget the prosody baseline; the next voice entry seeds it again
    pub fn reset_baseline(&mut self) {
        info!(updates = self.baseline.count(), "Prosody baseline reset");
        self.baseline.reset();
    }

    pub fn entries(&self) -> &[EntryRecord] {
        &self.entries
    }

    /// Last `n` entries, oldest first
    pub fn recent_entries(&self, n: usize) -> &[EntryRecord] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn next_entry_id(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    pub fn push_entry(&mut self, entry: EntryRecord) {
        self.entries.push(entry);
    }

    /// Current knowledge index, if one was built
    pub fn knowledge(&self) -> Option<Arc<ChunkIndex>> {
        self.knowledge.clone()
    }

    /// Cached index for `documents`, building it on first use or when the
    /// documents or parameters changed
    pub fn knowledge_for(
        &mut self,
        indexer: &KnowledgeIndexer,
        documents: &[SourceDocument],
    ) -> Arc<ChunkIndex> {
        if let Some(index) = &self.knowledge {
            if index.content_hash() == indexer.content_hash(documents) {
                debug!(hash = %index.content_hash(), "Using cached knowledge index");
                return Arc::clone(index);
            }
        }
        self.rebuild_knowledge(indexer, documents)
    }

    /// Build and install a fresh index unconditionally
    pub fn rebuild_knowledge(
        &mut self,
        indexer: &KnowledgeIndexer,
        documents: &[SourceDocument],
    ) -> Arc<ChunkIndex> {
        let index = Arc::new(indexer.build(documents));
        self.knowledge = Some(Arc::clone(&index));
        index
    }

    /// Drop the cached index
    pub fn clear_knowledge(&mut self) {
        self.knowledge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawAudioFeatures;

    fn docs(text: &str) -> Vec<SourceDocument> {
        vec![SourceDocument::from_text("guide.txt", text)]
    }

    #[test]
    fn test_index_is_cached_by_content() {
        let mut session = UserSession::new();
        let indexer = KnowledgeIndexer::default();

        let first = session.knowledge_for(&indexer, &docs("호흡 훈련"));
        let second = session.knowledge_for(&indexer, &docs("호흡 훈련"));
        assert!(Arc::ptr_eq(&first, &second));

        let changed = session.knowledge_for(&indexer, &docs("햇빛 산책"));
        assert!(!Arc::ptr_eq(&first, &changed));
        assert!(Arc::ptr_eq(&changed, &session.knowledge().unwrap()));
    }

    #[test]
    fn test_rebuild_replaces_index() {
        let mut session = UserSession::new();
        let indexer = KnowledgeIndexer::default();
        let first = session.knowledge_for(&indexer, &docs("호흡"));
        let rebuilt = session.rebuild_knowledge(&indexer, &docs("호흡"));
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*first, *rebuilt);

        session.clear_knowledge();
        assert!(session.knowledge().is_none());
    }

    #[test]
    fn test_reset_baseline() {
        let mut session = UserSession::new();
        session.baseline_mut().update(&RawAudioFeatures::default());
        assert_eq!(session.baseline().count(), 1);
        session.reset_baseline();
        assert!(session.baseline().is_empty());
    }

    #[test]
    fn test_entry_ids_and_recent_window() {
        let session = UserSession::new();
        assert_eq!(session.next_entry_id(), 1);
        assert!(session.recent_entries(7).is_empty());
    }
}
