//! Knowledge Indexer
//!
//! Turns reference documents into a searchable [`ChunkIndex`]:
//! page → clean → chunk → signature. Building is deterministic, so the same
//! documents and parameters always give the same index and content hash.

use crate::knowledge::chunker::{chunk_text, ChunkParams};
use crate::knowledge::cleaner::clean_page;
use crate::knowledge::loader::SourceDocument;
use crate::knowledge::signature::{SignatureScheme, SimilaritySignature};
use sha2::{Digest, Sha256};
use sori_common::config::{KnowledgeConfig, SignatureKind};
use tracing::{debug, info};

/// Indexing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexParams {
    pub chunk: ChunkParams,
    pub max_vocabulary: usize,
    pub signature: SignatureKind,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self::from(&KnowledgeConfig::default())
    }
}

impl From<&KnowledgeConfig> for IndexParams {
    fn from(config: &KnowledgeConfig) -> Self {
        Self {
            chunk: ChunkParams {
                max_chars: config.chunk_max_chars,
                overlap: config.chunk_overlap,
            },
            max_vocabulary: config.max_vocabulary,
            signature: config.signature,
        }
    }
}

/// One indexed chunk
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    /// Position in the index (insertion order)
    pub ordinal: usize,
    pub source: String,
    /// 1-based page number
    pub page: usize,
    pub char_offset: usize,
    pub overlap_chars: usize,
    pub text: String,
    pub signature: SimilaritySignature,
}

/// Immutable searchable index
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkIndex {
    chunks: Vec<IndexedChunk>,
    scheme: SignatureScheme,
    content_hash: String,
}

impl ChunkIndex {
    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn scheme(&self) -> &SignatureScheme {
        &self.scheme
    }

    /// SHA-256 of the indexed documents and parameters (hex)
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// Builds chunk indexes
#[derive(Debug, Clone, Default)]
pub struct KnowledgeIndexer {
    params: IndexParams,
}

impl KnowledgeIndexer {
    pub fn new(params: IndexParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    /// Hash identifying an index built from `documents` with these parameters
    pub fn content_hash(&self, documents: &[SourceDocument]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}:{}:{}:{:?}",
                self.params.chunk.max_chars,
                self.params.chunk.overlap,
                self.params.max_vocabulary,
                self.params.signature
            )
            .as_bytes(),
        );
        for doc in documents {
            hasher.update(doc.source.as_bytes());
            hasher.update([0u8]);
            for page in &doc.pages {
                hasher.update(page.as_bytes());
                hasher.update([0x0Cu8]);
            }
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Build an index; documents without usable text contribute nothing
    pub fn build(&self, documents: &[SourceDocument]) -> ChunkIndex {
        let mut pending = Vec::new();

        for doc in documents {
            for (page_index, raw) in doc.pages.iter().enumerate() {
                let cleaned = clean_page(raw);
                if cleaned.is_empty() {
                    continue;
                }
                for chunk in chunk_text(&cleaned, self.params.chunk) {
                    pending.push((doc.source.clone(), page_index + 1, chunk));
                }
            }
        }

        let texts: Vec<&str> = pending.iter().map(|(_, _, c)| c.text.as_str()).collect();
        let scheme = SignatureScheme::fit(self.params.signature, &texts, self.params.max_vocabulary);

        let chunks: Vec<IndexedChunk> = pending
            .into_iter()
            .enumerate()
            .map(|(ordinal, (source, page, chunk))| IndexedChunk {
                ordinal,
                signature: scheme.signature(&chunk.text),
                source,
                page,
                char_offset: chunk.char_offset,
                overlap_chars: chunk.overlap_chars,
                text: chunk.text,
            })
            .collect();

        let content_hash = self.content_hash(documents);

        if chunks.is_empty() {
            debug!(documents = documents.len(), "No usable knowledge text, index is empty");
        } else {
            info!(
                documents = documents.len(),
                chunks = chunks.len(),
                signature = ?scheme.kind(),
                "Knowledge index built"
            );
        }

        ChunkIndex {
            chunks,
            scheme,
            content_hash,
        }
    }
}
