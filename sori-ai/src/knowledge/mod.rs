//! Knowledge base: reference documents → chunk index → retrieval

pub mod chunker;
pub mod cleaner;
pub mod indexer;
pub mod loader;
pub mod retriever;
pub mod signature;

pub use chunker::{chunk_text, reconstruct, ChunkParams, TextChunk};
pub use cleaner::clean_page;
pub use indexer::{ChunkIndex, IndexParams, IndexedChunk, KnowledgeIndexer};
pub use loader::{collect_files, find_default_documents, load_document, load_documents, SourceDocument};
pub use retriever::{search, ChunkMatch, Retriever};
pub use signature::{similarity, SignatureScheme, SimilaritySignature};
