//! Knowledge indexing and retrieval over files on disk

mod helpers;

use helpers::generate_test_pdf;
use sori_ai::knowledge::{
    find_default_documents, load_document, load_documents, reconstruct, ChunkParams, IndexParams,
    KnowledgeIndexer, Retriever, SourceDocument, TextChunk,
};
use sori_ai::models::UserSession;
use sori_common::config::SignatureKind;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const SLEEP_GUIDE: &str = "수면 위생\n\n잠들기 한 시간 전에는 화면을 끄고 조명을 낮춥니다.\n\n\
매일 같은 시간에 일어나면 생체 리듬이 안정됩니다.";

const BREATHING_GUIDE: &str = "호흡 훈련\n\n4초 들이마시고 7초 멈춘 뒤 8초 동안 내쉽니다.\n\n\
긴장이 높을 때 세 번 반복하면 스트레스 완화에 도움이 됩니다.";

fn write_knowledge(root: &TempDir) -> PathBuf {
    let dir = root.path().join("knowledge");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("sleep.md"), SLEEP_GUIDE).unwrap();
    std::fs::write(dir.join("breathing.txt"), BREATHING_GUIDE).unwrap();
    std::fs::write(dir.join(".hidden.md"), "숨김 파일").unwrap();
    dir
}

fn small_indexer(signature: SignatureKind) -> KnowledgeIndexer {
    KnowledgeIndexer::new(IndexParams {
        chunk: ChunkParams {
            max_chars: 60,
            overlap: 10,
        },
        max_vocabulary: 512,
        signature,
    })
}

#[test]
fn test_default_documents_come_from_knowledge_folder() {
    let root = TempDir::new().unwrap();
    write_knowledge(&root);

    let paths = find_default_documents(root.path(), &[]);
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["breathing.txt", "sleep.md"]);
}

#[test]
fn test_missing_extra_path_is_skipped() {
    let root = TempDir::new().unwrap();
    write_knowledge(&root);
    let paths = find_default_documents(root.path(), &[root.path().join("missing.md")]);
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_search_finds_relevant_document() {
    let root = TempDir::new().unwrap();
    write_knowledge(&root);
    let documents = load_documents(&find_default_documents(root.path(), &[]));

    for signature in [SignatureKind::TfIdf, SignatureKind::NGram] {
        let index = small_indexer(signature).build(&documents);
        assert!(index.len() >= 2);

        let matches = Retriever::new(3).search("스트레스 완화 호흡", &index);
        assert!(!matches.is_empty(), "no match with {:?}", signature);
        assert_eq!(matches[0].source, "breathing.txt");
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(matches.len() <= 3);
    }
}

#[test]
fn test_chunks_reconstruct_each_document() {
    let root = TempDir::new().unwrap();
    write_knowledge(&root);
    let documents = load_documents(&find_default_documents(root.path(), &[]));
    let index = small_indexer(SignatureKind::TfIdf).build(&documents);

    for document in &documents {
        let chunks: Vec<TextChunk> = index
            .chunks()
            .iter()
            .filter(|c| c.source == document.source)
            .map(|c| TextChunk {
                text: c.text.clone(),
                char_offset: c.char_offset,
                overlap_chars: c.overlap_chars,
            })
            .collect();
        assert!(!chunks.is_empty());

        let expected = match document.source.as_str() {
            "sleep.md" => SLEEP_GUIDE,
            _ => BREATHING_GUIDE,
        };
        assert_eq!(reconstruct(&chunks), expected);
    }
}

#[test]
fn test_empty_corpus_yields_empty_search() {
    let index = KnowledgeIndexer::default().build(&[]);
    assert_eq!(index.len(), 0);
    assert!(Retriever::default().search("수면", &index).is_empty());
}

#[test]
fn test_session_reuses_index_until_documents_change() {
    let root = TempDir::new().unwrap();
    let dir = write_knowledge(&root);
    let indexer = small_indexer(SignatureKind::TfIdf);
    let mut session = UserSession::new();

    let documents = load_documents(&find_default_documents(root.path(), &[]));
    let first = session.knowledge_for(&indexer, &documents);
    let again = session.knowledge_for(&indexer, &documents);
    assert!(Arc::ptr_eq(&first, &again));

    std::fs::write(dir.join("sleep.md"), "낮잠은 20분 이내로 짧게 잡습니다.").unwrap();
    let documents = load_documents(&find_default_documents(root.path(), &[]));
    let rebuilt = session.knowledge_for(&indexer, &documents);
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_ne!(first.content_hash(), rebuilt.content_hash());
}

#[test]
fn test_pdf_pages_are_indexed_with_page_numbers() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("knowledge");
    std::fs::create_dir_all(&dir).unwrap();
    let pdf = generate_test_pdf(&[
        "Sleep hygiene keeps a regular wake time",
        "Slow breathing eases stress and tension",
        "A short walk outside restores energy",
    ])
    .unwrap();
    std::fs::write(dir.join("wellbeing.pdf"), &pdf).unwrap();

    let document = load_document(&dir.join("wellbeing.pdf")).unwrap();
    assert_eq!(document.pages.len(), 3);
    assert!(document.pages[1].contains("breathing"));

    let documents = load_documents(&find_default_documents(root.path(), &[]));
    let index = KnowledgeIndexer::default().build(&documents);
    let pages: Vec<usize> = index.chunks().iter().map(|c| c.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);

    let matches = Retriever::new(1).search("breathing stress", &index);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source, "wellbeing.pdf");
    assert_eq!(matches[0].page, 2);
}

#[test]
fn test_pdf_detected_without_extension() {
    let pdf = generate_test_pdf(&["first page", "second page"]).unwrap();
    let document = SourceDocument::from_bytes("download", &pdf);
    assert_eq!(document.pages.len(), 2);
    assert!(document.pages[1].contains("second"));
}
