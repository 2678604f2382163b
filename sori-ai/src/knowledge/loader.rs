//! Reference document loading
//!
//! - Text-like files (`.txt`, `.md`) are read as UTF-8 (lossy) and split into
//!   pages on form feed characters.
//! - PDF files yield one page per PDF page, in page order. A page whose text
//!   cannot be extracted stays in place as an empty page so later page
//!   numbers keep their positions.
//!
//! Anything else yields a document with no pages and a warning; an empty
//! document simply contributes no chunks.

use crate::error::{Result, SoriError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions read as plain text
const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

const PDF_EXTENSION: &str = "pdf";
const PDF_MIME: &str = "application/pdf";

/// Page separator in extracted text
const PAGE_BREAK: char = '\u{000C}';

/// A reference document split into pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Display name (file name)
    pub source: String,
    /// Page texts in order; page numbers are 1-based positions
    pub pages: Vec<String>,
}

impl SourceDocument {
    /// Document from already extracted text
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        Self {
            source: source.into(),
            pages: text.split(PAGE_BREAK).map(str::to_string).collect(),
        }
    }

    /// Document from raw bytes; format chosen by file name and content sniffing
    pub fn from_bytes(source: impl Into<String>, bytes: &[u8]) -> Self {
        let source = source.into();

        if is_text_name(&source) {
            return Self::from_text(source, &String::from_utf8_lossy(bytes));
        }

        let detected = infer::get(bytes).map(|kind| kind.mime_type());
        if has_extension(&source, PDF_EXTENSION) || detected == Some(PDF_MIME) {
            return Self::from_pdf(source, bytes);
        }
        if detected.is_none() && std::str::from_utf8(bytes).is_ok() {
            debug!(source = %source, "Treating unrecognized UTF-8 document as text");
            return Self::from_text(source, &String::from_utf8_lossy(bytes));
        }

        warn!(
            source = %source,
            mime = detected.unwrap_or("unknown"),
            "Unsupported document format, no text extracted"
        );
        Self {
            source,
            pages: Vec::new(),
        }
    }

    /// Document from PDF bytes, one entry per PDF page
    ///
    /// An unreadable PDF yields no pages and a warning.
    pub fn from_pdf(source: impl Into<String>, bytes: &[u8]) -> Self {
        let source = source.into();
        let pages = match extract_pdf_pages(bytes) {
            Ok(pages) => {
                debug!(source = %source, pages = pages.len(), "Extracted PDF text");
                pages
            }
            Err(e) => {
                warn!(source = %source, error = %e, "Failed to read PDF, no text extracted");
                Vec::new()
            }
        };
        Self { source, pages }
    }

    /// Whether any page has non-whitespace text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.trim().is_empty())
    }
}

fn is_text_name(name: &str) -> bool {
    TEXT_EXTENSIONS.iter().any(|ext| has_extension(name, ext))
}

fn has_extension(name: &str, wanted: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

/// Text of every PDF page in page order
fn extract_pdf_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages = document
        .get_pages()
        .into_keys()
        .map(|number| match document.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                debug!(page = number, error = %e, "No extractable text on PDF page");
                String::new()
            }
        })
        .collect();
    Ok(pages)
}

/// Load one document from disk
///
/// # Errors
/// `PathNotFound` when the file does not exist, `Io` when it cannot be read
pub fn load_document(path: &Path) -> Result<SourceDocument> {
    if !path.exists() {
        return Err(SoriError::PathNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceDocument::from_bytes(name, &bytes))
}

/// Files under a path: the path itself, or a sorted recursive listing
///
/// Hidden entries are skipped. Unreadable entries are logged and skipped.
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(SoriError::PathNotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Error accessing knowledge entry"),
        }
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Default document set: `<root>/knowledge` plus configured paths
///
/// A missing `<root>/knowledge` is not an error; a missing configured path is
/// logged and skipped.
pub fn find_default_documents(root: &Path, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let knowledge_dir = root.join("knowledge");
    if knowledge_dir.is_dir() {
        match collect_files(&knowledge_dir) {
            Ok(found) => files.extend(found),
            Err(e) => warn!(path = %knowledge_dir.display(), error = %e, "Knowledge folder scan failed"),
        }
    }

    for path in extra {
        match collect_files(path) {
            Ok(found) => files.extend(found),
            Err(e) => warn!(path = %path.display(), error = %e, "Configured knowledge path skipped"),
        }
    }

    debug!(count = files.len(), "Knowledge documents discovered");
    files
}

/// Load every document in `paths`, skipping unreadable files
pub fn load_documents(paths: &[PathBuf]) -> Vec<SourceDocument> {
    paths
        .iter()
        .filter_map(|path| match load_document(path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load knowledge document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_split_on_form_feed() {
        let doc = SourceDocument::from_text("guide.txt", "첫 페이지\u{000C}둘째 페이지");
        assert_eq!(doc.pages, vec!["첫 페이지", "둘째 페이지"]);
    }

    #[test]
    fn test_markdown_bytes_are_text() {
        let doc = SourceDocument::from_bytes("notes.MD", "# 호흡\n\n천천히".as_bytes());
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.has_text());
    }

    #[test]
    fn test_truncated_pdf_yields_no_pages() {
        let doc = SourceDocument::from_bytes("guide.pdf", b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj");
        assert!(doc.pages.is_empty());
        assert!(!doc.has_text());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_document(Path::new("/nonexistent/knowledge.txt"));
        assert!(matches!(result, Err(SoriError::PathNotFound(_))));
    }

    #[test]
    fn test_default_documents_sorted_and_hidden_skipped() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("knowledge");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("b.txt"), "b").unwrap();
        std::fs::write(dir.join("a.md"), "a").unwrap();
        std::fs::write(dir.join("sub").join("c.txt"), "c").unwrap();
        std::fs::write(dir.join(".hidden.txt"), "h").unwrap();

        let files = find_default_documents(root.path(), &[]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt", "c.txt"]);

        let docs = load_documents(&files);
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].source, "a.md");
    }

    #[test]
    fn test_missing_knowledge_folder_is_empty() {
        let root = TempDir::new().unwrap();
        let extra = vec![root.path().join("missing.txt")];
        assert!(find_default_documents(root.path(), &extra).is_empty());
    }
}
