//! Extraction noise cleanup for reference text
//!
//! Removes the debris left by text extraction (zero-width characters, odd
//! spaces, bullets and page numbers at line ends, footnote markers) while
//! keeping paragraph breaks, which the chunker relies on.

use once_cell::sync::Lazy;
use regex::Regex;

static ZERO_WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{200B}-\x{200D}\x{2060}\x{FEFF}\x{00AD}]").expect("Invalid regex"));

static UNICODE_SPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\t\x{00A0}\x{1680}\x{2000}-\x{200A}\x{202F}\x{205F}\x{3000}]")
        .expect("Invalid regex")
});

/// `[12]`, `[3-5]`, `[1, 4]`
static FOOTNOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\d{1,3}(?:\s*[-–,]\s*\d{1,3})*\]").expect("Invalid regex")
});

static SUPERSCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[⁰¹²³⁴⁵⁶⁷⁸⁹]+").expect("Invalid regex"));

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("Invalid regex"));

static TRAILING_BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" *[•·\-–—]+ *$").expect("Invalid regex"));

/// Standalone 1-3 digit number at line end
static TRAILING_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^| +)\d{1,3} *$").expect("Invalid regex"));

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// Clean one page of extracted text
///
/// Paragraphs in the result are separated by exactly one blank line.
pub fn clean_page(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = ZERO_WIDTH_RE.replace_all(&text, "");
    let text = UNICODE_SPACE_RE.replace_all(&text, " ");
    let text = FOOTNOTE_RE.replace_all(&text, "");
    let text = SUPERSCRIPT_RE.replace_all(&text, "");
    let text = MULTI_SPACE_RE.replace_all(&text, " ");

    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let line = TRAILING_BULLET_RE.replace(line, "");
            let line = TRAILING_PAGE_RE.replace(&line, "");
            line.trim().to_string()
        })
        .collect();

    let joined = lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}
