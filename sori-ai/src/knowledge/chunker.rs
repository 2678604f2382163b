//! Paragraph-aware chunking with overlap
//!
//! Paragraphs (separated by a blank line) are packed into chunks of at most
//! `max_chars` characters. When a chunk closes, its last `overlap` characters
//! open the next one. A run that still exceeds the budget is hard-cut into
//! windows of `max_chars` stepping by `max_chars - overlap`; the final window
//! stays open for the following paragraphs.
//!
//! Lengths and offsets are counted in characters, not bytes.

/// Paragraph separator
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Chunking limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub max_chars: usize,
    /// Must be smaller than `max_chars`
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_chars: 1100,
            overlap: 180,
        }
    }
}

/// One chunk of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    /// Start position in the page text (characters)
    pub char_offset: usize,
    /// Leading characters shared with the previous chunk
    pub overlap_chars: usize,
}

/// Page text as chunked: trimmed paragraphs joined by one blank line
pub fn normalize_paragraphs(text: &str) -> String {
    text.split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_BREAK)
}

/// Split page text into overlapping chunks
pub fn chunk_text(text: &str, params: ChunkParams) -> Vec<TextChunk> {
    let max = params.max_chars.max(1);
    let overlap = params.overlap.min(max - 1);

    let normalized = normalize_paragraphs(text);
    let chars: Vec<char> = normalized.chars().collect();
    let spans = paragraph_spans(&chars);

    let mut out = ChunkSink::new(&chars);
    // Open chunk as [start, end) in characters
    let mut open: Option<(usize, usize)> = None;

    for (p_start, p_end) in spans {
        open = Some(match open {
            None => (p_start, p_end),
            // Paragraphs are contiguous, so the merged length is p_end - start
            Some((start, _)) if p_end - start <= max => (start, p_end),
            Some((start, end)) => {
                out.emit(start, end);
                let next_start = if overlap == 0 {
                    p_start
                } else {
                    let mut s = end.saturating_sub(overlap).max(start);
                    while s < end && chars[s].is_whitespace() {
                        s += 1;
                    }
                    s
                };
                (next_start, p_end)
            }
        });

        while let Some((start, end)) = open {
            if end - start <= max {
                break;
            }
            out.emit(start, start + max);
            open = Some((start + max - overlap, end));
        }
    }

    if let Some((start, end)) = open {
        out.emit(start, end);
    }
    out.chunks
}

/// Rebuild page text from its chunks
///
/// Overlapping prefixes are dropped; a chunk that starts past the end of its
/// predecessor is joined with a paragraph break.
pub fn reconstruct(chunks: &[TextChunk]) -> String {
    let mut text = String::new();
    let mut end = 0usize;

    for (i, chunk) in chunks.iter().enumerate() {
        let len = chunk.text.chars().count();
        if i > 0 && chunk.overlap_chars == 0 && chunk.char_offset > end {
            text.push_str(PARAGRAPH_BREAK);
        }
        text.extend(chunk.text.chars().skip(chunk.overlap_chars));
        end = chunk.char_offset + len;
    }
    text
}

/// Character spans of paragraphs in normalized text
fn paragraph_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i] == '\n' && chars[i + 1] == '\n' {
            spans.push((start, i));
            i += 2;
            start = i;
        } else {
            i += 1;
        }
    }
    if start < chars.len() {
        spans.push((start, chars.len()));
    }
    spans
}

struct ChunkSink<'a> {
    chars: &'a [char],
    chunks: Vec<TextChunk>,
    last_end: usize,
}

impl<'a> ChunkSink<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self {
            chars,
            chunks: Vec::new(),
            last_end: 0,
        }
    }

    fn emit(&mut self, start: usize, end: usize) {
        let overlap_chars = if self.chunks.is_empty() {
            0
        } else {
            self.last_end.saturating_sub(start)
        };
        self.chunks.push(TextChunk {
            text: self.chars[start..end].iter().collect(),
            char_offset: start,
            overlap_chars,
        });
        self.last_end = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_chars: usize, overlap: usize) -> ChunkParams {
        ChunkParams { max_chars, overlap }
    }

    fn korean_paragraphs(count: usize, len: usize) -> String {
        (0..count)
            .map(|i| {
                let word = ["호흡", "수면", "산책", "휴식"][i % 4];
                let mut p = format!("{}번 문단 {}", i + 1, word);
                while p.chars().count() < len {
                    p.push_str(" 가나다");
                }
                p.chars().take(len).collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("첫 문단\n\n둘째 문단", params(100, 20));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "첫 문단\n\n둘째 문단");
        assert_eq!(chunks[0].overlap_chars, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", ChunkParams::default()).is_empty());
        assert!(chunk_text("\n\n  \n\n", ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_chunks_respect_budget_and_carry_overlap() {
        let text = korean_paragraphs(12, 90);
        let chunks = chunk_text(&text, params(300, 40));

        assert!(chunks.len() > 3);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 300);
        }
        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count() - pair[1].overlap_chars)
                .collect();
            let next_head: String = pair[1].text.chars().take(pair[1].overlap_chars).collect();
            assert_eq!(prev_tail, next_head);
            assert!(pair[1].overlap_chars > 0 && pair[1].overlap_chars <= 40);
        }
    }

    #[test]
    fn test_reconstruction_round_trip() {
        for (max, overlap) in [(300, 40), (120, 0), (500, 180), (50, 10)] {
            let text = korean_paragraphs(9, 130);
            let chunks = chunk_text(&text, params(max, overlap));
            assert_eq!(reconstruct(&chunks), text, "max {} overlap {}", max, overlap);
        }
    }

    #[test]
    fn test_long_paragraph_is_hard_cut() {
        let text: String = std::iter::repeat('가').take(250).collect();
        let chunks = chunk_text(&text, params(100, 20));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].char_offset, 0);
        assert_eq!(chunks[1].char_offset, 80);
        assert_eq!(chunks[2].char_offset, 160);
        assert_eq!(chunks[2].text.chars().count(), 90);
        assert!(chunks.iter().skip(1).all(|c| c.overlap_chars == 20));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_zero_overlap_joins_on_paragraph_break() {
        let chunks = chunk_text("가나다라\n\n마바사아", params(6, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].char_offset, 6);
        assert_eq!(chunks[1].overlap_chars, 0);
        assert_eq!(reconstruct(&chunks), "가나다라\n\n마바사아");
    }

    #[test]
    fn test_normalizes_extra_blank_lines() {
        let chunks = chunk_text("  가 \n\n\n\n나  ", params(100, 10));
        assert_eq!(chunks[0].text, "가\n\n나");
    }
}
