//! Similarity signatures for knowledge chunks
//!
//! Two interchangeable schemes:
//! - **TF-IDF**: sparse term vectors (words plus Hangul bigrams) weighted by
//!   smoothed IDF over the indexed chunks, L2-normalized; cosine similarity
//! - **Character trigrams**: set of 3-character windows; Jaccard similarity
//!
//! Signatures from different schemes never match (similarity 0).

use once_cell::sync::Lazy;
use regex::Regex;
use sori_common::config::SignatureKind;
use std::collections::{BTreeMap, BTreeSet, HashMap};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("Invalid regex"));

/// Sparse L2-normalized term vector, sorted by term id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    fn from_weights(weights: BTreeMap<u32, f64>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm <= f64::EPSILON {
            return Self::default();
        }
        Self {
            entries: weights.into_iter().map(|(id, w)| (id, w / norm)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product by merging sorted entries
    fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_id, a_w) = self.entries[i];
            let (b_id, b_w) = other.entries[j];
            match a_id.cmp(&b_id) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Per-chunk (or per-query) similarity signature
#[derive(Debug, Clone, PartialEq)]
pub enum SimilaritySignature {
    TfIdf(SparseVector),
    NGramSet(BTreeSet<String>),
}

impl SimilaritySignature {
    /// Whether the signature can match anything
    pub fn is_empty(&self) -> bool {
        match self {
            SimilaritySignature::TfIdf(v) => v.is_empty(),
            SimilaritySignature::NGramSet(set) => set.is_empty(),
        }
    }
}

/// Similarity in [0, 1]; mismatched schemes score 0
pub fn similarity(a: &SimilaritySignature, b: &SimilaritySignature) -> f64 {
    match (a, b) {
        (SimilaritySignature::TfIdf(x), SimilaritySignature::TfIdf(y)) => x.dot(y).clamp(0.0, 1.0),
        (SimilaritySignature::NGramSet(x), SimilaritySignature::NGramSet(y)) => {
            let union = x.union(y).count();
            if union == 0 {
                return 0.0;
            }
            x.intersection(y).count() as f64 / union as f64
        }
        _ => 0.0,
    }
}

/// Term tokens: lowercase words plus character bigrams of Hangul words
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    for word in WORD_RE.find_iter(&lowered) {
        let word = word.as_str();
        tokens.push(word.to_string());

        let chars: Vec<char> = word.chars().collect();
        if chars.len() > 2 && chars.iter().any(|c| is_hangul(*c)) {
            for pair in chars.windows(2) {
                tokens.push(pair.iter().collect());
            }
        }
    }
    tokens
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Character trigrams over whitespace-collapsed lowercase text
pub fn char_trigrams(text: &str) -> BTreeSet<String> {
    let collapsed = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let chars: Vec<char> = collapsed.chars().collect();

    if chars.is_empty() {
        return BTreeSet::new();
    }
    if chars.len() < 3 {
        return BTreeSet::from([collapsed]);
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

/// Fitted TF-IDF vocabulary
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TfIdfModel {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
}

impl TfIdfModel {
    /// Fit over document texts, keeping at most `max_vocabulary` terms
    ///
    /// Terms are ranked by document frequency, ties broken alphabetically.
    /// IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit<S: AsRef<str>>(documents: &[S], max_vocabulary: usize) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: BTreeSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = document_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_vocabulary);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (id, (term, df)) in ranked.into_iter().enumerate() {
            vocabulary.insert(term, id as u32);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Normalized vector; out-of-vocabulary terms are ignored
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let mut weights: BTreeMap<u32, f64> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *weights.entry(id).or_insert(0.0) += self.idf[id as usize];
            }
        }
        SparseVector::from_weights(weights)
    }
}

/// Signature scheme of an index; queries must use the same one
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureScheme {
    TfIdf(TfIdfModel),
    NGram,
}

impl SignatureScheme {
    /// Fit the configured scheme over chunk texts
    pub fn fit<S: AsRef<str>>(kind: SignatureKind, texts: &[S], max_vocabulary: usize) -> Self {
        match kind {
            SignatureKind::TfIdf => SignatureScheme::TfIdf(TfIdfModel::fit(texts, max_vocabulary)),
            SignatureKind::NGram => SignatureScheme::NGram,
        }
    }

    pub fn kind(&self) -> SignatureKind {
        match self {
            SignatureScheme::TfIdf(_) => SignatureKind::TfIdf,
            SignatureScheme::NGram => SignatureKind::NGram,
        }
    }

    pub fn signature(&self, text: &str) -> SimilaritySignature {
        match self {
            SignatureScheme::TfIdf(model) => SimilaritySignature::TfIdf(model.vectorize(text)),
            SignatureScheme::NGram => SimilaritySignature::NGramSet(char_trigrams(text)),
        }
    }
}
