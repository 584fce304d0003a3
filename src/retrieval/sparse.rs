//! BM25 keyword index.

use crate::transcription::strip_timestamps;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Inverted index scored with Okapi BM25.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    /// term -> (position, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f32,
    k1: f32,
    b: f32,
}

impl Bm25Index {
    /// Index the given texts; position `i` is text `i`.
    pub fn build<S: AsRef<str>>(texts: &[S], k1: f32, b: f32) -> Self {
        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(texts.len());

        for (idx, text) in texts.iter().enumerate() {
            let tokens = tokenize(text.as_ref());
            doc_lens.push(tokens.len());

            let mut counts: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *counts.entry(token).or_insert(0) += 1;
            }
            for (term, tf) in counts {
                postings.entry(term).or_default().push((idx, tf));
            }
        }

        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f32 / doc_lens.len() as f32
        };

        Self {
            postings,
            doc_lens,
            avg_doc_len,
            k1,
            b,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    fn idf(&self, doc_freq: usize) -> f32 {
        let n = self.doc_lens.len() as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Score every document against the query and return the `k` best with a
    /// positive score, best first. Equal scores keep index order.
    pub fn search(&self, query: &str, k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scores = vec![0.0f32; self.doc_lens.len()];
        for term in tokenize(query) {
            let Some(postings) = self.postings.get(&term) else {
                continue;
            };
            let idf = self.idf(postings.len());
            for &(idx, tf) in postings {
                let tf = tf as f32;
                let len_norm = if self.avg_doc_len > 0.0 {
                    self.doc_lens[idx] as f32 / self.avg_doc_len
                } else {
                    1.0
                };
                let denom = tf + self.k1 * (1.0 - self.b + self.b * len_norm);
                scores[idx] += idf * (tf * (self.k1 + 1.0)) / denom;
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }
}

/// Lowercased word tokens with timestamp tags removed.
///
/// Alphanumeric runs form one token; each CJK character is a token of its own,
/// since those scripts are not space-delimited.
pub fn tokenize(text: &str) -> Vec<String> {
    let text = strip_timestamps(text).to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if is_cjk(c) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF     // hiragana, katakana
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xAC00..=0xD7AF   // hangul syllables
        | 0xF900..=0xFAFF)  // CJK compatibility ideographs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_timestamps() {
        let tokens = tokenize("[00:00:01.000] --> [00:00:04.000] Rust's Borrow-Checker!");
        assert_eq!(tokens, vec!["rust", "s", "borrow", "checker"]);
    }

    #[test]
    fn test_tokenize_cjk() {
        assert_eq!(tokenize("视频abc 内容"), vec!["视", "频", "abc", "内", "容"]);
    }

    #[test]
    fn test_bm25_prefers_matching_document() {
        let index = Bm25Index::build(
            &[
                "the weather is sunny today",
                "ownership and borrowing in rust",
                "rust rust rust ownership",
            ],
            1.5,
            0.75,
        );
        let hits = index.search("rust ownership", 3);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(idx, _)| *idx != 0));
        assert_eq!(hits[0].0, 2);
    }

    #[test]
    fn test_bm25_no_match_is_empty() {
        let index = Bm25Index::build(&["hello world"], 1.5, 0.75);
        assert!(index.search("goodbye", 3).is_empty());
    }

    #[test]
    fn test_bm25_single_document_scores_positive() {
        let index = Bm25Index::build(&["hello world test clip"], 1.5, 0.75);
        let hits = index.search("what is this clip about?", 3);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].1 > 0.0);
    }
}
