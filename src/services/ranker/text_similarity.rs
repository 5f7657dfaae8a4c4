//! TF-IDF cosine similarity over an ad hoc corpus.
//!
//! The vocabulary and document frequencies come from the documents passed to
//! [`TfIdfIndex::fit`], so the same query can score differently against a
//! different candidate set. Weighting follows the usual smoothed form:
//! `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, raw term counts, L2-normalized
//! vectors.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Lowercased word tokens of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Ordered so that dot products and norms sum in a fixed order.
type SparseVector = BTreeMap<usize, f64>;

pub struct TfIdfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<SparseVector>,
}

impl TfIdfIndex {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = HashSet::new();
            for token in tokens {
                let next = vocabulary.len();
                let index = *vocabulary.entry(token.clone()).or_insert(next);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if seen.insert(index) {
                    document_frequency[index] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = TfIdfIndex {
            vocabulary,
            idf,
            documents: Vec::with_capacity(tokenized.len()),
        };
        index.documents = tokenized.iter().map(|t| index.vectorize(t)).collect();
        index
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine similarity of `query` against every fitted document, in input
    /// order. Terms unseen in the corpus are ignored; an empty vocabulary or
    /// query yields zeros.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let query_vector = self.vectorize(&tokenize(query));
        if query_vector.is_empty() {
            return vec![0.0; self.documents.len()];
        }
        self.documents
            .iter()
            .map(|doc| {
                let dot: f64 = query_vector
                    .iter()
                    .filter_map(|(term, q)| doc.get(term).map(|d| q * d))
                    .sum();
                dot.clamp(0.0, 1.0)
            })
            .collect()
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut vector = SparseVector::new();
        for token in tokens {
            if let Some(&term) = self.vocabulary.get(token) {
                *vector.entry(term).or_insert(0.0) += 1.0;
            }
        }
        for (term, weight) in vector.iter_mut() {
            *weight *= self.idf[*term];
        }
        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(
            tokenize("Phở bò, a B-52 café!"),
            vec!["phở", "bò", "52", "café"]
        );
    }

    #[test]
    fn test_identical_document_scores_one() {
        let index = TfIdfIndex::fit(&["rooftop bar view", "noodle soup", "street food market"]);
        let sims = index.similarities("noodle soup");
        assert!((sims[1] - 1.0).abs() < 1e-9);
        assert_eq!(sims[0], 0.0);
        assert_eq!(sims[2], 0.0);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let docs = [
            "coffee shop coffee",
            "coffee roastery garden",
            "coffee and cake",
        ];
        let index = TfIdfIndex::fit(&docs);
        // "garden" appears in one document, "coffee" in all three
        let sims = index.similarities("coffee garden");
        assert!(sims[1] > sims[0]);
        assert!(sims[1] > sims[2]);
    }

    #[test]
    fn test_unknown_query_terms_score_zero() {
        let index = TfIdfIndex::fit(&["museum", "pagoda"]);
        assert_eq!(index.similarities("karaoke"), vec![0.0, 0.0]);
        assert_eq!(index.similarities(""), vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_corpus_text() {
        let index = TfIdfIndex::fit(&["", "x"]);
        assert_eq!(index.vocabulary_size(), 0);
        assert_eq!(index.similarities("anything"), vec![0.0, 0.0]);
    }
}
