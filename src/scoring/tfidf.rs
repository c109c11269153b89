//! Bounded-vocabulary tf-idf vector space.
//!
//! Vocabulary is capped at `max_terms`, keeping the most frequent terms
//! of the base corpus (first-seen order breaks ties). Document vectors
//! are tf * idf with smoothed idf, L2-normalized. The centroid is the
//! element-wise mean over the base documents.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TfidfModel {
    index: HashMap<String, usize>,
    idf: Vec<f32>,
}

/// Lowercased alphanumeric terms of at least 2 characters.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|s| s.to_lowercase())
        .filter(|s| s.len() > 1)
        .collect()
}

impl TfidfModel {
    pub fn fit(corpus: &[String], max_terms: usize) -> Self {
        let docs: Vec<Vec<String>> = corpus.iter().map(|text| tokenize(text)).collect();

        // total term counts in first-seen order
        let mut order: Vec<String> = vec![];
        let mut totals: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in &docs {
            let mut seen_in_doc: Vec<&str> = vec![];
            for term in doc {
                if !totals.contains_key(term) {
                    order.push(term.clone());
                }
                *totals.entry(term.clone()).or_insert(0) += 1;
                if !seen_in_doc.contains(&term.as_str()) {
                    seen_in_doc.push(term);
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        // stable sort by total count keeps first-seen order on ties
        let mut ranked = order;
        ranked.sort_by(|a, b| totals[b].cmp(&totals[a]));
        ranked.truncate(max_terms);

        let n_docs = docs.len().max(1) as f32;
        let mut index = HashMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (slot, term) in ranked.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0) as f32;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            index.insert(term, slot);
        }

        TfidfModel { index, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.index.len()
    }

    /// L2-normalized tf-idf vector for one text. Terms outside the
    /// vocabulary are ignored.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.idf.len()];
        for term in tokenize(text) {
            if let Some(&slot) = self.index.get(&term) {
                vector[slot] += self.idf[slot];
            }
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }

    /// Element-wise mean vector over the given documents.
    pub fn centroid(&self, corpus: &[String]) -> Vec<f32> {
        let vectors: Vec<Vec<f32>> = corpus.iter().map(|text| self.transform(text)).collect();
        super::mean_vector(&vectors, self.idf.len())
    }
}
