//! Similarity scoring for prospect ranking.
//!
//! Two interchangeable strategies map candidate texts to a raw similarity
//! against a centroid built from a base corpus:
//!
//! - `tfidf`: frequency-weighted lexical vector space (default)
//! - `embeddings`: fastembed sentence embeddings
//!
//! Normalization and seed blending live in `normalize`, outside the
//! strategies, so both methods share identical edge-case handling.

pub mod embeddings;
mod normalize;
mod tfidf;

pub use embeddings::{EmbeddingError, EmbeddingModel};
pub use normalize::{blend_seed, min_max_scale, round_to, scale_by_max};
pub use tfidf::TfidfModel;

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("strategy must be fitted before scoring")]
    NotFitted,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Caller-selected scoring method. Anything that isn't "tfidf" selects
/// the embedding method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Tfidf,
    Embedding,
}

impl Method {
    pub fn parse(value: &str) -> Method {
        if value == "tfidf" {
            Method::Tfidf
        } else {
            Method::Embedding
        }
    }
}

/// Fit a centroid on a base corpus, then score candidate texts against it.
pub trait ScoringStrategy {
    fn fit(&mut self, corpus: &[String]) -> Result<(), ScoringError>;
    fn score(&self, texts: &[String]) -> Result<Vec<f32>, ScoringError>;
}

/// An empty corpus would break vectorizer fitting; substitute a single
/// empty document instead.
fn non_empty(corpus: &[String]) -> Vec<String> {
    if corpus.is_empty() {
        vec![String::new()]
    } else {
        corpus.to_vec()
    }
}

/// Lexical strategy with a bounded vocabulary.
pub struct TfidfStrategy {
    max_terms: usize,
    fitted: Option<(TfidfModel, Vec<f32>)>,
}

impl TfidfStrategy {
    pub fn new(max_terms: usize) -> Self {
        Self {
            max_terms,
            fitted: None,
        }
    }
}

impl ScoringStrategy for TfidfStrategy {
    fn fit(&mut self, corpus: &[String]) -> Result<(), ScoringError> {
        let corpus = non_empty(corpus);
        let model = TfidfModel::fit(&corpus, self.max_terms);
        let centroid = model.centroid(&corpus);
        self.fitted = Some((model, centroid));
        Ok(())
    }

    fn score(&self, texts: &[String]) -> Result<Vec<f32>, ScoringError> {
        let (model, centroid) = self.fitted.as_ref().ok_or(ScoringError::NotFitted)?;
        Ok(texts
            .iter()
            .map(|text| dot(&model.transform(text), centroid))
            .collect())
    }
}

/// Dense semantic strategy. Embeddings are pre-normalized, so the dot
/// product against the centroid is a cosine similarity.
pub struct EmbeddingStrategy {
    model: Arc<EmbeddingModel>,
    centroid: Option<Vec<f32>>,
}

impl EmbeddingStrategy {
    pub fn new(model: Arc<EmbeddingModel>) -> Self {
        Self {
            model,
            centroid: None,
        }
    }
}

impl ScoringStrategy for EmbeddingStrategy {
    fn fit(&mut self, corpus: &[String]) -> Result<(), ScoringError> {
        let corpus = non_empty(corpus);
        let vectors = self.model.embed_batch(&corpus)?;
        self.centroid = Some(mean_vector(&vectors, self.model.dimensions()));
        Ok(())
    }

    fn score(&self, texts: &[String]) -> Result<Vec<f32>, ScoringError> {
        let centroid = self.centroid.as_ref().ok_or(ScoringError::NotFitted)?;
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self.model.embed_batch(texts)?;
        Ok(vectors.iter().map(|v| dot(v, centroid)).collect())
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn mean_vector(vectors: &[Vec<f32>], dimensions: usize) -> Vec<f32> {
    let mut mean = vec![0.0; dimensions];
    if vectors.is_empty() {
        return mean;
    }
    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }
    let n = vectors.len() as f32;
    for slot in mean.iter_mut() {
        *slot /= n;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_tfidf_else_embedding() {
        assert_eq!(Method::parse("tfidf"), Method::Tfidf);
        assert_eq!(Method::parse("embedding"), Method::Embedding);
        assert_eq!(Method::parse("anything"), Method::Embedding);
        assert_eq!(Method::default(), Method::Tfidf);
    }

    #[test]
    fn tfidf_strategy_requires_fit() {
        let strategy = TfidfStrategy::new(600);
        assert!(matches!(
            strategy.score(&["retail".to_string()]),
            Err(ScoringError::NotFitted)
        ));
    }

    #[test]
    fn tfidf_strategy_ranks_by_lexical_overlap() {
        let base = vec![
            "retail lima pagos".to_string(),
            "bodega independencia".to_string(),
        ];
        let prospects = vec![
            "retail lima".to_string(),
            "unrelated text".to_string(),
            "retail lima pagos exacto".to_string(),
        ];

        let mut strategy = TfidfStrategy::new(600);
        strategy.fit(&base).unwrap();
        let raw = strategy.score(&prospects).unwrap();

        assert!(raw[2] > raw[0], "full overlap should beat partial: {raw:?}");
        assert!(raw[0] > raw[1], "partial overlap should beat none: {raw:?}");
        assert_eq!(raw[1], 0.0);
    }

    #[test]
    fn empty_base_corpus_fits_without_error() {
        let mut strategy = TfidfStrategy::new(600);
        strategy.fit(&[]).unwrap();
        let raw = strategy.score(&["retail".to_string()]).unwrap();
        assert_eq!(raw, vec![0.0]);
    }

    #[test]
    fn mean_vector_averages_elementwise() {
        let mean = mean_vector(&[vec![1.0, 0.0], vec![0.0, 1.0]], 2);
        assert_eq!(mean, vec![0.5, 0.5]);
        assert_eq!(mean_vector(&[], 2), vec![0.0, 0.0]);
    }
}
