//! Embedding collaborator interface and vector math.
//!
//! The pipeline does not run an embedding model itself: vectors are
//! obtained through the [`EmbeddingProvider`] trait and attached to text
//! units and images by the orchestrator. A provider that cannot produce a
//! vector reports [`EmbedError`]; callers degrade to documented fallbacks,
//! never abort the document.
//!
//! The similarity helpers here define the semantics the rest of the
//! pipeline relies on: cosine of mismatched-length vectors is exactly 0
//! (different embedding spaces must not be silently compared), and the
//! coherence of an empty cluster is 0.

pub mod cache;

pub use cache::EmbeddingCache;

use thiserror::Error;

/// Why an embedding could not be produced.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("no embedding available for input")]
    Unavailable,
    #[error("embedding provider failed: {0}")]
    Provider(String),
}

/// External embedding collaborator, defined at the interface boundary only.
///
/// Implementations may call out to a model server; the pipeline treats any
/// error as "no embedding available" and falls back.
pub trait EmbeddingProvider {
    /// Embed a text span.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed an image, identified by its asset id.
    fn embed_image(&self, image_id: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Cosine similarity of two vectors, in [-1, 1].
///
/// Vectors of unequal length come from different embedding spaces and are
/// defined to have similarity 0. Zero-norm vectors also yield 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Element-wise mean of a set of equal-length vectors.
///
/// Returns `None` for an empty set or when the vectors disagree on length.
#[must_use]
pub fn centroid(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f32; dim];
    for v in vectors {
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let n = vectors.len() as f32;
    for acc in &mut sum {
        *acc /= n;
    }
    Some(sum)
}

/// Mean cosine similarity of each vector to a centroid.
///
/// Used when grouping several text units into one semantic group. Defined
/// as 0.0 for an empty input.
#[must_use]
pub fn cluster_coherence(vectors: &[Vec<f32>], center: &[f32]) -> f32 {
    if vectors.is_empty() {
        return 0.0;
    }
    let total: f32 = vectors
        .iter()
        .map(|v| cosine_similarity(v, center))
        .sum();
    total / vectors.len() as f32
}
