//! Boundary detection between adjacent text units.
//!
//! Scores how strongly each unit ends a logical run of content, using
//! lexical cues (terminal punctuation, paragraph breaks, heading lines)
//! plus semantic similarity to the following unit. Entity boundaries
//! (where one catalog entry ends and the next begins) require both a
//! strong lexical break and low similarity to the successor.
//!
//! Scoring is purely additive and deterministic; when embeddings are
//! missing, similarity degrades to a documented surface heuristic rather
//! than a silent zero.

use catalog_common::TextUnit;
use catalog_embeddings::cosine_similarity;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Boundary classification, from weakest to most structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    Weak,
    Sentence,
    Paragraph,
    Section,
    /// Lexically unremarkable but semantically disjoint from the successor.
    Semantic,
}

/// Where the similarity value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilaritySource {
    /// Cosine of both units' embedding vectors, in [-1, 1].
    Embedding,
    /// Surface heuristic (length ratio + leading token match), in [0, 1].
    Heuristic,
}

/// Score for the break between one unit and its successor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryScore {
    /// Lexical break strength in [0, 1].
    pub strength: f32,
    pub boundary_type: BoundaryType,
    /// Similarity to the successor unit.
    pub similarity: f32,
    pub similarity_source: SimilaritySource,
    /// Candidate end of one logical entity and start of the next.
    pub entity_boundary: bool,
}

/// Thresholds for boundary classification.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    /// Minimum strength for an entity boundary (exclusive).
    pub entity_strength: f32,
    /// Maximum similarity for an entity boundary (exclusive).
    pub entity_similarity: f32,
    /// Below this strength a boundary is always weak.
    pub weak_strength: f32,
    /// Below this similarity a lexically plain break is still semantic.
    pub semantic_similarity: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            entity_strength: 0.6,
            entity_similarity: 0.6,
            weak_strength: 0.3,
            semantic_similarity: 0.5,
        }
    }
}

/// Score the break after every unit except the last.
///
/// Returns `units.len() - 1` scores; score `i` describes the boundary
/// between unit `i` and unit `i + 1`. The final unit has no successor and
/// therefore no score. This pass is inherently sequential: each score
/// reads the successor, so it must not be parallelized within a document.
#[must_use]
pub fn score_boundaries(units: &[TextUnit], config: &BoundaryConfig) -> Vec<BoundaryScore> {
    let mut scores = Vec::with_capacity(units.len().saturating_sub(1));
    for pair in units.windows(2) {
        scores.push(score_pair(&pair[0], &pair[1], config));
    }

    info!(
        units = units.len(),
        entity_boundaries = scores.iter().filter(|s| s.entity_boundary).count(),
        "boundary scoring complete"
    );
    scores
}

/// Score a single adjacent pair.
#[must_use]
pub fn score_pair(unit: &TextUnit, next: &TextUnit, config: &BoundaryConfig) -> BoundaryScore {
    let strength = break_strength(&unit.text);

    let (similarity, similarity_source) = match (&unit.embedding, &next.embedding) {
        (Some(a), Some(b)) => (cosine_similarity(a, b), SimilaritySource::Embedding),
        _ => (surface_similarity(&unit.text, &next.text), SimilaritySource::Heuristic),
    };

    let boundary_type = classify(&unit.text, strength, similarity, config);
    let entity_boundary =
        strength > config.entity_strength && similarity < config.entity_similarity;

    BoundaryScore {
        strength,
        boundary_type,
        similarity,
        similarity_source,
        entity_boundary,
    }
}

/// Additive lexical break strength, clamped to [0, 1].
#[must_use]
pub fn break_strength(text: &str) -> f32 {
    let mut strength: f32 = 0.3;
    let trimmed = text.trim_end_matches([' ', '\t']);

    if ends_with_sentence_terminal(trimmed) {
        strength += 0.4;
    } else if ends_with_clause_terminal(trimmed) {
        strength += 0.15;
    }

    if trimmed.ends_with("\n\n") {
        strength += 0.2;
    }

    if last_line_is_heading(text) {
        strength += 0.15;
    }

    if ends_on_word_char(trimmed) {
        strength -= 0.15;
    }

    strength.clamp(0.0, 1.0)
}

fn ends_with_sentence_terminal(text: &str) -> bool {
    let tail = text.trim_end_matches(['\n', '"', '\'', ')', ']']);
    matches!(tail.chars().last(), Some('.' | '!' | '?' | '…'))
}

fn ends_with_clause_terminal(text: &str) -> bool {
    let tail = text.trim_end_matches(['\n', '"', '\'', ')', ']']);
    matches!(tail.chars().last(), Some(',' | ';' | ':'))
}

fn ends_on_word_char(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some(c) if c.is_alphanumeric())
}

/// Markdown-style hashes or a short all-caps line.
fn last_line_is_heading(text: &str) -> bool {
    let Some(line) = text.lines().rev().find(|l| !l.trim().is_empty()) else {
        return false;
    };
    let line = line.trim();

    if line.starts_with('#') {
        let hashes = line.chars().take_while(|&c| c == '#').count();
        return (1..=6).contains(&hashes) && line[hashes..].starts_with(' ');
    }

    line.len() >= 3
        && line.len() <= 60
        && line.chars().any(|c| c.is_uppercase())
        && !line.chars().any(|c| c.is_lowercase())
}

/// Surface similarity fallback in [0, 1] for units without embeddings:
/// half weight on the length ratio, half on a leading-token match.
#[must_use]
pub fn surface_similarity(a: &str, b: &str) -> f32 {
    let len_a = a.trim().chars().count();
    let len_b = b.trim().chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let ratio = len_a.min(len_b) as f32 / len_a.max(len_b) as f32;
    let first_token = |s: &str| {
        s.split_whitespace()
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default()
    };
    let token_match = if first_token(a) == first_token(b) { 1.0 } else { 0.0 };

    0.5 * ratio + 0.5 * token_match
}

fn classify(
    text: &str,
    strength: f32,
    similarity: f32,
    config: &BoundaryConfig,
) -> BoundaryType {
    if strength < config.weak_strength {
        return BoundaryType::Weak;
    }
    if last_line_is_heading(text) {
        return BoundaryType::Section;
    }
    if text.trim_end_matches([' ', '\t']).ends_with("\n\n") {
        return BoundaryType::Paragraph;
    }
    if ends_with_sentence_terminal(text.trim_end_matches([' ', '\t'])) {
        return BoundaryType::Sentence;
    }
    if similarity < config.semantic_similarity {
        return BoundaryType::Semantic;
    }
    BoundaryType::Weak
}
