//! Cross-modal image association.
//!
//! Scores every (image, entity) pair on three factors: spatial proximity
//! (page distance), lexical overlap (caption/alt text against entity
//! text), and visual-semantic similarity (embedding cosine, with
//! documented fallbacks). Pairs passing the acceptance threshold are
//! resolved into a bounded matching by a greedy pass over descending
//! scores with per-image and per-entity fan-out quotas.
//!
//! The greedy assignment is deliberately not a global maximum-weight
//! matching. It is deterministic, O(n·m log(n·m)), and reproducible
//! across runs, which matters more here than squeezing out the last few
//! points of aggregate score.

use catalog_classification::EntityCandidate;
use catalog_common::ImageAsset;
use catalog_embeddings::cosine_similarity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Relative weights of the three scoring factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationWeights {
    pub spatial: f32,
    pub lexical: f32,
    pub visual: f32,
}

impl Default for AssociationWeights {
    fn default() -> Self {
        Self {
            spatial: 0.4,
            lexical: 0.3,
            visual: 0.3,
        }
    }
}

/// Association engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    pub weights: AssociationWeights,
    /// Per-factor floors; a pair failing any floor is dropped unscored.
    pub min_spatial: f32,
    pub min_lexical: f32,
    pub min_visual: f32,
    /// Minimum overall score for a pair to survive.
    pub overall_threshold: f32,
    /// Fan-out quota per image.
    pub max_per_image: usize,
    /// Fan-out quota per entity.
    pub max_per_entity: usize,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            weights: AssociationWeights::default(),
            min_spatial: 0.0,
            min_lexical: 0.0,
            min_visual: 0.0,
            overall_threshold: 0.6,
            max_per_image: 2,
            max_per_entity: 3,
        }
    }
}

/// A scored image-to-entity link. Immutable once scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub image_id: String,
    /// Index of the entity in the candidate slice passed to [`associate`].
    pub entity_index: usize,
    pub spatial_score: f32,
    pub lexical_score: f32,
    pub visual_score: f32,
    pub overall_score: f32,
    /// Overall score boosted when the three sub-scores agree.
    pub confidence: f32,
    pub reasoning: String,
}

/// Output of one association run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssociationResult {
    /// Final bounded matching, in assignment order.
    pub associations: Vec<Association>,
    /// Total (image, entity) pairs considered, including dropped ones.
    pub pairs_evaluated: usize,
}

/// Score all pairs and resolve them into a bounded matching.
#[must_use]
pub fn associate(
    images: &[ImageAsset],
    entities: &[EntityCandidate],
    config: &AssociationConfig,
) -> AssociationResult {
    let mut scored = Vec::new();
    let mut pairs_evaluated = 0;

    for (image_index, image) in images.iter().enumerate() {
        for (entity_index, entity) in entities.iter().enumerate() {
            pairs_evaluated += 1;
            let Some(assoc) = score_pair(image, entity, entity_index, config) else {
                continue;
            };
            debug!(
                image = %assoc.image_id,
                entity = entity_index,
                overall = assoc.overall_score,
                "pair scored"
            );
            scored.push((image_index, assoc));
        }
    }

    let associations = assign_greedy(scored, config);

    info!(
        images = images.len(),
        entities = entities.len(),
        pairs_evaluated,
        retained = associations.len(),
        "association complete"
    );
    AssociationResult {
        associations,
        pairs_evaluated,
    }
}

/// Score one pair; `None` when a factor floor or the overall threshold
/// rejects it.
fn score_pair(
    image: &ImageAsset,
    entity: &EntityCandidate,
    entity_index: usize,
    config: &AssociationConfig,
) -> Option<Association> {
    let spatial = spatial_score(image.page, entity.page);
    let lexical = lexical_score(image, entity);
    let visual = visual_score(image, entity, lexical);

    if spatial < config.min_spatial || lexical < config.min_lexical || visual < config.min_visual {
        return None;
    }

    let w = &config.weights;
    let weight_sum = w.spatial + w.lexical + w.visual;
    if weight_sum <= 0.0 {
        return None;
    }
    let overall = (w.spatial * spatial + w.lexical * lexical + w.visual * visual) / weight_sum;
    if overall < config.overall_threshold {
        return None;
    }

    let confidence = (overall + (0.3 - variance(&[spatial, lexical, visual])).max(0.0)).min(1.0);

    Some(Association {
        image_id: image.id.clone(),
        entity_index,
        spatial_score: spatial,
        lexical_score: lexical,
        visual_score: visual,
        overall_score: overall,
        confidence,
        reasoning: reasoning(spatial, lexical, visual, overall),
    })
}

/// Page-distance score.
///
/// The far-band formula `1/(diff*0.5)` gives a 4-page gap a higher score
/// (0.5) than the 3-page band (0.4). That non-monotonic step is the
/// established behavior of the scoring scale and is kept as-is.
#[must_use]
pub fn spatial_score(image_page: u32, entity_page: u32) -> f32 {
    match image_page.abs_diff(entity_page) {
        0 => 1.0,
        1 => 0.8,
        2 => 0.6,
        3 => 0.4,
        diff => (1.0 / (diff as f32 * 0.5)).max(0.1),
    }
}

/// Jaccard similarity of >2-character token sets, with a +0.3 boost when
/// the entity's product name appears verbatim in the image text.
#[must_use]
pub fn lexical_score(image: &ImageAsset, entity: &EntityCandidate) -> f32 {
    let image_text = image.combined_text();
    let image_tokens = tokenize(&image_text);
    let mut entity_tokens = tokenize(&entity.text);
    if let Some(name) = entity.name() {
        entity_tokens.extend(tokenize(name));
    }

    let mut score = jaccard(&image_tokens, &entity_tokens);
    if let Some(name) = entity.name() {
        if !name.is_empty() && image_text.to_lowercase().contains(&name.to_lowercase()) {
            score = (score + 0.3).min(1.0);
        }
    }
    score
}

/// Visual-semantic score: embedding cosine when both sides have vectors,
/// otherwise the lexical score, otherwise a neutral 0.5 so assets without
/// metadata are not penalized.
fn visual_score(image: &ImageAsset, entity: &EntityCandidate, lexical: f32) -> f32 {
    match (&image.embedding, &entity.embedding) {
        (Some(a), Some(b)) => cosine_similarity(a, b).max(0.0),
        _ if !image.combined_text().is_empty() => lexical,
        _ => 0.5,
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Population variance.
fn variance(values: &[f32]) -> f32 {
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
}

fn reasoning(spatial: f32, lexical: f32, visual: f32, overall: f32) -> String {
    let spatial_band = if spatial >= 1.0 {
        "same page"
    } else if spatial >= 0.8 {
        "adjacent page"
    } else if spatial >= 0.4 {
        "nearby pages"
    } else {
        "distant pages"
    };
    let lexical_band = if lexical >= 0.5 {
        "strong text similarity"
    } else if lexical >= 0.2 {
        "partial text similarity"
    } else {
        "little text overlap"
    };
    let visual_band = if visual >= 0.7 {
        "strong visual match"
    } else if visual >= 0.4 {
        "moderate visual match"
    } else {
        "weak visual match"
    };
    let overall_band = if overall >= 0.8 {
        "strong"
    } else if overall >= 0.7 {
        "good"
    } else {
        "plausible"
    };
    format!("{overall_band} association: {spatial_band}, {lexical_band}, {visual_band}")
}

/// Greedy bounded assignment over descending overall score.
///
/// Ties break on image index, then entity index, so the matching is fully
/// deterministic for a given input order.
fn assign_greedy(
    mut scored: Vec<(usize, Association)>,
    config: &AssociationConfig,
) -> Vec<Association> {
    scored.sort_by(|(ia, a), (ib, b)| {
        b.overall_score
            .total_cmp(&a.overall_score)
            .then(ia.cmp(ib))
            .then(a.entity_index.cmp(&b.entity_index))
    });

    let mut per_image: HashMap<usize, usize> = HashMap::new();
    let mut per_entity: HashMap<usize, usize> = HashMap::new();
    let mut out = Vec::new();

    for (image_index, assoc) in scored {
        let image_used = per_image.get(&image_index).copied().unwrap_or(0);
        let entity_used = per_entity.get(&assoc.entity_index).copied().unwrap_or(0);
        if image_used >= config.max_per_image || entity_used >= config.max_per_entity {
            continue;
        }
        *per_image.entry(image_index).or_insert(0) += 1;
        *per_entity.entry(assoc.entity_index).or_insert(0) += 1;
        out.push(assoc);
    }
    out
}
