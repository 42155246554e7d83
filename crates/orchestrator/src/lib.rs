//! Pipeline orchestrator.
//!
//! Runs the stages in order for one document: layout model, text units
//! with optional embedding enrichment, classification, boundary scoring,
//! chunking, and image association. Each stage's failure is caught
//! independently; the report always carries whatever earlier stages
//! produced, plus a per-stage status and an aggregate quality score.
//!
//! Nothing here retries. A caller that wants retries or deadlines wraps
//! the whole per-document run.

use catalog_association::{associate, AssociationConfig, AssociationResult};
use catalog_boundary::{score_boundaries, BoundaryConfig, BoundaryScore};
use catalog_chunking::{chunk_layout, Chunk, ChunkingConfig};
use catalog_classification::{
    classify_units, retain_association_candidates, EntityCandidate,
};
use catalog_common::{ElementKind, ImageAsset, ParsedNode, TextUnit};
use catalog_embeddings::{EmbeddingCache, EmbeddingProvider};
use catalog_layout::{build_layout, LayoutModel};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// A stage rejected its configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid chunking configuration: {0}")]
    ChunkingConfig(String),
    #[error("invalid association configuration: {0}")]
    AssociationConfig(String),
}

/// Full pipeline configuration, one sub-config per configurable stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub boundary: BoundaryConfig,
    pub chunking: ChunkingConfig,
    pub association: AssociationConfig,
}

/// One document's input: the parsed element tree and its extracted images.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub root: ParsedNode,
    pub images: Vec<ImageAsset>,
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum StageStatus {
    Completed,
    Failed(String),
    /// Not run: prerequisites absent (no provider, too few units, ...).
    Skipped,
}

/// Per-stage statuses for one document run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageStatuses {
    pub layout: StageStatus,
    pub embedding: StageStatus,
    pub classification: StageStatus,
    pub boundary: StageStatus,
    pub chunking: StageStatus,
    pub association: StageStatus,
}

/// Aggregate quality over the stages that produced output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Mean layout element confidence, absent for an empty document.
    pub layout_confidence: Option<f32>,
    /// 1 minus the normalized chunk-size standard deviation.
    pub chunk_quality: Option<f32>,
    /// Mean association confidence, absent when nothing was associated.
    pub association_confidence: Option<f32>,
    /// Mean of the present components, 0.0 when none are present.
    pub overall: f32,
}

/// Everything one document run produced, partial results included.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub layout: LayoutModel,
    pub units: Vec<TextUnit>,
    /// Every classified unit, all categories.
    pub candidates: Vec<EntityCandidate>,
    /// Catalog entries above the quality floor; association entity
    /// indexes refer to this list.
    pub association_candidates: Vec<EntityCandidate>,
    pub boundaries: Vec<BoundaryScore>,
    pub chunks: Vec<Chunk>,
    pub associations: AssociationResult,
    pub stages: StageStatuses,
    pub quality: QualityReport,
}

/// Run the full pipeline for one document.
///
/// The embedding cache is owned by the caller and survives across
/// documents; pass a fresh one if cross-document reuse is unwanted. With
/// no provider, embedding enrichment is skipped and the downstream stages
/// use their documented lexical fallbacks.
pub fn run_pipeline(
    doc: &DocumentInput,
    config: &PipelineConfig,
    cache: &mut EmbeddingCache,
    provider: Option<&dyn EmbeddingProvider>,
) -> PipelineReport {
    let mut stages = StageStatuses {
        layout: StageStatus::Completed,
        embedding: StageStatus::Skipped,
        classification: StageStatus::Completed,
        boundary: StageStatus::Skipped,
        chunking: StageStatus::Completed,
        association: StageStatus::Skipped,
    };

    let layout = build_layout(&doc.root);
    let mut units = text_units(&layout);
    let mut images = doc.images.clone();

    if let Some(provider) = provider {
        attach_embeddings(&mut units, &mut images, cache, provider);
        stages.embedding = StageStatus::Completed;
    }

    let candidates = classify_units(&units);
    let association_candidates = retain_association_candidates(candidates.clone());

    let boundaries = if units.len() >= 2 {
        stages.boundary = StageStatus::Completed;
        score_boundaries(&units, &config.boundary)
    } else {
        Vec::new()
    };

    let chunks = match validate_chunking(&config.chunking) {
        Ok(()) => chunk_layout(&layout, &config.chunking),
        Err(err) => {
            warn!(error = %err, "chunking stage failed");
            stages.chunking = StageStatus::Failed(err.to_string());
            Vec::new()
        }
    };

    let associations = if images.is_empty() || association_candidates.is_empty() {
        AssociationResult::default()
    } else {
        match validate_association(&config.association) {
            Ok(()) => {
                stages.association = StageStatus::Completed;
                associate(&images, &association_candidates, &config.association)
            }
            Err(err) => {
                warn!(error = %err, "association stage failed");
                stages.association = StageStatus::Failed(err.to_string());
                AssociationResult::default()
            }
        }
    };

    let quality = quality_report(&layout, &chunks, &associations, &config.chunking);

    info!(
        elements = layout.elements.len(),
        units = units.len(),
        chunks = chunks.len(),
        associations = associations.associations.len(),
        quality = quality.overall,
        "pipeline run complete"
    );

    PipelineReport {
        layout,
        units,
        candidates,
        association_candidates,
        boundaries,
        chunks,
        associations,
        stages,
        quality,
    }
}

/// Process several documents in parallel.
///
/// Each document gets an independent pipeline instance and its own
/// embedding cache; no state is shared across documents.
pub fn run_batch(
    docs: &[DocumentInput],
    config: &PipelineConfig,
    provider: Option<&(dyn EmbeddingProvider + Sync)>,
) -> Vec<PipelineReport> {
    docs.par_iter()
        .map(|doc| {
            let mut cache = EmbeddingCache::default();
            run_pipeline(
                doc,
                config,
                &mut cache,
                provider.map(|p| p as &dyn EmbeddingProvider),
            )
        })
        .collect()
}

/// Text-bearing, non-image layout elements become text units.
fn text_units(layout: &LayoutModel) -> Vec<TextUnit> {
    layout
        .elements
        .iter()
        .filter(|e| e.kind != ElementKind::Image && !e.text.is_empty())
        .map(|e| TextUnit {
            element: e.id,
            text: e.text.clone(),
            page: e.page,
            bbox: e.bbox,
            embedding: None,
        })
        .collect()
}

/// Fill in missing embeddings from the cache or the provider.
///
/// Provider failures are logged and leave the item without a vector; the
/// boundary and association stages fall back per their own rules.
fn attach_embeddings(
    units: &mut [TextUnit],
    images: &mut [ImageAsset],
    cache: &mut EmbeddingCache,
    provider: &dyn EmbeddingProvider,
) {
    for unit in units.iter_mut().filter(|u| u.embedding.is_none()) {
        if let Some(vector) = cache.get(&unit.text) {
            unit.embedding = Some(vector);
            continue;
        }
        match provider.embed_text(&unit.text) {
            Ok(vector) => {
                cache.insert(unit.text.clone(), vector.clone());
                unit.embedding = Some(vector);
            }
            Err(err) => warn!(element = unit.element.index(), error = %err, "text embedding unavailable"),
        }
    }

    for image in images.iter_mut().filter(|i| i.embedding.is_none()) {
        let key = format!("img:{}", image.id);
        if let Some(vector) = cache.get(&key) {
            image.embedding = Some(vector);
            continue;
        }
        match provider.embed_image(&image.id) {
            Ok(vector) => {
                cache.insert(key, vector.clone());
                image.embedding = Some(vector);
            }
            Err(err) => warn!(image = %image.id, error = %err, "image embedding unavailable"),
        }
    }
}

fn validate_chunking(config: &ChunkingConfig) -> Result<(), PipelineError> {
    if config.target_size == 0 {
        return Err(PipelineError::ChunkingConfig(
            "target size must be positive".to_string(),
        ));
    }
    if config.min_size > config.max_size {
        return Err(PipelineError::ChunkingConfig(format!(
            "min size {} exceeds max size {}",
            config.min_size, config.max_size
        )));
    }
    Ok(())
}

fn validate_association(config: &AssociationConfig) -> Result<(), PipelineError> {
    let sum = config.weights.spatial + config.weights.lexical + config.weights.visual;
    if sum <= 0.0 {
        return Err(PipelineError::AssociationConfig(
            "factor weights must sum to a positive value".to_string(),
        ));
    }
    Ok(())
}

fn quality_report(
    layout: &LayoutModel,
    chunks: &[Chunk],
    associations: &AssociationResult,
    chunking: &ChunkingConfig,
) -> QualityReport {
    let layout_confidence = (!layout.is_empty()).then(|| layout.mean_confidence());

    let chunk_quality = (!chunks.is_empty()).then(|| {
        let sizes: Vec<f32> = chunks.iter().map(|c| c.char_len() as f32).collect();
        let mean = sizes.iter().sum::<f32>() / sizes.len() as f32;
        let variance =
            sizes.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / sizes.len() as f32;
        let stddev = variance.sqrt();
        1.0 - (stddev / chunking.target_size as f32).min(1.0)
    });

    let association_confidence = (!associations.associations.is_empty()).then(|| {
        associations
            .associations
            .iter()
            .map(|a| a.confidence)
            .sum::<f32>()
            / associations.associations.len() as f32
    });

    let components: Vec<f32> = [layout_confidence, chunk_quality, association_confidence]
        .into_iter()
        .flatten()
        .collect();
    let overall = if components.is_empty() {
        0.0
    } else {
        components.iter().sum::<f32>() / components.len() as f32
    };

    QualityReport {
        layout_confidence,
        chunk_quality,
        association_confidence,
        overall,
    }
}
