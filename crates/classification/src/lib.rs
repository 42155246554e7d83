//! Content classification for text units.
//!
//! Labels each text unit with a closed content category via ordered,
//! mutually exclusive lexical pattern checks (first match wins), and for
//! catalog entries extracts the structured fields downstream association
//! needs. The category set is a closed tagged enum: each variant carries
//! exactly the payload that category guarantees, so consumers can match
//! exhaustively instead of probing a free-form metadata map.

mod extract;
pub mod patterns;

pub use extract::CatalogEntryFields;

use catalog_common::{BoundingBox, ElementId, TextUnit};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Units shorter than this are skipped entirely.
pub const MIN_UNIT_LEN: usize = 50;

/// Quality floor for candidates retained for association.
pub const QUALITY_FLOOR: f32 = 0.5;

/// Closed set of content categories.
///
/// Only `CatalogEntry` carries an extraction payload; the other
/// categories are terminal labels used for filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "category", content = "fields")]
pub enum ContentKind {
    /// Table-of-contents / index pages.
    Index,
    /// Sustainability, environmental, and certification notices.
    Sustainability,
    /// Technical specification sheets.
    TechnicalSpecs,
    /// Mood boards, inspiration spreads, lifestyle photography text.
    Mood,
    /// A product entry with structured fields.
    CatalogEntry(CatalogEntryFields),
    /// Nothing matched.
    Unknown,
}

impl ContentKind {
    /// Stable lowercase label for logs and storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Sustainability => "sustainability",
            Self::TechnicalSpecs => "technical_specs",
            Self::Mood => "mood",
            Self::CatalogEntry(_) => "catalog_entry",
            Self::Unknown => "unknown",
        }
    }
}

/// A classified text span, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Index of the source unit in the classified sequence.
    pub unit_index: usize,
    pub element: ElementId,
    pub kind: ContentKind,
    /// Rule-match confidence in [0, 1].
    pub confidence: f32,
    /// Field-coverage quality score in [0, 1].
    pub quality: f32,
    pub text: String,
    pub page: u32,
    pub bbox: BoundingBox,
    /// Copied from the source unit so association can score visually.
    pub embedding: Option<Vec<f32>>,
}

impl EntityCandidate {
    /// Product name when this candidate is a catalog entry.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ContentKind::CatalogEntry(fields) => fields.name.as_deref(),
            _ => None,
        }
    }

    /// Whether this candidate survives into the association stage.
    #[must_use]
    pub fn is_association_candidate(&self) -> bool {
        matches!(self.kind, ContentKind::CatalogEntry(_)) && self.quality > QUALITY_FLOOR
    }
}

/// Classify a single unit. Returns `None` for units under 50 characters.
#[must_use]
pub fn classify_unit(unit: &TextUnit, unit_index: usize) -> Option<EntityCandidate> {
    let text = unit.text.trim();
    if text.chars().count() < MIN_UNIT_LEN {
        return None;
    }

    let (kind, cues) = match_category(text);
    let quality = match &kind {
        ContentKind::CatalogEntry(fields) => fields.quality_score(text),
        _ => 0.0,
    };
    let confidence = (0.5 + 0.15 * cues as f32).min(1.0);

    debug!(
        unit = unit_index,
        category = kind.label(),
        confidence,
        quality,
        "unit classified"
    );

    Some(EntityCandidate {
        unit_index,
        element: unit.element,
        kind,
        confidence,
        quality,
        text: text.to_string(),
        page: unit.page,
        bbox: unit.bbox,
        embedding: unit.embedding.clone(),
    })
}

/// Classify every unit in sequence, skipping too-short spans.
#[must_use]
pub fn classify_units(units: &[TextUnit]) -> Vec<EntityCandidate> {
    let candidates: Vec<EntityCandidate> = units
        .iter()
        .enumerate()
        .filter_map(|(i, unit)| classify_unit(unit, i))
        .collect();

    info!(
        units = units.len(),
        classified = candidates.len(),
        catalog_entries = candidates
            .iter()
            .filter(|c| matches!(c.kind, ContentKind::CatalogEntry(_)))
            .count(),
        "classification complete"
    );
    candidates
}

/// Keep only catalog entries above the quality floor.
#[must_use]
pub fn retain_association_candidates(candidates: Vec<EntityCandidate>) -> Vec<EntityCandidate> {
    candidates
        .into_iter()
        .filter(EntityCandidate::is_association_candidate)
        .collect()
}

/// Ordered category checks; returns the category and the cue count that
/// feeds rule confidence.
fn match_category(text: &str) -> (ContentKind, usize) {
    let index_cues = count_cues(&[
        patterns::INDEX.is_match(text),
        patterns::DOTTED_LEADER.is_match(text),
    ]);
    if index_cues > 0 {
        return (ContentKind::Index, index_cues);
    }

    // Certification language belongs with sustainability unless the text
    // is otherwise a spec sheet.
    let sustain = patterns::SUSTAINABILITY.is_match(text);
    let certified = patterns::CERTIFICATION.is_match(text);
    let technical = patterns::TECHNICAL.is_match(text);
    if sustain || (certified && !technical) {
        return (
            ContentKind::Sustainability,
            count_cues(&[sustain, certified]),
        );
    }

    if technical {
        return (
            ContentKind::TechnicalSpecs,
            count_cues(&[technical, certified, patterns::SINGLE_DIMENSION.is_match(text)]),
        );
    }

    if patterns::MOOD.is_match(text) {
        return (ContentKind::Mood, 1);
    }

    let has_name = patterns::UPPERCASE_RUN.is_match(text);
    let has_dims =
        patterns::DIMENSION.is_match(text) || patterns::SINGLE_DIMENSION.is_match(text);
    let has_attribution =
        patterns::ATTRIBUTION.is_match(text) || patterns::STUDIOS.is_match(text);
    if has_name && (has_dims || has_attribution) {
        let fields = CatalogEntryFields::extract(text);
        let cues = count_cues(&[
            has_name,
            has_dims,
            has_attribution,
            !fields.colors.is_empty(),
            !fields.materials.is_empty(),
        ]);
        return (ContentKind::CatalogEntry(fields), cues);
    }

    (ContentKind::Unknown, 0)
}

fn count_cues(cues: &[bool]) -> usize {
    cues.iter().filter(|&&c| c).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::BoundingBox;

    fn unit(text: &str) -> TextUnit {
        TextUnit {
            element: ElementId(0),
            text: text.to_string(),
            page: 1,
            bbox: BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            embedding: None,
        }
    }

    #[test]
    fn test_short_unit_is_skipped() {
        assert!(classify_unit(&unit("Short text"), 0).is_none());
    }

    #[test]
    fn test_index_classification() {
        let text = "Table of Contents\n1. Introduction ........... 3\n2. Products ....... 5";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::Index);
        assert!(c.confidence > 0.5);
    }

    #[test]
    fn test_sustainability_classification() {
        let text = "Our commitment to sustainability includes 100% recycled materials, \
            carbon-neutral manufacturing and biodegradable packaging.";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::Sustainability);
    }

    #[test]
    fn test_certification_without_specs_is_sustainability() {
        let text = "Quality Assurance: all products are CE marked and certified for \
            European compliance under the applicable programmes.";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::Sustainability);
    }

    #[test]
    fn test_technical_specs_classification() {
        let text = "Technical Specifications: weight capacity 150 kg, IP65 rated, \
            dimensions 200×100×80 mm, aluminium frame.";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::TechnicalSpecs);
    }

    #[test]
    fn test_mood_classification() {
        let text = "The visual showcase presents a stunning moodboard featuring warm \
            earth tones and natural textures across the gallery.";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::Mood);
    }

    #[test]
    fn test_catalog_entry_classification_and_extraction() {
        let text = "VALENOVA is a sophisticated modular seating system. Features premium \
            leather upholstery in black and brown. Dimensions: 180×90×75 cm. \
            Designed by Maria Santos.";
        let c = classify_unit(&unit(text), 3).unwrap();
        match &c.kind {
            ContentKind::CatalogEntry(fields) => {
                assert_eq!(fields.name.as_deref(), Some("VALENOVA"));
                assert_eq!(fields.dimensions, vec!["180×90×75 cm"]);
                assert_eq!(fields.attribution.as_deref(), Some("Maria Santos"));
            }
            other => panic!("expected catalog entry, got {other:?}"),
        }
        assert_eq!(c.unit_index, 3);
        assert!(c.quality > QUALITY_FLOOR);
        assert!(c.is_association_candidate());
    }

    #[test]
    fn test_unmatched_text_is_unknown() {
        let text = "Welcome to our comprehensive catalog of innovative solutions for \
            modern workspaces and living areas.";
        let c = classify_unit(&unit(text), 0).unwrap();
        assert_eq!(c.kind, ContentKind::Unknown);
        assert!(!c.is_association_candidate());
    }

    #[test]
    fn test_retain_association_candidates_filters() {
        let units = vec![
            unit("Table of Contents\n1. Introduction ........... 3 and more entries here"),
            unit(
                "FOLD minimalist table collection with geometric forms, 30×60 cm, \
                 designed by Stacy Garcia NY. Oak and walnut finishes in natural tones.",
            ),
        ];
        let candidates = classify_units(&units);
        assert_eq!(candidates.len(), 2);
        let retained = retain_association_candidates(candidates);
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].name(), Some("FOLD"));
    }
}
