//! Layout model builder.
//!
//! Converts a parsed element tree (the HTML-like output of the upstream
//! PDF conversion step) into a flat typed element list, a hierarchical
//! section tree, and page metadata. This is the first pipeline stage;
//! everything downstream works against the [`LayoutModel`] produced here.
//!
//! An empty input tree yields an empty-but-valid model: "no content" is a
//! legitimate terminal state, not an error.

mod builder;
mod geometry;

pub use builder::build_layout;
pub use geometry::LayoutCursor;

use catalog_common::{Element, ElementId};
use serde::{Deserialize, Serialize};

/// A named document region rooted at a heading.
///
/// Spans the heading and its following elements up to the next heading of
/// equal or higher level. Invariant: `level` is strictly less than the
/// level of every subsection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Heading level (1-6). Implicit preamble sections use level 1.
    pub level: u8,
    /// The heading element itself, absent for an implicit preamble section.
    pub heading: Option<ElementId>,
    /// Elements belonging directly to this section, in document order.
    pub elements: Vec<ElementId>,
    pub subsections: Vec<Section>,
}

impl Section {
    /// Total number of elements in this section and all subsections.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
            + self
                .subsections
                .iter()
                .map(Section::element_count)
                .sum::<usize>()
    }
}

/// Output of the layout stage: owned elements plus the section tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutModel {
    /// All elements in document order. `ElementId(i)` indexes slot `i`.
    pub elements: Vec<Element>,
    /// Top-level sections in document order.
    pub sections: Vec<Section>,
    /// Highest page number seen (0 for an empty document).
    pub page_count: u32,
}

impl LayoutModel {
    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    /// All sections flattened depth-first, in document order.
    #[must_use]
    pub fn sections_flat(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        fn walk<'a>(section: &'a Section, out: &mut Vec<&'a Section>) {
            out.push(section);
            for sub in &section.subsections {
                walk(sub, out);
            }
        }
        for section in &self.sections {
            walk(section, &mut out);
        }
        out
    }

    /// Mean element confidence, 0.0 for an empty model.
    #[must_use]
    pub fn mean_confidence(&self) -> f32 {
        if self.elements.is_empty() {
            return 0.0;
        }
        let total: f32 = self.elements.iter().map(|e| e.confidence).sum();
        total / self.elements.len() as f32
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
