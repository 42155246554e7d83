//! Common types shared by the catalog extraction pipeline stages.
//!
//! The pipeline consumes a parsed element tree ([`ParsedNode`], supplied by
//! an external PDF/HTML conversion step) and a set of [`ImageAsset`]s, and
//! produces layout elements, text units, chunks, and image associations.
//! All types here are plain values: stages communicate by handing complete
//! collections downstream, never by sharing mutable state.

use serde::{Deserialize, Serialize};

/// Nominal page geometry used when explicit position metadata is missing
/// (A4 portrait in points, 72pt margins).
pub const PAGE_WIDTH: f64 = 595.0;
/// Nominal page height in points.
pub const PAGE_HEIGHT: f64 = 842.0;
/// Nominal page margin in points.
pub const PAGE_MARGIN: f64 = 72.0;

/// Identifier of an [`Element`] within one document's layout model.
///
/// Elements are owned by the `LayoutModel`; downstream stages refer to them
/// by id only. Ids are assigned densely in document order, so an id doubles
/// as an index into the element list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl ElementId {
    /// Index into the owning layout model's element list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned bounding box in page coordinates (points, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Explicit position metadata carried by a parsed node, when the upstream
/// converter preserved it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePosition {
    /// 1-based page number.
    pub page: u32,
    pub bbox: BoundingBox,
}

/// One node of the parsed element tree handed to the pipeline.
///
/// This is the interface type of the parsed-tree provider: the pipeline
/// never parses markup itself, it only walks this structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedNode {
    /// Lowercased tag name ("h1", "p", "table", "img", "div", ...).
    pub tag: String,
    /// CSS-style class names, if any.
    pub classes: Vec<String>,
    /// Direct text content of this node (not including children).
    pub text: String,
    /// Explicit page/bbox metadata when the converter preserved it.
    pub position: Option<PagePosition>,
    pub children: Vec<ParsedNode>,
}

impl ParsedNode {
    /// Convenience constructor for a leaf node with text content.
    #[must_use]
    pub fn leaf(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }
}

/// Semantic kind of a layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Paragraph,
    List,
    Table,
    Image,
    /// Untyped container (div/span/section without a recognized role).
    Container,
}

impl ElementKind {
    /// Stable lowercase name, used as a chunk semantic tag.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::List => "list",
            Self::Table => "table",
            Self::Image => "image",
            Self::Container => "container",
        }
    }
}

/// A typed element of the layout model.
///
/// Owned by the layout model for its lifetime; downstream stages hold
/// [`ElementId`]s, never copies of the element itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Heading level for `Heading` elements (1-6), 0 otherwise.
    pub level: u8,
    pub text: String,
    /// 1-based page number (explicit or estimated).
    pub page: u32,
    pub bbox: BoundingBox,
    /// Nesting depth in the parsed tree.
    pub depth: usize,
    /// Extraction confidence in [0.5, 1.0].
    pub confidence: f32,
    /// Whether page/bbox came from explicit metadata rather than the
    /// deterministic layout-cursor fallback.
    pub explicit_position: bool,
}

/// A normalized text span produced from one element during classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    pub element: ElementId,
    pub text: String,
    pub page: u32,
    pub bbox: BoundingBox,
    /// Caller-supplied embedding vector, if one was obtained.
    pub embedding: Option<Vec<f32>>,
}

/// An image extracted from the document, as delivered by the upstream
/// conversion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    /// 1-based page number.
    pub page: u32,
    pub bbox: BoundingBox,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    /// Visual embedding vector, if one was obtained.
    pub embedding: Option<Vec<f32>>,
}

impl ImageAsset {
    /// Caption and alt text joined into one searchable string.
    #[must_use]
    pub fn combined_text(&self) -> String {
        match (&self.caption, &self.alt_text) {
            (Some(c), Some(a)) => format!("{c} {a}"),
            (Some(c), None) => c.clone(),
            (None, Some(a)) => a.clone(),
            (None, None) => String::new(),
        }
    }
}
