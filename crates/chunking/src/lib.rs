//! Layout-aware chunking.
//!
//! Walks the layout model's section tree in document order and packs
//! elements into retrieval-sized chunks. Splits happen at structural
//! seams (headings, tables, page turns, deep nesting changes) before the
//! size target forces one, so chunks follow the document's own shape.
//!
//! Out-of-range sizes are flagged, never rejected: a lone oversized table
//! or an undersized trailing fragment is still a valid chunk.

use std::collections::BTreeSet;

use catalog_common::{BoundingBox, Element, ElementId, ElementKind};
use catalog_layout::{LayoutModel, Section};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Chunking parameters. All sizes are character counts of chunk text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Preferred chunk size; a split is forced before exceeding it.
    pub target_size: usize,
    /// Chunks below this are flagged undersized.
    pub min_size: usize,
    /// Chunks above this are flagged oversized.
    pub max_size: usize,
    /// Characters of trailing context copied from the previous chunk.
    pub overlap: usize,
    /// Start a fresh chunk at every heading.
    pub respect_hierarchy: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 1000,
            min_size: 150,
            max_size: 1800,
            overlap: 0,
            respect_hierarchy: true,
        }
    }
}

/// Size validation outcome for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeFlag {
    Undersized,
    Oversized,
}

/// One retrieval-sized span of document content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Element texts joined by blank lines, plus any overlap prefix.
    pub text: String,
    /// Source elements in document order.
    pub elements: Vec<ElementId>,
    /// Distinct element kinds present, sorted.
    pub tags: BTreeSet<String>,
    /// Page of the first element.
    pub page: u32,
    /// Merged bounding box of all member elements.
    pub bbox: BoundingBox,
    /// Title of the owning section (empty for preamble content).
    pub section_title: String,
    pub section_level: u8,
    /// Last chunk emitted for its section.
    pub is_section_final: bool,
    /// Running mean of member element confidences.
    pub confidence: f32,
    /// Set when the chunk text falls outside [min_size, max_size].
    pub size_flag: Option<SizeFlag>,
}

impl Chunk {
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Chunk an entire layout model.
///
/// Sections are consumed in flattened document order; each chunk belongs
/// to exactly one section. An empty model produces no chunks.
#[must_use]
pub fn chunk_layout(model: &LayoutModel, config: &ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for section in model.sections_flat() {
        chunk_section(model, section, config, &mut chunks);
    }

    if config.overlap > 0 {
        apply_overlap(&mut chunks, config);
    }

    info!(
        sections = model.sections_flat().len(),
        chunks = chunks.len(),
        flagged = chunks.iter().filter(|c| c.size_flag.is_some()).count(),
        "chunking complete"
    );
    chunks
}

fn chunk_section(
    model: &LayoutModel,
    section: &Section,
    config: &ChunkingConfig,
    out: &mut Vec<Chunk>,
) {
    let start = out.len();
    let mut builder = ChunkBuilder::new(section);

    for &id in &section.elements {
        let Some(element) = model.element(id) else {
            continue;
        };

        if builder.should_split_before(element, config) {
            builder.flush(config, out);
        }
        builder.push(element);
        // Tables stand alone.
        if element.kind == ElementKind::Table {
            builder.flush(config, out);
        }
    }
    builder.flush(config, out);

    if out.len() > start {
        if let Some(last) = out.last_mut() {
            last.is_section_final = true;
        }
    }
}

/// Accumulates elements for the chunk under construction.
struct ChunkBuilder<'a> {
    section: &'a Section,
    texts: Vec<String>,
    elements: Vec<ElementId>,
    tags: BTreeSet<String>,
    page: u32,
    bbox: Option<BoundingBox>,
    last_page: u32,
    last_depth: usize,
    confidence: f32,
    text_len: usize,
}

impl<'a> ChunkBuilder<'a> {
    fn new(section: &'a Section) -> Self {
        Self {
            section,
            texts: Vec::new(),
            elements: Vec::new(),
            tags: BTreeSet::new(),
            page: 0,
            bbox: None,
            last_page: 0,
            last_depth: 0,
            confidence: 0.0,
            text_len: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn should_split_before(&self, element: &Element, config: &ChunkingConfig) -> bool {
        if self.is_empty() {
            return false;
        }
        if element.kind == ElementKind::Heading && config.respect_hierarchy {
            return true;
        }
        if element.kind == ElementKind::Table {
            return true;
        }
        if element.page != self.last_page {
            return true;
        }
        if element.depth.abs_diff(self.last_depth) > 1 {
            return true;
        }
        let incoming = element.text.chars().count();
        // Joining separator counts toward the target.
        self.text_len + 2 + incoming > config.target_size
    }

    fn push(&mut self, element: &Element) {
        if self.is_empty() {
            self.page = element.page;
        }
        if !element.text.is_empty() {
            if self.text_len > 0 {
                self.text_len += 2;
            }
            self.text_len += element.text.chars().count();
            self.texts.push(element.text.clone());
        }
        self.elements.push(element.id);
        self.tags.insert(element.kind.name().to_string());
        self.bbox = Some(match self.bbox {
            Some(b) => b.merge(&element.bbox),
            None => element.bbox,
        });
        let n = self.elements.len() as f32;
        self.confidence = (self.confidence * (n - 1.0) + element.confidence) / n;
        self.last_page = element.page;
        self.last_depth = element.depth;
    }

    fn flush(&mut self, config: &ChunkingConfig, out: &mut Vec<Chunk>) {
        if self.is_empty() {
            return;
        }
        let text = self.texts.join("\n\n");
        let len = text.chars().count();
        let size_flag = if len < config.min_size {
            Some(SizeFlag::Undersized)
        } else if len > config.max_size {
            Some(SizeFlag::Oversized)
        } else {
            None
        };

        out.push(Chunk {
            text,
            elements: std::mem::take(&mut self.elements),
            tags: std::mem::take(&mut self.tags),
            page: self.page,
            bbox: self.bbox.take().unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0)),
            section_title: self.section.title.clone(),
            section_level: self.section.level,
            is_section_final: false,
            confidence: self.confidence,
            size_flag,
        });

        self.texts.clear();
        self.page = 0;
        self.confidence = 0.0;
        self.text_len = 0;
    }
}

/// Prefix each chunk after the first with the tail of its predecessor.
///
/// Suffixes are taken from the pre-overlap texts so context never
/// compounds across chunks, and are cut on a character boundary. Size
/// flags are re-measured against the extended text.
fn apply_overlap(chunks: &mut [Chunk], config: &ChunkingConfig) {
    let originals: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    for (i, chunk) in chunks.iter_mut().enumerate().skip(1) {
        let prev = &originals[i - 1];
        let suffix = char_suffix(prev, config.overlap);
        if suffix.is_empty() {
            continue;
        }
        chunk.text = format!("{suffix}\n\n{}", chunk.text);
        let len = chunk.char_len();
        chunk.size_flag = if len < config.min_size {
            Some(SizeFlag::Undersized)
        } else if len > config.max_size {
            Some(SizeFlag::Oversized)
        } else {
            None
        };
    }
}

fn char_suffix(text: &str, chars: usize) -> &str {
    let total = text.chars().count();
    if total <= chars {
        return text;
    }
    let skip = total - chars;
    match text.char_indices().nth(skip) {
        Some((byte, _)) => &text[byte..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::ParsedNode;
    use catalog_layout::build_layout;

    fn doc(children: Vec<ParsedNode>) -> ParsedNode {
        ParsedNode {
            tag: "body".to_string(),
            children,
            ..ParsedNode::default()
        }
    }

    fn para(text: &str) -> ParsedNode {
        ParsedNode::leaf("p", text)
    }

    #[test]
    fn test_empty_model_yields_no_chunks() {
        let model = build_layout(&doc(vec![]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_heading_starts_new_chunk() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "SEATING"),
            para("Collection overview text."),
            ParsedNode::leaf("h1", "TABLES"),
            para("Table range text."),
        ]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("SEATING"));
        assert!(chunks[1].text.starts_with("TABLES"));
        assert_eq!(chunks[0].section_title, "SEATING");
        assert!(chunks[0].is_section_final);
    }

    #[test]
    fn test_target_size_forces_split() {
        let long = "x".repeat(600);
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "SECTION"),
            para(&long),
            para(&long),
        ]));
        let config = ChunkingConfig {
            target_size: 700,
            ..ChunkingConfig::default()
        };
        let chunks = chunk_layout(&model, &config);
        assert_eq!(chunks.len(), 2);
        assert!(!chunks[0].is_section_final);
        assert!(chunks[1].is_section_final);
    }

    #[test]
    fn test_table_stands_alone() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "SPECS"),
            para("Intro paragraph."),
            ParsedNode::leaf("table", "col1 col2\nval1 val2"),
            para("Closing paragraph."),
        ]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1].tags.contains("table"));
        assert_eq!(chunks[1].elements.len(), 1);
    }

    #[test]
    fn test_size_flags() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "TINY"),
            para("short"),
        ]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].size_flag, Some(SizeFlag::Undersized));

        let big = "y".repeat(2500);
        let model = build_layout(&doc(vec![ParsedNode::leaf("table", &big)]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        assert_eq!(chunks[0].size_flag, Some(SizeFlag::Oversized));
    }

    #[test]
    fn test_overlap_uses_previous_tail_without_compounding() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "AAA SECTION HEAD"),
            para(&"a".repeat(400)),
            ParsedNode::leaf("h1", "BBB SECTION HEAD"),
            para(&"b".repeat(400)),
            ParsedNode::leaf("h1", "CCC SECTION HEAD"),
            para(&"c".repeat(400)),
        ]));
        let config = ChunkingConfig {
            overlap: 50,
            ..ChunkingConfig::default()
        };
        let chunks = chunk_layout(&model, &config);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[1].text.starts_with(&"a".repeat(50)));
        // Third chunk's prefix comes from the second chunk's original text,
        // not from its overlap-extended form.
        assert!(chunks[2].text.starts_with(&"b".repeat(50)));
    }

    #[test]
    fn test_chunk_confidence_is_mean_of_elements() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "HEAD"),
            para("Body text."),
        ]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        let expected: f32 = model.elements.iter().map(|e| e.confidence).sum::<f32>()
            / model.elements.len() as f32;
        assert!((chunks[0].confidence - expected).abs() < 1e-6);
    }

    #[test]
    fn test_tags_collect_element_kinds() {
        let model = build_layout(&doc(vec![
            ParsedNode::leaf("h1", "MIXED"),
            para("Text."),
            ParsedNode::leaf("ul", "item one\nitem two"),
        ]));
        let chunks = chunk_layout(&model, &ChunkingConfig::default());
        let tags: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.tags.iter().map(String::as_str))
            .collect();
        assert!(tags.contains(&"heading"));
        assert!(tags.contains(&"paragraph"));
        assert!(tags.contains(&"list"));
    }
}
