//! Tree traversal: parsed nodes to typed elements and the section tree.

use catalog_common::{Element, ElementId, ElementKind, ParsedNode};
use tracing::{debug, info};

use crate::geometry::LayoutCursor;
use crate::{LayoutModel, Section};

/// Base element confidence before adjustments.
const BASE_CONFIDENCE: f32 = 0.75;
/// Bonus for a recognized (non-container) tag.
const TYPED_BONUS: f32 = 0.1;
/// Bonus for explicit position metadata.
const POSITION_BONUS: f32 = 0.1;
/// Penalty for a generic container with no distinguishing markers.
const CONTAINER_PENALTY: f32 = 0.15;
/// Containers with less text than this and no classes are considered
/// markerless for the confidence penalty.
const CONTAINER_MARKER_LEN: usize = 20;

/// Build the layout model from a parsed element tree.
///
/// Traverses the tree in document order, typing each content-bearing node,
/// resolving geometry (explicit metadata or the cursor fallback), and
/// grouping elements into sections under their governing headings.
#[must_use]
pub fn build_layout(root: &ParsedNode) -> LayoutModel {
    let mut elements = Vec::new();
    let mut cursor = LayoutCursor::new();
    flatten(root, 0, &mut cursor, &mut elements);

    let page_count = elements.iter().map(|e| e.page).max().unwrap_or(0);
    let sections = build_sections(&elements);

    info!(
        elements = elements.len(),
        sections = sections.len(),
        pages = page_count,
        "layout model built"
    );

    LayoutModel {
        elements,
        sections,
        page_count,
    }
}

/// Map a tag name to an element kind. Unrecognized tags are containers.
fn kind_for_tag(tag: &str) -> ElementKind {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading,
        "p" | "blockquote" | "pre" => ElementKind::Paragraph,
        "ul" | "ol" | "dl" => ElementKind::List,
        "table" => ElementKind::Table,
        "img" | "image" | "figure" => ElementKind::Image,
        _ => ElementKind::Container,
    }
}

/// Heading level for a heading-like node, `None` for ordinary content.
///
/// Resolution order: explicit `h1`..`h6` tag, then a `level-N` /
/// `heading-N` / `title-N` class, then a bare `heading`/`title` class
/// (level 1).
fn heading_level(node: &ParsedNode) -> Option<u8> {
    if let Some(digit) = node.tag.strip_prefix('h') {
        if let Ok(level @ 1..=6) = digit.parse::<u8>() {
            return Some(level);
        }
    }

    for class in &node.classes {
        for prefix in ["level-", "heading-", "title-"] {
            if let Some(rest) = class.strip_suffix(|c: char| c.is_ascii_digit()) {
                if rest == prefix {
                    let level = class.as_bytes()[class.len() - 1] - b'0';
                    if (1..=6).contains(&level) {
                        return Some(level);
                    }
                }
            }
        }
        if class == "heading" || class == "title" {
            return Some(1);
        }
    }

    None
}

fn flatten(
    node: &ParsedNode,
    depth: usize,
    cursor: &mut LayoutCursor,
    elements: &mut Vec<Element>,
) {
    // The root itself is a wrapper; only its descendants become elements.
    if depth > 0 {
        let is_heading = heading_level(node).is_some();
        let kind = if is_heading {
            ElementKind::Heading
        } else {
            kind_for_tag(&node.tag)
        };

        let has_content =
            !node.text.trim().is_empty() || matches!(kind, ElementKind::Image | ElementKind::Table);
        if has_content {
            let explicit = node.position.is_some();
            let position = match node.position {
                Some(pos) => {
                    cursor.sync_to(&pos);
                    pos
                }
                None => cursor.place(kind),
            };

            let level = heading_level(node).unwrap_or(0);
            let confidence = element_confidence(node, kind, explicit);
            debug!(tag = %node.tag, kind = kind.name(), page = position.page, "element typed");

            elements.push(Element {
                id: ElementId(elements.len()),
                kind,
                level,
                text: node.text.trim().to_string(),
                page: position.page,
                bbox: position.bbox,
                depth,
                confidence,
                explicit_position: explicit,
            });
        }
    }

    for child in &node.children {
        flatten(child, depth + 1, cursor, elements);
    }
}

fn element_confidence(node: &ParsedNode, kind: ElementKind, explicit_position: bool) -> f32 {
    let mut confidence = BASE_CONFIDENCE;
    if kind != ElementKind::Container {
        confidence += TYPED_BONUS;
    }
    if explicit_position {
        confidence += POSITION_BONUS;
    }
    if kind == ElementKind::Container
        && node.classes.is_empty()
        && node.text.trim().len() < CONTAINER_MARKER_LEN
    {
        confidence -= CONTAINER_PENALTY;
    }
    confidence.clamp(0.5, 1.0)
}

/// Group elements into a section tree.
///
/// Headings open sections; a new section of level L closes every open
/// section whose level is >= L, then nests under the first open section
/// with a strictly lower level (or becomes top-level). Non-heading
/// elements attach to the innermost open section; content before the
/// first heading goes into an implicit untitled preamble section.
fn build_sections(elements: &[Element]) -> Vec<Section> {
    let mut roots: Vec<Section> = Vec::new();
    // Open sections, outermost first. Levels are strictly increasing.
    let mut stack: Vec<Section> = Vec::new();

    fn close_into(stack: &mut Vec<Section>, roots: &mut Vec<Section>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.subsections.push(done),
                None => roots.push(done),
            }
        }
    }

    for element in elements {
        if element.kind == ElementKind::Heading {
            let level = element.level.max(1);
            while stack.last().is_some_and(|open| open.level >= level) {
                close_into(&mut stack, &mut roots);
            }
            stack.push(Section {
                title: element.text.clone(),
                level,
                heading: Some(element.id),
                elements: vec![element.id],
                subsections: Vec::new(),
            });
        } else {
            match stack.last_mut() {
                Some(open) => open.elements.push(element.id),
                None => {
                    stack.push(Section {
                        title: String::new(),
                        level: 1,
                        heading: None,
                        elements: vec![element.id],
                        subsections: Vec::new(),
                    });
                }
            }
        }
    }

    while !stack.is_empty() {
        close_into(&mut stack, &mut roots);
    }

    roots
}
