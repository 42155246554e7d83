//! Chunking over layout models built from realistic catalog trees.

use catalog_chunking::{chunk_layout, ChunkingConfig, SizeFlag};
use catalog_common::{BoundingBox, PagePosition, ParsedNode};
use catalog_layout::build_layout;

fn catalog_tree() -> ParsedNode {
    ParsedNode {
        tag: "body".to_string(),
        children: vec![
            ParsedNode::leaf("h1", "SEATING COLLECTION"),
            ParsedNode::leaf(
                "p",
                "VALENOVA is a sophisticated modular seating system available in \
                 multiple configurations with premium leather upholstery in black \
                 and brown finishes. Dimensions: 180×90×75 cm.",
            ),
            ParsedNode::leaf("h2", "DINING"),
            ParsedNode::leaf(
                "p",
                "ONA is an elegant dining chair with solid oak construction and a \
                 woven linen seat. Dimensions: 45×52×78 cm. Designed by YONOH.",
            ),
            ParsedNode::leaf("table", "model width depth height\nONA 45 52 78"),
            ParsedNode::leaf("h1", "SURFACES"),
            ParsedNode::leaf(
                "p",
                "PIQUE ceramic wall tiles by ESTUDI{H}AC in 15×38 and 20×40 formats \
                 with taupe, sand, and clay glazes.",
            ),
        ],
        ..ParsedNode::default()
    }
}

#[test]
fn test_chunks_follow_section_order() {
    let model = build_layout(&catalog_tree());
    let chunks = chunk_layout(&model, &ChunkingConfig::default());

    let titles: Vec<&str> = chunks.iter().map(|c| c.section_title.as_str()).collect();
    let first_dining = titles.iter().position(|t| *t == "DINING").unwrap();
    let first_surfaces = titles.iter().position(|t| *t == "SURFACES").unwrap();
    assert!(titles[0] == "SEATING COLLECTION");
    assert!(first_dining < first_surfaces);

    // Each section's last chunk closes it.
    for title in ["SEATING COLLECTION", "DINING", "SURFACES"] {
        let last = chunks
            .iter()
            .filter(|c| c.section_title == title)
            .next_back()
            .unwrap();
        assert!(last.is_section_final, "section {title} not closed");
    }
}

#[test]
fn test_table_isolated_within_its_section() {
    let model = build_layout(&catalog_tree());
    let chunks = chunk_layout(&model, &ChunkingConfig::default());

    let table_chunks: Vec<_> = chunks.iter().filter(|c| c.tags.contains("table")).collect();
    assert_eq!(table_chunks.len(), 1);
    assert_eq!(table_chunks[0].elements.len(), 1);
    assert_eq!(table_chunks[0].section_title, "DINING");
}

#[test]
fn test_page_change_forces_split() {
    let mut far = ParsedNode::leaf("p", "Continuation on a later page of the catalog.");
    far.position = Some(PagePosition {
        page: 3,
        bbox: BoundingBox::new(72.0, 72.0, 451.0, 120.0),
    });
    let root = ParsedNode {
        tag: "body".to_string(),
        children: vec![
            ParsedNode::leaf("h1", "SPANNING SECTION"),
            ParsedNode::leaf("p", "Opening text on the first page."),
            far,
        ],
        ..ParsedNode::default()
    };
    let model = build_layout(&root);
    let chunks = chunk_layout(&model, &ChunkingConfig::default());

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].page, 1);
    assert_eq!(chunks[1].page, 3);
    assert_eq!(chunks[0].section_title, chunks[1].section_title);
}

#[test]
fn test_overlap_re_measures_size_flags() {
    let root = ParsedNode {
        tag: "body".to_string(),
        children: vec![
            ParsedNode::leaf("h1", "FIRST HEAD"),
            ParsedNode::leaf("p", &"a".repeat(200)),
            ParsedNode::leaf("h1", "SECOND HEAD"),
            ParsedNode::leaf("p", &"b".repeat(130)),
        ],
        ..ParsedNode::default()
    };
    let model = build_layout(&root);

    let without = chunk_layout(&model, &ChunkingConfig::default());
    assert_eq!(without[1].size_flag, Some(SizeFlag::Undersized));

    // 60 chars of overlap push the second chunk past the minimum.
    let config = ChunkingConfig {
        overlap: 60,
        ..ChunkingConfig::default()
    };
    let with = chunk_layout(&model, &config);
    assert_eq!(with[1].size_flag, None);
    assert!(with[1].char_len() > without[1].char_len());
}
