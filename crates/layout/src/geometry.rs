//! Deterministic geometry fallback for elements without position metadata.
//!
//! Many converters drop page coordinates for reflowed content. Rather than
//! failing, the builder lays such elements out with a simple top-to-bottom
//! cursor over a nominal A4 page: same input, same geometry, every run.

use catalog_common::{
    BoundingBox, ElementKind, PagePosition, PAGE_HEIGHT, PAGE_MARGIN, PAGE_WIDTH,
};

/// Vertical gap between consecutive estimated elements, in points.
const ELEMENT_GAP: f64 = 12.0;

/// Nominal height for each element kind, in points.
fn nominal_height(kind: ElementKind) -> f64 {
    match kind {
        ElementKind::Heading => 40.0,
        ElementKind::Paragraph => 120.0,
        ElementKind::List => 160.0,
        ElementKind::Table => 200.0,
        ElementKind::Image => 240.0,
        ElementKind::Container => 60.0,
    }
}

/// Running placement cursor for estimated element positions.
#[derive(Debug, Clone)]
pub struct LayoutCursor {
    page: u32,
    y: f64,
}

impl Default for LayoutCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCursor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: 1,
            y: PAGE_MARGIN,
        }
    }

    /// Place an element of the given kind, advancing the cursor.
    ///
    /// Wraps to the next page when the content area is exhausted.
    pub fn place(&mut self, kind: ElementKind) -> PagePosition {
        let height = nominal_height(kind);
        if self.y + height > PAGE_HEIGHT - PAGE_MARGIN {
            self.page += 1;
            self.y = PAGE_MARGIN;
        }

        let position = PagePosition {
            page: self.page,
            bbox: BoundingBox::new(
                PAGE_MARGIN,
                self.y,
                PAGE_WIDTH - 2.0 * PAGE_MARGIN,
                height,
            ),
        };
        self.y += height + ELEMENT_GAP;
        position
    }

    /// Resynchronize after an element carrying explicit coordinates, so
    /// that following estimated elements continue below it.
    pub fn sync_to(&mut self, position: &PagePosition) {
        if position.page > self.page
            || (position.page == self.page && position.bbox.y + position.bbox.height > self.y)
        {
            self.page = position.page;
            self.y = position.bbox.y + position.bbox.height + ELEMENT_GAP;
        }
    }

    /// Current page of the cursor.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_is_deterministic() {
        let mut a = LayoutCursor::new();
        let mut b = LayoutCursor::new();
        for kind in [
            ElementKind::Heading,
            ElementKind::Paragraph,
            ElementKind::Image,
        ] {
            assert_eq!(a.place(kind), b.place(kind));
        }
    }

    #[test]
    fn test_cursor_wraps_to_next_page() {
        let mut cursor = LayoutCursor::new();
        // Images are 240pt; the content area holds two before wrapping.
        let first = cursor.place(ElementKind::Image);
        assert_eq!(first.page, 1);
        cursor.place(ElementKind::Image);
        let third = cursor.place(ElementKind::Image);
        assert_eq!(third.page, 2);
        assert_eq!(third.bbox.y, PAGE_MARGIN);
    }

    #[test]
    fn test_sync_to_explicit_position() {
        let mut cursor = LayoutCursor::new();
        cursor.sync_to(&PagePosition {
            page: 3,
            bbox: BoundingBox::new(72.0, 400.0, 400.0, 100.0),
        });
        let placed = cursor.place(ElementKind::Paragraph);
        assert_eq!(placed.page, 3);
        assert!(placed.bbox.y > 500.0);
    }

    #[test]
    fn test_sync_never_moves_backwards() {
        let mut cursor = LayoutCursor::new();
        cursor.place(ElementKind::Table);
        let before = cursor.page();
        cursor.sync_to(&PagePosition {
            page: 0,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        });
        assert_eq!(cursor.page(), before);
    }
}
