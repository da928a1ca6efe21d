use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::sections::HEADER_END;

/// Vertical space kept free at the bottom of every page for the footer, in millimeters.
pub const FOOTER_RESERVE: f32 = 25.0;

/// Extra space below the top margin on continuation pages, so that continued content
/// does not touch the top edge.
pub const CONTINUATION_TOP_PADDING: f32 = 10.0;

/// Page size and margin in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with a 20mm margin.
    fn default() -> Self {
        PageGeometry {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
        }
    }
}

impl PageGeometry {
    /// Checks that the margins leave a content area, and that the page is tall enough for
    /// the header to end above the footer reserve.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.margin < 0.0 || self.width - 2.0 * self.margin <= 0.0 {
            return Err(ContextError::with_context(format!(
                "A margin of {}mm leaves no content area on a page {}mm wide",
                self.margin, self.width
            )));
        }
        if self.height - FOOTER_RESERVE <= HEADER_END {
            return Err(ContextError::with_context(format!(
                "A page {}mm high is too short for the header and the footer, which need more than {}mm",
                self.height,
                HEADER_END + FOOTER_RESERVE
            )));
        }

        Ok(())
    }
}

/// The mutable layout state of a single document: where the next block goes and on which page.
///
/// The cursor always stays within `margin..=page_height`, and once a block has been laid out
/// it never goes past `bottom_limit()`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    page_width: f32,
    page_height: f32,
    margin: f32,
    content_width: f32,
    cursor_y: f32,
    page_number: usize,
    footer_drawn: bool,
}

impl PageState {
    pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
        PageState {
            page_width,
            page_height,
            margin,
            content_width: page_width - 2.0 * margin,
            cursor_y: margin,
            page_number: 1,
            footer_drawn: false,
        }
    }

    pub fn page_width(&self) -> f32 {
        self.page_width
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn footer_drawn(&self) -> bool {
        self.footer_drawn
    }

    /// The lowest position content may reach before the footer reserve begins.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - FOOTER_RESERVE
    }

    /// Where the cursor starts on every page after the first one.
    pub fn continuation_top(&self) -> f32 {
        self.margin + CONTINUATION_TOP_PADDING
    }

    /// The vertical space left on the current page.
    pub fn remaining(&self) -> f32 {
        (self.bottom_limit() - self.cursor_y).max(0.0)
    }

    /// The largest block that fits on a freshly started continuation page.
    pub fn fresh_page_capacity(&self) -> f32 {
        self.bottom_limit() - self.continuation_top()
    }

    pub fn fits(&self, required_height: f32) -> bool {
        self.cursor_y + required_height <= self.bottom_limit()
    }

    pub fn advance(&mut self, height: f32) {
        self.move_to(self.cursor_y + height);
    }

    /// Moves the cursor to an absolute position, clamped to the page.
    pub fn move_to(&mut self, y: f32) {
        self.cursor_y = y.clamp(self.margin, self.page_height);
    }

    pub(crate) fn mark_footer_drawn(&mut self) {
        self.footer_drawn = true;
    }

    pub(crate) fn start_next_page(&mut self) {
        self.page_number += 1;
        self.cursor_y = self.continuation_top();
        self.footer_drawn = false;
    }
}

impl From<PageGeometry> for PageState {
    fn from(geometry: PageGeometry) -> Self {
        PageState::new(geometry.width, geometry.height, geometry.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_narrow_pages_are_rejected() {
        assert!(PageGeometry::default().validate().is_ok());
        let short = PageGeometry {
            height: 100.0,
            ..PageGeometry::default()
        };
        assert!(short.validate().is_err());
        let narrow = PageGeometry {
            width: 40.0,
            ..PageGeometry::default()
        };
        assert!(narrow.validate().is_err());
    }

    #[test]
    fn a4_page_state() {
        let state = PageState::from(PageGeometry::default());
        assert_eq!(state.content_width(), 170.0);
        assert_eq!(state.cursor_y(), 20.0);
        assert_eq!(state.page_number(), 1);
        assert_eq!(state.bottom_limit(), 272.0);
        assert_eq!(state.fresh_page_capacity(), 242.0);
    }

    #[test]
    fn cursor_is_clamped_to_the_page() {
        let mut state = PageState::from(PageGeometry::default());
        state.move_to(5.0);
        assert_eq!(state.cursor_y(), 20.0);
        state.advance(1000.0);
        assert_eq!(state.cursor_y(), 297.0);
        assert_eq!(state.remaining(), 0.0);

        state.start_next_page();
        assert_eq!(state.cursor_y(), 30.0);
        assert_eq!(state.page_number(), 2);
        assert!(state.fits(242.0));
        assert!(!state.fits(242.5));
    }
}
