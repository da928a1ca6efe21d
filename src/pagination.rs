use crate::canvas::{Alignment, Canvas, TextStyle};
use crate::error::ContextError;
use crate::font::StandardFont;
use crate::geometry::PageState;
use crate::theme::Theme;

/// Distance of the footer rule from the bottom edge of the page.
const FOOTER_RULE_OFFSET: f32 = 18.0;
/// Distance of the footer baseline from the bottom edge of the page.
const FOOTER_TEXT_OFFSET: f32 = 12.0;
const FOOTER_FONT_SIZE: f32 = 7.5;

/// Everything a section renderer draws with: the layout state, the drawing primitives and the branding.
pub struct Surface<'a, C: Canvas> {
    pub state: &'a mut PageState,
    pub canvas: &'a mut C,
    pub theme: &'a Theme,
}

impl<C: Canvas> Surface<'_, C> {
    /// Makes sure `required_height` millimeters can be drawn from the cursor on, starting a new
    /// page when they would reach into the footer reserve. Returns whether a page was started.
    pub fn ensure_space(&mut self, required_height: f32) -> Result<bool, ContextError> {
        ensure_space(self.state, self.canvas, self.theme, required_height)
    }

    /// Reserves a block which is laid out as a whole when it fits on a single page. Blocks taller
    /// than a fresh page are flowed instead, and `false` is returned so that the caller reserves
    /// every line on its own.
    pub fn reserve_block(&mut self, required_height: f32) -> Result<bool, ContextError> {
        if required_height <= self.state.fresh_page_capacity() {
            self.ensure_space(required_height)?;
            Ok(true)
        } else {
            log::debug!(
                "Block of {:.1}mm is taller than a page, flowing it line by line",
                required_height
            );
            Ok(false)
        }
    }

    /// Advances the cursor by a trailing gap, without letting it reach into the footer reserve.
    pub fn trailing_gap(&mut self, gap: f32) {
        let gap = gap.min(self.state.remaining());
        self.state.advance(gap);
    }
}

/// Makes sure `required_height` millimeters can be drawn from the cursor on, starting a new
/// page when they would reach into the footer reserve. Returns whether a page was started.
pub fn ensure_space<C: Canvas>(
    state: &mut PageState,
    canvas: &mut C,
    theme: &Theme,
    required_height: f32,
) -> Result<bool, ContextError> {
    if state.fits(required_height) {
        return Ok(false);
    }

    log::debug!(
        "{:.1}mm needed at {:.1}mm on page {}, starting a new page",
        required_height,
        state.cursor_y(),
        state.page_number()
    );
    break_page(state, canvas, theme)?;

    Ok(true)
}

/// Closes the current page with its footer and continues on a new one.
pub fn break_page<C: Canvas>(
    state: &mut PageState,
    canvas: &mut C,
    theme: &Theme,
) -> Result<(), ContextError> {
    draw_footer(state, canvas, theme)?;
    canvas.add_page();
    state.start_next_page();

    Ok(())
}

/// Draws the footer of the current page: a rule, the disclosure text and the page number.
/// The footer is drawn at most once per page.
pub fn draw_footer<C: Canvas>(
    state: &mut PageState,
    canvas: &mut C,
    theme: &Theme,
) -> Result<(), ContextError> {
    if state.footer_drawn() {
        log::debug!("Footer of page {} already drawn", state.page_number());
        return Ok(());
    }

    let left = state.margin();
    let right = state.page_width() - state.margin();
    let rule_y = state.page_height() - FOOTER_RULE_OFFSET;
    let text_y = state.page_height() - FOOTER_TEXT_OFFSET;
    let style = TextStyle::new(StandardFont::Helvetica, FOOTER_FONT_SIZE, theme.muted_text);

    canvas.line((left, rule_y), (right, rule_y), theme.border, 0.3)?;
    canvas.text(&theme.disclosure, left, text_y, &style)?;
    canvas.text(
        &format!("Page {}", state.page_number()),
        right,
        text_y,
        &style.aligned(Alignment::Right),
    )?;
    state.mark_footer_drawn();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::geometry::PageGeometry;

    #[test]
    fn no_page_break_while_the_block_fits() {
        let mut state = PageState::from(PageGeometry::default());
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let theme = Theme::default();
        state.move_to(200.0);

        assert!(!ensure_space(&mut state, &mut canvas, &theme, 72.0).unwrap());
        assert_eq!(state.page_number(), 1);
        assert_eq!(canvas.page_count(), 1);
        assert!(canvas.page(1).is_empty());
    }

    #[test]
    fn overflowing_block_starts_a_new_page_with_a_footer() {
        let mut state = PageState::from(PageGeometry::default());
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let theme = Theme::default();
        state.move_to(250.0);

        assert!(ensure_space(&mut state, &mut canvas, &theme, 23.0).unwrap());
        assert_eq!(state.page_number(), 2);
        assert_eq!(state.cursor_y(), 30.0);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.texts_on_page(1), vec![theme.disclosure.as_str(), "Page 1"]);
        assert!(canvas.page(2).is_empty());
        assert!(!state.footer_drawn());
    }

    #[test]
    fn footer_is_drawn_once_per_page() {
        let mut state = PageState::from(PageGeometry::default());
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let theme = Theme::default();

        draw_footer(&mut state, &mut canvas, &theme).unwrap();
        draw_footer(&mut state, &mut canvas, &theme).unwrap();
        assert_eq!(canvas.page(1).len(), 3);
    }
}
