use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::font::StandardFont;

/// An RGB color with 8 bits per channel, written in JSON as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255);
    pub const BLACK: Color = Color(0, 0, 0);

    /// The color as the three fractional components the PDF color operators expect.
    pub fn to_fractions(self) -> [f32; 3] {
        [self.0, self.1, self.2].map(|component| f32::from(component) / 255.0)
    }
}

/// A rectangle in millimeters, with the origin at the top left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// How a single run of text is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    /// Font size in points.
    pub size: f32,
    pub color: Color,
    pub alignment: Alignment,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f32, color: Color) -> Self {
        TextStyle {
            font,
            size,
            color,
            alignment: Alignment::Left,
        }
    }

    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Resolves the anchor `x` into the left edge of the text according to the alignment.
    pub fn left_edge(&self, text: &str, x: f32) -> f32 {
        match self.alignment {
            Alignment::Left => x,
            Alignment::Center => x - self.font.text_width(text, self.size) / 2.0,
            Alignment::Right => x - self.font.text_width(text, self.size),
        }
    }
}

/// The drawing primitives the report layout is expressed in. All coordinates are in
/// millimeters from the top left corner of the current page, and text is positioned
/// by its baseline.
pub trait Canvas {
    /// Width and height of the pages in millimeters.
    fn page_size(&self) -> (f32, f32);

    /// The number of pages created so far.
    fn page_count(&self) -> usize;

    /// Appends a new page, which becomes the target of all the following operations.
    fn add_page(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), ContextError>;

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32)
        -> Result<(), ContextError>;

    fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError>;

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) -> Result<(), ContextError>;

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) -> Result<(), ContextError>;

    /// Draws an encoded (PNG or JPEG) image stretched over the rectangle.
    fn image(&mut self, encoded_image: &[u8], rect: Rect) -> Result<(), ContextError>;
}

/// A single drawing operation as recorded by the `RecordingCanvas`.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        line_width: f32,
    },
    FillPolygon {
        points: Vec<(f32, f32)>,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    Image {
        rect: Rect,
        width_in_pixels: u32,
        height_in_pixels: u32,
    },
}

/// A canvas which keeps a display list of every page instead of producing a file.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    page_width: f32,
    page_height: f32,
    pages: Vec<Vec<DrawCommand>>,
}

impl RecordingCanvas {
    /// Creates a canvas with a single empty page of the given size in millimeters.
    pub fn new(page_width: f32, page_height: f32) -> Self {
        RecordingCanvas {
            page_width,
            page_height,
            pages: vec![Vec::new()],
        }
    }

    pub fn pages(&self) -> &[Vec<DrawCommand>] {
        &self.pages
    }

    /// The commands drawn on the page with the given (1-based) number.
    pub fn page(&self, page_number: usize) -> &[DrawCommand] {
        page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All the text drawn on the page with the given (1-based) number, in drawing order.
    pub fn texts_on_page(&self, page_number: usize) -> Vec<&str> {
        self.page(page_number)
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All the text drawn in the document, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        (1..=self.pages.len())
            .flat_map(|page_number| self.texts_on_page(page_number))
            .collect()
    }

    fn record(&mut self, command: DrawCommand) -> Result<(), ContextError> {
        self.pages
            .last_mut()
            .ok_or(ContextError::with_context(
                "Unable to find a page to draw onto",
            ))?
            .push(command);
        Ok(())
    }
}

impl Canvas for RecordingCanvas {
    fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), ContextError> {
        self.record(DrawCommand::FillRect { rect, color })
    }

    fn stroke_rect(
        &mut self,
        rect: Rect,
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        self.record(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        })
    }

    fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        self.record(DrawCommand::Line {
            from,
            to,
            color,
            line_width,
        })
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) -> Result<(), ContextError> {
        self.record(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        })
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) -> Result<(), ContextError> {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            style: *style,
        })
    }

    fn image(&mut self, encoded_image: &[u8], rect: Rect) -> Result<(), ContextError> {
        // Invalid images fail here as they do on the PDF canvas
        let image = image::load_from_memory(encoded_image)
            .map_err(|error| ContextError::with_error("Failed to decode the image", &error))?;
        self.record(DrawCommand::Image {
            rect,
            width_in_pixels: image.width(),
            height_in_pixels: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_moves_the_left_edge() {
        let style = TextStyle::new(StandardFont::Helvetica, 10.0, Color::BLACK);
        let width = StandardFont::Helvetica.text_width("Page 1", 10.0);
        assert_eq!(style.left_edge("Page 1", 190.0), 190.0);
        assert!(
            (style.aligned(Alignment::Right).left_edge("Page 1", 190.0) - (190.0 - width)).abs()
                < 1e-4
        );
        assert!(
            (style.aligned(Alignment::Center).left_edge("Page 1", 100.0) - (100.0 - width / 2.0))
                .abs()
                < 1e-4
        );
    }

    #[test]
    fn recording_canvas_keeps_commands_per_page() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let style = TextStyle::new(StandardFont::Helvetica, 10.0, Color::BLACK);
        canvas.text("first", 20.0, 30.0, &style).unwrap();
        canvas.add_page();
        canvas.text("second", 20.0, 30.0, &style).unwrap();

        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.texts_on_page(1), vec!["first"]);
        assert_eq!(canvas.texts_on_page(2), vec!["second"]);
        assert!(canvas.page(3).is_empty());
        assert!(canvas.image(b"not an image", Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }
}
