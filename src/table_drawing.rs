//! Drawing of tables which continue over as many pages as their rows need.

use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Rect, TextStyle};
use crate::error::ContextError;
use crate::font::{StandardFont, MILLIMETERS_PER_POINT};
use crate::table::TableSpec;
use crate::theme::Theme;

/// Space between the cell borders and the cell text, in millimeters.
pub const CELL_PADDING: f32 = 2.0;
/// Width given to automatically sized columns when no space is left for them, in millimeters.
pub const MINIMUM_COLUMN_WIDTH: f32 = 10.0;
const LINE_HEIGHT_FACTOR: f32 = 1.15;
const BORDER_WIDTH: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStyle {
    /// Fill every other body row.
    pub striped: bool,
    /// Font size of the header and of the body, in points.
    pub font_size: f32,
}

impl Default for TableStyle {
    fn default() -> Self {
        TableStyle {
            striped: true,
            font_size: 8.0,
        }
    }
}

impl TableStyle {
    fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_FACTOR * MILLIMETERS_PER_POINT
    }

    /// The height of a row whose tallest cell has the given number of lines.
    pub fn row_height(&self, line_count: usize) -> f32 {
        line_count.max(1) as f32 * self.line_height() + 2.0 * CELL_PADDING
    }
}

/// Where a table is drawn: its left edge and width, the position of its top on the
/// first page and the lowest position rows may reach on every page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TablePlacement {
    pub x: f32,
    pub width: f32,
    pub start_y: f32,
    pub bottom_limit: f32,
}

/// What drawing a table did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOutcome {
    /// The bottom of the last row, on the last page the table was drawn on.
    pub final_y: f32,
    pub pages_added: usize,
    pub rows_drawn: usize,
}

/// Computes the width of every column: explicit widths are kept, and the width left is shared
/// among the other columns in proportion to the width of their widest content.
pub fn column_widths(table: &TableSpec, style: &TableStyle, available_width: f32) -> Vec<f32> {
    let natural_widths: Vec<f32> = table
        .columns
        .iter()
        .map(|column| {
            let header_width = widest_line(StandardFont::HelveticaBold, &column.header, style);
            table
                .rows
                .iter()
                .map(|row| widest_line(StandardFont::Helvetica, &table.cell_text(row, column), style))
                .fold(header_width, f32::max)
                + 2.0 * CELL_PADDING
        })
        .collect();

    let explicit_width: f32 = table.columns.iter().filter_map(|column| column.width).sum();
    let automatic_count = table
        .columns
        .iter()
        .filter(|column| column.width.is_none())
        .count();
    let automatic_natural_width: f32 = table
        .columns
        .iter()
        .zip(&natural_widths)
        .filter(|(column, _)| column.width.is_none())
        .map(|(_, width)| width)
        .sum();
    let remaining_width = available_width - explicit_width;

    table
        .columns
        .iter()
        .zip(&natural_widths)
        .map(|(column, natural_width)| match column.width {
            Some(width) => width,
            None if remaining_width <= MINIMUM_COLUMN_WIDTH * automatic_count as f32 => {
                MINIMUM_COLUMN_WIDTH
            }
            None if automatic_natural_width <= 0.0 => remaining_width / automatic_count as f32,
            None => (remaining_width * natural_width / automatic_natural_width)
                .max(MINIMUM_COLUMN_WIDTH),
        })
        .collect()
}

fn widest_line(font: StandardFont, text: &str, style: &TableStyle) -> f32 {
    text.split('\n')
        .map(|line| font.text_width(line, style.font_size))
        .fold(0.0, f32::max)
}

/// The wrapped lines of every cell of a row.
fn wrap_cells(
    texts: &[String],
    widths: &[f32],
    font: StandardFont,
    style: &TableStyle,
) -> Vec<Vec<String>> {
    texts
        .iter()
        .zip(widths)
        .map(|(text, width)| {
            font.wrap_text(text, style.font_size, (width - 2.0 * CELL_PADDING).max(1.0))
        })
        .collect()
}

fn tallest_cell(cells: &[Vec<String>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1)
}

/// The lines `first_line..first_line + count` of every cell of a row.
fn cell_lines(cells: &[Vec<String>], first_line: usize, count: usize) -> Vec<Vec<String>> {
    cells
        .iter()
        .map(|lines| lines.iter().skip(first_line).take(count).cloned().collect())
        .collect()
}

/// Draws the table, calling `break_page` whenever the next row does not fit above the bottom
/// limit anymore. `break_page` is expected to start a new page and to return the position the
/// table continues from on it; the header row is repeated there.
///
/// A row which does not fit on a fresh page either is split between its wrapped lines, the
/// lines left over continuing below the repeated header of the next page.
pub fn draw_table<C, F>(
    canvas: &mut C,
    table: &TableSpec,
    style: &TableStyle,
    theme: &Theme,
    placement: TablePlacement,
    mut break_page: F,
) -> Result<TableOutcome, ContextError>
where
    C: Canvas,
    F: FnMut(&mut C) -> Result<f32, ContextError>,
{
    let widths = column_widths(table, style, placement.width);
    let header_cells = wrap_cells(
        &table
            .columns
            .iter()
            .map(|column| column.header.clone())
            .collect::<Vec<_>>(),
        &widths,
        StandardFont::HelveticaBold,
        style,
    );
    let header_height = style.row_height(tallest_cell(&header_cells));
    let body_cells: Vec<Vec<Vec<String>>> = table
        .row_texts()
        .iter()
        .map(|texts| wrap_cells(texts, &widths, StandardFont::Helvetica, style))
        .collect();

    let mut outcome = TableOutcome {
        final_y: placement.start_y,
        pages_added: 0,
        rows_drawn: 0,
    };
    let mut y = placement.start_y;

    // The header is never left alone at the bottom of a page
    let first_row_height = body_cells
        .first()
        .map(|cells| style.row_height(tallest_cell(cells)))
        .unwrap_or(0.0);
    if y + header_height + first_row_height > placement.bottom_limit {
        y = break_page(canvas)?;
        outcome.pages_added += 1;
    }
    draw_row(canvas, &header_cells, &widths, placement.x, y, header_height, RowKind::Header, style, theme)?;
    y += header_height;

    let mut rows_on_page = 0;
    for (index, cells) in body_cells.iter().enumerate() {
        let line_count = tallest_cell(cells);
        let mut row_height = style.row_height(line_count);
        if y + row_height > placement.bottom_limit && rows_on_page > 0 {
            log::trace!("Row {} continues the table on a new page", index);
            y = break_page(canvas)?;
            outcome.pages_added += 1;
            draw_row(canvas, &header_cells, &widths, placement.x, y, header_height, RowKind::Header, style, theme)?;
            y += header_height;
            rows_on_page = 0;
        }

        let kind = if style.striped && index % 2 == 1 {
            RowKind::StripedBody
        } else {
            RowKind::Body
        };

        let mut first_line = 0;
        while y + row_height > placement.bottom_limit {
            let fitting_lines = ((placement.bottom_limit - y - 2.0 * CELL_PADDING) / style.line_height()
                + 1e-4)
                .floor()
                .max(0.0) as usize;
            // At least one line is kept for the part after the split
            let fitting_lines = fitting_lines.min(line_count - first_line - 1);
            if fitting_lines == 0 {
                break;
            }
            let part = cell_lines(cells, first_line, fitting_lines);
            draw_row(canvas, &part, &widths, placement.x, y, style.row_height(fitting_lines), kind, style, theme)?;
            first_line += fitting_lines;
            log::trace!("Row {} is split after its line {}", index, first_line);

            y = break_page(canvas)?;
            outcome.pages_added += 1;
            draw_row(canvas, &header_cells, &widths, placement.x, y, header_height, RowKind::Header, style, theme)?;
            y += header_height;
            row_height = style.row_height(line_count - first_line);
        }

        let rest = cell_lines(cells, first_line, line_count - first_line);
        draw_row(canvas, &rest, &widths, placement.x, y, row_height, kind, style, theme)?;
        y += row_height;
        rows_on_page += 1;
        outcome.rows_drawn += 1;
    }

    outcome.final_y = y;
    log::debug!(
        "Drew a table of {} rows over {} additional pages, ending at {:.1}mm",
        outcome.rows_drawn,
        outcome.pages_added,
        outcome.final_y
    );

    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Body,
    StripedBody,
}

#[allow(clippy::too_many_arguments)]
fn draw_row<C: Canvas>(
    canvas: &mut C,
    cells: &[Vec<String>],
    widths: &[f32],
    x: f32,
    y: f32,
    height: f32,
    kind: RowKind,
    style: &TableStyle,
    theme: &Theme,
) -> Result<(), ContextError> {
    let row_width: f32 = widths.iter().sum();
    let text_style = match kind {
        RowKind::Header => {
            canvas.fill_rect(Rect::new(x, y, row_width, height), theme.primary)?;
            TextStyle::new(StandardFont::HelveticaBold, style.font_size, theme.on_primary)
        }
        RowKind::StripedBody => {
            canvas.fill_rect(Rect::new(x, y, row_width, height), theme.zebra)?;
            TextStyle::new(StandardFont::Helvetica, style.font_size, theme.text)
        }
        RowKind::Body => TextStyle::new(StandardFont::Helvetica, style.font_size, theme.text),
    };

    let ascent = style.font_size * MILLIMETERS_PER_POINT * 0.8;
    let mut cell_x = x;
    for (lines, width) in cells.iter().zip(widths) {
        canvas.stroke_rect(Rect::new(cell_x, y, *width, height), theme.border, BORDER_WIDTH)?;
        for (line_index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline = y + CELL_PADDING + ascent + line_index as f32 * style.line_height();
            canvas.text(line, cell_x + CELL_PADDING, baseline, &text_style)?;
        }
        cell_x += width;
    }

    Ok(())
}
