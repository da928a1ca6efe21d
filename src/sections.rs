//! The catalog of blocks a report is made of. Every renderer reserves the space it needs
//! through the pagination controller first, then draws, then advances the cursor.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::canvas::{Alignment, Canvas, Rect, TextStyle};
use crate::document::DocumentConfig;
use crate::error::ContextError;
use crate::font::StandardFont;
use crate::pagination::{break_page, Surface};
use crate::table::{CellValue, TableSpec};
use crate::table_drawing::{draw_table, TableOutcome, TablePlacement, TableStyle};

/// Where the cursor is placed after the header, whatever the header contains.
pub const HEADER_END: f32 = 76.0;
const BANNER_HEIGHT: f32 = 50.0;
const LOGO_SIZE: f32 = 22.0;
const TITLE_FONT_SIZE: f32 = 18.0;
/// Width kept free on the right of the banner for the metadata column.
const METADATA_COLUMN_WIDTH: f32 = 62.0;

pub const SECTION_TITLE_RESERVE: f32 = 18.0;
pub const SECTION_TITLE_ADVANCE: f32 = 16.0;

/// Only this many summary cards fit in the single row they are laid out in; further items are dropped.
pub const MAX_SUMMARY_CARDS: usize = 4;
pub const SUMMARY_ROW_ADVANCE: f32 = 36.0;
const CARD_HEIGHT: f32 = 28.0;
const CARD_GAP: f32 = 4.0;
const CARD_VALUE_FONT_SIZE: f32 = 14.0;

/// Room for the table title, its header and its first row.
pub const TABLE_RESERVE: f32 = 45.0;
const TABLE_TITLE_ADVANCE: f32 = 7.0;
/// Gap left below every table.
pub const TABLE_PADDING: f32 = 10.0;

pub const PARAGRAPH_LINE_HEIGHT: f32 = 5.0;
pub const PARAGRAPH_GAP: f32 = 8.0;
const PARAGRAPH_FONT_SIZE: f32 = 10.0;

pub const KEY_VALUE_LABEL_WIDTH: f32 = 50.0;
pub const KEY_VALUE_ROW_HEIGHT: f32 = 7.0;
pub const KEY_VALUE_GAP: f32 = 5.0;

pub const DIVIDER_ADVANCE: f32 = 8.0;

pub const SIGNATURE_LEADING_GAP: f32 = 10.0;
const SIGNATURE_LABEL_HEIGHT: f32 = 8.0;
const SIGNATURE_BOXES_HEIGHT: f32 = 40.0;
pub const SIGNATURE_BLOCK_ADVANCE: f32 =
    SIGNATURE_LEADING_GAP + SIGNATURE_LABEL_HEIGHT + SIGNATURE_BOXES_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// A headline figure shown as a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub label: String,
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_value: Option<String>,
}

impl SummaryItem {
    pub fn new<L: Into<String>, V: Into<CellValue>>(label: L, value: V) -> Self {
        SummaryItem {
            label: label.into(),
            value: value.into(),
            trend: None,
            trend_value: None,
        }
    }

    pub fn with_trend<T: Into<String>>(mut self, trend: Trend, trend_value: T) -> Self {
        self.trend = Some(trend);
        self.trend_value = Some(trend_value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub label: String,
    pub value: String,
}

impl KeyValue {
    pub fn new<L: Into<String>, V: Into<String>>(label: L, value: V) -> Self {
        KeyValue {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The names printed under the signature lines; blank lines are left when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signatories {
    #[serde(default)]
    pub prepared_by: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
}

/// Whether the title or the subtitle are wider than the space the banner leaves them.
/// The header never measures them, so they would run into the metadata column.
pub fn header_overflows(config: &DocumentConfig, page_width: f32, margin: f32) -> bool {
    let available_width = page_width - 2.0 * margin - LOGO_SIZE - 6.0 - METADATA_COLUMN_WIDTH;
    let title_width = StandardFont::HelveticaBold.text_width(&config.title, TITLE_FONT_SIZE);
    let subtitle_width = config
        .subtitle
        .as_deref()
        .map(|subtitle| StandardFont::Helvetica.text_width(subtitle, 10.0))
        .unwrap_or(0.0);
    title_width > available_width || subtitle_width > available_width
}

/// Draws the branded banner at the top of the first page and moves the cursor to `HEADER_END`.
///
/// When the logo is missing or cannot be drawn, the wordmark of the theme takes its place.
pub fn header<C: Canvas>(
    surface: &mut Surface<'_, C>,
    config: &DocumentConfig,
    logo: Option<&[u8]>,
    generated_at: OffsetDateTime,
) -> Result<(), ContextError> {
    let theme = surface.theme;
    let margin = surface.state.margin();
    let page_width = surface.state.page_width();
    let right = page_width - margin;
    let canvas = &mut *surface.canvas;

    canvas.fill_rect(Rect::new(0.0, 0.0, page_width, BANNER_HEIGHT), theme.primary)?;

    let logo_rect = Rect::new(margin, 12.0, LOGO_SIZE, LOGO_SIZE);
    let logo_drawn = match logo {
        Some(logo) => match canvas.image(logo, logo_rect) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("Unable to draw the logo, drawing the wordmark instead: {}", error);
                false
            }
        },
        None => false,
    };
    if !logo_drawn {
        let wordmark_style = TextStyle::new(StandardFont::HelveticaBold, 9.0, theme.on_primary)
            .aligned(Alignment::Center);
        canvas.stroke_rect(logo_rect, theme.on_primary, 0.4)?;
        canvas.text(
            &theme.wordmark,
            logo_rect.x + LOGO_SIZE / 2.0,
            logo_rect.y + LOGO_SIZE / 2.0 + 1.2,
            &wordmark_style,
        )?;
    }

    let text_x = margin + LOGO_SIZE + 6.0;
    canvas.text(
        &config.title,
        text_x,
        23.0,
        &TextStyle::new(StandardFont::HelveticaBold, TITLE_FONT_SIZE, theme.on_primary),
    )?;
    if let Some(subtitle) = &config.subtitle {
        canvas.text(
            subtitle,
            text_x,
            31.0,
            &TextStyle::new(StandardFont::Helvetica, 10.0, theme.on_primary),
        )?;
    }

    let metadata_style = TextStyle::new(StandardFont::Helvetica, 8.5, theme.on_primary)
        .aligned(Alignment::Right);
    let mut metadata = Vec::new();
    if let Some(period) = &config.period {
        metadata.push(format!("Period: {period}"));
    }
    metadata.push(format!("Generated: {}", format_timestamp(generated_at)?));
    if let Some(generated_by) = &config.generated_by {
        metadata.push(format!("Prepared by: {generated_by}"));
    }
    for (index, line) in metadata.iter().enumerate() {
        canvas.text(line, right, 18.0 + index as f32 * 6.0, &metadata_style)?;
    }

    let department = config
        .department
        .as_deref()
        .map(|department| format!("Department: {department}"))
        .unwrap_or_else(|| theme.organisation.clone());
    canvas.text(
        &department,
        margin,
        60.0,
        &TextStyle::new(StandardFont::Helvetica, 9.0, theme.muted_text),
    )?;
    canvas.text(
        &theme.organisation,
        right,
        60.0,
        &TextStyle::new(StandardFont::HelveticaBold, 9.0, theme.primary).aligned(Alignment::Right),
    )?;
    canvas.line((margin, 66.0), (right, 66.0), theme.accent(0), 0.8)?;

    surface.state.move_to(HEADER_END);

    Ok(())
}

/// Formats the generation timestamp the way it is printed in the header, e.g. `31 Jan 2026, 17:05`.
pub fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, ContextError> {
    timestamp
        .format(format_description!("[day] [month repr:short] [year], [hour]:[minute]"))
        .map_err(|error| ContextError::with_error("Unable to format the generation timestamp", &error))
}

/// A labelled band introducing the blocks that follow.
pub fn section_title<C: Canvas>(
    surface: &mut Surface<'_, C>,
    title: &str,
) -> Result<(), ContextError> {
    surface.ensure_space(SECTION_TITLE_RESERVE)?;

    let theme = surface.theme;
    let margin = surface.state.margin();
    let y = surface.state.cursor_y();
    let width = surface.state.content_width();
    let canvas = &mut *surface.canvas;

    canvas.fill_rect(Rect::new(margin, y, width, 10.0), theme.section_band)?;
    canvas.fill_rect(Rect::new(margin, y, 1.5, 10.0), theme.primary)?;
    canvas.text(
        title,
        margin + 4.5,
        y + 6.8,
        &TextStyle::new(StandardFont::HelveticaBold, 11.0, theme.primary),
    )?;

    surface.state.advance(SECTION_TITLE_ADVANCE);

    Ok(())
}

/// A row of up to `MAX_SUMMARY_CARDS` equal-width cards. Returns how many cards were drawn.
pub fn summary_cards<C: Canvas>(
    surface: &mut Surface<'_, C>,
    items: &[SummaryItem],
) -> Result<usize, ContextError> {
    if items.is_empty() {
        log::debug!("No summary items, skipping the summary cards");
        return Ok(0);
    }
    if items.len() > MAX_SUMMARY_CARDS {
        log::debug!(
            "Only the first {} of {} summary items are drawn",
            MAX_SUMMARY_CARDS,
            items.len()
        );
    }
    let items = &items[..items.len().min(MAX_SUMMARY_CARDS)];

    surface.ensure_space(SUMMARY_ROW_ADVANCE)?;

    let theme = surface.theme;
    let margin = surface.state.margin();
    let y = surface.state.cursor_y();
    let card_count = items.len() as f32;
    let card_width = (surface.state.content_width() - CARD_GAP * (card_count - 1.0)) / card_count;
    let canvas = &mut *surface.canvas;

    for (index, item) in items.iter().enumerate() {
        let x = margin + index as f32 * (card_width + CARD_GAP);
        let card = Rect::new(x, y, card_width, CARD_HEIGHT);
        canvas.fill_rect(card, theme.card_background)?;
        canvas.stroke_rect(card, theme.border, 0.2)?;
        canvas.fill_rect(Rect::new(x, y, 1.5, CARD_HEIGHT), theme.accent(index))?;

        canvas.text(
            &item.label,
            x + 5.0,
            y + 7.0,
            &TextStyle::new(StandardFont::Helvetica, 8.0, theme.muted_text),
        )?;
        // Long values are shrunk to the width of the card
        let value = item.value.to_string();
        let value_width = StandardFont::HelveticaBold.text_width(&value, CARD_VALUE_FONT_SIZE);
        let value_font_size = if value_width > card_width - 10.0 {
            (CARD_VALUE_FONT_SIZE * (card_width - 10.0) / value_width).max(6.0)
        } else {
            CARD_VALUE_FONT_SIZE
        };
        canvas.text(
            &value,
            x + 5.0,
            y + 16.5,
            &TextStyle::new(StandardFont::HelveticaBold, value_font_size, theme.text),
        )?;

        if let Some(trend) = item.trend {
            let color = match trend {
                Trend::Up => theme.trend_up,
                Trend::Down => theme.trend_down,
                Trend::Neutral => theme.trend_neutral,
            };
            let (indicator_x, indicator_y) = (x + 5.0, y + 21.5);
            match trend {
                Trend::Up => canvas.fill_polygon(
                    &[
                        (indicator_x, indicator_y + 2.6),
                        (indicator_x + 3.0, indicator_y + 2.6),
                        (indicator_x + 1.5, indicator_y),
                    ],
                    color,
                )?,
                Trend::Down => canvas.fill_polygon(
                    &[
                        (indicator_x, indicator_y),
                        (indicator_x + 3.0, indicator_y),
                        (indicator_x + 1.5, indicator_y + 2.6),
                    ],
                    color,
                )?,
                Trend::Neutral => {
                    canvas.fill_rect(Rect::new(indicator_x, indicator_y + 0.9, 3.0, 0.8), color)?
                }
            }
            if let Some(trend_value) = &item.trend_value {
                canvas.text(
                    trend_value,
                    indicator_x + 4.5,
                    indicator_y + 2.5,
                    &TextStyle::new(StandardFont::Helvetica, 7.5, color),
                )?;
            }
        }
    }

    surface.state.advance(SUMMARY_ROW_ADVANCE);

    Ok(items.len())
}

/// An optionally titled table, continued over new pages as needed. The cursor ends up
/// `TABLE_PADDING` below the last row.
pub fn table<C: Canvas>(
    surface: &mut Surface<'_, C>,
    title: Option<&str>,
    table: &TableSpec,
    style: &TableStyle,
) -> Result<TableOutcome, ContextError> {
    surface.ensure_space(TABLE_RESERVE)?;

    let theme = surface.theme;
    let Surface { state, canvas, .. } = surface;

    if let Some(title) = title {
        canvas.text(
            title,
            state.margin(),
            state.cursor_y() + 5.0,
            &TextStyle::new(StandardFont::HelveticaBold, 10.0, theme.text),
        )?;
        state.advance(TABLE_TITLE_ADVANCE);
    }

    let placement = TablePlacement {
        x: state.margin(),
        width: state.content_width(),
        start_y: state.cursor_y(),
        // The padding below the table has to fit above the footer reserve as well
        bottom_limit: state.bottom_limit() - TABLE_PADDING,
    };
    let outcome = draw_table(&mut **canvas, table, style, theme, placement, |canvas: &mut C| {
        break_page(&mut **state, canvas, theme)?;
        Ok(state.cursor_y())
    })?;

    state.move_to(outcome.final_y + TABLE_PADDING);

    Ok(outcome)
}

/// Plain text wrapped to the content width.
pub fn paragraph<C: Canvas>(
    surface: &mut Surface<'_, C>,
    text: &str,
) -> Result<(), ContextError> {
    let lines = StandardFont::Helvetica.wrap_text(
        text,
        PARAGRAPH_FONT_SIZE,
        surface.state.content_width(),
    );
    let required_height = lines.len() as f32 * PARAGRAPH_LINE_HEIGHT + PARAGRAPH_GAP;
    let as_block = surface.reserve_block(required_height)?;
    let style = TextStyle::new(StandardFont::Helvetica, PARAGRAPH_FONT_SIZE, surface.theme.text);

    for line in &lines {
        if !as_block {
            surface.ensure_space(PARAGRAPH_LINE_HEIGHT)?;
        }
        let baseline = surface.state.cursor_y() + 4.0;
        if !line.is_empty() {
            surface
                .canvas
                .text(line, surface.state.margin(), baseline, &style)?;
        }
        surface.state.advance(PARAGRAPH_LINE_HEIGHT);
    }
    surface.trailing_gap(PARAGRAPH_GAP);

    Ok(())
}

/// Label and value pairs, the labels in a fixed-width column and the values in bold.
pub fn key_values<C: Canvas>(
    surface: &mut Surface<'_, C>,
    pairs: &[KeyValue],
) -> Result<(), ContextError> {
    let required_height = pairs.len() as f32 * KEY_VALUE_ROW_HEIGHT + KEY_VALUE_GAP;
    let as_block = surface.reserve_block(required_height)?;
    let label_style = TextStyle::new(StandardFont::Helvetica, 9.0, surface.theme.muted_text);
    let value_style = TextStyle::new(StandardFont::HelveticaBold, 9.0, surface.theme.text);

    for pair in pairs {
        if !as_block {
            surface.ensure_space(KEY_VALUE_ROW_HEIGHT)?;
        }
        let margin = surface.state.margin();
        let baseline = surface.state.cursor_y() + 5.0;
        surface.canvas.text(&pair.label, margin, baseline, &label_style)?;
        surface.canvas.text(
            &pair.value,
            margin + KEY_VALUE_LABEL_WIDTH,
            baseline,
            &value_style,
        )?;
        surface.state.advance(KEY_VALUE_ROW_HEIGHT);
    }
    surface.trailing_gap(KEY_VALUE_GAP);

    Ok(())
}

/// A single horizontal rule across the content width.
pub fn divider<C: Canvas>(surface: &mut Surface<'_, C>) -> Result<(), ContextError> {
    surface.ensure_space(DIVIDER_ADVANCE)?;

    let margin = surface.state.margin();
    let right = surface.state.page_width() - margin;
    let y = surface.state.cursor_y() + DIVIDER_ADVANCE / 2.0;
    surface
        .canvas
        .line((margin, y), (right, y), surface.theme.border, 0.3)?;
    surface.state.advance(DIVIDER_ADVANCE);

    Ok(())
}

/// Side by side "Prepared By" and "Approved By" boxes, each with a signature line.
pub fn signature_block<C: Canvas>(
    surface: &mut Surface<'_, C>,
    signatories: &Signatories,
) -> Result<(), ContextError> {
    surface.ensure_space(SIGNATURE_BLOCK_ADVANCE)?;

    let theme = surface.theme;
    let margin = surface.state.margin();
    let right = surface.state.page_width() - margin;
    let content_width = surface.state.content_width();
    let top = surface.state.cursor_y() + SIGNATURE_LEADING_GAP;
    let canvas = &mut *surface.canvas;

    let label = "Authorisation";
    let label_style = TextStyle::new(StandardFont::HelveticaBold, 9.0, theme.muted_text);
    canvas.text(label, margin, top + 4.0, &label_style)?;
    let label_end = margin + StandardFont::HelveticaBold.text_width(label, 9.0) + 3.0;
    canvas.line((label_end, top + 3.0), (right, top + 3.0), theme.border, 0.3)?;

    let boxes_top = top + SIGNATURE_LABEL_HEIGHT;
    let box_gap = 10.0;
    let box_width = (content_width - box_gap) / 2.0;
    let box_height = SIGNATURE_BOXES_HEIGHT - 6.0;
    let heading_style = TextStyle::new(StandardFont::HelveticaBold, 9.0, theme.text);
    let caption_style = TextStyle::new(StandardFont::Helvetica, 8.0, theme.muted_text);

    let columns = [
        ("Prepared By", &signatories.prepared_by),
        ("Approved By", &signatories.approved_by),
    ];
    for (index, (heading, name)) in columns.into_iter().enumerate() {
        let x = margin + index as f32 * (box_width + box_gap);
        canvas.stroke_rect(Rect::new(x, boxes_top, box_width, box_height), theme.border, 0.3)?;
        canvas.text(heading, x + 4.0, boxes_top + 7.0, &heading_style)?;
        canvas.line(
            (x + 4.0, boxes_top + 24.0),
            (x + box_width - 4.0, boxes_top + 24.0),
            theme.text,
            0.3,
        )?;
        let caption = name.as_deref().unwrap_or("Name / Signature / Date");
        canvas.text(caption, x + 4.0, boxes_top + 29.0, &caption_style)?;
    }

    surface.state.advance(SIGNATURE_BLOCK_ADVANCE);

    Ok(())
}
