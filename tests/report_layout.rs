use rand::{rngs::StdRng, Rng, SeedableRng};

use reportr::canvas::{Canvas, DrawCommand, RecordingCanvas};
use reportr::document::DocumentConfig;
use reportr::geometry::{PageState, CONTINUATION_TOP_PADDING, FOOTER_RESERVE};
use reportr::report::{ReportBuilder, ReportOptions};
use reportr::sections::{KeyValue, Signatories, SummaryItem, Trend};
use reportr::table::{Row, TableColumn, TableSpec};

fn options() -> ReportOptions {
    ReportOptions::default().generated_at(time::macros::datetime!(2026-01-31 17:05 UTC))
}

fn recording_builder(title: &str) -> ReportBuilder<RecordingCanvas> {
    ReportBuilder::generate_on(
        RecordingCanvas::new(210.0, 297.0),
        DocumentConfig::new(title).with_period("January 2026"),
        &options(),
    )
    .unwrap()
}

fn deals_table(row_count: usize) -> TableSpec {
    TableSpec::new(
        vec![
            TableColumn::new("Deal Ref", "reference").with_width(30.0),
            TableColumn::new("Pair", "pair"),
            TableColumn::new("Amount", "amount"),
        ],
        (0..row_count)
            .map(|index| {
                Row::new()
                    .with("reference", format!("FX-{index:04}"))
                    .with("pair", "USD/NGN")
                    .with("amount", 1_000_000.0 + index as f64)
            })
            .collect(),
    )
}

fn assert_within_page(state: &PageState) {
    assert!(
        state.cursor_y() >= state.margin(),
        "cursor {} above the margin",
        state.cursor_y()
    );
    assert!(
        state.cursor_y() <= state.page_height() - FOOTER_RESERVE,
        "cursor {} inside the footer reserve",
        state.cursor_y()
    );
}

fn footer_count(canvas: &RecordingCanvas, page_number: usize) -> usize {
    let footer = format!("Page {page_number}");
    canvas
        .texts_on_page(page_number)
        .into_iter()
        .filter(|text| *text == footer)
        .count()
}

fn random_words(rng: &mut StdRng, count: usize) -> String {
    const WORDS: [&str; 8] = [
        "liquidity",
        "placement",
        "naira",
        "settlement",
        "yield",
        "counterparty",
        "limit",
        "exposure",
    ];
    (0..count)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn cursor_never_reaches_the_footer_reserve() {
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut builder = recording_builder("Randomized Report");
        assert_within_page(builder.page_state());

        for _ in 0..rng.gen_range(5..40) {
            let page_before = builder.page_state().page_number();
            let is_table = match rng.gen_range(0..7) {
                0 => {
                    builder.add_section_title("Section").unwrap();
                    false
                }
                1 => {
                    let count = rng.gen_range(0..7);
                    let items: Vec<_> = (0..count)
                        .map(|index| {
                            SummaryItem::new(format!("Item {index}"), index as f64)
                                .with_trend(Trend::Neutral, "0.0%")
                        })
                        .collect();
                    builder.add_summary_cards(&items).unwrap();
                    false
                }
                2 => {
                    let title = if rng.gen_bool(0.5) { Some("Deals") } else { None };
                    builder
                        .add_table(title, &deals_table(rng.gen_range(0..60)))
                        .unwrap();
                    true
                }
                3 => {
                    let text = random_words(&mut rng, 150);
                    builder.add_paragraph(&text).unwrap();
                    false
                }
                4 => {
                    let pairs: Vec<_> = (0..rng.gen_range(1..10))
                        .map(|index| KeyValue::new(format!("Key {index}"), "Value"))
                        .collect();
                    builder.add_key_values(&pairs).unwrap();
                    false
                }
                5 => {
                    builder.add_divider().unwrap();
                    false
                }
                _ => {
                    builder
                        .add_signature_block(&Signatories::default())
                        .unwrap();
                    false
                }
            };

            let state = builder.page_state();
            assert_within_page(state);
            assert_eq!(state.page_number(), builder.canvas().page_count());
            if !is_table {
                assert!(state.page_number() - page_before <= 1);
            }
        }

        builder.finalize().unwrap();
        let canvas = builder.canvas();
        for page_number in 1..=canvas.page_count() {
            assert_eq!(
                footer_count(canvas, page_number),
                1,
                "page {} of seed {}",
                page_number,
                seed
            );
        }
    }
}

#[test]
fn overflowing_block_starts_at_the_continuation_top() {
    let mut builder = recording_builder("Overflow");
    let pairs: Vec<_> = (0..26)
        .map(|index| KeyValue::new(format!("Key {index}"), "Value"))
        .collect();
    builder.add_key_values(&pairs).unwrap();
    assert_eq!(builder.page_state().page_number(), 1);

    builder.add_section_title("Continued").unwrap();
    let state = builder.page_state();
    let continuation_top = state.margin() + CONTINUATION_TOP_PADDING;
    assert_eq!(state.page_number(), 2);
    assert_eq!(state.cursor_y(), continuation_top + 16.0);

    let first_fill = builder
        .canvas()
        .page(2)
        .iter()
        .find_map(|command| match command {
            DrawCommand::FillRect { rect, .. } => Some(rect.y),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_fill, continuation_top);
}

#[test]
fn long_table_is_continued_with_its_header() {
    let mut builder = recording_builder("FX Blotter");
    builder
        .add_table(Some("All Deals"), &deals_table(200))
        .unwrap();
    builder.finalize().unwrap();

    let page_count = builder.page_state().page_number();
    assert!(page_count > 1);
    let canvas = builder.canvas();
    assert_eq!(canvas.page_count(), page_count);
    for page_number in 1..=page_count {
        let texts = canvas.texts_on_page(page_number);
        assert!(texts.contains(&"Deal Ref"), "no header on page {page_number}");
        assert_eq!(footer_count(canvas, page_number), 1);
    }
    let texts = canvas.texts();
    assert!(texts.contains(&"FX-0000"));
    assert!(texts.contains(&"FX-0199"));
}

#[test]
fn table_cells_follow_the_column_order() {
    let mut builder = recording_builder("Column Order");
    let table = TableSpec::new(
        vec![
            TableColumn::new("A", "a"),
            TableColumn::new("B", "b"),
            TableColumn::new("C", "c"),
        ],
        vec![Row::new().with("c", "3").with("b", "2").with("a", "1")],
    );
    builder.add_table(None, &table).unwrap();

    let texts = builder.canvas().texts_on_page(1);
    let start = texts.iter().position(|text| *text == "A").unwrap();
    similar_asserts::assert_eq!(
        texts[start..start + 6].to_vec(),
        vec!["A", "B", "C", "1", "2", "3"]
    );
}

#[test]
fn empty_report_is_a_single_page() {
    let mut builder =
        ReportBuilder::generate(DocumentConfig::new("Empty Report"), &options()).unwrap();
    builder.finalize().unwrap();
    assert_eq!(builder.page_state().page_number(), 1);

    let bytes = builder.get_bytes().unwrap();
    let parsed = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
}

#[test]
fn pdf_page_count_matches_the_layout() {
    let mut builder =
        ReportBuilder::generate(DocumentConfig::new("FX Blotter"), &options()).unwrap();
    builder
        .add_section_title("Deals")
        .unwrap()
        .add_table(None, &deals_table(200))
        .unwrap()
        .add_signature_block(&Signatories::default())
        .unwrap();
    let page_count = builder.page_state().page_number();

    let bytes = builder.get_bytes().unwrap();
    let parsed = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), page_count);
    assert!(page_count > 1);
}

#[test]
fn cell_longer_than_a_page_is_continued_on_the_next_pages() {
    let mut builder = recording_builder("Settlement Notes");
    let table = TableSpec::new(
        vec![
            TableColumn::new("Deal Ref", "reference").with_width(30.0),
            TableColumn::new("Notes", "notes"),
        ],
        vec![Row::new()
            .with("reference", "FX-0001")
            .with("notes", "settlement instruction ".repeat(600))],
    );
    builder.add_table(Some("Instructions"), &table).unwrap();
    assert_within_page(builder.page_state());
    builder.add_paragraph("Closing remarks").unwrap();
    assert_within_page(builder.page_state());
    builder.finalize().unwrap();

    let page_count = builder.page_state().page_number();
    assert!(page_count > 2);
    let canvas = builder.canvas();
    let bottom_limit = builder.page_state().bottom_limit();
    for page_number in 1..=page_count {
        assert_eq!(footer_count(canvas, page_number), 1);
        for command in canvas.page(page_number) {
            if let DrawCommand::Text { text, y, .. } = command {
                if text.contains("settlement") {
                    assert!(*y <= bottom_limit, "note at {y} on page {page_number}");
                }
            }
        }
    }
}
