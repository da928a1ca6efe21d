use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::canvas::Canvas;
use crate::error::ContextError;
use crate::pdf::PdfDocument;
use crate::report::{ReportBuilder, ReportOptions};
use crate::sections::{KeyValue, Signatories, SummaryItem};
use crate::table::{Row, TableColumn, TableSpec};
use crate::table_drawing::TableStyle;

/// What the header of a report shows. It is created once per document and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
}

impl DocumentConfig {
    pub fn new<T: Into<String>>(title: T) -> Self {
        DocumentConfig {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_period<S: Into<String>>(mut self, period: S) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn with_department<S: Into<String>>(mut self, department: S) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_generated_by<S: Into<String>>(mut self, generated_by: S) -> Self {
        self.generated_by = Some(generated_by.into());
        self
    }
}

/// A block of a report document, in the order it is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Section {
    SectionTitle {
        title: String,
    },
    SummaryCards {
        items: Vec<SummaryItem>,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        #[serde(default)]
        title: Option<String>,
        columns: Vec<TableColumn>,
        #[serde(default)]
        rows: Vec<Row>,
        #[serde(default)]
        style: TableStyle,
    },
    Paragraph {
        text: String,
    },
    KeyValues {
        pairs: Vec<KeyValue>,
    },
    Divider,
    #[serde(rename_all = "camelCase")]
    SignatureBlock {
        #[serde(default)]
        prepared_by: Option<String>,
        #[serde(default)]
        approved_by: Option<String>,
    },
}

/// A whole report described as data: the header configuration and the sections following it.
///
/// # Example
///
/// ```json
/// {
///     "config": { "title": "Liquidity Report", "period": "Q1 2026" },
///     "sections": [
///         { "type": "section-title", "title": "Overview" },
///         { "type": "paragraph", "text": "Balances remained stable." },
///         { "type": "divider" }
///     ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub config: DocumentConfig,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn from_path<P: AsRef<Path>>(document_path: P) -> Result<ReportDocument, ContextError> {
        let document_path = document_path.as_ref();
        let document_content = std::fs::read_to_string(document_path).map_err(|error| {
            ContextError::with_error(
                format!("Unable to read the report document {:?}", document_path),
                &error,
            )
        })?;
        let document: ReportDocument =
            serde_json::from_str(&document_content).map_err(|error| {
                ContextError::with_error(
                    format!("Unable to parse the report document {:?}", document_path),
                    &error,
                )
            })?;

        Ok(document)
    }

    /// Lays out every section of the document, in order, onto the canvas and finalizes it.
    pub fn render_on<C: Canvas>(
        &self,
        canvas: C,
        options: &ReportOptions,
    ) -> Result<ReportBuilder<C>, ContextError> {
        let mut builder = ReportBuilder::generate_on(canvas, self.config.clone(), options)?;
        for section in self.sections.iter() {
            apply_section(&mut builder, section)?;
        }
        builder.finalize()?;

        Ok(builder)
    }

    /// Converts the document into a finalized PDF report, ready to be written out.
    pub fn to_pdf(&self, options: &ReportOptions) -> Result<ReportBuilder<PdfDocument>, ContextError> {
        let mut builder = ReportBuilder::generate(self.config.clone(), options)?;
        for section in self.sections.iter() {
            apply_section(&mut builder, section)?;
        }
        builder.finalize()?;

        Ok(builder)
    }
}

fn apply_section<C: Canvas>(
    builder: &mut ReportBuilder<C>,
    section: &Section,
) -> Result<(), ContextError> {
    match section {
        Section::SectionTitle { title } => builder.add_section_title(title)?,
        Section::SummaryCards { items } => builder.add_summary_cards(items)?,
        Section::Table {
            title,
            columns,
            rows,
            style,
        } => builder.add_table_with_style(
            title.as_deref(),
            &TableSpec::new(columns.clone(), rows.clone()),
            style,
        )?,
        Section::Paragraph { text } => builder.add_paragraph(text)?,
        Section::KeyValues { pairs } => builder.add_key_values(pairs)?,
        Section::Divider => builder.add_divider()?,
        Section::SignatureBlock {
            prepared_by,
            approved_by,
        } => builder.add_signature_block(&Signatories {
            prepared_by: prepared_by.clone(),
            approved_by: approved_by.clone(),
        })?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;

    const DOCUMENT: &str = r#"{
        "config": {
            "title": "Liquidity Report",
            "period": "Q1 2026",
            "generatedBy": "Treasury Desk"
        },
        "sections": [
            { "type": "section-title", "title": "Overview" },
            { "type": "summary-cards", "items": [
                { "label": "Cash", "value": "NGN 4.2bn", "trend": "up", "trendValue": "+3.1%" },
                { "label": "Placements", "value": 12 }
            ] },
            { "type": "table", "title": "Balances", "columns": [
                { "header": "Bank", "dataKey": "bank" },
                { "header": "Balance", "dataKey": "balance", "width": 40 }
            ], "rows": [ { "bank": "Access", "balance": "1,200.00" } ] },
            { "type": "paragraph", "text": "Balances remained stable." },
            { "type": "key-values", "pairs": [ { "label": "Reviewed", "value": "Yes" } ] },
            { "type": "divider" },
            { "type": "signature-block", "preparedBy": "A. Okafor" }
        ]
    }"#;

    #[test]
    fn sections_are_parsed_from_tagged_json() {
        let document: ReportDocument = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(document.sections.len(), 7);
        assert_eq!(document.config.generated_by.as_deref(), Some("Treasury Desk"));
        assert_eq!(
            document.sections[6],
            Section::SignatureBlock {
                prepared_by: Some("A. Okafor".into()),
                approved_by: None,
            }
        );
        match &document.sections[2] {
            Section::Table { columns, style, .. } => {
                assert_eq!(columns[1].width, Some(40.0));
                assert!(style.striped);
            }
            other => panic!("Expected a table, found {:?}", other),
        }
    }

    #[test]
    fn rendering_lays_out_every_section() {
        let document: ReportDocument = serde_json::from_str(DOCUMENT).unwrap();
        let builder = document
            .render_on(RecordingCanvas::new(210.0, 297.0), &ReportOptions::default())
            .unwrap();
        let canvas = builder.canvas();

        assert_eq!(canvas.page_count(), 1);
        let texts = canvas.texts();
        for expected in [
            "Liquidity Report",
            "Overview",
            "NGN 4.2bn",
            "12",
            "Access",
            "Balances remained stable.",
            "Reviewed",
            "A. Okafor",
            "Page 1",
        ] {
            assert!(texts.contains(&expected), "{:?} is missing", expected);
        }
    }
}
