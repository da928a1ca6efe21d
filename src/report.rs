use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use base64::Engine as _;
use time::OffsetDateTime;

use crate::canvas::Canvas;
use crate::document::DocumentConfig;
use crate::error::ContextError;
use crate::geometry::{PageGeometry, PageState};
use crate::pagination::{draw_footer, Surface};
use crate::pdf::{DocumentInformation, PdfDocument};
use crate::sections::{self, KeyValue, Signatories, SummaryItem};
use crate::table::{ReportTable, TableSpec};
use crate::table_drawing::TableStyle;
use crate::theme::Theme;

/// Everything about a report which is not its content.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub geometry: PageGeometry,
    pub theme: Theme,
    /// Encoded PNG or JPEG image drawn in the header.
    pub logo: Option<Vec<u8>>,
    /// The timestamp printed in the header and written into the document metadata.
    pub generated_at: OffsetDateTime,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            geometry: PageGeometry::default(),
            theme: Theme::default(),
            logo: None,
            generated_at: OffsetDateTime::now_utc(),
        }
    }
}

impl ReportOptions {
    pub fn generated_at(mut self, generated_at: OffsetDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Where a builder is in its life: sections can only be added before it is finalized,
/// and it can only be written out once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderPhase {
    HeaderDrawn,
    Finalized,
    Written,
}

/// Assembles a report section after section, starting new pages whenever the next block
/// would run into the footer of the current one.
///
/// The header is drawn as soon as the builder is created, so sections always come after it.
/// A builder produces exactly one document: once written out it only returns errors.
pub struct ReportBuilder<C: Canvas = PdfDocument> {
    config: DocumentConfig,
    theme: Theme,
    state: PageState,
    canvas: C,
    phase: BuilderPhase,
}

impl ReportBuilder<PdfDocument> {
    /// Starts a PDF report and draws its header.
    pub fn generate(
        config: DocumentConfig,
        options: &ReportOptions,
    ) -> Result<ReportBuilder<PdfDocument>, ContextError> {
        let identifier = document_identifier(&config, options.generated_at);
        let mut pdf_document = PdfDocument::new(
            identifier,
            options.geometry.width,
            options.geometry.height,
        );
        pdf_document.information = DocumentInformation {
            title: config.title.clone(),
            author: config
                .generated_by
                .clone()
                .unwrap_or_else(|| options.theme.organisation.clone()),
            subject: config
                .period
                .clone()
                .or_else(|| config.subtitle.clone())
                .unwrap_or_default(),
            creation_date: options.generated_at,
            ..Default::default()
        };

        ReportBuilder::generate_on(pdf_document, config, options)
    }

    /// Finalizes the report if needed and serializes it into the bytes of a PDF file.
    pub fn get_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        if self.phase == BuilderPhase::Written {
            return Err(ContextError::with_context(format!(
                "The report {:?} has already been written out",
                self.config.title
            )));
        }
        self.finalize()?;

        let instance_id = format!(
            "{:032x}",
            self.canvas.information.creation_date.unix_timestamp_nanos()
        );
        self.canvas.write_all(instance_id)?;
        self.canvas.optimize();
        let bytes = self.canvas.save_to_bytes()?;
        self.phase = BuilderPhase::Written;

        log::debug!(
            "Serialized the report {:?} into {} bytes over {} pages",
            self.config.title,
            bytes.len(),
            self.state.page_number()
        );

        Ok(bytes)
    }

    /// The PDF file as a `data:` URL, for embedding the report directly.
    pub fn get_data_url(&mut self) -> Result<String, ContextError> {
        let bytes = self.get_bytes()?;
        Ok(format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    /// Writes the PDF file to the given path.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ContextError> {
        let path = path.as_ref();
        let bytes = self.get_bytes()?;
        std::fs::write(path, bytes).map_err(|error| {
            ContextError::with_error(format!("Unable to write the report to {:?}", path), &error)
        })?;

        Ok(())
    }
}

impl<C: Canvas> ReportBuilder<C> {
    /// Starts a report on the given canvas, which is expected to hold a single empty page,
    /// and draws its header.
    pub fn generate_on(
        mut canvas: C,
        config: DocumentConfig,
        options: &ReportOptions,
    ) -> Result<ReportBuilder<C>, ContextError> {
        options.geometry.validate()?;
        let (page_width, page_height) = canvas.page_size();
        if (page_width - options.geometry.width).abs() > 1e-3
            || (page_height - options.geometry.height).abs() > 1e-3
        {
            return Err(ContextError::with_context(format!(
                "The canvas pages of {}x{}mm do not match the page geometry of {}x{}mm",
                page_width, page_height, options.geometry.width, options.geometry.height
            )));
        }
        if canvas.page_count() == 0 {
            canvas.add_page();
        }
        let mut state = PageState::from(options.geometry);
        if sections::header_overflows(&config, state.page_width(), state.margin()) {
            log::warn!(
                "The title or the subtitle of the report {:?} is wider than the header leaves room for",
                config.title
            );
        }

        let theme = options.theme.clone();
        sections::header(
            &mut Surface {
                state: &mut state,
                canvas: &mut canvas,
                theme: &theme,
            },
            &config,
            options.logo.as_deref(),
            options.generated_at,
        )?;
        log::debug!("Drew the header of the report {:?}", config.title);

        Ok(ReportBuilder {
            config,
            theme,
            state,
            canvas,
            phase: BuilderPhase::HeaderDrawn,
        })
    }

    pub fn add_section_title(&mut self, title: &str) -> Result<&mut Self, ContextError> {
        sections::section_title(&mut self.open_surface()?, title)?;
        Ok(self)
    }

    /// Adds a row of summary cards. Only the first four items are shown.
    pub fn add_summary_cards(&mut self, items: &[SummaryItem]) -> Result<&mut Self, ContextError> {
        sections::summary_cards(&mut self.open_surface()?, items)?;
        Ok(self)
    }

    pub fn add_table(
        &mut self,
        title: Option<&str>,
        table: &TableSpec,
    ) -> Result<&mut Self, ContextError> {
        self.add_table_with_style(title, table, &TableStyle::default())
    }

    pub fn add_table_with_style(
        &mut self,
        title: Option<&str>,
        table: &TableSpec,
        style: &TableStyle,
    ) -> Result<&mut Self, ContextError> {
        sections::table(&mut self.open_surface()?, title, table, style)?;
        Ok(self)
    }

    pub fn add_report_table(&mut self, table: &ReportTable) -> Result<&mut Self, ContextError> {
        self.add_table(Some(&table.title), &table.to_spec())
    }

    pub fn add_paragraph(&mut self, text: &str) -> Result<&mut Self, ContextError> {
        sections::paragraph(&mut self.open_surface()?, text)?;
        Ok(self)
    }

    pub fn add_key_values(&mut self, pairs: &[KeyValue]) -> Result<&mut Self, ContextError> {
        sections::key_values(&mut self.open_surface()?, pairs)?;
        Ok(self)
    }

    pub fn add_divider(&mut self) -> Result<&mut Self, ContextError> {
        sections::divider(&mut self.open_surface()?)?;
        Ok(self)
    }

    pub fn add_signature_block(
        &mut self,
        signatories: &Signatories,
    ) -> Result<&mut Self, ContextError> {
        sections::signature_block(&mut self.open_surface()?, signatories)?;
        Ok(self)
    }

    /// Draws the footer of the last page. Calling it again has no effect.
    pub fn finalize(&mut self) -> Result<&mut Self, ContextError> {
        if self.phase != BuilderPhase::HeaderDrawn {
            log::debug!("The report {:?} is already finalized", self.config.title);
            return Ok(self);
        }

        draw_footer(&mut self.state, &mut self.canvas, &self.theme)?;
        self.phase = BuilderPhase::Finalized;

        Ok(self)
    }

    pub fn phase(&self) -> BuilderPhase {
        self.phase
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn page_state(&self) -> &PageState {
        &self.state
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    fn open_surface(&mut self) -> Result<Surface<'_, C>, ContextError> {
        if self.phase != BuilderPhase::HeaderDrawn {
            return Err(ContextError::with_context(format!(
                "Unable to add a section to the report {:?}, it has already been finalized",
                self.config.title
            )));
        }

        Ok(Surface {
            state: &mut self.state,
            canvas: &mut self.canvas,
            theme: &self.theme,
        })
    }
}

/// A stable identifier for the document, the same for the same report generated at the same time.
fn document_identifier(config: &DocumentConfig, generated_at: OffsetDateTime) -> String {
    let mut hasher = DefaultHasher::new();
    config.title.hash(&mut hasher);
    config.period.hash(&mut hasher);
    generated_at.unix_timestamp_nanos().hash(&mut hasher);
    let first_half = hasher.finish();
    config.subtitle.hash(&mut hasher);
    config.department.hash(&mut hasher);
    let second_half = hasher.finish();

    format!("{first_half:016x}{second_half:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use base64::Engine as _;
    use time::macros::datetime;

    fn options() -> ReportOptions {
        ReportOptions::default().generated_at(datetime!(2026-01-31 17:05 UTC))
    }

    fn recording_builder() -> ReportBuilder<RecordingCanvas> {
        ReportBuilder::generate_on(
            RecordingCanvas::new(210.0, 297.0),
            DocumentConfig::new("Liquidity Report"),
            &options(),
        )
        .unwrap()
    }

    #[test]
    fn unusable_pages_are_refused() {
        let short = ReportOptions {
            geometry: PageGeometry {
                height: 90.0,
                ..Default::default()
            },
            ..options()
        };
        assert!(ReportBuilder::generate(DocumentConfig::new("Short"), &short).is_err());

        let error = ReportBuilder::generate_on(
            RecordingCanvas::new(297.0, 210.0),
            DocumentConfig::new("Landscape"),
            &options(),
        )
        .err()
        .unwrap();
        assert!(error.context.contains("do not match the page geometry"));
    }

    #[test]
    fn empty_report_has_a_header_and_a_footer() {
        let mut builder = recording_builder();
        builder.finalize().unwrap();

        assert_eq!(builder.page_state().page_number(), 1);
        assert_eq!(builder.canvas().page_count(), 1);
        let texts = builder.canvas().texts_on_page(1);
        assert_eq!(texts.first(), Some(&"TREASURY"));
        assert_eq!(texts.last(), Some(&"Page 1"));
    }

    #[test]
    fn finalizing_twice_draws_a_single_footer() {
        let mut builder = recording_builder();
        builder.add_paragraph("Closing balances were reconciled.").unwrap();
        builder.finalize().unwrap().finalize().unwrap();

        let footers = builder
            .canvas()
            .texts_on_page(1)
            .into_iter()
            .filter(|text| *text == "Page 1")
            .count();
        assert_eq!(footers, 1);
        assert_eq!(builder.phase(), BuilderPhase::Finalized);
    }

    #[test]
    fn sections_are_refused_after_finalizing() {
        let mut builder = recording_builder();
        builder.finalize().unwrap();

        let error = builder.add_divider().err().unwrap();
        assert!(error.context.contains("already been finalized"));
    }

    #[test]
    fn pdf_is_written_out_once() {
        let mut builder = ReportBuilder::generate(
            DocumentConfig::new("Liquidity Report").with_period("Q1 2026"),
            &options(),
        )
        .unwrap();
        builder
            .add_section_title("Overview")
            .unwrap()
            .add_paragraph("Balances remained stable.")
            .unwrap();

        let bytes = builder.get_bytes().unwrap();
        assert_eq!(builder.phase(), BuilderPhase::Written);
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);

        assert!(builder.get_bytes().is_err());
        assert!(builder.get_data_url().is_err());
        assert!(builder.add_divider().is_err());
    }

    #[test]
    fn data_url_carries_the_pdf() {
        let mut builder =
            ReportBuilder::generate(DocumentConfig::new("Liquidity Report"), &options()).unwrap();
        let data_url = builder.get_data_url().unwrap();

        let encoded = data_url
            .strip_prefix("data:application/pdf;base64,")
            .unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn identifier_is_reproducible() {
        let config = DocumentConfig::new("MIS Report").with_period("January 2026");
        let generated_at = datetime!(2026-01-31 17:05 UTC);
        assert_eq!(
            document_identifier(&config, generated_at),
            document_identifier(&config, generated_at)
        );
        assert_eq!(document_identifier(&config, generated_at).len(), 32);
        assert_ne!(
            document_identifier(&config, generated_at),
            document_identifier(&config, datetime!(2026-02-01 09:00 UTC))
        );
    }
}
