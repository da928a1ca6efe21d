//! Reportr generates the paginated PDF reports and the spreadsheet exports of a treasury
//! operations desk. A report is assembled section after section through the `ReportBuilder`,
//! which takes care of starting new pages, repeating table headers and drawing the footer
//! of every page, or it is described as a JSON `ReportDocument` and converted in one go.
//!
//! The layout only speaks to the `Canvas` trait: `PdfDocument` implements it on top of `lopdf`,
//! while `RecordingCanvas` keeps the list of drawing operations, which is what the layout
//! is tested against.

/// The module where the `ReportBuilder` is presented.
///
/// # Introduction
///
/// A builder is created by `ReportBuilder::generate`, which immediately draws the header of the
/// first page. Sections can then be added in any order and as many times as needed: every one
/// of them first makes sure that the space it needs is left above the footer, starting a new
/// page otherwise. Once `finalize` has drawn the footer of the last page, the report is written
/// out with `save`, `get_bytes` or `get_data_url`, each of which can only be called once.
pub mod report;

/// The JSON representation of a report: its header configuration and its ordered sections.
pub mod document;

/// The section renderers: header, section titles, summary cards, tables, paragraphs,
/// key-value lists, dividers and signature blocks.
pub mod sections;

pub mod pagination;

pub mod geometry;

pub mod table;

/// Tables laid out into columns and continued over as many pages as needed.
pub mod table_drawing;

/// The drawing primitives the layout is expressed in, and a canvas recording them.
pub mod canvas;

/// The module where the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`, which implements `Canvas` by
/// accumulating the content stream operations of every page. Only `write_all` turns the pages
/// into PDF objects, after which `optimize` and `save_to_bytes` produce the final file. The
/// identifier and the instance ID of the document are given by the caller, so that the same
/// report generated at the same time always produces the same file.
pub mod pdf;

/// The standard PDF fonts the reports are typeset in, with their metrics.
pub mod font;

pub mod theme;

/// This module contains the `ContextError` type which is the error type used throughout this library.
///
/// The `ContextError` type is always returned from a `Result` type, which means that the end user can expect to obtain an explanation
/// whenever a function returns an error. If an error happened in a function which was called inside a function of this library,
/// then the user can expect to also obtain information about this propagated error.
pub mod error;

/// Formatting of amounts and percentages for the report templates.
pub mod formatting;

/// The ready-made treasury reports.
pub mod templates;

/// Exports of rows into two-sheet XLSX workbooks or CSV files, and CSV dumps of tables.
pub mod export;

/// The `ReportConfiguration`, read from a JSON file.
pub mod configuration;
