use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use reportr::configuration::ReportConfiguration;
use reportr::document::ReportDocument;
use reportr::error::ContextError;
use reportr::export::{export_rows, export_table_csv, ExportFormat};
use reportr::formatting::StandardFormatting;
use reportr::table::{Row, TableSpec};
use reportr::templates::{
    cbn_monthly_return, custom_report, mis_report, regulatory_compliance_report,
    CbnMonthlyReturnData, CustomReportRequest, MisReportData, RegulatoryComplianceData,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct CliArguments {
    #[arg(
        long = "configuration",
        global = true,
        help = "Path to the report configuration file in the JSON format"
    )]
    configuration_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON report document into a PDF file
    Render {
        #[arg(long = "document", help = "Path to the report document in the JSON format")]
        document_path: PathBuf,
        #[arg(long = "output", help = "Path of the PDF file to write")]
        output_path: PathBuf,
    },
    /// Render one of the built-in reports with illustrative figures
    Template {
        #[arg(long = "kind", value_enum)]
        kind: TemplateKind,
        #[arg(long = "period", help = "Reporting period printed in the header, e.g. \"January 2026\"")]
        period: String,
        #[arg(
            long = "request",
            help = "Path to a custom report request in the JSON format, used with `--kind custom`"
        )]
        request_path: Option<PathBuf>,
        #[arg(long = "output-directory", default_value = ".")]
        output_directory: PathBuf,
    },
    /// Export a JSON array of rows into a spreadsheet
    Export {
        #[arg(long = "rows", help = "Path to a JSON array of row objects")]
        rows_path: PathBuf,
        #[arg(long = "title", help = "Name of the exported file, without extension")]
        title: String,
        #[arg(long = "format", default_value = "xlsx")]
        format: ExportFormat,
        #[arg(long = "output-directory", default_value = ".")]
        output_directory: PathBuf,
    },
    /// Dump a JSON table (columns and rows) into a fully quoted CSV file
    TableCsv {
        #[arg(long = "table", help = "Path to a JSON table with its columns and rows")]
        table_path: PathBuf,
        #[arg(long = "context", help = "Prefix of the file name")]
        context: String,
        #[arg(long = "output-directory", default_value = ".")]
        output_directory: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, clap::ValueEnum)]
enum TemplateKind {
    Mis,
    Regulatory,
    CbnReturn,
    Custom,
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    env_logger::init();

    let CliArguments {
        configuration_path,
        command,
    } = CliArguments::parse();

    let configuration = match &configuration_path {
        Some(configuration_path) => ReportConfiguration::from_path(configuration_path)?,
        None => ReportConfiguration::default(),
    };
    let generated_at = OffsetDateTime::now_utc();

    match command {
        Command::Render {
            document_path,
            output_path,
        } => {
            let document = ReportDocument::from_path(&document_path)?;
            let mut builder =
                document.to_pdf(&configuration.to_report_options(generated_at)?)?;
            builder.save(&output_path)?;
            log::info!(
                "Rendered {:?} into {:?} ({} pages)",
                document_path,
                output_path,
                builder.page_state().page_number()
            );
        }
        Command::Template {
            kind,
            period,
            request_path,
            output_directory,
        } => {
            let options = configuration.to_report_options(generated_at)?;
            let formatting = StandardFormatting;
            let report = match kind {
                TemplateKind::Mis => {
                    mis_report(&MisReportData::sample(&period), &options, &formatting)?
                }
                TemplateKind::Regulatory => regulatory_compliance_report(
                    &RegulatoryComplianceData::sample(&period),
                    &options,
                    &formatting,
                )?,
                TemplateKind::CbnReturn => cbn_monthly_return(
                    &CbnMonthlyReturnData::sample(&period),
                    &options,
                    &formatting,
                )?,
                TemplateKind::Custom => {
                    let request = match &request_path {
                        Some(request_path) => read_json(request_path)?,
                        None => CustomReportRequest::sample(&period),
                    };
                    custom_report(&request, &options)?
                }
            };
            let path = report.save_in(&output_directory)?;
            log::info!("Saved the {:?} report to {:?} ({} pages)", kind, path, report.page_count);
        }
        Command::Export {
            rows_path,
            title,
            format,
            output_directory,
        } => {
            let rows: Vec<Row> = read_json(&rows_path)?;
            let exported = export_rows(
                &rows,
                &title,
                format,
                &configuration.to_export_options(generated_at),
            )?;
            let path = exported.save_in(&output_directory)?;
            log::info!("Exported {} rows to {:?}", rows.len(), path);
        }
        Command::TableCsv {
            table_path,
            context,
            output_directory,
        } => {
            let table: TableSpec = read_json(&table_path)?;
            let exported = export_table_csv(&table, &context, generated_at.date())?;
            let path = exported.save_in(&output_directory)?;
            log::info!("Dumped {} rows to {:?}", table.rows.len(), path);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ContextError> {
    let content = std::fs::read_to_string(path).map_err(|error| {
        ContextError::with_error(format!("Unable to read the file {:?}", path), &error)
    })?;
    serde_json::from_str(&content).map_err(|error| {
        ContextError::with_error(format!("Unable to parse the file {:?}", path), &error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_template_takes_a_request_file() {
        let arguments = CliArguments::try_parse_from([
            "reportr",
            "template",
            "--kind",
            "custom",
            "--period",
            "Q1 2026",
            "--request",
            "exposure.json",
        ])
        .unwrap();
        match arguments.command {
            Command::Template {
                kind: TemplateKind::Custom,
                request_path,
                ..
            } => assert_eq!(request_path, Some(PathBuf::from("exposure.json"))),
            _ => panic!("expected the custom template command"),
        }
    }
}
