use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ContextError;
use crate::export::ExportOptions;
use crate::geometry::PageGeometry;
use crate::report::ReportOptions;
use crate::theme::Theme;

/// The settings shared by every report and export, usually read from a JSON file.
/// Every field is optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfiguration {
    pub page_geometry: PageGeometry,
    pub theme: Theme,
    /// PNG or JPEG image drawn in the header of every report.
    pub logo_path: Option<PathBuf>,
    /// Delay before spreadsheet exports, in milliseconds.
    pub export_latency_milliseconds: Option<u64>,
}

impl ReportConfiguration {
    /// Reads the configuration file. A relative logo path is resolved against the directory
    /// of the configuration file.
    pub fn from_path<P: AsRef<Path>>(configuration_file_path: P) -> Result<Self, ContextError> {
        let configuration_file_path = configuration_file_path.as_ref();
        let configuration_file_contents = std::fs::read_to_string(configuration_file_path)
            .map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to read the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;
        let mut configuration: ReportConfiguration =
            serde_json::from_str(&configuration_file_contents).map_err(|error| {
                ContextError::with_error(
                    format!(
                        "Failed to parse the configuration file {:?}",
                        configuration_file_path
                    ),
                    &error,
                )
            })?;
        configuration.page_geometry.validate().map_err(|error| {
            ContextError::with_error(
                format!(
                    "Invalid page geometry in the configuration file {:?}",
                    configuration_file_path
                ),
                &error,
            )
        })?;

        if let (Some(logo_path), Some(directory)) = (
            configuration.logo_path.as_mut(),
            configuration_file_path.parent(),
        ) {
            if logo_path.is_relative() {
                *logo_path = directory.join(&*logo_path);
            }
        }

        Ok(configuration)
    }

    pub fn to_report_options(
        &self,
        generated_at: OffsetDateTime,
    ) -> Result<ReportOptions, ContextError> {
        let logo = match &self.logo_path {
            Some(logo_path) => Some(std::fs::read(logo_path).map_err(|error| {
                ContextError::with_error(format!("Failed to read the logo {:?}", logo_path), &error)
            })?),
            None => None,
        };

        Ok(ReportOptions {
            geometry: self.page_geometry,
            theme: self.theme.clone(),
            logo,
            generated_at,
        })
    }

    pub fn to_export_options(&self, generated_at: OffsetDateTime) -> ExportOptions {
        ExportOptions {
            generated_at,
            latency: self.export_latency_milliseconds.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_default() {
        let configuration: ReportConfiguration = serde_json::from_str("{}").unwrap();
        similar_asserts::assert_eq!(configuration, ReportConfiguration::default());

        let configuration: ReportConfiguration = serde_json::from_str(
            r#"{
                "pageGeometry": { "width": 297, "height": 210 },
                "theme": { "wordmark": "ACME", "primary": [10, 20, 30] },
                "exportLatencyMilliseconds": 800
            }"#,
        )
        .unwrap();
        assert_eq!(configuration.page_geometry.width, 297.0);
        assert_eq!(configuration.page_geometry.margin, 20.0);
        assert_eq!(configuration.theme.wordmark, "ACME");
        assert_eq!(configuration.theme.primary, crate::canvas::Color(10, 20, 30));
        assert_eq!(configuration.theme.organisation, Theme::default().organisation);

        let generated_at = time::macros::datetime!(2026-01-31 17:05 UTC);
        let export_options = configuration.to_export_options(generated_at);
        assert_eq!(export_options.latency, Some(Duration::from_millis(800)));
        let report_options = configuration.to_report_options(generated_at).unwrap();
        assert_eq!(report_options.geometry.height, 210.0);
        assert!(report_options.logo.is_none());
    }

    #[test]
    fn missing_files_are_reported() {
        let error = ReportConfiguration::from_path("does/not/exist.json").unwrap_err();
        assert!(error.context.starts_with("Failed to read the configuration file"));
        assert!(error.source_error.is_some());

        let configuration = ReportConfiguration {
            logo_path: Some("does/not/exist.png".into()),
            ..Default::default()
        };
        assert!(configuration
            .to_report_options(OffsetDateTime::UNIX_EPOCH)
            .is_err());
    }

    #[test]
    fn pages_too_short_for_the_header_are_rejected() {
        let path = std::env::temp_dir().join("reportr_short_page_configuration.json");
        std::fs::write(&path, r#"{ "pageGeometry": { "height": 90 } }"#).unwrap();
        let error = ReportConfiguration::from_path(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(error.context.starts_with("Invalid page geometry"));
        assert!(error.source_error.unwrap().contains("too short"));
    }
}
