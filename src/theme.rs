use serde::{Deserialize, Serialize};

use crate::canvas::Color;

/// Colors and fixed texts of the report branding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    /// Fill of the header band and of the table headers.
    pub primary: Color,
    /// Text drawn on top of the primary color.
    pub on_primary: Color,
    /// Accent colors cycled through by the summary cards.
    pub accents: [Color; 4],
    pub text: Color,
    pub muted_text: Color,
    pub border: Color,
    /// Fill of every other table body row.
    pub zebra: Color,
    /// Background of the section title bands.
    pub section_band: Color,
    pub card_background: Color,
    pub trend_up: Color,
    pub trend_down: Color,
    pub trend_neutral: Color,
    /// Drawn in place of the logo when there is none or it cannot be drawn.
    pub wordmark: String,
    pub organisation: String,
    /// The fixed text printed in the footer of every page.
    pub disclosure: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            primary: Color(30, 58, 138),
            on_primary: Color::WHITE,
            accents: [
                Color(37, 99, 235),
                Color(16, 185, 129),
                Color(245, 158, 11),
                Color(139, 92, 246),
            ],
            text: Color(31, 41, 55),
            muted_text: Color(107, 114, 128),
            border: Color(209, 213, 219),
            zebra: Color(243, 244, 246),
            section_band: Color(239, 246, 255),
            card_background: Color(249, 250, 251),
            trend_up: Color(22, 163, 74),
            trend_down: Color(220, 38, 38),
            trend_neutral: Color(107, 114, 128),
            wordmark: "TREASURY".into(),
            organisation: "Treasury Operations".into(),
            disclosure: "Confidential - generated by the treasury operations platform for internal use only"
                .into(),
        }
    }
}

impl Theme {
    /// The accent color of the card at the given position, cycling through the palette.
    pub fn accent(&self, index: usize) -> Color {
        self.accents[index % self.accents.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_theme_falls_back_to_defaults() {
        let theme: Theme =
            serde_json::from_str(r#"{ "primary": [0, 0, 0], "wordmark": "ACME" }"#).unwrap();
        assert_eq!(theme.primary, Color::BLACK);
        assert_eq!(theme.wordmark, "ACME");
        assert_eq!(theme.disclosure, Theme::default().disclosure);
        assert_eq!(theme.accent(5), theme.accents[1]);
    }
}
