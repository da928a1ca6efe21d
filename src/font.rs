use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization as _;

/// The number of millimeters in a typographic point.
pub const MILLIMETERS_PER_POINT: f32 = 25.4 / 72.0;

/// The advance width used for characters missing from the metric tables, in 1/1000 em.
const DEFAULT_ADVANCE_WIDTH: u16 = 556;

/// Advance widths of the printable ASCII range (0x20 to 0x7E) for Helvetica, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Advance widths of the printable ASCII range (0x20 to 0x7E) for Helvetica-Bold, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// One of the standard Type1 fonts every PDF viewer ships, so that nothing has to be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    /// The PostScript name of the font, as expected by the `BaseFont` key.
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// The name under which the font is registered in the page resources.
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    /// The advance width of a single character in 1/1000 em.
    pub fn advance_width(&self, character: char) -> u16 {
        let table = match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        match character {
            ' '..='~' => table[character as usize - 0x20],
            '\u{a0}' => table[0],
            '€' | '£' | '¥' => 556,
            '–' => 556,
            '—' | '…' | '‰' => 1000,
            '•' => 350,
            '‘' | '’' | '‚' => 222,
            '“' | '”' | '„' => 333,
            '©' | '®' => 737,
            '°' => 400,
            _ => DEFAULT_ADVANCE_WIDTH,
        }
    }

    /// The width of the text in millimeters when set at the given size in points.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text
            .nfc()
            .map(|character| u32::from(self.advance_width(character)))
            .sum();
        units as f32 / 1000.0 * font_size * MILLIMETERS_PER_POINT
    }

    /// Splits the text into lines no wider than `maximum_width` millimeters. Explicit line breaks
    /// are honoured and words wider than a whole line are broken between characters.
    /// An empty text still produces a single (empty) line.
    pub fn wrap_text(&self, text: &str, font_size: f32, maximum_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut current_line = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current_line.is_empty() {
                    word.to_string()
                } else {
                    format!("{current_line} {word}")
                };
                if self.text_width(&candidate, font_size) <= maximum_width {
                    current_line = candidate;
                    continue;
                }
                if !current_line.is_empty() {
                    lines.push(std::mem::take(&mut current_line));
                }
                if self.text_width(word, font_size) <= maximum_width {
                    current_line = word.to_string();
                } else {
                    // The word alone does not fit, so it is broken where the width runs out
                    for character in word.chars() {
                        current_line.push(character);
                        if self.text_width(&current_line, font_size) > maximum_width
                            && current_line.chars().count() > 1
                        {
                            current_line.pop();
                            lines.push(std::mem::replace(
                                &mut current_line,
                                character.to_string(),
                            ));
                        }
                    }
                }
            }
            lines.push(current_line);
        }
        lines
    }
}

/// Encodes the text into the single-byte WinAnsi encoding used by the standard fonts.
/// Characters outside of the encoding are replaced by a question mark.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| match win_ansi_byte(character) {
            Some(byte) => byte,
            None => {
                log::warn!(
                    "Unable to encode the character {:?} with the standard fonts, replacing it",
                    character
                );
                b'?'
            }
        })
        .collect()
}

fn win_ansi_byte(character: char) -> Option<u8> {
    let byte = match character {
        ' '..='~' | '\u{a0}'..='\u{ff}' => character as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        '\t' => b' ',
        _ => return None,
    };
    Some(byte)
}
