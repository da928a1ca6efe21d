/// Turns amounts into the text printed in reports. Templates receive one so that the
/// currency conventions are decided by the caller.
pub trait FormattingPolicy {
    /// Formats an amount in the currency with the given ISO 4217 code.
    fn format(&self, value: f64, currency_code: &str) -> String;

    /// Formats a ratio given in percent, e.g. `12.5` as `12.50%`.
    fn format_percentage(&self, value: f64) -> String {
        format!("{value:.2}%")
    }
}

/// Two decimals, comma thousands separators and a leading minus sign. The dollar, euro and
/// pound are written with their symbol, every other currency with its code.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormatting;

impl StandardFormatting {
    fn currency_prefix(currency_code: &str) -> String {
        match currency_code.to_ascii_uppercase().as_str() {
            "USD" => "$".into(),
            "EUR" => "€".into(),
            "GBP" => "£".into(),
            "" => String::new(),
            other => format!("{other} "),
        }
    }
}

impl FormattingPolicy for StandardFormatting {
    fn format(&self, value: f64, currency_code: &str) -> String {
        let sign = if value < 0.0 && format!("{:.2}", value.abs()) != "0.00" {
            "-"
        } else {
            ""
        };
        format!(
            "{sign}{}{}",
            Self::currency_prefix(currency_code),
            group_thousands(value.abs())
        )
    }
}

/// Writes a non-negative amount with two decimals and its integral part grouped by thousands.
pub fn group_thousands(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (integral, fractional) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integral.len() + integral.len() / 3);
    for (index, digit) in integral.chars().enumerate() {
        if index > 0 && (integral.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{grouped}.{fractional}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currencies() {
        let formatting = StandardFormatting;
        assert_eq!(formatting.format(1250.0, "NGN"), "NGN 1,250.00");
        assert_eq!(formatting.format(-1200.0, "USD"), "-$1,200.00");
        assert_eq!(formatting.format(0.5, "eur"), "€0.50");
        assert_eq!(formatting.format(1_234_567.891, "GBP"), "£1,234,567.89");
        assert_eq!(formatting.format(-0.001, "USD"), "$0.00");
        assert_eq!(formatting.format(999.0, ""), "999.00");
        assert_eq!(formatting.format_percentage(12.5), "12.50%");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0.00");
        assert_eq!(group_thousands(100.0), "100.00");
        assert_eq!(group_thousands(1000.0), "1,000.00");
        assert_eq!(group_thousands(12_345_678.0), "12,345,678.00");
    }
}
