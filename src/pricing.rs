//! Price parsing and formatting.
//!
//! Prices are persisted as `i64` minor units (cents). Form input arrives as
//! free text ("$1,234.50", "12.5") or as a JSON number, and is normalized here
//! before it reaches the database.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A price as submitted by a client: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    pub fn as_text(&self) -> String {
        match self {
            PriceInput::Number(n) => n.to_string(),
            PriceInput::Text(s) => s.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_price(&self.as_text())
    }

    pub fn to_cents(&self) -> i64 {
        parse_price(&self.as_text())
    }

    pub fn to_database(&self) -> Option<i64> {
        to_database_price(&self.as_text())
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        PriceInput::Text(value.to_string())
    }
}

/// Largest accepted amount in cents (one trillion currency units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000_000;

/// Parse a price into cents.
///
/// Everything except digits, `.` and `-` is stripped first, so currency
/// symbols and thousands separators are tolerated. Empty, non-numeric,
/// negative and out-of-range input all yield `0`. The value is rounded to
/// two decimals.
pub fn parse_price(input: &str) -> i64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    parse_numeric_prefix(&cleaned)
        .and_then(amount_to_cents)
        .unwrap_or(0)
}

/// True when the input is non-empty and starts with a non-negative number
/// no larger than [`MAX_PRICE_CENTS`].
pub fn is_valid_price(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    parse_numeric_prefix(trimmed)
        .and_then(amount_to_cents)
        .is_some()
}

fn amount_to_cents(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let cents = (value * 100.0).round();
    (cents <= MAX_PRICE_CENTS as f64).then_some(cents as i64)
}

/// Price as stored in a nullable column: absent for empty input and for
/// anything that does not parse to a strictly positive amount.
pub fn to_database_price(input: &str) -> Option<i64> {
    if input.trim().is_empty() {
        return None;
    }
    let cents = parse_price(input);
    (cents > 0).then_some(cents)
}

/// `1235` -> `"12.35"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Display a price with its currency, e.g. `"$1,234.50"`.
///
/// A zero amount renders as a bare `"0.00"`.
pub fn format_price(cents: i64, currency: &str) -> String {
    if cents == 0 {
        return "0.00".to_string();
    }

    let abs = cents.unsigned_abs();
    let amount = format!("{}.{:02}", group_thousands(abs / 100), abs % 100);
    let sign = if cents < 0 { "-" } else { "" };
    let code = currency.trim().to_ascii_uppercase();

    match currency_symbol(&code) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{code} {amount}"),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "INR" => "₹",
        "CNY" => "CN¥",
        "CAD" => "CA$",
        "AUD" => "A$",
        _ => return None,
    };
    Some(symbol)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Longest leading decimal number in `s`, in the manner of a lenient
/// float parser: `"12.5abc"` -> 12.5, `"1.2.3"` -> 1.2, `"abc"` -> None.
fn parse_numeric_prefix(s: &str) -> Option<f64> {
    let bytes = s.trim_start().as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    std::str::from_utf8(&bytes[..end]).ok()?.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_prices() {
        assert_eq!(parse_price("12.345"), 1235);
        assert_eq!(parse_price("12.5"), 1250);
        assert_eq!(parse_price("  7 "), 700);
        assert_eq!(parse_price("$1,234.50"), 123450);
        assert_eq!(parse_price("1.2.3"), 120);
    }

    #[test]
    fn invalid_or_negative_prices_become_zero() {
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("   "), 0);
        assert_eq!(parse_price("abc"), 0);
        assert_eq!(parse_price("-5"), 0);
        assert_eq!(parse_price("--5"), 0);
        assert_eq!(parse_price("."), 0);
    }

    #[test]
    fn validity_requires_a_non_negative_leading_number() {
        assert!(is_valid_price("0"));
        assert!(is_valid_price("19.99"));
        assert!(is_valid_price("12abc"));
        assert!(!is_valid_price(""));
        assert!(!is_valid_price("-1"));
        assert!(!is_valid_price("$12"));
    }

    #[test]
    fn amounts_beyond_the_ceiling_are_rejected() {
        assert!(!is_valid_price("99999999999999999999"));
        assert!(!is_valid_price("1e30"));
        assert_eq!(parse_price("99999999999999999999"), 0);
        assert!(is_valid_price("1000000000000"));
        assert_eq!(parse_price("1000000000000"), MAX_PRICE_CENTS);
        assert!(!PriceInput::Number(1e13).is_valid());
    }

    #[test]
    fn database_price_is_absent_unless_positive() {
        assert_eq!(to_database_price(""), None);
        assert_eq!(to_database_price("0"), None);
        assert_eq!(to_database_price("-3"), None);
        assert_eq!(to_database_price("9.99"), Some(999));
    }

    #[test]
    fn price_input_accepts_numbers_and_strings() {
        let number: PriceInput = serde_json::from_str("12.5").unwrap();
        let text: PriceInput = serde_json::from_str("\"$3.10\"").unwrap();
        assert_eq!(number.to_cents(), 1250);
        assert_eq!(text.to_cents(), 310);
        assert!(!PriceInput::from("nope").is_valid());
    }

    #[test]
    fn formats_amounts_with_currency() {
        assert_eq!(format_cents(1235), "12.35");
        assert_eq!(format_cents(-50), "-0.50");
        assert_eq!(format_price(123450, "usd"), "$1,234.50");
        assert_eq!(format_price(100_000_000, "EUR"), "€1,000,000.00");
        assert_eq!(format_price(500, "SAR"), "SAR 5.00");
        assert_eq!(format_price(0, "USD"), "0.00");
    }
}
