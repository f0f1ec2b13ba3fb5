//! Monetary amount parsing for extracted invoice values.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

lazy_static! {
    /// A number with optional sign, comma grouping and decimals.
    static ref AMOUNT_TOKEN: Regex = Regex::new(r"(-\s*)?(\d[\d,]*(?:\.\d+)?)").unwrap();
}

/// Parse an amount as the model tends to return it.
///
/// Accepts JSON numbers and strings such as `"1,23,456.78"`, `"₹ 500"`
/// or `"Rs. 1,200.00"`. Commas are always thousands separators.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(|f| Decimal::from_str(&f.to_string()).ok())
            }
        }
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

/// Parse an amount from text.
///
/// The first number not followed by `%` is taken, so currency prefixes,
/// rate annotations and trailing words are ignored.
pub fn parse_amount_str(s: &str) -> Option<Decimal> {
    AMOUNT_TOKEN
        .captures_iter(s)
        .find(|caps| {
            let end = caps.get(0).map_or(0, |m| m.end());
            !s[end..].trim_start().starts_with('%')
        })
        .and_then(|caps| {
            let digits = caps[2].replace(',', "");
            let amount = Decimal::from_str(&digits).ok()?;
            Some(if caps.get(1).is_some() { -amount } else { amount })
        })
}

/// Format an amount with two decimals and Indian digit grouping (12,34,567.89).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    let len = chars.len();

    for (i, c) in chars.iter().enumerate() {
        let remaining = len - i;
        if i > 0 && remaining >= 3 && (remaining - 3) % 2 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_amount(&json!(1500)), Some(dec("1500")));
        assert_eq!(parse_amount(&json!(12.5)), Some(dec("12.5")));
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!(true)), None);
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parse_amount(&json!("1,23,456.78")), Some(dec("123456.78")));
        assert_eq!(parse_amount(&json!("₹ 500")), Some(dec("500")));
        assert_eq!(parse_amount(&json!("Rs. 1,200.00")), Some(dec("1200.00")));
        assert_eq!(parse_amount(&json!("-42.10")), Some(dec("-42.10")));
        assert_eq!(parse_amount(&json!("N/A")), None);
    }

    #[test]
    fn test_parse_strings_with_annotations() {
        assert_eq!(parse_amount_str("9% = 135.00"), Some(dec("135.00")));
        assert_eq!(parse_amount_str("Rs. 1,770.00 only."), Some(dec("1770.00")));
        assert_eq!(parse_amount_str("Rs. -500"), Some(dec("-500")));
        assert_eq!(parse_amount_str("CGST @ 9 % : 45"), Some(dec("45")));
        assert_eq!(parse_amount_str("18%"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("1234567.891")), "12,34,567.89");
        assert_eq!(format_amount(dec("999")), "999.00");
        assert_eq!(format_amount(dec("1000")), "1,000.00");
        assert_eq!(format_amount(dec("-250000")), "-2,50,000.00");
    }
}
