//! Document identifier normalization
//!
//! Uploads carry `pmid` as a string, an integer, or a float depending on the
//! tool that produced them. Everything downstream keys on one canonical form:
//! plain decimal digits, no fractional part, no exponent.

use super::value::RecordValue;
use tracing::debug;

/// Field holding the document identifier in every record
pub const IDENTIFIER_FIELD: &str = "pmid";

/// Exponents beyond this are left as literal text rather than expanded
const MAX_EXPANDED_EXPONENT: i64 = 400;

/// Canonical string form of an identifier value
///
/// Total and deterministic:
/// - strings are returned unchanged (`"007"` stays `"007"`)
/// - integers render as plain decimal digits
/// - floats render with zero decimal places (`1.23e7` → `"12300000"`)
/// - decoded number literals are read as exact integers when possible,
///   otherwise returned verbatim
/// - anything else is stringified
pub fn normalize_identifier(value: &RecordValue) -> String {
    match value {
        RecordValue::String(s) => s.clone(),
        RecordValue::Integer(i) => i.to_string(),
        RecordValue::Float(f) => format_float(*f),
        RecordValue::Number(text) => normalize_number_text(text),
        other => {
            let text = other.to_display_string();
            debug!("Identifier of non-numeric kind stringified as {:?}", text);
            text
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() {
        let text = format!("{:.0}", f);
        // -0.0 and small negatives round to "-0"
        if text == "-0" {
            "0".to_string()
        } else {
            text
        }
    } else {
        f.to_string()
    }
}

/// Exact integer reading of a number literal, else the literal itself
fn normalize_number_text(text: &str) -> String {
    if let Ok(i) = text.parse::<i128>() {
        return i.to_string();
    }

    match expand_integral_literal(text) {
        Some(digits) => {
            debug!("Identifier literal {} expanded to {}", text, digits);
            digits
        }
        None => {
            debug!("Identifier literal {} kept verbatim", text);
            text.to_string()
        }
    }
}

/// Expand a JSON number literal digit-wise when its value is an integer
///
/// `1.23e7` → `12300000`, `1001.000` → `1001`, `-0.0` → `0`.
/// Returns `None` for non-integral values, malformed literals, and
/// exponents too large to expand.
fn expand_integral_literal(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => {
            let exp_text = &unsigned[idx + 1..];
            let exp_text = exp_text.strip_prefix('+').unwrap_or(exp_text);
            (&unsigned[..idx], exp_text.parse::<i64>().ok()?)
        }
        None => (unsigned, 0),
    };
    if exponent.abs() > MAX_EXPANDED_EXPONENT {
        return None;
    }

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;

    let integral = if point <= 0 {
        if !digits.bytes().all(|b| b == b'0') {
            return None;
        }
        String::new()
    } else if point as usize >= digits.len() {
        format!("{}{}", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        if !fraction.bytes().all(|b| b == b'0') {
            return None;
        }
        whole.to_string()
    };

    let trimmed = integral.trim_start_matches('0');
    if trimmed.is_empty() {
        Some("0".to_string())
    } else if negative {
        Some(format!("-{}", trimmed))
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(text: &str) -> RecordValue {
        RecordValue::Number(text.to_string())
    }

    #[test]
    fn test_string_unchanged() {
        assert_eq!(normalize_identifier(&"007".into()), "007");
        assert_eq!(normalize_identifier(&"".into()), "");
    }

    #[test]
    fn test_integer_variants() {
        assert_eq!(normalize_identifier(&RecordValue::from(42i64)), "42");
        assert_eq!(normalize_identifier(&RecordValue::from(-17i64)), "-17");
        assert_eq!(
            normalize_identifier(&RecordValue::Integer(u64::MAX as i128)),
            "18446744073709551615"
        );
    }

    #[test]
    fn test_float_has_no_exponent_or_fraction() {
        assert_eq!(normalize_identifier(&RecordValue::Float(1.23e7)), "12300000");
        assert_eq!(normalize_identifier(&RecordValue::Float(36_123_456.0)), "36123456");
        assert_eq!(normalize_identifier(&RecordValue::Float(1e20)), "100000000000000000000");
    }

    #[test]
    fn test_negative_zero_has_one_form() {
        assert_eq!(normalize_identifier(&RecordValue::Float(-0.0)), "0");
        assert_eq!(normalize_identifier(&RecordValue::Float(-0.4)), "0");
        assert_eq!(normalize_identifier(&number("-0.0")), "0");
        assert_eq!(normalize_identifier(&number("-0")), "0");
        assert_eq!(normalize_identifier(&RecordValue::Float(-3.0)), "-3");
    }

    #[test]
    fn test_number_literal_plain_integer() {
        assert_eq!(normalize_identifier(&number("1001")), "1001");
        assert_eq!(normalize_identifier(&number("-0")), "0");
        assert_eq!(
            normalize_identifier(&number("123456789012345678901234567890123456789012345")),
            "123456789012345678901234567890123456789012345"
        );
    }

    #[test]
    fn test_number_literal_integral_with_exponent_or_fraction() {
        assert_eq!(normalize_identifier(&number("1.23e7")), "12300000");
        assert_eq!(normalize_identifier(&number("1.23E+7")), "12300000");
        assert_eq!(normalize_identifier(&number("1001.000")), "1001");
        assert_eq!(normalize_identifier(&number("-4.5e1")), "-45");
        assert_eq!(normalize_identifier(&number("0.0")), "0");
        assert_eq!(normalize_identifier(&number("5000e-3")), "5");
    }

    #[test]
    fn test_number_literal_fractional_kept_verbatim() {
        assert_eq!(normalize_identifier(&number("1.5")), "1.5");
        assert_eq!(normalize_identifier(&number("1.25e1")), "1.25e1");
        assert_eq!(normalize_identifier(&number("1e-3")), "1e-3");
        assert_eq!(normalize_identifier(&number("1e999999")), "1e999999");
    }

    #[test]
    fn test_other_kinds_stringified() {
        assert_eq!(normalize_identifier(&RecordValue::Bool(true)), "true");
        assert_eq!(normalize_identifier(&RecordValue::Null), "null");
        assert_eq!(
            normalize_identifier(&RecordValue::Array(vec![RecordValue::from(1i64)])),
            "[1]"
        );
    }

    #[test]
    fn test_deterministic_and_never_exponent_for_integral_inputs() {
        let inputs = [
            RecordValue::Float(9.87654321e8),
            number("9.87654321e8"),
            RecordValue::Integer(987654321),
            number("987654321"),
        ];
        for input in &inputs {
            let first = normalize_identifier(input);
            assert_eq!(first, normalize_identifier(input));
            assert_eq!(first, "987654321");
            assert!(!first.contains(['e', 'E', '.']));
        }
    }
}
