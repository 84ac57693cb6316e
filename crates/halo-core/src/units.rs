//! Amount conversions between raw base units and decimal strings

use crate::errors::AmountError;
use crate::types::{RawAmount, RawDelta};

/// Largest decimals value that still fits `10^decimals` in a u128
pub const MAX_DECIMALS: u8 = 38;

/// `10^decimals` as u128
pub fn pow10(decimals: u8) -> RawAmount {
    10u128.pow(decimals.min(MAX_DECIMALS) as u32)
}

/// Parse a decimal string ("12.5") into raw base units.
///
/// An empty string parses as zero.
pub fn parse_units(input: &str, decimals: u8) -> Result<RawAmount, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let not_a_number = || AmountError::NotANumber {
        input: input.to_string(),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(not_a_number());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(not_a_number());
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            input: input.to_string(),
            decimals,
        });
    }

    let overflow = || AmountError::Overflow {
        input: input.to_string(),
    };
    let whole_value: RawAmount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_value: RawAmount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole_value
        .checked_mul(pow10(decimals))
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Format raw base units as a decimal string, always keeping one fractional
/// digit ("50.0", "0.000001").
pub fn format_units(raw: RawAmount, decimals: u8) -> String {
    if decimals == 0 {
        return format!("{}.0", raw);
    }
    let base = pow10(decimals);
    let whole = raw / base;
    let frac = raw % base;
    let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
    let frac_str = frac_str.trim_end_matches('0');
    if frac_str.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, frac_str)
    }
}

/// Format a signed delta, keeping its sign ("-12.5")
pub fn format_signed_units(delta: RawDelta, decimals: u8) -> String {
    let formatted = format_units(delta.unsigned_abs(), decimals);
    if delta < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Lossy conversion of raw base units to a float, for display-grade math
pub fn to_f64(raw: RawAmount, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Group the integer part of a fixed-point string with commas
fn group_thousands(fixed: &str) -> String {
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) if !f.is_empty() => format!("{}{}.{}", sign, grouped, f),
        _ => format!("{}{}", sign, grouped),
    }
}

/// Display a number with thousands separators and up to two decimals
/// ("1,234.5", "20")
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        &fixed
    };
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    group_thousands(trimmed)
}

/// Display a USD value with thousands separators and two decimals ("$1,234.50")
pub fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let fixed = if fixed == "-0.00" { "0.00".to_string() } else { fixed };
    match fixed.strip_prefix('-') {
        Some(abs) => format!("-${}", group_thousands(abs)),
        None => format!("${}", group_thousands(&fixed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("50", 18).unwrap(), 50 * pow10(18));
        assert_eq!(parse_units("1.5", 6).unwrap(), 1_500_000);
        assert_eq!(parse_units(".25", 2).unwrap(), 25);
        assert_eq!(parse_units("", 18).unwrap(), 0);
        assert_eq!(parse_units("0.0", 18).unwrap(), 0);
        assert_eq!(parse_units("1.10", 1).unwrap(), 11);
    }

    #[test]
    fn test_parse_units_errors() {
        assert!(matches!(
            parse_units("abc", 18),
            Err(AmountError::NotANumber { .. })
        ));
        assert!(matches!(parse_units(".", 18), Err(AmountError::NotANumber { .. })));
        assert!(matches!(
            parse_units("1.234", 2),
            Err(AmountError::TooPrecise { .. })
        ));
        assert!(matches!(
            parse_units("999999999999999999999999999999999999999", 18),
            Err(AmountError::Overflow { .. })
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(50 * pow10(18), 18), "50.0");
        assert_eq!(format_units(1_500_000, 6), "1.5");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(7, 0), "7.0");
        assert_eq!(format_signed_units(-1_500_000, 6), "-1.5");
    }

    #[test]
    fn test_format_number_and_usd() {
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1234567.891), "1,234,567.89");
        assert_eq!(format_usd(20.0), "$20.00");
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(-5.0), "-$5.00");
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(to_f64(2 * pow10(18), 18), 2.0);
        assert_eq!(to_f64(150_000_000, 8), 1.5);
    }
}
