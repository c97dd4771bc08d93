//! Display formatting for money, counts and dates.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// `$1,234.56` (negative values as `-$1,234.56`).
pub fn currency(value: Decimal) -> String {
    let (sign, abs) = split_sign(value);
    format!("{sign}${}", grouped(abs))
}

/// Signed delta without currency symbol: `+1,234.56`, `-12.00`, `+0.00`.
pub fn signed_amount(value: Decimal) -> String {
    let (sign, abs) = split_sign(value);
    let sign = if sign.is_empty() { "+" } else { sign };
    format!("{sign}{}", grouped(abs))
}

/// Signed currency: `+$1,234.56`, `-$12.00`.
pub fn signed_currency(value: Decimal) -> String {
    let (sign, abs) = split_sign(value);
    let sign = if sign.is_empty() { "+" } else { sign };
    format!("{sign}${}", grouped(abs))
}

/// `+3`, `-2`, `+0`.
pub fn signed_int(value: i64) -> String {
    format!("{value:+}")
}

/// `DD/MM/YYYY`, or an empty string when there is no date.
pub fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn split_sign(value: Decimal) -> (&'static str, Decimal) {
    let rounded = value.round_dp(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        ("-", rounded.abs())
    } else {
        ("", rounded.abs())
    }
}

fn grouped(abs: Decimal) -> String {
    format_num::format_num!(",.2", abs.to_f64().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn formats_currency() {
        assert_eq!(currency(dec("1234.5")), "$1,234.50");
        assert_eq!(currency(dec("-60000")), "-$60,000.00");
        assert_eq!(currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn formats_signed_values() {
        assert_eq!(signed_amount(dec("70")), "+70.00");
        assert_eq!(signed_amount(dec("-1500.256")), "-1,500.26");
        assert_eq!(signed_amount(dec("-0.001")), "+0.00");
        assert_eq!(signed_currency(dec("-12")), "-$12.00");
        assert_eq!(signed_currency(dec("12")), "+$12.00");
        assert_eq!(signed_int(3), "+3");
        assert_eq!(signed_int(-2), "-2");
        assert_eq!(signed_int(0), "+0");
    }

    #[test]
    fn formats_dates() {
        assert_eq!(date(NaiveDate::from_ymd_opt(2024, 3, 5)), "05/03/2024");
        assert_eq!(date(None), "");
    }
}
