//! Cents/dollars conversion and currency display.
//!
//! All arithmetic runs on exact decimals. Rounding to whole cents (and to two
//! dollar decimals) is half away from zero, so `0.005` dollars is one cent and
//! `-0.005` is minus one cent.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};

use crate::error::ConversionError;

/// Numeric input accepted by the conversions: integers, floats and decimal text.
pub trait IntoAmount {
    fn into_amount(self) -> Result<BigDecimal, ConversionError>;
}

impl IntoAmount for &str {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        let trimmed = self.trim();
        let numeric = trimmed
            .trim_start_matches(['+', '-'])
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.');
        let plain = trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if !numeric || !plain {
            return Err(ConversionError::NotNumeric(self.to_string()));
        }
        BigDecimal::from_str(trimmed).map_err(|_| ConversionError::NotNumeric(self.to_string()))
    }
}

impl IntoAmount for &String {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        self.as_str().into_amount()
    }
}

impl IntoAmount for String {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        self.as_str().into_amount()
    }
}

impl IntoAmount for f64 {
    /// Uses the shortest representation that round-trips the float, so
    /// `0.615_f64` converts as the decimal `0.615`.
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        if !self.is_finite() {
            return Err(ConversionError::NotNumeric(self.to_string()));
        }
        BigDecimal::from_str(&format!("{self}"))
            .map_err(|_| ConversionError::NotNumeric(self.to_string()))
    }
}

impl IntoAmount for i64 {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        Ok(BigDecimal::from(self))
    }
}

impl IntoAmount for u64 {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        Ok(BigDecimal::from(self))
    }
}

impl IntoAmount for i32 {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        Ok(BigDecimal::from(self))
    }
}

impl IntoAmount for BigDecimal {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        Ok(self)
    }
}

impl IntoAmount for &BigDecimal {
    fn into_amount(self) -> Result<BigDecimal, ConversionError> {
        Ok(self.clone())
    }
}

/// Largest power of ten an amount may reach before rescaling.
const MAX_MAGNITUDE: i64 = 40;

/// Decimal exponent just above the amount: `|amount| < 10^magnitude`.
fn magnitude(amount: &BigDecimal) -> i64 {
    if amount.is_zero() {
        return i64::MIN;
    }
    let (_, scale) = amount.as_bigint_and_exponent();
    amount.digits() as i64 - scale
}

// Rendering a huge exponent in full would allocate every digit.
fn out_of_range(magnitude: i64) -> ConversionError {
    ConversionError::OutOfRange(format!("magnitude 10^{magnitude}"))
}

/// Dollars to whole cents.
pub fn to_cents(value: impl IntoAmount) -> Result<i64, ConversionError> {
    let amount = value.into_amount()?;
    let magnitude = magnitude(&amount);
    if magnitude > MAX_MAGNITUDE {
        return Err(out_of_range(magnitude));
    }
    // Below a tenth of a cent.
    if magnitude < -3 {
        return Ok(0);
    }
    let cents = (&amount * BigDecimal::from(100)).with_scale_round(0, RoundingMode::HalfUp);
    cents
        .to_i64()
        .ok_or_else(|| ConversionError::OutOfRange(amount.to_string()))
}

/// Cents to dollars with exactly two decimal places.
pub fn to_dollars(value: impl IntoAmount) -> Result<BigDecimal, ConversionError> {
    let amount = value.into_amount()?;
    let magnitude = magnitude(&amount);
    if magnitude > MAX_MAGNITUDE {
        return Err(out_of_range(magnitude));
    }
    if magnitude < -1 {
        return Ok(BigDecimal::new(0.into(), 2));
    }
    let one_cent = BigDecimal::new(1.into(), 2);
    Ok((amount * one_cent).with_scale_round(2, RoundingMode::HalfUp))
}

struct LocaleFormat {
    group: &'static str,
    decimal: char,
    symbol_after: bool,
}

const EN: LocaleFormat = LocaleFormat {
    group: ",",
    decimal: '.',
    symbol_after: false,
};

const DE: LocaleFormat = LocaleFormat {
    group: ".",
    decimal: ',',
    symbol_after: true,
};

const FR: LocaleFormat = LocaleFormat {
    group: "\u{202f}",
    decimal: ',',
    symbol_after: true,
};

/// Splits `en-US` / `en_US` into lowercase language and uppercase region.
fn parse_locale(locale: Option<&str>) -> (String, String) {
    let tag = locale.unwrap_or("en-US").replace('_', "-");
    let mut parts = tag.split('-');
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().unwrap_or_default().to_ascii_uppercase();
    (language, region)
}

fn locale_format(language: &str) -> &'static LocaleFormat {
    match language {
        "de" => &DE,
        "fr" => &FR,
        _ => &EN,
    }
}

fn currency_symbol(language: &str, region: &str, code: &str) -> String {
    match (code, region) {
        ("USD", _) if language == "fr" => "$US".into(),
        ("USD", "CA" | "AU" | "GB" | "NZ") => "US$".into(),
        ("USD", _) => "$".into(),
        ("CAD", "CA") => "$".into(),
        ("CAD", _) => "CA$".into(),
        ("AUD", "AU") => "$".into(),
        ("AUD", _) => "A$".into(),
        ("EUR", _) => "€".into(),
        ("GBP", _) => "£".into(),
        ("JPY", "JP") => "￥".into(),
        ("JPY", _) => "¥".into(),
        _ => code.to_string(),
    }
}

fn group_digits(mut whole: u64, separator: &str) -> String {
    let mut groups = Vec::new();
    loop {
        if whole < 1000 {
            groups.push(whole.to_string());
            break;
        }
        groups.push(format!("{:03}", whole % 1000));
        whole /= 1000;
    }
    groups.reverse();
    groups.join(separator)
}

/// Render a cents amount as a currency string with two fraction digits.
///
/// `locale` defaults to `en-US`; unknown locales fall back to English
/// conventions. `currency_code` defaults to `USD`; codes without a known
/// symbol are printed verbatim.
pub fn format_currency(cents: i64, locale: Option<&str>, currency_code: Option<&str>) -> String {
    let code = currency_code.unwrap_or("USD").to_ascii_uppercase();
    let (language, region) = parse_locale(locale);
    let format = locale_format(&language);
    let symbol = currency_symbol(&language, &region, &code);

    let magnitude = cents.unsigned_abs();
    let number = format!(
        "{}{}{:02}",
        group_digits(magnitude / 100, format.group),
        format.decimal,
        magnitude % 100
    );
    let sign = if cents < 0 { "-" } else { "" };

    if format.symbol_after {
        format!("{sign}{number}\u{a0}{symbol}")
    } else if symbol.chars().all(|c| c.is_ascii_uppercase()) {
        format!("{sign}{symbol}\u{a0}{number}")
    } else {
        format!("{sign}{symbol}{number}")
    }
}
