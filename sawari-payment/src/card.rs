//! Stateless card validation: Luhn checksum, issuer-prefix detection, CVV,
//! expiry and holder-name checks, composed in a fixed order that
//! short-circuits on the first failure.

use chrono::{DateTime, Datelike, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardIssuer {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl fmt::Display for CardIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardIssuer::Visa => "visa",
            CardIssuer::Mastercard => "mastercard",
            CardIssuer::Amex => "amex",
            CardIssuer::Discover => "discover",
        };
        f.write_str(name)
    }
}

/// Every rejection names the check that failed; the Display string is the
/// caller-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("card number must contain only digits")]
    NumberNonNumeric,

    #[error("card number must be between 13 and 19 digits")]
    NumberLength,

    #[error("invalid card number (failed checksum validation)")]
    Checksum,

    #[error("card type not recognized, use visa, mastercard, amex or discover")]
    UnknownIssuer,

    #[error("CVV must contain only digits")]
    CvvNonNumeric,

    #[error("CVV must be {expected} digits for {issuer}")]
    CvvLength { issuer: CardIssuer, expected: usize },

    #[error("expiry must be in MM/YY format")]
    ExpiryFormat,

    #[error("invalid expiry month (must be 01-12)")]
    ExpiryMonth,

    #[error("card has expired")]
    Expired,

    #[error("cardholder name must be at least 2 characters")]
    NameTooShort,

    #[error("cardholder name must contain letters")]
    NameNoLetters,
}

/// Strip spaces and dashes; the accepted separators in card input.
fn sanitize(card_number: &str) -> String {
    card_number
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect()
}

/// Mod-10 checksum: double every second digit from the right, sum the
/// digits of the products, and require the total to divide by 10.
pub fn luhn_checksum(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(d) = c.to_digit(10) else { return false };
        let d = if i % 2 == 1 { d * 2 } else { d };
        sum += if d > 9 { d - 9 } else { d };
    }
    sum % 10 == 0
}

fn prefix_in_range(digits: &str, len: usize, low: u64, high: u64) -> bool {
    digits.len() >= len
        && digits[..len]
            .parse::<u64>()
            .map(|p| (low..=high).contains(&p))
            .unwrap_or(false)
}

/// Classify a sanitized digit string by its documented issuer prefixes.
pub fn detect_issuer(digits: &str) -> Option<CardIssuer> {
    if digits.starts_with('4') {
        return Some(CardIssuer::Visa);
    }
    if prefix_in_range(digits, 2, 51, 55) || prefix_in_range(digits, 4, 2221, 2720) {
        return Some(CardIssuer::Mastercard);
    }
    if digits.starts_with("34") || digits.starts_with("37") {
        return Some(CardIssuer::Amex);
    }
    if digits.starts_with("6011")
        || digits.starts_with("65")
        || prefix_in_range(digits, 6, 622126, 622925)
        || prefix_in_range(digits, 3, 644, 649)
    {
        return Some(CardIssuer::Discover);
    }
    None
}

fn validate_cvv(cvv: &str, issuer: CardIssuer) -> Result<(), CardError> {
    if !cvv.chars().all(|c| c.is_ascii_digit()) || cvv.is_empty() {
        return Err(CardError::CvvNonNumeric);
    }
    let expected = if issuer == CardIssuer::Amex { 4 } else { 3 };
    if cvv.len() != expected {
        return Err(CardError::CvvLength { issuer, expected });
    }
    Ok(())
}

/// Strict `MM/YY` check against the current (year, month) pair. The
/// two-digit year is compared mod 100, which is ambiguous across century
/// boundaries; that is the documented behavior, kept as-is.
fn validate_expiry(expiry: &str, now: DateTime<Utc>) -> Result<(), CardError> {
    let Some((month_str, year_str)) = expiry.split_once('/') else {
        return Err(CardError::ExpiryFormat);
    };
    if month_str.len() != 2 || year_str.len() != 2 {
        return Err(CardError::ExpiryFormat);
    }
    let month: u32 = month_str.parse().map_err(|_| CardError::ExpiryFormat)?;
    let year: i32 = year_str.parse().map_err(|_| CardError::ExpiryFormat)?;

    if !(1..=12).contains(&month) {
        return Err(CardError::ExpiryMonth);
    }

    let current_year = now.year() % 100;
    let current_month = now.month();
    if year < current_year || (year == current_year && month < current_month) {
        return Err(CardError::Expired);
    }
    Ok(())
}

fn validate_holder_name(name: &str) -> Result<(), CardError> {
    let trimmed = name.trim();
    if trimmed.len() < 2 {
        return Err(CardError::NameTooShort);
    }
    if !trimmed.chars().any(|c| c.is_alphabetic()) {
        return Err(CardError::NameNoLetters);
    }
    Ok(())
}

/// Full validation pipeline: format, checksum, issuer, CVV, expiry, name.
/// Returns the detected issuer on acceptance.
pub fn validate_card(
    card_number: &str,
    cvv: &str,
    expiry: &str,
    holder_name: &str,
    now: DateTime<Utc>,
) -> Result<CardIssuer, CardError> {
    let digits = sanitize(card_number);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::NumberNonNumeric);
    }
    if !(13..=19).contains(&digits.len()) {
        return Err(CardError::NumberLength);
    }
    if !luhn_checksum(&digits) {
        return Err(CardError::Checksum);
    }
    let issuer = detect_issuer(&digits).ok_or(CardError::UnknownIssuer)?;

    validate_cvv(cvv, issuer)?;
    validate_expiry(expiry, now)?;
    validate_holder_name(holder_name)?;

    Ok(issuer)
}

pub fn card_last4(card_number: &str) -> String {
    let digits = sanitize(card_number);
    digits
        .chars()
        .skip(digits.len().saturating_sub(4))
        .collect()
}

/// Luhn-valid numbers published for exercising the mock gateway.
pub const TEST_CARDS: &[(CardIssuer, &str)] = &[
    (CardIssuer::Visa, "4532015112830366"),
    (CardIssuer::Visa, "4111111111111111"),
    (CardIssuer::Visa, "4024007198964305"),
    (CardIssuer::Mastercard, "5425233430109903"),
    (CardIssuer::Mastercard, "5555555555554444"),
    (CardIssuer::Mastercard, "2221000010000015"),
    (CardIssuer::Amex, "378282246310005"),
    (CardIssuer::Amex, "371449635398431"),
    (CardIssuer::Discover, "6011111111111117"),
    (CardIssuer::Discover, "6011000990139424"),
];

pub fn is_test_card(card_number: &str) -> bool {
    let digits = sanitize(card_number);
    TEST_CARDS.iter().any(|&(_, number)| number == digits)
}
