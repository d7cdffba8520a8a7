use crate::{DomainError, DomainResult};

/// Normalize a phone number to the canonical `+91` dialing format.
///
/// Accepts 10 digits, optionally prefixed with `91` or `+91`. Spaces,
/// dashes and parentheses are stripped before validation. Anything else is
/// rejected before any state is touched.
pub fn normalize_phone(raw: &str) -> DomainResult<String> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let plus_prefixed = cleaned.starts_with('+');
    if plus_prefixed {
        cleaned.remove(0);
    }

    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::Validation(format!(
            "phone number contains non-digit characters: {raw}"
        )));
    }

    let national = match cleaned.len() {
        10 => cleaned.as_str(),
        12 if cleaned.starts_with("91") => &cleaned[2..],
        _ => {
            return Err(DomainError::Validation(format!(
                "phone number must be 10 digits, optionally prefixed with 91: {raw}"
            )))
        }
    };

    Ok(format!("+91{national}"))
}

/// Minimal email shape check: non-empty local part, non-empty domain with a
/// dot, no whitespace.
pub fn validate_email(email: &str) -> DomainResult<()> {
    let trimmed = email.trim();
    if trimmed.contains(char::is_whitespace) {
        return Err(DomainError::Validation(format!("invalid email: {email}")));
    }
    match trimmed.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
        {
            Ok(())
        }
        _ => Err(DomainError::Validation(format!("invalid email: {email}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_ten_digits() {
        assert_eq!(normalize_phone("9876543210").unwrap(), "+919876543210");
    }

    #[test]
    fn test_normalize_with_country_code() {
        assert_eq!(normalize_phone("+91 98765 43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("91-9876543210").unwrap(), "+919876543210");
    }

    #[test]
    fn test_rejects_short_and_alpha() {
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98765abcde").is_err());
        assert!(normalize_phone("+1 555 123 4567").is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }
}
