//! Pure input validation: phone numbers, message content, credentials.
//!
//! Phone numbers are canonicalized to an international `+<digits>` form;
//! the canonical string, not the raw input, is what gets persisted and
//! compared.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;
use crate::models::message::PhoneNumber;

/// Canonical form lower/upper bounds, including the leading `+`.
pub const MIN_NUMBER_LEN: usize = 6;
pub const MAX_NUMBER_LEN: usize = 17;

pub const MIN_CONTENT_LEN: usize = 6;

pub const MIN_NUMBERS_PER_MESSAGE: usize = 1;
pub const MAX_NUMBERS_PER_MESSAGE: usize = 20;

// Hardcoded patterns; a failure to compile is a source bug.
static CANONICAL_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    // international prefix, non-zero country code digit, then digits
    Regex::new(r"^\+[1-9][0-9]+$").expect("hardcoded phone regex is invalid - fix source code")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]{3,32}$")
        .expect("hardcoded username regex is invalid - fix source code")
});

/// Validate one destination number and return its canonical form.
///
/// Normalization strips common separators and rewrites the `00`
/// international prefix to `+`. Anything left that is not a plausible
/// international number is rejected.
pub fn validate_number(raw: &str) -> Result<PhoneNumber, AppError> {
    let canonical = normalize_number(raw);

    if canonical.len() < MIN_NUMBER_LEN || canonical.len() > MAX_NUMBER_LEN {
        return Err(AppError::Validation(vec![number_violation(raw)]));
    }
    if !CANONICAL_NUMBER_REGEX.is_match(&canonical) {
        return Err(AppError::Validation(vec![number_violation(raw)]));
    }

    Ok(PhoneNumber::new_unchecked(canonical))
}

fn normalize_number(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if let Some(rest) = stripped.strip_prefix("00") {
        format!("+{rest}")
    } else {
        stripped
    }
}

fn number_violation(raw: &str) -> String {
    format!("'{raw}' is not a valid phone number")
}

/// Validate a full create request, collecting every field violation
/// instead of failing fast on the first one.
pub fn validate_create_request(
    content: &str,
    raw_numbers: &[String],
) -> Result<Vec<PhoneNumber>, AppError> {
    let mut violations = Vec::new();

    if content.is_empty() || content.chars().count() < MIN_CONTENT_LEN {
        violations.push(format!(
            "content must be at least {MIN_CONTENT_LEN} characters"
        ));
    }

    if raw_numbers.len() < MIN_NUMBERS_PER_MESSAGE {
        violations.push("at least one destination number is required".to_string());
    } else if raw_numbers.len() > MAX_NUMBERS_PER_MESSAGE {
        violations.push(format!(
            "at most {MAX_NUMBERS_PER_MESSAGE} destination numbers are allowed"
        ));
    }

    let mut numbers = Vec::with_capacity(raw_numbers.len());
    for raw in raw_numbers {
        match validate_number(raw) {
            Ok(number) => numbers.push(number),
            Err(_) => violations.push(number_violation(raw)),
        }
    }

    if violations.is_empty() {
        Ok(numbers)
    } else {
        Err(AppError::Validation(violations))
    }
}

pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// 3-32 characters, alphanumeric plus `-` and `_`.
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

pub fn validate_password(password: &str) -> bool {
    password.len() >= 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_us_number_is_canonicalized() {
        let number = validate_number("+1 650-555-1234").unwrap();
        assert_eq!(number.as_str(), "+16505551234");
    }

    #[test]
    fn international_double_zero_prefix_is_rewritten() {
        let number = validate_number("0049 30 901820").unwrap();
        assert_eq!(number.as_str(), "+4930901820");
    }

    #[test]
    fn validation_is_idempotent_over_canonical_output() {
        for raw in ["+1 650-555-1234", "+44 (20) 7946.0958", "0049 30 901820"] {
            let first = validate_number(raw).unwrap();
            let second = validate_number(first.as_str()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(validate_number("abc").is_err());
        assert!(validate_number("+1-800-FLOWERS").is_err());
        assert!(validate_number("").is_err());
    }

    #[test]
    fn length_bounds_are_enforced_post_normalization() {
        // 5 chars canonical, below minimum
        assert!(validate_number("+123 4").is_err());
        // 6 chars canonical, at minimum
        assert!(validate_number("+12345").is_ok());
        // 17 chars canonical, at maximum
        assert!(validate_number("+1234567890123456").is_ok());
        // 18 chars canonical, above maximum
        assert!(validate_number("+12345678901234567").is_err());
    }

    #[test]
    fn leading_zero_country_code_is_implausible() {
        assert!(validate_number("+0123456").is_err());
    }

    #[test]
    fn create_request_reports_every_violation() {
        let err = validate_create_request("hi", &["abc".into(), "+12345".into()]).unwrap_err();
        match err {
            AppError::Validation(violations) => {
                assert_eq!(violations.len(), 2);
                assert!(violations[0].contains("content"));
                assert!(violations[1].contains("'abc'"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_request_requires_at_least_one_number() {
        let err = validate_create_request("Hello there", &[]).unwrap_err();
        match err {
            AppError::Validation(violations) => {
                assert_eq!(violations, vec!["at least one destination number is required"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_request_caps_number_count() {
        let numbers: Vec<String> = (0..21).map(|i| format!("+1650555{i:04}")).collect();
        assert!(validate_create_request("Hello there", &numbers).is_err());

        let numbers: Vec<String> = (0..20).map(|i| format!("+1650555{i:04}")).collect();
        let validated = validate_create_request("Hello there", &numbers).unwrap();
        assert_eq!(validated.len(), 20);
    }

    #[test]
    fn duplicate_numbers_are_allowed() {
        let validated = validate_create_request(
            "Hello there",
            &["+16505551234".into(), "+1 650-555-1234".into()],
        )
        .unwrap();
        assert_eq!(validated[0], validated[1]);
    }

    #[test]
    fn email_and_username_shapes() {
        assert!(validate_email("user@example.com"));
        assert!(!validate_email("@example.com"));
        assert!(validate_username("john_doe"));
        assert!(!validate_username("ab"));
    }
}
