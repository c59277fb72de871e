//! Indian mobile number normalization
//!
//! Raw numbers arrive from spreadsheet cells and form fields in every shape
//! people type them: `+91 91253 77622`, `09125377622`, `919125377622`.
//! [`normalize`] reduces them to the 10-digit subscriber number the gateway
//! expects, or rejects them.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SmsError};

const COUNTRY_CODE: &str = "91";
const LOCAL_LENGTH: usize = 10;

/// A validated 10-digit Indian mobile number (`[6-9]\d{9}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rendering safe for logs: only the last two digits are kept.
    pub fn masked(&self) -> String {
        let visible = &self.0[LOCAL_LENGTH - 2..];
        format!("{}{}", "*".repeat(LOCAL_LENGTH - 2), visible)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = SmsError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

/// Normalize a raw phone number into a [`PhoneNumber`].
pub fn normalize(raw: &str) -> Result<PhoneNumber> {
    let trimmed = raw.trim();
    let digits = digits_only(trimmed);

    let local = if digits.len() == 12 && digits.starts_with(COUNTRY_CODE) {
        digits[2..].to_string()
    } else if digits.len() == 11 && digits.starts_with('0') {
        digits[1..].to_string()
    } else if trimmed.len() == 13 && trimmed.starts_with("+91") {
        digits_only(&trimmed[3..])
    } else if digits.len() == LOCAL_LENGTH {
        digits
    } else {
        return Err(SmsError::InvalidFormat);
    };

    if is_indian_mobile(&local) {
        Ok(PhoneNumber(local))
    } else {
        Err(SmsError::InvalidIndianMobileNumber)
    }
}

/// Comma-joined wire form used by the gateway's `numbers` field.
pub fn join_numbers(numbers: &[PhoneNumber]) -> String {
    numbers
        .iter()
        .map(PhoneNumber::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn is_indian_mobile(value: &str) -> bool {
    value.len() == LOCAL_LENGTH
        && value.bytes().all(|b| b.is_ascii_digit())
        && matches!(value.as_bytes()[0], b'6'..=b'9')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_forms_normalize_to_local_number() {
        for raw in ["+919125377622", "09125377622", "919125377622", "9125377622"] {
            assert_eq!(normalize(raw).unwrap().as_str(), "9125377622", "input {raw}");
        }
    }

    #[test]
    fn test_separators_are_stripped() {
        assert_eq!(normalize("+91 91253-77622").unwrap().as_str(), "9125377622");
        assert_eq!(normalize("(912) 537 7622").unwrap().as_str(), "9125377622");
        assert_eq!(normalize("  7012345678 ").unwrap().as_str(), "7012345678");
    }

    #[test]
    fn test_leading_digit_must_be_six_to_nine() {
        assert!(matches!(
            normalize("5125377622"),
            Err(SmsError::InvalidIndianMobileNumber)
        ));
        assert!(matches!(
            normalize("915125377622"),
            Err(SmsError::InvalidIndianMobileNumber)
        ));
        assert!(normalize("6000000000").is_ok());
    }

    #[test]
    fn test_wrong_lengths_are_invalid_format() {
        for raw in ["", "12345", "912537762", "12345678901", "9912537762211", "abc"] {
            assert!(
                matches!(normalize(raw), Err(SmsError::InvalidFormat)),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_eleven_digits_without_leading_zero_is_invalid_format() {
        assert!(matches!(normalize("19125377622"), Err(SmsError::InvalidFormat)));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["9125377622", "6000000001", "7999999999", "8123456789"] {
            let once = normalize(raw).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_masked_keeps_last_two_digits() {
        let number = normalize("9125377622").unwrap();
        assert_eq!(number.masked(), "********22");
    }

    #[test]
    fn test_join_numbers() {
        let numbers = vec![
            normalize("9125377622").unwrap(),
            normalize("8000000001").unwrap(),
        ];
        assert_eq!(join_numbers(&numbers), "9125377622,8000000001");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let number: PhoneNumber = "09125377622".parse().unwrap();
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"9125377622\"");
    }
}
