// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input validators for flow steps.
//!
//! Validation failures never advance flow state; the error text is shown
//! inline in the widget.

use std::sync::LazyLock;

use parley_core::ParleyError;
use regex::Regex;

use crate::step::InputKind;

/// Local mobile numbers: the fixed `09` prefix followed by exactly nine
/// digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^09\d{9}$").expect("static pattern"));

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

/// Validate raw input for the given kind. Returns the normalized (trimmed)
/// value on success.
pub fn validate_input(kind: InputKind, raw: &str) -> Result<String, ParleyError> {
    let trimmed = raw.trim();
    match kind {
        InputKind::GeneralMessage => {
            if trimmed.is_empty() {
                Err(ParleyError::Validation(
                    "Please type a message first.".to_string(),
                ))
            } else {
                Ok(trimmed.to_string())
            }
        }
        InputKind::Phone => validate_phone(trimmed),
        InputKind::Name => validate_name(trimmed),
        InputKind::None => Ok(trimmed.to_string()),
    }
}

fn validate_phone(trimmed: &str) -> Result<String, ParleyError> {
    if trimmed.is_empty() {
        return Err(ParleyError::Validation(
            "Please enter your mobile number.".to_string(),
        ));
    }
    if !PHONE_RE.is_match(trimmed) {
        return Err(ParleyError::Validation(
            "That doesn't look like a valid mobile number (09 followed by nine digits)."
                .to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_name(trimmed: &str) -> Result<String, ParleyError> {
    let len = trimmed.chars().count();
    if len < NAME_MIN || len > NAME_MAX {
        return Err(ParleyError::Validation(
            "Please enter a name between 2 and 100 characters.".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_prefix_plus_nine_digits() {
        assert_eq!(
            validate_input(InputKind::Phone, "09123456789").unwrap(),
            "09123456789"
        );
        assert_eq!(
            validate_input(InputKind::Phone, "  09123456789  ").unwrap(),
            "09123456789"
        );
    }

    #[test]
    fn phone_rejections_have_distinct_messages() {
        let short = validate_input(InputKind::Phone, "123").unwrap_err();
        let empty = validate_input(InputKind::Phone, "").unwrap_err();
        let short_text = short.user_message();
        let empty_text = empty.user_message();
        assert_ne!(short_text, empty_text);
        assert!(short_text.contains("valid mobile number"));
    }

    #[test]
    fn phone_rejects_wrong_prefix_and_length() {
        assert!(validate_input(InputKind::Phone, "08123456789").is_err());
        assert!(validate_input(InputKind::Phone, "091234567").is_err());
        assert!(validate_input(InputKind::Phone, "091234567890").is_err());
        assert!(validate_input(InputKind::Phone, "09 12345678").is_err());
    }

    #[test]
    fn name_enforces_trimmed_length_bounds() {
        assert!(validate_input(InputKind::Name, "A").is_err());
        assert!(validate_input(InputKind::Name, "  B  ").is_err());
        assert_eq!(validate_input(InputKind::Name, " Acme Co ").unwrap(), "Acme Co");
        assert!(validate_input(InputKind::Name, &"x".repeat(101)).is_err());
        assert!(validate_input(InputKind::Name, &"x".repeat(100)).is_ok());
    }

    #[test]
    fn general_message_rejects_whitespace_only() {
        assert!(validate_input(InputKind::GeneralMessage, "   ").is_err());
        assert!(validate_input(InputKind::GeneralMessage, "hello").is_ok());
    }
}
