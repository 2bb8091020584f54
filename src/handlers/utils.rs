// Shared response helpers and custom field validators for handlers

use std::borrow::Cow;

use axum::http::{header, HeaderName};
use cookie::Cookie;
use validator::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// `Set-Cookie` header part for an axum response tuple
pub fn set_cookie(cookie: Cookie<'static>) -> [(HeaderName, String); 1] {
    [(header::SET_COOKIE, cookie.to_string())]
}

/// Emails are compared and stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Rejects empty and whitespace-only text
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "This field is required"));
    }
    Ok(())
}

/// Optional new password: empty leaves it unchanged, otherwise the usual minimum
pub fn password_or_empty(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("length", "Password must be at least 6 characters"));
    }
    Ok(())
}

/// `#rgb` or `#rrggbb`
pub fn hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = match color.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    };
    if !valid {
        return Err(invalid("hex_color", "Invalid color format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email(" Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn colors() {
        for good in ["#fff", "#A0b1C2"] {
            assert!(hex_color(good).is_ok(), "{good}");
        }
        for bad in ["fff", "#ffff", "#ggg", "#12345", ""] {
            assert!(hex_color(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn optional_passwords() {
        assert!(password_or_empty("").is_ok());
        assert!(password_or_empty("123456").is_ok());
        assert!(password_or_empty("12345").is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(not_blank("  Acme ").is_ok());
        assert!(not_blank("").is_err());
        let err = not_blank(" \t ").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("This field is required"));
    }
}
