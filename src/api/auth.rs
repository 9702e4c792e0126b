//! Authorization header construction.

use reqwest::header::HeaderValue;

use crate::error::{Error, Result};

/// Build the `Authorization` header value for a token.
///
/// User tokens are sent verbatim; bot tokens carry the `Bot ` scheme. A token
/// that already starts with a scheme is left alone.
pub fn authorization_value(token: &str, bot: bool) -> Result<HeaderValue> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::MissingConfig("token".to_string()));
    }

    let value = if bot && !has_scheme(token) {
        format!("Bot {}", token)
    } else {
        token.to_string()
    };

    let mut header = HeaderValue::from_str(&value)
        .map_err(|_| Error::Config("Token contains characters not allowed in a header".into()))?;
    header.set_sensitive(true);
    Ok(header)
}

fn has_scheme(token: &str) -> bool {
    token.starts_with("Bot ") || token.starts_with("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_token_verbatim() {
        let value = authorization_value("abc.def.ghi", false).unwrap();
        assert_eq!(value.to_str().unwrap(), "abc.def.ghi");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bot_token_prefixed_once() {
        let value = authorization_value("abc", true).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bot abc");

        let value = authorization_value("Bot abc", true).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bot abc");
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            authorization_value("   ", false),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_newline_rejected() {
        assert!(authorization_value("abc\ndef", false).is_err());
    }
}
