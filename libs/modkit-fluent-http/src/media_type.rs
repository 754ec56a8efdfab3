//! Media type tokens and `Content-Type` helpers.

use crate::error::HttpError;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";

/// `application/xml`
pub const APPLICATION_XML: &str = "application/xml";

/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";

/// Media type part of a `Content-Type` value: everything before the first
/// `;`, trimmed. Returns `None` for a blank value.
///
/// The token is returned as-is; registry lookups are case-sensitive.
#[must_use]
pub fn essence(content_type: &str) -> Option<&str> {
    let essence = content_type
        .split_once(';')
        .map_or(content_type, |(essence, _params)| essence)
        .trim();
    (!essence.is_empty()).then_some(essence)
}

/// Check that a media type can be registered for negotiation.
///
/// # Errors
/// Returns `HttpError::InvalidMediaType` if the token is blank, is not a
/// well-formed `type/subtype` MIME value, or carries parameters. Responses
/// are matched on their [`essence`], so a parameterized token never matches.
pub fn validate(media_type: &str) -> Result<(), HttpError> {
    let invalid = |reason: String| HttpError::InvalidMediaType {
        media_type: media_type.to_owned(),
        reason,
    };

    if media_type.trim().is_empty() {
        return Err(invalid(
            "the value cannot be empty or composed entirely of whitespace".to_owned(),
        ));
    }

    let parsed = media_type
        .parse::<mime::Mime>()
        .map_err(|e| invalid(e.to_string()))?;
    if parsed.params().next().is_some() || media_type.contains(';') {
        return Err(invalid(format!(
            "parameters are not allowed, register '{}' instead",
            parsed.essence_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_essence() {
        assert_eq!(essence("application/json"), Some("application/json"));
        assert_eq!(essence("text/xml; charset=utf-8"), Some("text/xml"));
        assert_eq!(essence("  text/plain ;q=0.5"), Some("text/plain"));
        assert_eq!(essence(""), None);
        assert_eq!(essence(" ; charset=utf-8"), None);
    }

    #[test]
    fn test_essence_keeps_case() {
        assert_eq!(essence("Application/JSON"), Some("Application/JSON"));
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(validate(APPLICATION_JSON).is_ok());
        assert!(validate(APPLICATION_XML).is_ok());
        assert!(validate("application/problem+json").is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_and_malformed() {
        assert!(matches!(
            validate("   "),
            Err(HttpError::InvalidMediaType { .. })
        ));
        assert!(matches!(
            validate("json"),
            Err(HttpError::InvalidMediaType { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_parameters() {
        let err = validate("application/json; charset=utf-8").unwrap_err();
        assert!(matches!(
            &err,
            HttpError::InvalidMediaType { media_type, .. } if media_type == "application/json; charset=utf-8"
        ));
        assert!(err.to_string().contains("register 'application/json' instead"));
        assert!(validate("text/plain;").is_err());
    }
}
