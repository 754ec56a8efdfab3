//! Decode resolution: pick the decoder for a response by its media type.

use crate::builder::Discriminated;
use crate::error::{DecoderLookup, HttpError};
use crate::registry::DecoderRegistry;
use crate::response::HttpResponse;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Media type used to look up a decoder for `response`.
///
/// The declared `Content-Type` essence wins. Without one, the first
/// accepted media type is assumed; that guess is only reliable when the
/// request accepted a single media type, so a warning is logged otherwise.
pub fn resolve_media_type(response: &HttpResponse, accept: &[String]) -> Option<String> {
    if let Some(media_type) = response.media_type() {
        return Some(media_type.to_owned());
    }

    let fallback = accept.first()?;
    if accept.len() > 1 {
        warn!(
            assumed = %fallback,
            accepted = ?accept,
            status = %response.status(),
            "response declares no content type; assuming the first accepted media type"
        );
    } else {
        debug!(assumed = %fallback, "response declares no content type");
    }
    Some(fallback.clone())
}

/// Decode `response` with the single matching decoder of `registry`.
pub async fn decode_single<T>(
    response: HttpResponse,
    accept: &[String],
    registry: &DecoderRegistry<T>,
    cancel: CancellationToken,
) -> Result<Option<T>, HttpError> {
    let Some(media_type) = resolve_media_type(&response, accept) else {
        return Err(HttpError::UndeterminedMediaType {
            response: Box::new(response),
        });
    };

    let Some(decode) = registry.get(&media_type) else {
        return Err(HttpError::NoDecoder {
            media_type,
            lookup: DecoderLookup::Primary,
            response: Box::new(response),
        });
    };

    debug!(media_type = %media_type, registered = registry.len(), "decoding response");
    decode(response.into_content(), cancel).await
}

/// Decode `response` with the primary registry, falling back to the alternate one.
pub async fn decode_discriminated<P, A>(
    response: HttpResponse,
    accept: &[String],
    primary: &DecoderRegistry<P>,
    alternate: &DecoderRegistry<A>,
    cancel: CancellationToken,
) -> Result<Option<Discriminated<P, A>>, HttpError> {
    let Some(media_type) = resolve_media_type(&response, accept) else {
        return Err(HttpError::UndeterminedMediaType {
            response: Box::new(response),
        });
    };

    if let Some(decode) = primary.get(&media_type) {
        debug!(media_type = %media_type, "decoding response as primary type");
        let value = decode(response.into_content(), cancel).await?;
        return Ok(value.map(Discriminated::Primary));
    }

    if let Some(decode) = alternate.get(&media_type) {
        debug!(media_type = %media_type, "decoding response as alternate type");
        let value = decode(response.into_content(), cancel).await?;
        return Ok(value.map(Discriminated::Alternate));
    }

    Err(HttpError::NoDecoder {
        media_type,
        lookup: DecoderLookup::Discriminated,
        response: Box::new(response),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::codec::erase_decode_fn;
    use crate::content::Content;
    use http::{Response, header::CONTENT_TYPE};

    fn response(content_type: Option<&str>, body: &'static str) -> HttpResponse {
        let mut builder = Response::builder();
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        HttpResponse::new(builder.body(Content::from_bytes(body)).unwrap())
    }

    fn text_registry(media_type: &str, tag: &'static str) -> DecoderRegistry<String> {
        let mut registry = DecoderRegistry::new();
        registry.insert(
            media_type.to_owned(),
            erase_decode_fn(move |content: Content, _cancel: CancellationToken| async move {
                let text = content.text().await?;
                Ok::<_, HttpError>(Some(format!("{tag}:{text}")))
            }),
        );
        registry
    }

    #[test]
    fn test_declared_content_type_wins_over_accept() {
        let resp = response(Some("application/xml; charset=utf-8"), "");
        let accept = vec!["application/json".to_owned()];
        assert_eq!(
            resolve_media_type(&resp, &accept).as_deref(),
            Some("application/xml")
        );
    }

    #[test]
    fn test_missing_content_type_falls_back_to_first_accepted() {
        let resp = response(None, "");
        let accept = vec!["application/json".to_owned(), "application/xml".to_owned()];
        assert_eq!(
            resolve_media_type(&resp, &accept).as_deref(),
            Some("application/json")
        );
        assert_eq!(resolve_media_type(&resp, &[]), None);
    }

    #[tokio::test]
    async fn test_single_decodes_with_match() {
        let registry = text_registry("text/plain", "p");
        let value = decode_single(
            response(Some("text/plain"), "hi"),
            &[],
            &registry,
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(value.as_deref(), Some("p:hi"));
    }

    #[tokio::test]
    async fn test_single_miss_keeps_response() {
        let registry = text_registry("application/json", "p");
        let err = decode_single(
            response(Some("text/xml"), "<a/>"),
            &[],
            &registry,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            HttpError::NoDecoder {
                media_type,
                lookup,
                response,
            } => {
                assert_eq!(media_type, "text/xml");
                assert_eq!(lookup, DecoderLookup::Primary);
                let response = *response;
                assert_eq!(response.text().await.unwrap(), "<a/>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_without_any_media_type() {
        let registry = text_registry("application/json", "p");
        let err = decode_single(response(None, ""), &[], &registry, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::UndeterminedMediaType { .. }));
    }

    #[tokio::test]
    async fn test_discriminated_prefers_primary() {
        let primary = text_registry("text/plain", "p");
        let alternate = text_registry("text/plain", "a");
        let value = decode_discriminated(
            response(Some("text/plain"), "x"),
            &[],
            &primary,
            &alternate,
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(value, Some(Discriminated::Primary("p:x".to_owned())));
    }

    #[tokio::test]
    async fn test_discriminated_miss_in_both() {
        let primary = text_registry("application/json", "p");
        let alternate = text_registry("application/xml", "a");
        let err = decode_discriminated(
            response(Some("text/csv"), ""),
            &[],
            &primary,
            &alternate,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            HttpError::NoDecoder {
                lookup: DecoderLookup::Discriminated,
                ref media_type,
                ..
            } if media_type == "text/csv"
        ));
    }
}
