//! Fluent request builders.
//!
//! A chain starts as a [`RequestBuilder`] and moves forward through more
//! specialized shapes as typing is added:
//!
//! ```text
//! RequestBuilder ── with_body ──▶ ContentBuilder<B>
//!       │                               │
//!       └──── with_auto_decoding ───────┴──▶ ResponseBuilder<T> ── or_to ──▶ DiscriminatedResponseBuilder<T, A>
//! ```
//!
//! Every transition consumes the current builder and moves its
//! [`RequestDescriptor`] into the next one. Configuration calls shared by all
//! shapes live on [`ConfigureRequest`].

mod content;
mod discriminated;
mod request;
mod response;

pub use content::ContentBuilder;
pub use discriminated::{Discriminated, DiscriminatedResponseBuilder};
pub use request::RequestBuilder;
pub use response::ResponseBuilder;

use crate::codec::{DecodeFn, Decoder};
use crate::descriptor::RequestDescriptor;
use crate::error::{HttpError, InvalidUriKind};
use crate::media_type;
use crate::registry::DecoderRegistry;
use crate::response::HttpResponse;
use crate::transport::CompletionMode;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::{HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use tracing::debug;

mod sealed {
    use crate::descriptor::RequestDescriptor;

    /// Descriptor access for the builder shapes of this crate only.
    pub trait Shape {
        fn descriptor_mut(&mut self) -> &mut RequestDescriptor;

        /// Give up this shape and keep only the request state.
        ///
        /// A typed body is erased into the descriptor so it is still encoded
        /// at send time.
        fn into_descriptor(self) -> RequestDescriptor;
    }
}

use sealed::Shape;

/// Configuration calls shared by every builder shape.
///
/// Each call returns the same shape, so chains read the same regardless of
/// how far they have been specialized. None of the calls fail eagerly: an
/// invalid header, target or media type is recorded and returned by `send`.
///
/// The trait is sealed: only the builders of this crate implement it, and
/// a chain cannot be turned back into a bare [`RequestDescriptor`].
///
/// ```compile_fail
/// use modkit_fluent_http::{ConfigureRequest, RequestDescriptor};
///
/// struct Detached(RequestDescriptor);
///
/// impl ConfigureRequest for Detached {
///     fn descriptor(&self) -> &RequestDescriptor {
///         &self.0
///     }
/// }
/// ```
///
/// ```compile_fail
/// use modkit_fluent_http::{ConfigureRequest, RequestBuilder, RequestDescriptor};
///
/// fn detach(builder: RequestBuilder) -> RequestDescriptor {
///     builder.into_descriptor()
/// }
/// ```
pub trait ConfigureRequest: Shape + Sized {
    /// Read access to the accumulated request state.
    fn descriptor(&self) -> &RequestDescriptor;

    /// Set the HTTP method; the last call wins.
    #[must_use]
    fn with_method(mut self, method: Method) -> Self {
        self.descriptor_mut().set_method(method);
        self
    }

    /// Set the target from an absolute URL string; the last call wins.
    #[must_use]
    fn with_target(mut self, target: &str) -> Self {
        match parse_target(target) {
            Ok(uri) => self.descriptor_mut().set_target(uri),
            Err(e) => self.descriptor_mut().record_error(e),
        }
        self
    }

    /// Set the target from a parsed URI; the last call wins.
    #[must_use]
    fn with_uri(mut self, uri: Uri) -> Self {
        match ensure_absolute(uri) {
            Ok(uri) => self.descriptor_mut().set_target(uri),
            Err(e) => self.descriptor_mut().record_error(e),
        }
        self
    }

    /// Add a header. Repeated names are kept, not replaced.
    #[must_use]
    fn include_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.descriptor_mut().headers_mut().append(name, value);
            }
            (Err(e), _) => self.descriptor_mut().record_error(e.into()),
            (_, Err(e)) => self.descriptor_mut().record_error(e.into()),
        }
        self
    }

    /// Add several headers, see [`include_header`](Self::include_header).
    #[must_use]
    fn include_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers.into_iter().fold(self, |builder, (name, value)| {
            builder.include_header(name.as_ref(), value.as_ref())
        })
    }

    /// Choose when the transport hands back the response.
    #[must_use]
    fn with_completion_mode(mut self, completion: CompletionMode) -> Self {
        self.descriptor_mut().set_completion_mode(completion);
        self
    }

    /// Run `hook` on the outgoing request right before transmission.
    ///
    /// Only one request hook is kept; the last call wins. An error from the
    /// hook aborts the send and nothing is transmitted.
    ///
    /// ```ignore
    /// builder.with_request_hook(|req| {
    ///     Box::pin(async move {
    ///         req.headers_mut().insert("x-request-id", HeaderValue::from_static("abc"));
    ///         Ok(())
    ///     })
    /// })
    /// ```
    #[must_use]
    fn with_request_hook<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request<Bytes>) -> BoxFuture<'a, Result<(), HttpError>>
            + Send
            + Sync
            + 'static,
    {
        self.descriptor_mut().set_request_hook(Box::new(hook));
        self
    }

    /// Run `hook` on the response right after it was received, before any
    /// decoding. Only one response hook is kept; the last call wins.
    #[must_use]
    fn with_response_hook<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut HttpResponse) -> BoxFuture<'a, Result<(), HttpError>>
            + Send
            + Sync
            + 'static,
    {
        self.descriptor_mut().set_response_hook(Box::new(hook));
        self
    }

    /// Decode the response with `decoder`, moving to a [`ResponseBuilder`].
    #[must_use]
    fn with_auto_decoding<T, D>(self, decoder: D) -> ResponseBuilder<T>
    where
        T: Send + 'static,
        D: Decoder<T> + 'static,
    {
        ResponseBuilder::from_descriptor(self.into_descriptor()).with_decoder(decoder)
    }

    /// Decode the response with any of `decoders`, moving to a [`ResponseBuilder`].
    #[must_use]
    fn with_auto_decoders<T, I>(self, decoders: I) -> ResponseBuilder<T>
    where
        T: Send + 'static,
        I: IntoIterator,
        I::Item: Decoder<T> + 'static,
    {
        ResponseBuilder::from_descriptor(self.into_descriptor()).with_decoders(decoders)
    }
}

/// Bind `decode` under `media_type` and advertise the media type in `Accept`.
pub fn register<T>(
    descriptor: &mut RequestDescriptor,
    registry: &mut DecoderRegistry<T>,
    media_type: &str,
    decode: DecodeFn<T>,
) {
    if let Err(e) = media_type::validate(media_type) {
        descriptor.record_error(e);
        return;
    }

    if registry.insert(media_type.to_owned(), decode) {
        debug!(media_type, "replaced decoder");
    }
    descriptor.accept_media_type(media_type);
}

fn parse_target(target: &str) -> Result<Uri, HttpError> {
    let uri = target
        .parse::<Uri>()
        .map_err(|e| HttpError::InvalidUri {
            url: target.to_owned(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;
    ensure_absolute(uri)
}

fn ensure_absolute(uri: Uri) -> Result<Uri, HttpError> {
    if uri.scheme().is_none() {
        return Err(HttpError::InvalidUri {
            url: uri.to_string(),
            kind: InvalidUriKind::MissingScheme,
            reason: "missing scheme".to_owned(),
        });
    }
    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url: uri.to_string(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "missing host/authority".to_owned(),
        });
    }
    Ok(uri)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_accepts_absolute() {
        let uri = parse_target("http://example.test/items?page=2").unwrap();
        assert_eq!(uri.host(), Some("example.test"));
        assert_eq!(uri.path(), "/items");
    }

    #[test]
    fn test_parse_target_classifies_failures() {
        assert!(matches!(
            parse_target("not a url"),
            Err(HttpError::InvalidUri {
                kind: InvalidUriKind::ParseError,
                ..
            })
        ));
        assert!(matches!(
            parse_target("/relative/path"),
            Err(HttpError::InvalidUri {
                kind: InvalidUriKind::MissingScheme,
                ..
            })
        ));
    }
}
