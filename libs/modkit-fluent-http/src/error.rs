use crate::response::HttpResponse;
use std::time::Duration;
use thiserror::Error;

/// Boxed error type used for opaque sources (transport, codecs, hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Builder member that must be configured before a request can be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MissingField {
    /// `with_method` was never called
    Method,
    /// `with_target` / `with_uri` was never called
    Target,
}

impl MissingField {
    /// Name of the builder method that would have set the field.
    #[must_use]
    pub fn builder_method(self) -> &'static str {
        match self {
            Self::Method => "with_method",
            Self::Target => "with_target",
        }
    }
}

/// Which decoder lookup failed to find a match for the response media type.
///
/// A [`ResponseBuilder`](crate::ResponseBuilder) consults one registry, a
/// [`DiscriminatedResponseBuilder`](crate::DiscriminatedResponseBuilder)
/// consults the primary and then the alternate registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecoderLookup {
    /// Single registry lookup missed
    Primary,
    /// Both the primary and the alternate registry missed
    Discriminated,
}

/// Classification of URL validation failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is missing required host/authority component
    MissingAuthority,
    /// URL is missing required scheme (http/https)
    MissingScheme,
}

/// Errors produced while building, sending or decoding a request.
///
/// Transport, encoder, decoder and hook failures are returned exactly as the
/// collaborator produced them.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// A required builder member was not configured before `send`
    #[error("The builder method {} must be called.", .0.builder_method())]
    InvalidBuilderState(MissingField),

    /// The cancellation token was triggered before transmission started
    #[error("Request was cancelled")]
    Cancelled,

    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Media type registered for a decoder is blank, malformed or parameterized
    #[error("Invalid media type '{media_type}': {reason}")]
    InvalidMediaType {
        /// The rejected media type token
        media_type: String,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// No registered decoder matches the response media type.
    ///
    /// The original response is kept for diagnostics; its content has not
    /// been consumed.
    #[error("No decoder found for the response content type: '{media_type}'")]
    NoDecoder {
        /// Media type declared by (or assumed for) the response
        media_type: String,
        /// Which lookup missed
        lookup: DecoderLookup,
        /// The response that could not be decoded
        response: Box<HttpResponse>,
    },

    /// The response declares no content type and the request accepted none
    #[error("Response has no content type and the request declared no accepted media type")]
    UndeterminedMediaType {
        /// The response that could not be decoded
        response: Box<HttpResponse>,
    },

    /// Request body encoder failed
    #[error("Failed to encode request content: {0}")]
    Encode(#[source] BoxError),

    /// Response content decoder failed
    #[error("Failed to decode response content: {0}")]
    Decode(#[source] BoxError),

    /// JSON serialization or parsing error
    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Request or response hook failed
    #[error("Hook failed: {0}")]
    Hook(#[source] BoxError),

    /// Single request attempt timed out
    #[error("Request attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Transport error (network, connection, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] BoxError),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Invalid URL (failed to parse)
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field contains
    /// a diagnostic message intended for logging only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        /// The URL that failed to parse
        url: String,
        /// Structured failure classification for programmatic matching
        kind: InvalidUriKind,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// Invalid URL scheme for transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme {
        /// The URL scheme that was rejected
        scheme: String,
        /// Reason the scheme was rejected
        reason: String,
    },
}

impl HttpError {
    /// Wrap an arbitrary encoder failure.
    pub fn encode(err: impl Into<BoxError>) -> Self {
        Self::Encode(err.into())
    }

    /// Wrap an arbitrary decoder failure.
    pub fn decode(err: impl Into<BoxError>) -> Self {
        Self::Decode(err.into())
    }

    /// Wrap an arbitrary hook failure.
    pub fn hook(err: impl Into<BoxError>) -> Self {
        Self::Hook(err.into())
    }

    /// The response carried by a decode-resolution failure, if any.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::NoDecoder { response, .. } | Self::UndeterminedMediaType { response } => {
                Some(response)
            }
            _ => None,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
