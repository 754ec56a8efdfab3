//! Encoder and decoder contracts plus the bundled codecs.
//!
//! An [`Encoder`] turns a typed request body into [`EncodedContent`] tagged
//! with a media type. A [`Decoder`] turns response [`Content`] back into a
//! typed value and declares the media type it handles; decoders are keyed by
//! that media type when registered on a response builder.

mod json;
mod text;
mod xml;

pub use json::{JsonDecoder, JsonEncoder};
pub use text::{TextDecoder, TextEncoder};
pub use xml::{XmlDecoder, XmlEncoder};

use crate::content::Content;
use crate::error::HttpError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::HeaderValue;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Transport-ready request content and the media type describing it.
#[derive(Debug, Clone)]
pub struct EncodedContent {
    content_type: HeaderValue,
    bytes: Bytes,
}

impl EncodedContent {
    /// Create encoded content with the given `Content-Type` value.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if `content_type` is not a valid header value.
    pub fn new(content_type: &str, bytes: impl Into<Bytes>) -> Result<Self, HttpError> {
        Ok(Self {
            content_type: HeaderValue::from_str(content_type)?,
            bytes: bytes.into(),
        })
    }

    /// Create encoded content with a static `Content-Type` value.
    #[must_use]
    pub fn from_static(content_type: &'static str, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: HeaderValue::from_static(content_type),
            bytes: bytes.into(),
        }
    }

    /// `Content-Type` header value for the request.
    #[must_use]
    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    /// Encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Split into header value and bytes.
    #[must_use]
    pub fn into_parts(self) -> (HeaderValue, Bytes) {
        (self.content_type, self.bytes)
    }
}

/// Converts a typed value into transport-ready content.
pub trait Encoder<T: ?Sized>: Send + Sync {
    /// Media type of the produced content.
    fn media_type(&self) -> &str;

    /// Encode `value`.
    ///
    /// # Errors
    /// Returns whatever error the concrete format produces.
    fn encode(&self, value: &T) -> Result<EncodedContent, HttpError>;
}

/// Converts response content into a typed value.
#[async_trait]
pub trait Decoder<T>: Send + Sync {
    /// Media type this decoder handles; used as the registry key.
    fn media_type(&self) -> &str;

    /// Decode `content`. `Ok(None)` means the content represents no value.
    ///
    /// # Errors
    /// Returns whatever error the concrete format produces.
    async fn decode(&self, content: Content, cancel: &CancellationToken)
    -> Result<Option<T>, HttpError>;
}

impl<T, E> Encoder<T> for Box<E>
where
    T: ?Sized,
    E: Encoder<T> + ?Sized,
{
    fn media_type(&self) -> &str {
        (**self).media_type()
    }

    fn encode(&self, value: &T) -> Result<EncodedContent, HttpError> {
        (**self).encode(value)
    }
}

#[async_trait]
impl<T, D> Decoder<T> for Box<D>
where
    T: Send + 'static,
    D: Decoder<T> + ?Sized,
{
    fn media_type(&self) -> &str {
        (**self).media_type()
    }

    async fn decode(
        &self,
        content: Content,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, HttpError> {
        (**self).decode(content, cancel).await
    }
}

/// Future produced by a type-erased decode operation.
pub type DecodeFuture<T> = BoxFuture<'static, Result<Option<T>, HttpError>>;

/// Type-erased decode operation stored in a registry.
pub type DecodeFn<T> = Box<dyn Fn(Content, CancellationToken) -> DecodeFuture<T> + Send + Sync>;

/// Erase a decoder object into a registry entry.
pub fn erase_decoder<T, D>(decoder: D) -> DecodeFn<T>
where
    T: Send + 'static,
    D: Decoder<T> + 'static,
{
    let decoder = Arc::new(decoder);
    Box::new(move |content: Content, cancel: CancellationToken| -> DecodeFuture<T> {
        let decoder = Arc::clone(&decoder);
        Box::pin(async move { decoder.decode(content, &cancel).await })
    })
}

/// Erase a decode closure into a registry entry.
pub fn erase_decode_fn<T, F, Fut>(decode: F) -> DecodeFn<T>
where
    T: Send + 'static,
    F: Fn(Content, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<T>, HttpError>> + Send + 'static,
{
    Box::new(move |content: Content, cancel: CancellationToken| -> DecodeFuture<T> {
        Box::pin(decode(content, cancel))
    })
}

/// Read content to memory unless the token fires first.
pub async fn read_cancellable(
    content: Content,
    cancel: &CancellationToken,
) -> Result<Bytes, HttpError> {
    if let Some(bytes) = content.as_bytes() {
        return Ok(bytes.clone());
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(HttpError::Cancelled),
        bytes = content.bytes() => bytes,
    }
}
