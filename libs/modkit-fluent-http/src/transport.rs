use crate::builder::RequestBuilder;
use crate::error::HttpError;
use crate::response::HttpResponse;
use async_trait::async_trait;
use bytes::Bytes;
use http::Request;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// When a transport may return the response to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionMode {
    /// Read the whole body before returning; the response carries buffered [`Content`](crate::Content).
    #[default]
    BufferContent,
    /// Return as soon as the headers arrived; the response carries streaming content.
    HeadersOnly,
}

/// Performs the network exchange for a fully built request.
///
/// The send pipeline calls [`transmit`](Transport::transmit) exactly once per
/// send. Implementations own everything below that seam: connection reuse,
/// TLS, timeouts and how cancellation is surfaced once the exchange started.
///
/// # Example
///
/// ```ignore
/// struct Canned;
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn transmit(
///         &self,
///         _request: Request<Bytes>,
///         _completion: CompletionMode,
///         _cancel: CancellationToken,
///     ) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::new(http::Response::new(Content::from_bytes("ok"))))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response.
    ///
    /// # Errors
    /// Whatever the transport fails with; the pipeline returns it unmodified.
    async fn transmit(
        &self,
        request: Request<Bytes>,
        completion: CompletionMode,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, HttpError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn transmit(
        &self,
        request: Request<Bytes>,
        completion: CompletionMode,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        (**self).transmit(request, completion, cancel).await
    }
}

/// Start a request chain from a transport handle.
pub trait TransportExt {
    /// New [`RequestBuilder`] bound to a clone of this transport.
    fn build_request(&self) -> RequestBuilder;
}

impl<T> TransportExt for T
where
    T: Transport + Clone + 'static,
{
    fn build_request(&self) -> RequestBuilder {
        RequestBuilder::new(self.clone())
    }
}
