use super::{ConfigureRequest, ContentBuilder, Shape};
use crate::codec::{Encoder, JsonEncoder};
use crate::descriptor::RequestDescriptor;
use crate::error::HttpError;
use crate::pipeline;
use crate::response::HttpResponse;
use crate::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Entry point of a request chain.
///
/// Configure the method, target and headers, then either send as-is or
/// move on to a typed body ([`with_body`](Self::with_body)) or typed
/// response decoding ([`with_auto_decoding`](ConfigureRequest::with_auto_decoding)).
///
/// # Example
///
/// ```ignore
/// use modkit_fluent_http::{ConfigureRequest, JsonDecoder, TransportExt};
///
/// let created: Option<Created> = transport
///     .build_request()
///     .with_method(http::Method::POST)
///     .with_target("https://api.example.com/items")
///     .include_header("x-request-id", "42")
///     .with_body(NewItem { title: "Test".into(), user_id: 69 })
///     .with_auto_decoding(JsonDecoder::<Created>::new())
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
#[derive(Debug)]
pub struct RequestBuilder {
    descriptor: RequestDescriptor,
}

impl RequestBuilder {
    /// Start a chain that will be sent through `transport`.
    pub fn new<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self::from_shared(Arc::new(transport))
    }

    /// Start a chain on an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            descriptor: RequestDescriptor::new(transport),
        }
    }

    /// Attach `body`, encoded as JSON unless another encoder is configured.
    pub fn with_body<B>(self, body: B) -> ContentBuilder<B>
    where
        B: Serialize + Send + 'static,
    {
        ContentBuilder::new(self.descriptor, body, JsonEncoder::<B>::new())
    }

    /// Attach `body` together with the encoder that turns it into content.
    ///
    /// Use this for payloads that have no serde representation.
    pub fn with_encoded_body<B, E>(self, body: B, encoder: E) -> ContentBuilder<B>
    where
        B: Send + 'static,
        E: Encoder<B> + 'static,
    {
        ContentBuilder::new(self.descriptor, body, encoder)
    }

    /// Send the request and return the raw response.
    ///
    /// # Errors
    /// - `HttpError::InvalidBuilderState` if method or target was never set
    /// - the deferred error of an invalid configuration call
    /// - whatever the hooks or the transport fail with
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        self.send_with_cancel(CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), aborting with `HttpError::Cancelled` if
    /// `cancel` fires before transmission. The token is handed to the transport.
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn send_with_cancel(self, cancel: CancellationToken) -> Result<HttpResponse, HttpError> {
        pipeline::dispatch(self.descriptor, cancel)
            .await
            .map(|dispatched| dispatched.response)
    }
}

impl ConfigureRequest for RequestBuilder {
    fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

impl Shape for RequestBuilder {
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }
}
