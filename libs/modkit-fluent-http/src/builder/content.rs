use super::{ConfigureRequest, Shape};
use crate::codec::{EncodedContent, Encoder, JsonEncoder};
use crate::descriptor::RequestDescriptor;
use crate::error::HttpError;
use crate::pipeline;
use crate::response::HttpResponse;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

type BodyEncoder<B> = Box<dyn Fn(&B) -> Result<EncodedContent, HttpError> + Send + Sync>;

/// Request chain carrying a typed body.
///
/// The body is encoded exactly once, when the request is sent. Until then
/// both the body and the encoder can be replaced.
#[must_use = "ContentBuilder does nothing until .send() is called"]
pub struct ContentBuilder<B> {
    descriptor: RequestDescriptor,
    body: B,
    encoder: BodyEncoder<B>,
}

impl<B> ContentBuilder<B>
where
    B: Send + 'static,
{
    pub(crate) fn new<E>(descriptor: RequestDescriptor, body: B, encoder: E) -> Self
    where
        E: Encoder<B> + 'static,
    {
        Self {
            descriptor,
            body,
            encoder: Box::new(move |body: &B| encoder.encode(body)),
        }
    }

    /// Replace the body; the configured encoder is kept.
    pub fn with_body(mut self, body: B) -> Self {
        self.body = body;
        self
    }

    /// Switch to a body of another type, encoded as JSON.
    ///
    /// The previous body and its encoder are dropped.
    pub fn replace_body<C>(self, body: C) -> ContentBuilder<C>
    where
        C: Serialize + Send + 'static,
    {
        ContentBuilder::new(self.descriptor, body, JsonEncoder::<C>::new())
    }

    /// Switch to a body of another type together with its encoder.
    ///
    /// The previous body and its encoder are dropped.
    pub fn replace_encoded_body<C, E>(self, body: C, encoder: E) -> ContentBuilder<C>
    where
        C: Send + 'static,
        E: Encoder<C> + 'static,
    {
        ContentBuilder::new(self.descriptor, body, encoder)
    }

    /// The body that will be encoded at send time.
    #[must_use]
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Encode the body with `encoder`; the last encoder call wins.
    pub fn with_content_encoder<E>(mut self, encoder: E) -> Self
    where
        E: Encoder<B> + 'static,
    {
        self.encoder = Box::new(move |body: &B| encoder.encode(body));
        self
    }

    /// Encode the body with an inline function; the last encoder call wins.
    pub fn with_content_encoder_fn<F>(mut self, encode: F) -> Self
    where
        F: Fn(&B) -> Result<EncodedContent, HttpError> + Send + Sync + 'static,
    {
        self.encoder = Box::new(encode);
        self
    }

    /// Encode the body, send the request and return the raw response.
    ///
    /// # Errors
    /// Same as [`RequestBuilder::send`](super::RequestBuilder::send), plus
    /// whatever the encoder fails with.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        self.send_with_cancel(CancellationToken::new()).await
    }

    /// Like [`send`](Self::send) with a cancellation token.
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn send_with_cancel(self, cancel: CancellationToken) -> Result<HttpResponse, HttpError> {
        pipeline::dispatch(self.into_descriptor(), cancel)
            .await
            .map(|dispatched| dispatched.response)
    }
}

impl<B> ConfigureRequest for ContentBuilder<B>
where
    B: Send + 'static,
{
    fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

impl<B> Shape for ContentBuilder<B>
where
    B: Send + 'static,
{
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    fn into_descriptor(self) -> RequestDescriptor {
        let Self {
            mut descriptor,
            body,
            encoder,
        } = self;
        descriptor.set_body(Box::new(move || encoder(&body)));
        descriptor
    }
}

impl<B: fmt::Debug> fmt::Debug for ContentBuilder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBuilder")
            .field("descriptor", &self.descriptor)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
