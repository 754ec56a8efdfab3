use super::{ConfigureRequest, DiscriminatedResponseBuilder, Shape, register};
use crate::codec::{Decoder, erase_decode_fn, erase_decoder};
use crate::content::Content;
use crate::descriptor::RequestDescriptor;
use crate::error::HttpError;
use crate::negotiation;
use crate::pipeline;
use crate::registry::DecoderRegistry;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Request chain whose response is decoded into `T`.
///
/// Decoders are keyed by media type. Each registration also adds the media
/// type to the request's `Accept` header; registering a media type again
/// replaces the decoder without repeating it in `Accept`.
///
/// On send, the response `Content-Type` (parameters stripped) selects the
/// decoder. A response without a `Content-Type` is assumed to carry the
/// first accepted media type.
#[must_use = "ResponseBuilder does nothing until .send() is called"]
pub struct ResponseBuilder<T> {
    descriptor: RequestDescriptor,
    decoders: DecoderRegistry<T>,
}

impl<T> ResponseBuilder<T>
where
    T: Send + 'static,
{
    pub(crate) fn from_descriptor(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            decoders: DecoderRegistry::new(),
        }
    }

    /// Register `decoder` under its own media type.
    pub fn with_decoder<D>(mut self, decoder: D) -> Self
    where
        D: Decoder<T> + 'static,
    {
        let media_type = decoder.media_type().to_owned();
        register(
            &mut self.descriptor,
            &mut self.decoders,
            &media_type,
            erase_decoder(decoder),
        );
        self
    }

    /// Register an inline decode function under `media_type`.
    ///
    /// ```ignore
    /// builder.with_decoder_fn("text/csv", |content, _cancel| async move {
    ///     let text = content.text().await?;
    ///     Ok(Some(parse_csv(&text)))
    /// })
    /// ```
    pub fn with_decoder_fn<F, Fut>(mut self, media_type: &str, decode: F) -> Self
    where
        F: Fn(Content, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>, HttpError>> + Send + 'static,
    {
        register(
            &mut self.descriptor,
            &mut self.decoders,
            media_type,
            erase_decode_fn(decode),
        );
        self
    }

    /// Register each decoder in order, as [`with_decoder`](Self::with_decoder) does.
    pub fn with_decoders<I>(self, decoders: I) -> Self
    where
        I: IntoIterator,
        I::Item: Decoder<T> + 'static,
    {
        decoders
            .into_iter()
            .fold(self, |builder, decoder| builder.with_decoder(decoder))
    }

    /// Also accept responses decoded into an alternate type `A`.
    ///
    /// The decoders registered so far stay the primary ones; register the
    /// alternate ones with [`DiscriminatedResponseBuilder::using_decoder`].
    pub fn or_to<A>(self) -> DiscriminatedResponseBuilder<T, A>
    where
        A: Send + 'static,
    {
        DiscriminatedResponseBuilder::from_parts(self.descriptor, self.decoders)
    }

    /// Media types with a registered decoder, in registration order.
    pub fn decoders(&self) -> impl Iterator<Item = &str> {
        self.decoders.media_types()
    }

    /// Send the request and decode the response.
    ///
    /// Returns `Ok(None)` when the decoder reports that the content holds no
    /// value (e.g. a JSON `null`).
    ///
    /// # Errors
    /// - everything [`RequestBuilder::send`](super::RequestBuilder::send) fails with
    /// - `HttpError::NoDecoder` if no decoder matches the response media type
    /// - `HttpError::UndeterminedMediaType` if the response declares no
    ///   content type and no decoder was registered
    /// - whatever the selected decoder fails with
    pub async fn send(self) -> Result<Option<T>, HttpError> {
        self.send_with_cancel(CancellationToken::new()).await
    }

    /// Like [`send`](Self::send) with a cancellation token, which is also
    /// handed to the selected decoder.
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn send_with_cancel(self, cancel: CancellationToken) -> Result<Option<T>, HttpError> {
        let Self {
            descriptor,
            decoders,
        } = self;
        let dispatched = pipeline::dispatch(descriptor, cancel.clone()).await?;
        negotiation::decode_single(dispatched.response, &dispatched.accept, &decoders, cancel).await
    }
}

impl<T> ConfigureRequest for ResponseBuilder<T>
where
    T: Send + 'static,
{
    fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

impl<T> Shape for ResponseBuilder<T>
where
    T: Send + 'static,
{
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }
}

impl<T> fmt::Debug for ResponseBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("descriptor", &self.descriptor)
            .field("decoders", &self.decoders)
            .finish()
    }
}
