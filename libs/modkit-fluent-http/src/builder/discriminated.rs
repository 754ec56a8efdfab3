use super::{ConfigureRequest, Shape, register};
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

/// Value decoded by a [`DiscriminatedResponseBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discriminated<P, A> {
    /// Decoded by a primary decoder.
    Primary(P),
    /// Decoded by an alternate decoder.
    Alternate(A),
}

impl<P, A> Discriminated<P, A> {
    #[must_use]
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary(_))
    }

    #[must_use]
    pub fn is_alternate(&self) -> bool {
        matches!(self, Self::Alternate(_))
    }

    /// The primary value, if that is what was decoded.
    #[must_use]
    pub fn primary(self) -> Option<P> {
        match self {
            Self::Primary(value) => Some(value),
            Self::Alternate(_) => None,
        }
    }

    /// The alternate value, if that is what was decoded.
    #[must_use]
    pub fn alternate(self) -> Option<A> {
        match self {
            Self::Primary(_) => None,
            Self::Alternate(value) => Some(value),
        }
    }

    /// Convert into a `Result`, treating the alternate type as the error side.
    ///
    /// # Errors
    /// Returns `Err(alternate)` when the alternate type was decoded.
    pub fn into_result(self) -> Result<P, A> {
        match self {
            Self::Primary(value) => Ok(value),
            Self::Alternate(value) => Err(value),
        }
    }
}

/// Request chain whose response decodes into either `P` or `A`.
///
/// Typical use is a success payload and an error document that the server
/// sends with different media types. The primary decoders are tried first;
/// only when none matches the response media type are the alternate
/// decoders consulted.
///
/// ```ignore
/// let outcome = transport
///     .build_request()
///     .with_method(Method::GET)
///     .with_target("https://api.example.com/items/1")
///     .with_auto_decoding(JsonDecoder::<Item>::new())
///     .or_to::<Problem>()
///     .using_decoder(JsonDecoder::<Problem>::new().with_media_type("application/problem+json"))
///     .send()
///     .await?;
/// ```
#[must_use = "DiscriminatedResponseBuilder does nothing until .send() is called"]
pub struct DiscriminatedResponseBuilder<P, A> {
    descriptor: RequestDescriptor,
    primary: DecoderRegistry<P>,
    alternate: DecoderRegistry<A>,
}

impl<P, A> DiscriminatedResponseBuilder<P, A>
where
    P: Send + 'static,
    A: Send + 'static,
{
    pub(crate) fn from_parts(descriptor: RequestDescriptor, primary: DecoderRegistry<P>) -> Self {
        Self {
            descriptor,
            primary,
            alternate: DecoderRegistry::new(),
        }
    }

    /// Register a primary decoder under its own media type.
    pub fn with_decoder<D>(mut self, decoder: D) -> Self
    where
        D: Decoder<P> + 'static,
    {
        let media_type = decoder.media_type().to_owned();
        register(
            &mut self.descriptor,
            &mut self.primary,
            &media_type,
            erase_decoder(decoder),
        );
        self
    }

    /// Register an inline primary decode function under `media_type`.
    pub fn with_decoder_fn<F, Fut>(mut self, media_type: &str, decode: F) -> Self
    where
        F: Fn(Content, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<P>, HttpError>> + Send + 'static,
    {
        register(
            &mut self.descriptor,
            &mut self.primary,
            media_type,
            erase_decode_fn(decode),
        );
        self
    }

    /// Register several primary decoders in order.
    pub fn with_decoders<I>(self, decoders: I) -> Self
    where
        I: IntoIterator,
        I::Item: Decoder<P> + 'static,
    {
        decoders
            .into_iter()
            .fold(self, |builder, decoder| builder.with_decoder(decoder))
    }

    /// Register an alternate decoder under its own media type.
    pub fn using_decoder<D>(mut self, decoder: D) -> Self
    where
        D: Decoder<A> + 'static,
    {
        let media_type = decoder.media_type().to_owned();
        register(
            &mut self.descriptor,
            &mut self.alternate,
            &media_type,
            erase_decoder(decoder),
        );
        self
    }

    /// Register an inline alternate decode function under `media_type`.
    pub fn using_decoder_fn<F, Fut>(mut self, media_type: &str, decode: F) -> Self
    where
        F: Fn(Content, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<A>, HttpError>> + Send + 'static,
    {
        register(
            &mut self.descriptor,
            &mut self.alternate,
            media_type,
            erase_decode_fn(decode),
        );
        self
    }

    /// Register several alternate decoders in order.
    pub fn using_decoders<I>(self, decoders: I) -> Self
    where
        I: IntoIterator,
        I::Item: Decoder<A> + 'static,
    {
        decoders
            .into_iter()
            .fold(self, |builder, decoder| builder.using_decoder(decoder))
    }

    /// Media types of the primary decoders, in registration order.
    pub fn decoders(&self) -> impl Iterator<Item = &str> {
        self.primary.media_types()
    }

    /// Media types of the alternate decoders, in registration order.
    pub fn alternate_decoders(&self) -> impl Iterator<Item = &str> {
        self.alternate.media_types()
    }

    /// Send the request and decode the response with whichever registry
    /// matches its media type, primary first.
    ///
    /// # Errors
    /// - everything [`RequestBuilder::send`](super::RequestBuilder::send) fails with
    /// - `HttpError::NoDecoder` with `DecoderLookup::Discriminated` if neither
    ///   registry has a decoder for the response media type
    /// - whatever the selected decoder fails with
    pub async fn send(self) -> Result<Option<Discriminated<P, A>>, HttpError> {
        self.send_with_cancel(CancellationToken::new()).await
    }

    /// Like [`send`](Self::send) with a cancellation token.
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn send_with_cancel(
        self,
        cancel: CancellationToken,
    ) -> Result<Option<Discriminated<P, A>>, HttpError> {
        let Self {
            descriptor,
            primary,
            alternate,
        } = self;
        let dispatched = pipeline::dispatch(descriptor, cancel.clone()).await?;
        negotiation::decode_discriminated(
            dispatched.response,
            &dispatched.accept,
            &primary,
            &alternate,
            cancel,
        )
        .await
    }
}

impl<P, A> ConfigureRequest for DiscriminatedResponseBuilder<P, A>
where
    P: Send + 'static,
    A: Send + 'static,
{
    fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

impl<P, A> Shape for DiscriminatedResponseBuilder<P, A>
where
    P: Send + 'static,
    A: Send + 'static,
{
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }
}

impl<P, A> fmt::Debug for DiscriminatedResponseBuilder<P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscriminatedResponseBuilder")
            .field("descriptor", &self.descriptor)
            .field("primary", &self.primary)
            .field("alternate", &self.alternate)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::builder::RequestBuilder;
    use crate::codec::{JsonDecoder, TextDecoder};
    use crate::error::DecoderLookup;
    use crate::response::HttpResponse;
    use crate::transport::{CompletionMode, Transport};
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::header::{ACCEPT, CONTENT_TYPE};
    use http::{Method, Request, Response};
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    struct Canned {
        content_type: &'static str,
        body: &'static str,
        accept: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn transmit(
            &self,
            request: Request<Bytes>,
            _completion: CompletionMode,
            _cancel: CancellationToken,
        ) -> Result<HttpResponse, HttpError> {
            *self.accept.lock().unwrap() = request
                .headers()
                .get(ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let response = Response::builder()
                .header(CONTENT_TYPE, self.content_type)
                .body(Content::from_bytes(self.body))
                .unwrap();
            Ok(HttpResponse::new(response))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Problem {
        title: String,
    }

    fn builder(
        content_type: &'static str,
        body: &'static str,
    ) -> (Arc<Canned>, DiscriminatedResponseBuilder<Item, Problem>) {
        let transport = Arc::new(Canned {
            content_type,
            body,
            accept: Mutex::new(None),
        });
        let builder = RequestBuilder::new(transport.clone())
            .with_method(Method::GET)
            .with_target("http://example.test/items/1")
            .with_auto_decoding(JsonDecoder::<Item>::new())
            .or_to::<Problem>()
            .using_decoder(JsonDecoder::<Problem>::new().with_media_type("application/problem+json"));
        (transport, builder)
    }

    #[tokio::test]
    async fn test_primary_match() {
        let (transport, builder) = builder("application/json", r#"{"id":5}"#);
        let value = builder.send().await.unwrap();

        assert_eq!(value, Some(Discriminated::Primary(Item { id: 5 })));
        assert_eq!(
            transport.accept.lock().unwrap().as_deref(),
            Some("application/json, application/problem+json")
        );
    }

    #[tokio::test]
    async fn test_alternate_match() {
        let (_transport, builder) = builder("application/problem+json", r#"{"title":"gone"}"#);
        let value = builder.send().await.unwrap().unwrap();

        assert!(value.is_alternate());
        assert_eq!(
            value.into_result(),
            Err(Problem {
                title: "gone".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn test_miss_in_both_registries() {
        let (_transport, builder) = builder("text/html", "<html/>");
        let err = builder.send().await.unwrap_err();

        assert!(matches!(
            err,
            HttpError::NoDecoder {
                lookup: DecoderLookup::Discriminated,
                ref media_type,
                ..
            } if media_type == "text/html"
        ));
    }

    #[tokio::test]
    async fn test_primary_registry_is_tried_first() {
        let (_transport, builder) = builder("text/plain", "hello");
        let value = builder
            .with_decoder_fn("text/plain", |_content, _cancel| async {
                Ok::<_, HttpError>(Some(Item { id: 1 }))
            })
            .using_decoder_fn("text/plain", |_content, _cancel| async {
                Ok::<_, HttpError>(Some(Problem {
                    title: "unused".to_owned(),
                }))
            })
            .send()
            .await
            .unwrap();

        assert_eq!(value.and_then(Discriminated::primary), Some(Item { id: 1 }));
    }

    #[tokio::test]
    async fn test_alternate_registration_is_advertised_once() {
        let transport = Arc::new(Canned {
            content_type: "text/plain",
            body: "hello",
            accept: Mutex::new(None),
        });
        let builder = RequestBuilder::new(transport.clone())
            .with_method(Method::GET)
            .with_target("http://example.test/items/1")
            .with_auto_decoding(JsonDecoder::<Item>::new())
            .or_to::<String>()
            .using_decoders([TextDecoder::new(), TextDecoder::new()]);

        assert_eq!(builder.alternate_decoders().collect::<Vec<_>>(), ["text/plain"]);
        assert_eq!(
            builder.descriptor().accepted_media_types(),
            ["application/json", "text/plain"]
        );
        let value = builder.send().await.unwrap();
        assert_eq!(value, Some(Discriminated::Alternate("hello".to_owned())));
        assert_eq!(
            transport.accept.lock().unwrap().as_deref(),
            Some("application/json, text/plain")
        );
    }
}
