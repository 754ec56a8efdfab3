use super::{Decoder, EncodedContent, Encoder, read_cancellable};
use crate::content::Content;
use crate::error::HttpError;
use crate::media_type::APPLICATION_JSON;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// JSON body encoder (`serde_json`).
///
/// This is the encoder a [`ContentBuilder`](crate::ContentBuilder) starts
/// with when no other encoder is configured.
pub struct JsonEncoder<T: ?Sized> {
    media_type: Cow<'static, str>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> JsonEncoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(APPLICATION_JSON),
            _marker: PhantomData,
        }
    }

    /// Use a different media type, e.g. `application/merge-patch+json`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl<T: ?Sized> Default for JsonEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Encoder<T> for JsonEncoder<T>
where
    T: Serialize + ?Sized,
{
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn encode(&self, value: &T) -> Result<EncodedContent, HttpError> {
        let bytes = serde_json::to_vec(value)?;
        EncodedContent::new(&self.media_type, bytes)
    }
}

/// JSON content decoder (`serde_json`).
///
/// A JSON `null` document decodes to `None`.
pub struct JsonDecoder<T> {
    media_type: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(APPLICATION_JSON),
            _marker: PhantomData,
        }
    }

    /// Register under a different media type, e.g. `application/problem+json`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Decoder<T> for JsonDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn media_type(&self) -> &str {
        &self.media_type
    }

    async fn decode(
        &self,
        content: Content,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, HttpError> {
        let bytes = read_cancellable(content, cancel).await?;
        Ok(serde_json::from_slice::<Option<T>>(&bytes)?)
    }
}
