use super::{Decoder, EncodedContent, Encoder, read_cancellable};
use crate::content::Content;
use crate::error::HttpError;
use crate::media_type::TEXT_PLAIN;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt::Display;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// Encodes any `Display` value as UTF-8 text.
///
/// The content type always carries `charset=utf-8`.
pub struct TextEncoder<T: ?Sized> {
    media_type: Cow<'static, str>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> TextEncoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(TEXT_PLAIN),
            _marker: PhantomData,
        }
    }

    /// Use a different media type, e.g. `text/csv`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl<T: ?Sized> Default for TextEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Encoder<T> for TextEncoder<T>
where
    T: Display + ?Sized,
{
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn encode(&self, value: &T) -> Result<EncodedContent, HttpError> {
        let content_type = format!("{}; charset=utf-8", self.media_type);
        EncodedContent::new(&content_type, value.to_string())
    }
}

/// Decodes text content into a `String`.
///
/// Invalid UTF-8 sequences are replaced, never rejected.
#[derive(Debug, Clone)]
pub struct TextDecoder {
    media_type: Cow<'static, str>,
}

impl TextDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(TEXT_PLAIN),
        }
    }

    /// Handle a different media type, e.g. `text/html`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Decoder<String> for TextDecoder {
    fn media_type(&self) -> &str {
        &self.media_type
    }

    async fn decode(
        &self,
        content: Content,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, HttpError> {
        let bytes = read_cancellable(content, cancel).await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}
