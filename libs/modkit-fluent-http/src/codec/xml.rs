use super::{Decoder, EncodedContent, Encoder, read_cancellable};
use crate::content::Content;
use crate::error::HttpError;
use crate::media_type::APPLICATION_XML;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// XML body encoder (`quick-xml` serde support).
///
/// The root element is named after the serialized type.
pub struct XmlEncoder<T: ?Sized> {
    media_type: Cow<'static, str>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> XmlEncoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(APPLICATION_XML),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl<T: ?Sized> Default for XmlEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Encoder<T> for XmlEncoder<T>
where
    T: Serialize + ?Sized,
{
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn encode(&self, value: &T) -> Result<EncodedContent, HttpError> {
        let document = quick_xml::se::to_string(value).map_err(HttpError::encode)?;
        let mut out = String::with_capacity(XML_DECLARATION.len() + document.len());
        out.push_str(XML_DECLARATION);
        out.push_str(&document);
        EncodedContent::new(&self.media_type, out)
    }
}

/// XML content decoder (`quick-xml` serde support).
///
/// Empty or whitespace-only content decodes to `None`.
pub struct XmlDecoder<T> {
    media_type: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> XmlDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            media_type: Cow::Borrowed(APPLICATION_XML),
            _marker: PhantomData,
        }
    }

    /// Register under a different media type, e.g. `text/xml`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<Cow<'static, str>>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl<T> Default for XmlDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Decoder<T> for XmlDecoder<T>
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
        let text = std::str::from_utf8(&bytes).map_err(HttpError::decode)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        quick_xml::de::from_str::<T>(text)
            .map(Some)
            .map_err(HttpError::decode)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Post {
        title: String,
        user_id: u32,
    }

    #[test]
    fn test_encode_writes_declaration_and_root() {
        let encoded = XmlEncoder::new()
            .encode(&Post {
                title: "Test".to_owned(),
                user_id: 69,
            })
            .unwrap();

        assert_eq!(encoded.content_type(), "application/xml");
        let text = std::str::from_utf8(encoded.bytes()).unwrap();
        assert!(text.starts_with(XML_DECLARATION));
        assert!(text.contains("<Post>"));
        assert!(text.contains("<userId>69</userId>"));
    }

    #[tokio::test]
    async fn test_decode_elements() {
        let post = XmlDecoder::<Post>::new()
            .decode(
                Content::from_bytes(
                    "<?xml version=\"1.0\"?><Post><title>Test</title><userId>69</userId></Post>",
                ),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            post,
            Some(Post {
                title: "Test".to_owned(),
                user_id: 69
            })
        );
    }

    #[tokio::test]
    async fn test_decode_empty_is_none() {
        let post = XmlDecoder::<Post>::new()
            .decode(Content::from_bytes("  \n"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(post.is_none());
    }

    #[tokio::test]
    async fn test_decode_error_is_decode_error() {
        let err = XmlDecoder::<Post>::new()
            .decode(Content::from_bytes("{\"title\":1}"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(_)));
    }

    #[test]
    fn test_custom_media_type() {
        let decoder = XmlDecoder::<Post>::new().with_media_type("text/xml");
        assert_eq!(Decoder::media_type(&decoder), "text/xml");
    }
}
