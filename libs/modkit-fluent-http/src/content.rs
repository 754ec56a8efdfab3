use crate::error::{BoxError, HttpError};
use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;

/// Type alias for a boxed, type-erased response body stream.
pub type ResponseBody = BoxBody<Bytes, BoxError>;

/// Response content handed to decoders.
///
/// Content is either fully buffered (the transport read the whole body
/// before returning, see [`CompletionMode::BufferContent`]) or still
/// streaming (returned as soon as headers arrived, see
/// [`CompletionMode::HeadersOnly`]).
///
/// [`CompletionMode::BufferContent`]: crate::CompletionMode::BufferContent
/// [`CompletionMode::HeadersOnly`]: crate::CompletionMode::HeadersOnly
#[derive(Debug)]
pub struct Content {
    repr: Repr,
}

#[derive(Debug)]
enum Repr {
    Buffered(Bytes),
    Streaming(ResponseBody),
}

impl Content {
    /// Empty buffered content.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Buffered content.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            repr: Repr::Buffered(bytes.into()),
        }
    }

    /// Streaming content backed by a body that has not been read yet.
    #[must_use]
    pub fn from_body(body: ResponseBody) -> Self {
        Self {
            repr: Repr::Streaming(body),
        }
    }

    /// Whether the content is already fully in memory.
    #[must_use]
    pub fn is_buffered(&self) -> bool {
        matches!(self.repr, Repr::Buffered(_))
    }

    /// Borrow the buffered bytes, `None` for streaming content.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.repr {
            Repr::Buffered(bytes) => Some(bytes),
            Repr::Streaming(_) => None,
        }
    }

    /// Read the whole content into memory.
    ///
    /// # Errors
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        match self.repr {
            Repr::Buffered(bytes) => Ok(bytes),
            Repr::Streaming(body) => Ok(body.collect().await.map_err(HttpError::Transport)?.to_bytes()),
        }
    }

    /// Read the whole content, failing once more than `limit` bytes arrive.
    ///
    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if the content exceeds `limit`.
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    pub async fn bytes_limited(self, limit: usize) -> Result<Bytes, HttpError> {
        match self.repr {
            Repr::Buffered(bytes) if bytes.len() > limit => Err(HttpError::BodyTooLarge {
                limit,
                actual: bytes.len(),
            }),
            Repr::Buffered(bytes) => Ok(bytes),
            Repr::Streaming(body) => read_body_limited(body, limit).await,
        }
    }

    /// Read the whole content as UTF-8 text.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    ///
    /// # Errors
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    pub async fn text(self) -> Result<String, HttpError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Convert into a body stream; buffered content becomes a single frame.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        match self.repr {
            Repr::Buffered(bytes) => http_body_util::Full::new(bytes)
                .map_err(|never| -> BoxError { match never {} })
                .boxed(),
            Repr::Streaming(body) => body,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Read a body stream into memory, enforcing a byte limit.
pub async fn read_body_limited(body: ResponseBody, limit: usize) -> Result<Bytes, HttpError> {
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use futures::stream;
    use http_body::Frame;
    use http_body_util::StreamBody;

    fn chunked(chunks: &[&'static str]) -> ResponseBody {
        let frames = chunks
            .iter()
            .map(|c| Ok::<_, BoxError>(Frame::data(Bytes::from(*c))))
            .collect::<Vec<_>>();
        StreamBody::new(stream::iter(frames)).boxed()
    }

    #[tokio::test]
    async fn test_streaming_content_is_collected() {
        let content = Content::from_body(chunked(&["hello, ", "world"]));
        assert!(!content.is_buffered());
        assert_eq!(content.text().await.unwrap(), "hello, world");
    }

    #[tokio::test]
    async fn test_limited_read_rejects_oversized_stream() {
        let content = Content::from_body(chunked(&["12345", "67890"]));
        let err = content.bytes_limited(8).await.unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge { limit: 8, actual: 10 }));
    }

    #[tokio::test]
    async fn test_limited_read_rejects_oversized_buffer() {
        let content = Content::from_bytes("0123456789");
        let err = content.bytes_limited(4).await.unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge { limit: 4, actual: 10 }));
    }

    #[tokio::test]
    async fn test_buffered_content_round_trips_through_body() {
        let content = Content::from_bytes("abc");
        assert_eq!(content.as_bytes().map(|b| b.as_ref()), Some(&b"abc"[..]));

        let body = content.into_body();
        let bytes = Content::from_body(body).bytes().await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"abc"));
    }
}
