use crate::content::Content;
use crate::error::HttpError;
use crate::media_type;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;

/// HTTP response returned by a [`Transport`](crate::Transport)
///
/// Provides a reqwest-like API for reading the content:
/// - `resp.bytes().await?` - Read raw bytes
/// - `resp.text().await?` - Read as UTF-8 text
/// - `resp.json::<T>().await?` - Parse as JSON
///
/// Unlike the typed `send` of [`ResponseBuilder`](crate::ResponseBuilder),
/// these helpers never consult the response media type.
#[derive(Debug)]
pub struct HttpResponse {
    inner: Response<Content>,
}

impl HttpResponse {
    /// Wrap a response produced by a transport.
    #[must_use]
    pub fn new(inner: Response<Content>) -> Self {
        Self { inner }
    }

    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Get the response headers for modification (e.g. from a response hook)
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Raw `Content-Type` header value, if present and valid UTF-8.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Media type declared by the response, without parameters.
    ///
    /// `application/json; charset=utf-8` yields `application/json`.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.content_type().and_then(media_type::essence)
    }

    /// Borrow the response content
    #[must_use]
    pub fn content(&self) -> &Content {
        self.inner.body()
    }

    /// Consume the wrapper and return the content
    #[must_use]
    pub fn into_content(self) -> Content {
        self.inner.into_body()
    }

    /// Consume the wrapper and return the inner response
    #[must_use]
    pub fn into_inner(self) -> Response<Content> {
        self.inner
    }

    /// Read response content as bytes
    ///
    /// # Errors
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        self.into_content().bytes().await
    }

    /// Read response content as text (UTF-8, lossy)
    ///
    /// # Errors
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    pub async fn text(self) -> Result<String, HttpError> {
        self.into_content().text().await
    }

    /// Parse response content as JSON
    ///
    /// # Errors
    /// Returns `HttpError::Transport` if reading a streaming body fails.
    /// Returns `HttpError::Json` if parsing fails.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl From<Response<Content>> for HttpResponse {
    fn from(inner: Response<Content>) -> Self {
        Self::new(inner)
    }
}
