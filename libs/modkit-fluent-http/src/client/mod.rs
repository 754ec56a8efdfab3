mod builder;

pub use builder::HyperTransportBuilder;

use crate::config::TransportSecurity;
use crate::content::{Content, ResponseBody, read_body_limited};
use crate::error::{HttpError, InvalidUriKind};
use crate::response::HttpResponse;
use crate::transport::{CompletionMode, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, Uri};
use http_body_util::Full;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;

pub type TransportService =
    BoxCloneSyncService<Request<Full<Bytes>>, Response<ResponseBody>, HttpError>;

/// [`Transport`] over a pooled hyper client with rustls.
///
/// `HyperTransport` is `Clone + Send + Sync`; clones share the connection
/// pool. Build one with [`HyperTransport::builder`] and start request chains
/// with [`TransportExt::build_request`](crate::TransportExt::build_request).
///
/// Every HTTP status is a successful exchange; only transport, TLS, timeout,
/// size and scheme failures are errors.
///
/// # Example
///
/// ```ignore
/// use modkit_fluent_http::{ConfigureRequest, HyperTransport, JsonDecoder, TransportExt};
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// let item: Option<Item> = transport
///     .build_request()
///     .with_method(http::Method::GET)
///     .with_target("https://api.example.com/items/1")
///     .with_auto_decoding(JsonDecoder::<Item>::new())
///     .send()
///     .await?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: TransportService,
    max_body_size: usize,
    transport_security: TransportSecurity,
}

impl HyperTransport {
    /// Transport with the default configuration.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        HyperTransportBuilder::new().build()
    }

    /// Builder for a configured transport
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Limit applied when content is buffered
    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Accepted URL schemes
    #[must_use]
    pub fn transport_security(&self) -> TransportSecurity {
        self.transport_security
    }

    fn check_scheme(&self, uri: &Uri) -> Result<(), HttpError> {
        match uri.scheme_str() {
            Some("https") => Ok(()),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(()),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: uri.to_string(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    async fn exchange(
        &self,
        request: Request<Bytes>,
        completion: CompletionMode,
    ) -> Result<HttpResponse, HttpError> {
        let response = self.service.clone().oneshot(request.map(Full::new)).await?;
        let (parts, body) = response.into_parts();

        let content = match completion {
            CompletionMode::BufferContent => {
                Content::from_bytes(read_body_limited(body, self.max_body_size).await?)
            }
            CompletionMode::HeadersOnly => Content::from_body(body),
        };
        Ok(HttpResponse::new(Response::from_parts(parts, content)))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn transmit(
        &self,
        request: Request<Bytes>,
        completion: CompletionMode,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.check_scheme(request.uri())?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(HttpError::Cancelled),
            result = self.exchange(request, completion) => result,
        }
    }
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport")
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}
