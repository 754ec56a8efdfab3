use crate::codec::EncodedContent;
use crate::error::HttpError;
use crate::response::HttpResponse;
use crate::transport::{CompletionMode, Transport};
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, Request, Uri};
use std::fmt;
use std::sync::Arc;

/// Callback run on the outgoing request right before it is transmitted.
pub type RequestHook =
    Box<dyn for<'a> Fn(&'a mut Request<Bytes>) -> BoxFuture<'a, Result<(), HttpError>> + Send + Sync>;

/// Callback run on the response right after it was received.
pub type ResponseHook =
    Box<dyn for<'a> Fn(&'a mut HttpResponse) -> BoxFuture<'a, Result<(), HttpError>> + Send + Sync>;

/// Typed body and encoder, erased; invoked once at send time.
pub type PendingBody = Box<dyn FnOnce() -> Result<EncodedContent, HttpError> + Send>;

/// Request state shared by every builder shape of one chain.
///
/// Builders own their descriptor by value and hand it to the next shape
/// when they transition, so a descriptor always belongs to exactly one
/// builder. Configuration never fails eagerly: the first invalid input is
/// kept as a deferred error and returned by `send`.
pub struct RequestDescriptor {
    transport: Arc<dyn Transport>,
    method: Option<Method>,
    target: Option<Uri>,
    headers: HeaderMap,
    accept: Vec<String>,
    completion: CompletionMode,
    request_hook: Option<RequestHook>,
    response_hook: Option<ResponseHook>,
    body: Option<PendingBody>,
    error: Option<HttpError>,
}

impl RequestDescriptor {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            method: None,
            target: None,
            headers: HeaderMap::new(),
            accept: Vec::new(),
            completion: CompletionMode::default(),
            request_hook: None,
            response_hook: None,
            body: None,
            error: None,
        }
    }

    /// Configured HTTP method.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Configured target URI.
    #[must_use]
    pub fn target(&self) -> Option<&Uri> {
        self.target.as_ref()
    }

    /// Headers included so far, without `Accept` and `Content-Type` defaults.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Media types registered for decoding, in registration order, without duplicates.
    #[must_use]
    pub fn accepted_media_types(&self) -> &[String] {
        &self.accept
    }

    #[must_use]
    pub fn completion_mode(&self) -> CompletionMode {
        self.completion
    }

    /// Whether a body will be encoded and attached at send time.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Whether a configuration call recorded an error that `send` will return.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn set_method(&mut self, method: Method) {
        self.method = Some(method);
    }

    pub(crate) fn set_target(&mut self, target: Uri) {
        self.target = Some(target);
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn set_completion_mode(&mut self, completion: CompletionMode) {
        self.completion = completion;
    }

    pub(crate) fn set_request_hook(&mut self, hook: RequestHook) {
        self.request_hook = Some(hook);
    }

    pub(crate) fn set_response_hook(&mut self, hook: ResponseHook) {
        self.response_hook = Some(hook);
    }

    pub(crate) fn set_body(&mut self, body: PendingBody) {
        self.body = Some(body);
    }

    /// Append `media_type` to the accept list unless it is already there.
    pub(crate) fn accept_media_type(&mut self, media_type: &str) {
        if !self.accept.iter().any(|accepted| accepted == media_type) {
            self.accept.push(media_type.to_owned());
        }
    }

    /// Keep `error` for `send`; only the first recorded error is kept.
    pub(crate) fn record_error(&mut self, error: HttpError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn into_parts(self) -> DescriptorParts {
        DescriptorParts {
            transport: self.transport,
            method: self.method,
            target: self.target,
            headers: self.headers,
            accept: self.accept,
            completion: self.completion,
            request_hook: self.request_hook,
            response_hook: self.response_hook,
            body: self.body,
            error: self.error,
        }
    }
}

/// Owned descriptor fields, destructured by the send pipeline.
pub struct DescriptorParts {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) method: Option<Method>,
    pub(crate) target: Option<Uri>,
    pub(crate) headers: HeaderMap,
    pub(crate) accept: Vec<String>,
    pub(crate) completion: CompletionMode,
    pub(crate) request_hook: Option<RequestHook>,
    pub(crate) response_hook: Option<ResponseHook>,
    pub(crate) body: Option<PendingBody>,
    pub(crate) error: Option<HttpError>,
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("target", &self.target)
            .field("headers", &self.headers)
            .field("accept", &self.accept)
            .field("completion", &self.completion)
            .field("request_hook", &self.request_hook.is_some())
            .field("response_hook", &self.response_hook.is_some())
            .field("body", &self.body.is_some())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::content::Content;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Unused;

    #[async_trait]
    impl Transport for Unused {
        async fn transmit(
            &self,
            _request: Request<Bytes>,
            _completion: CompletionMode,
            _cancel: CancellationToken,
        ) -> Result<HttpResponse, HttpError> {
            Ok(HttpResponse::new(http::Response::new(Content::empty())))
        }
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new(Arc::new(Unused))
    }

    #[test]
    fn test_accept_list_is_distinct_and_ordered() {
        let mut d = descriptor();
        d.accept_media_type("application/json");
        d.accept_media_type("application/xml");
        d.accept_media_type("application/json");

        assert_eq!(d.accepted_media_types(), ["application/json", "application/xml"]);
    }

    #[test]
    fn test_first_error_wins() {
        let mut d = descriptor();
        d.record_error(HttpError::Cancelled);
        d.record_error(HttpError::Timeout(std::time::Duration::from_secs(1)));

        assert!(d.has_error());
        assert!(matches!(d.into_parts().error, Some(HttpError::Cancelled)));
    }

    #[test]
    fn test_defaults() {
        let d = descriptor();
        assert!(d.method().is_none());
        assert!(d.target().is_none());
        assert!(d.headers().is_empty());
        assert_eq!(d.completion_mode(), CompletionMode::BufferContent);
        assert!(!d.has_body());
        assert!(!d.has_error());
    }
}
