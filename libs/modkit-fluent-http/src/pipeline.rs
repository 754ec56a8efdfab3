use crate::descriptor::{DescriptorParts, RequestDescriptor};
use crate::error::{HttpError, MissingField};
use crate::response::HttpResponse;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Result of a completed send: the response plus the accept list the
/// request declared, which decode resolution falls back on.
pub struct Dispatched {
    pub(crate) response: HttpResponse,
    pub(crate) accept: Vec<String>,
}

fn ensure_live(cancel: &CancellationToken) -> Result<(), HttpError> {
    if cancel.is_cancelled() {
        return Err(HttpError::Cancelled);
    }
    Ok(())
}

/// Run the send pipeline once.
///
/// Order: deferred error, method, target, body attach, request hook,
/// transmission, response hook. The token is checked before body attach,
/// before the request hook and before transmission.
pub async fn dispatch(
    descriptor: RequestDescriptor,
    cancel: CancellationToken,
) -> Result<Dispatched, HttpError> {
    let DescriptorParts {
        transport,
        method,
        target,
        headers,
        accept,
        completion,
        request_hook,
        response_hook,
        body,
        error,
    } = descriptor.into_parts();

    if let Some(e) = error {
        return Err(e);
    }
    let method = method.ok_or(HttpError::InvalidBuilderState(MissingField::Method))?;
    let target = target.ok_or(HttpError::InvalidBuilderState(MissingField::Target))?;

    ensure_live(&cancel)?;
    let (content_type, payload) = match body {
        Some(encode) => {
            let (content_type, bytes) = encode()?.into_parts();
            (Some(content_type), bytes)
        }
        None => (None, Bytes::new()),
    };

    let mut request = Request::builder().method(method).uri(target).body(payload)?;
    *request.headers_mut() = headers;

    if let Some(content_type) = content_type
        && !request.headers().contains_key(CONTENT_TYPE)
    {
        request.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    if !accept.is_empty() {
        let value = HeaderValue::from_str(&accept.join(", "))?;
        request.headers_mut().append(ACCEPT, value);
    }

    ensure_live(&cancel)?;
    if let Some(hook) = &request_hook {
        trace!(uri = %request.uri(), "running request hook");
        hook(&mut request).await?;
    }

    ensure_live(&cancel)?;
    debug!(
        method = %request.method(),
        uri = %request.uri(),
        completion = ?completion,
        body_len = request.body().len(),
        "dispatching request"
    );
    let mut response = transport.transmit(request, completion, cancel).await?;
    debug!(status = %response.status(), "response received");

    if let Some(hook) = &response_hook {
        trace!(status = %response.status(), "running response hook");
        hook(&mut response).await?;
    }

    Ok(Dispatched { response, accept })
}
