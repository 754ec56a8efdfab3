#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end request chains against in-process stub transports.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Request, Response};
use modkit_fluent_http::{
    CompletionMode, ConfigureRequest, Content, DecoderLookup, Discriminated, HttpError,
    HttpResponse, JsonDecoder, MissingField, Transport, TransportExt, XmlDecoder,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Answers every request with a fixed content type and body, keeping a copy
/// of what was sent.
#[derive(Clone)]
struct Canned {
    content_type: &'static str,
    body: &'static str,
    sent: Arc<Mutex<Vec<Request<Bytes>>>>,
}

impl Canned {
    fn new(content_type: &'static str, body: &'static str) -> Self {
        Self {
            content_type,
            body,
            sent: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_request(&self) -> Request<Bytes> {
        let sent = self.sent.lock().unwrap();
        let last = sent.last().expect("no request was sent");
        let mut copy = Request::builder()
            .method(last.method())
            .uri(last.uri())
            .body(last.body().clone())
            .unwrap();
        copy.headers_mut().clone_from(last.headers());
        copy
    }
}

#[async_trait]
impl Transport for Canned {
    async fn transmit(
        &self,
        request: Request<Bytes>,
        _completion: CompletionMode,
        _cancel: CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.sent.lock().unwrap().push(request);
        let response = Response::builder()
            .status(200)
            .header(CONTENT_TYPE, self.content_type)
            .body(Content::from_bytes(self.body))
            .unwrap();
        Ok(HttpResponse::new(response))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewItem {
    title: String,
    user_id: u32,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Created {
    id: u32,
    user_id: u32,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename = "problem")]
struct Problem {
    code: u32,
    detail: String,
}

fn new_item() -> NewItem {
    NewItem {
        title: "Test".to_owned(),
        user_id: 69,
    }
}

#[tokio::test]
async fn post_json_round_trip() {
    let transport = Canned::new("application/json", r#"{"id":1,"userId":69}"#);

    let created = transport
        .build_request()
        .with_method(Method::POST)
        .with_target("http://example.test/items")
        .with_body(new_item())
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap();

    assert_eq!(created, Some(Created { id: 1, user_id: 69 }));

    let sent = transport.last_request();
    assert_eq!(sent.method(), Method::POST);
    assert_eq!(sent.uri(), "http://example.test/items");
    assert_eq!(sent.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(sent.headers()[ACCEPT], "application/json");
    let body: serde_json::Value = serde_json::from_slice(sent.body()).unwrap();
    assert_eq!(body, serde_json::json!({"title": "Test", "userId": 69}));
}

#[tokio::test]
async fn unregistered_media_type_is_reported() {
    let transport = Canned::new("text/xml", "<created><id>1</id></created>");

    let err = transport
        .build_request()
        .with_method(Method::POST)
        .with_target("http://example.test/items")
        .with_body(new_item())
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap_err();

    match &err {
        HttpError::NoDecoder {
            media_type, lookup, ..
        } => {
            assert_eq!(media_type, "text/xml");
            assert_eq!(*lookup, DecoderLookup::Primary);
        }
        other => panic!("expected NoDecoder, got {other:?}"),
    }
    assert!(err.to_string().contains("text/xml"));
    assert_eq!(err.response().unwrap().content_type(), Some("text/xml"));
}

#[tokio::test]
async fn discriminated_alternate_skips_primary_decoder() {
    let transport = Canned::new(
        "application/xml; charset=utf-8",
        "<problem><code>404</code><detail>no such item</detail></problem>",
    );
    let json_calls = Arc::new(AtomicUsize::new(0));
    let counter = json_calls.clone();

    let outcome = transport
        .build_request()
        .with_method(Method::GET)
        .with_target("http://example.test/items/9")
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .with_decoder_fn("application/json", move |_content, _cancel| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .or_to::<Problem>()
        .using_decoder(XmlDecoder::<Problem>::new())
        .send()
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Some(Discriminated::Alternate(Problem {
            code: 404,
            detail: "no such item".to_owned(),
        }))
    );
    assert_eq!(json_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        transport.last_request().headers()[ACCEPT],
        "application/json, application/xml"
    );
}

#[tokio::test]
async fn discriminated_miss_names_media_type() {
    let transport = Canned::new("text/html", "<html></html>");

    let err = transport
        .build_request()
        .with_method(Method::GET)
        .with_target("http://example.test/items/9")
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .or_to::<Problem>()
        .using_decoder(XmlDecoder::<Problem>::new())
        .send()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HttpError::NoDecoder {
            ref media_type,
            lookup: DecoderLookup::Discriminated,
            ..
        } if media_type == "text/html"
    ));
}

#[tokio::test]
async fn missing_method_or_target_never_reaches_transport() {
    let transport = Canned::new("application/json", "{}");

    let no_method = transport
        .build_request()
        .with_target("http://example.test/items")
        .with_body(new_item())
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap_err();
    assert!(matches!(
        no_method,
        HttpError::InvalidBuilderState(MissingField::Method)
    ));

    let no_target = transport
        .build_request()
        .with_method(Method::GET)
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .or_to::<Problem>()
        .send()
        .await
        .unwrap_err();
    assert!(matches!(
        no_target,
        HttpError::InvalidBuilderState(MissingField::Target)
    ));
    assert_eq!(
        no_target.to_string(),
        "The builder method with_target must be called."
    );

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn last_registration_for_media_type_wins() {
    let transport = Canned::new("application/json", r#"{"id":1,"userId":69}"#);
    let replaced_calls = Arc::new(AtomicUsize::new(0));
    let counter = replaced_calls.clone();

    let created = transport
        .build_request()
        .with_method(Method::GET)
        .with_target("http://example.test/items/1")
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .with_decoder_fn("application/json", move |_content, _cancel| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Some(Created { id: 0, user_id: 0 })) }
        })
        .with_decoder(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap();

    assert_eq!(created, Some(Created { id: 1, user_id: 69 }));
    assert_eq!(replaced_calls.load(Ordering::SeqCst), 0);
    assert_eq!(transport.last_request().headers()[ACCEPT], "application/json");
}

#[tokio::test]
async fn headers_accumulate_while_method_and_target_overwrite() {
    let transport = Canned::new("application/json", "null");

    let created = transport
        .build_request()
        .with_method(Method::GET)
        .with_target("http://first.test/")
        .include_header("x-trace", "a")
        .with_method(Method::DELETE)
        .with_target("http://example.test/items/1")
        .include_header("x-trace", "b")
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap();
    assert_eq!(created, None);

    let sent = transport.last_request();
    assert_eq!(sent.method(), Method::DELETE);
    assert_eq!(sent.uri(), "http://example.test/items/1");
    let traces: Vec<_> = sent.headers().get_all("x-trace").iter().collect();
    assert_eq!(traces, ["a", "b"]);
}

#[tokio::test]
async fn hooks_run_around_transmission() {
    let transport = Canned::new("application/json", r#"{"id":3,"userId":7}"#);

    let created = transport
        .build_request()
        .with_method(Method::GET)
        .with_target("http://example.test/items/3")
        .with_request_hook(|request| {
            Box::pin(async move {
                assert_eq!(request.headers()[ACCEPT], "application/json");
                request
                    .headers_mut()
                    .insert("x-signed", http::HeaderValue::from_static("1"));
                Ok(())
            })
        })
        .with_response_hook(|response| {
            Box::pin(async move {
                assert_eq!(response.status(), http::StatusCode::OK);
                Ok(())
            })
        })
        .with_auto_decoding(JsonDecoder::<Created>::new())
        .send()
        .await
        .unwrap();

    assert_eq!(created, Some(Created { id: 3, user_id: 7 }));
    assert_eq!(transport.last_request().headers()["x-signed"], "1");
}
