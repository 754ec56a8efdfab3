#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Fluent HTTP request building for `ModKit`
//!
//! This crate provides a chainable request builder on top of a pluggable
//! [`Transport`]:
//! - Method, target, headers, completion mode and hooks configured fluently
//! - Typed request bodies encoded once, at send time (JSON by default)
//! - Response decoding selected by the response media type, with the
//!   registered media types advertised in `Accept`
//! - Discriminated decoding into a primary or alternate type
//!   (e.g. an entity or an error document)
//! - Cooperative cancellation via [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - A ready-made [`HyperTransport`] (rustls, pooling, timeouts, transparent
//!   decompression)
//!
//! Configuration mistakes never panic: they are recorded and returned by `send`.
//!
//! # Example
//!
//! ```ignore
//! use modkit_fluent_http::{ConfigureRequest, HyperTransport, JsonDecoder, TransportExt, XmlDecoder};
//!
//! let transport = HyperTransport::new()?;
//!
//! let outcome = transport
//!     .build_request()
//!     .with_method(http::Method::GET)
//!     .with_target("https://api.example.com/orders/7")
//!     .with_auto_decoding(JsonDecoder::<Order>::new())
//!     .or_to::<Problem>()
//!     .using_decoder(XmlDecoder::<Problem>::new())
//!     .send()
//!     .await?;
//!
//! match outcome {
//!     Some(Discriminated::Primary(order)) => println!("{order:?}"),
//!     Some(Discriminated::Alternate(problem)) => eprintln!("{problem:?}"),
//!     None => {}
//! }
//! ```

mod builder;
mod client;
mod codec;
mod config;
mod content;
mod descriptor;
mod error;
mod layers;
pub mod media_type;
mod negotiation;
mod pipeline;
mod registry;
mod response;
mod transport;

pub use builder::{
    ConfigureRequest, ContentBuilder, Discriminated, DiscriminatedResponseBuilder, RequestBuilder,
    ResponseBuilder,
};
pub use client::{HyperTransport, HyperTransportBuilder};
pub use codec::{
    Decoder, EncodedContent, Encoder, JsonDecoder, JsonEncoder, TextDecoder, TextEncoder,
    XmlDecoder, XmlEncoder,
};
pub use config::{DEFAULT_USER_AGENT, TransportConfig, TransportSecurity};
pub use content::{Content, ResponseBody};
pub use descriptor::{RequestDescriptor, RequestHook, ResponseHook};
pub use error::{BoxError, DecoderLookup, HttpError, InvalidUriKind, MissingField};
pub use layers::{UserAgentLayer, UserAgentService};
pub use response::HttpResponse;
pub use transport::{CompletionMode, Transport, TransportExt};
