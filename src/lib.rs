//! Server-side client for the WeChat Mini Program platform APIs.
//!
//! Covers session exchange, access tokens, user key-value storage, merchant
//! payment orders and the Midas virtual-currency API. Each [`Client`] method
//! issues exactly one HTTP request; there is no retry, caching or session
//! state beyond the immutable [`Config`].
//!
//! Signing lives in [`sign`] and can be used on its own, e.g. to verify a
//! payment notification.
//!
//! # Features
//!
//! - `tracing`: request/response spans and events through [`tracing`](https://docs.rs/tracing),
//!   including JSON paths for decode failures and a list of ignored response fields.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
mod serde_helpers;
pub mod sign;
pub mod types;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

pub use client::Client;
pub use config::{Config, DecodePolicy};
pub use endpoint::{Endpoint, Environment, Hosts};
pub use error::{Error, Kind};

pub type Result<T> = std::result::Result<T, Error>;

/// Unix time in seconds.
pub type Timestamp = i64;

/// Query parameters never written to logs verbatim.
#[cfg(feature = "tracing")]
const REDACTED_PARAMS: [&str; 3] = ["secret", "access_token", "js_code"];

/// Sends one request and decodes the body, whatever the status code.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, method, url, query, body),
        fields(method = %method, path = url.path(), status_code = tracing::field::Empty)
    )
)]
pub(crate) async fn request<Q, Response>(
    client: &ReqwestClient,
    method: Method,
    url: Url,
    query: &Q,
    body: Option<Vec<u8>>,
    policy: DecodePolicy,
) -> Result<Response>
where
    Q: Serialize + ?Sized,
    Response: DeserializeOwned + Default,
{
    let mut builder = match method {
        Method::GET => client.get(url),
        Method::POST => client.post(url),
        other => return Err(Error::unsupported_method(other)),
    };
    if let Some(body) = body {
        builder = builder.header(CONTENT_TYPE, "application/json").body(body);
    }
    let request = builder.query(query).build()?;

    #[cfg(feature = "tracing")]
    tracing::debug!(url = %redacted(request.url()), "sending request");

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    let bytes = response.bytes().await?;

    #[cfg(feature = "tracing")]
    tracing::trace!(body = %String::from_utf8_lossy(&bytes), "received response");

    serde_helpers::decode(status_code, &bytes, policy)
}

#[cfg(feature = "tracing")]
fn redacted(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if REDACTED_PARAMS.contains(&k.as_ref()) {
                "***".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
