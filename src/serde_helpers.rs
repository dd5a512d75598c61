use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::config::DecodePolicy;
use crate::error::Error;

type Decoded<T> = std::result::Result<T, (Option<String>, serde_json::Error)>;

/// Decodes a response body according to `policy`.
pub(crate) fn decode<T: DeserializeOwned + Default>(
    status_code: StatusCode,
    body: &[u8],
    policy: DecodePolicy,
) -> Result<T> {
    match from_slice::<T>(body) {
        Ok(value) => Ok(value),
        Err((path, source)) => match policy {
            DecodePolicy::Strict => Err(Error::decode(status_code, path, body, source)),
            DecodePolicy::Lenient => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    status = %status_code,
                    path = path.as_deref().unwrap_or_default(),
                    error = %source,
                    "discarding undecodable response body"
                );
                Ok(T::default())
            }
        },
    }
}

#[cfg(feature = "tracing")]
fn from_slice<T: DeserializeOwned>(body: &[u8]) -> Decoded<T> {
    let mut ignored = Vec::new();
    let mut json = serde_json::Deserializer::from_slice(body);
    let tracked = serde_ignored::Deserializer::new(&mut json, |path| {
        ignored.push(path.to_string());
    });
    let value: T = serde_path_to_error::deserialize(tracked)
        .map_err(|e| (Some(e.path().to_string()), e.into_inner()))?;
    json.end().map_err(|e| (None, e))?;

    if !ignored.is_empty() {
        tracing::trace!(fields = ?ignored, "ignored unknown response fields");
    }
    Ok(value)
}

#[cfg(not(feature = "tracing"))]
fn from_slice<T: DeserializeOwned>(body: &[u8]) -> Decoded<T> {
    serde_json::from_slice(body).map_err(|e| (None, e))
}
