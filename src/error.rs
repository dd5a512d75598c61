use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of an [`Error`].
///
/// Use [`Error::downcast_ref`] to get at the typed payload of a given kind.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Connection, TLS or body-read failure reported by the HTTP stack.
    Transport,
    /// The request could not be formed: unsupported method or malformed endpoint URL.
    Protocol,
    /// The remote side answered with a well-formed payload that reports a logical failure.
    Rejected,
    /// The response body was not the JSON shape the operation expects.
    Decode,
    /// Caller supplied configuration or input that cannot be used.
    Validation,
    /// Anything else.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Returns the typed source of this error if it is an `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Validation {
            reason: reason.into(),
        }
        .into()
    }

    pub(crate) fn unsupported_method(method: Method) -> Self {
        Protocol::UnsupportedMethod(method).into()
    }

    pub(crate) fn decode(
        status_code: StatusCode,
        path: Option<String>,
        body: &[u8],
        source: serde_json::Error,
    ) -> Self {
        Decode {
            status_code,
            path,
            body: excerpt(body),
            source,
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// A request that could not be built.
#[non_exhaustive]
#[derive(Debug)]
pub enum Protocol {
    UnsupportedMethod(Method),
    MalformedUrl(url::ParseError),
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::UnsupportedMethod(method) => write!(f, "unsupported method {method}"),
            Protocol::MalformedUrl(e) => write!(f, "malformed endpoint url: {e}"),
        }
    }
}

impl StdError for Protocol {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Protocol::UnsupportedMethod(_) => None,
            Protocol::MalformedUrl(e) => Some(e),
        }
    }
}

/// Business-outcome failure for an order the payment backend declined.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejected {
    pub return_code: String,
    pub return_msg: String,
    pub result_code: String,
    pub err_code: String,
    pub err_code_des: String,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unified order rejected: return_code={} result_code={}",
            self.return_code, self.result_code
        )?;
        if !self.return_msg.is_empty() {
            write!(f, " return_msg={}", self.return_msg)?;
        }
        if !self.err_code.is_empty() {
            write!(f, " err_code={} ({})", self.err_code, self.err_code_des)?;
        }
        Ok(())
    }
}

impl StdError for Rejected {}

/// Response body that could not be decoded into the expected record.
#[non_exhaustive]
#[derive(Debug)]
pub struct Decode {
    pub status_code: StatusCode,
    /// JSON path of the offending value, when known.
    pub path: Option<String>,
    /// Leading part of the raw body.
    pub body: String,
    pub source: serde_json::Error,
}

impl fmt::Display for Decode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode response (status {})", self.status_code)?;
        if let Some(path) = &self.path {
            write!(f, " at `{path}`")?;
        }
        write!(f, ": {}", self.source)
    }
}

impl StdError for Decode {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

const BODY_EXCERPT_CHARS: usize = 256;

fn excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .collect()
}

impl From<Protocol> for Error {
    fn from(err: Protocol) -> Self {
        Error::with_source(Kind::Protocol, err)
    }
}

impl From<Rejected> for Error {
    fn from(err: Rejected) -> Self {
        Error::with_source(Kind::Rejected, err)
    }
}

impl From<Decode> for Error {
    fn from(err: Decode) -> Self {
        Error::with_source(Kind::Decode, err)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Protocol::MalformedUrl(err).into()
    }
}

/// Request bodies are the only thing encoded through `?`; responses go through [`Error::decode`].
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(err: hmac::digest::InvalidLength) -> Self {
        Error::validation(format!("invalid HMAC key: {err}"))
    }
}
