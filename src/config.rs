use bon::Builder;
use secrecy::{ExposeSecret as _, SecretString};

use crate::Result;
use crate::error::Error;

/// Trade type used when none is configured.
pub const DEFAULT_TRADE_TYPE: &str = "JSAPI";

/// What to do with a response body that does not decode into the expected record.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Return a [`Kind::Decode`](crate::error::Kind::Decode) error.
    #[default]
    Strict,
    /// Return the zero-valued record, as older clients of this API did.
    Lenient,
}

/// Application credentials and merchant settings.
///
/// Built once by the embedding application and never mutated afterwards.
///
/// ```
/// use wxapp_sdk::Config;
///
/// let config = Config::builder()
///     .appid("wx0123456789")
///     .secret("app-secret".to_owned())
///     .mch_id("1230000109")
///     .notify_url("https://example.com/pay/notify")
///     .build();
/// assert_eq!(config.trade_type(), "JSAPI");
/// ```
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct Config {
    appid: String,
    /// App secret, used for session exchange and access tokens.
    #[builder(into)]
    secret: SecretString,
    mch_id: String,
    /// Merchant API key for payment signing. Falls back to `secret`.
    #[builder(into)]
    mch_key: Option<SecretString>,
    notify_url: String,
    #[builder(default = DEFAULT_TRADE_TYPE.to_owned())]
    trade_type: String,
    /// Virtual-currency offer id.
    midas_offer_id: Option<String>,
    /// Virtual-currency app key.
    #[builder(into)]
    midas_secret: Option<SecretString>,
    #[builder(default)]
    decode_policy: DecodePolicy,
}

impl Config {
    #[must_use]
    pub fn appid(&self) -> &str {
        &self.appid
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn mch_id(&self) -> &str {
        &self.mch_id
    }

    /// Key used for [`generic_sign`](crate::sign::generic_sign).
    #[must_use]
    pub fn mch_key(&self) -> &SecretString {
        self.mch_key.as_ref().unwrap_or(&self.secret)
    }

    #[must_use]
    pub fn notify_url(&self) -> &str {
        &self.notify_url
    }

    #[must_use]
    pub fn trade_type(&self) -> &str {
        &self.trade_type
    }

    #[must_use]
    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode_policy
    }

    /// Offer id and app key for virtual-currency calls.
    pub fn midas(&self) -> Result<(&str, &SecretString)> {
        match (&self.midas_offer_id, &self.midas_secret) {
            (Some(offer_id), Some(secret))
                if !offer_id.is_empty() && !secret.expose_secret().is_empty() =>
            {
                Ok((offer_id.as_str(), secret))
            }
            _ => Err(Error::validation(
                "virtual-currency calls require midas_offer_id and midas_secret",
            )),
        }
    }
}
