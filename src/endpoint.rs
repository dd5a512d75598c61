use url::Url;

use crate::Result;

/// Host serving the mini-program APIs.
pub const API_HOST: &str = "https://api.weixin.qq.com";
/// Host serving the merchant payment APIs.
pub const MCH_HOST: &str = "https://api.mch.weixin.qq.com";

/// Virtual-currency settlement environment.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

/// Remote operations and their fixed paths.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    JsCode2Session,
    UnifiedOrder,
    Token,
    SetUserStorage,
    MidasGetBalance,
    MidasPay,
    MidasPresent,
    MidasCancelPay,
}

impl Endpoint {
    /// Request path. Only virtual-currency endpoints have a sandbox variant.
    #[must_use]
    pub const fn path(self, env: Environment) -> &'static str {
        let sandbox = matches!(env, Environment::Sandbox);
        match self {
            Endpoint::JsCode2Session => "/sns/jscode2session",
            Endpoint::UnifiedOrder => "/pay/unifiedorder",
            Endpoint::Token => "/cgi-bin/token",
            Endpoint::SetUserStorage => "/wxa/set_user_storage",
            Endpoint::MidasGetBalance if sandbox => "/cgi-bin/midas/sandbox/getbalance",
            Endpoint::MidasGetBalance => "/cgi-bin/midas/getbalance",
            Endpoint::MidasPay if sandbox => "/cgi-bin/midas/sandbox/pay",
            Endpoint::MidasPay => "/cgi-bin/midas/pay",
            Endpoint::MidasPresent if sandbox => "/cgi-bin/midas/sandbox/present",
            Endpoint::MidasPresent => "/cgi-bin/midas/present",
            Endpoint::MidasCancelPay if sandbox => "/cgi-bin/midas/sandbox/cancelpay",
            Endpoint::MidasCancelPay => "/cgi-bin/midas/cancelpay",
        }
    }

    const fn is_merchant(self) -> bool {
        matches!(self, Endpoint::UnifiedOrder)
    }
}

/// Base URLs the endpoints are resolved against.
///
/// Production hosts are fixed; overriding them is meant for pointing a
/// client at a mock server.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hosts {
    pub api: Url,
    pub mch: Url,
}

impl Hosts {
    pub fn new(api: &str, mch: &str) -> Result<Self> {
        Ok(Self {
            api: Url::parse(api)?,
            mch: Url::parse(mch)?,
        })
    }

    pub fn production() -> Result<Self> {
        Self::new(API_HOST, MCH_HOST)
    }

    /// Full URL of `endpoint` in `env`.
    pub fn url(&self, endpoint: Endpoint, env: Environment) -> Result<Url> {
        let host = if endpoint.is_merchant() {
            &self.mch
        } else {
            &self.api
        };
        Ok(host.join(endpoint.path(env))?)
    }
}
