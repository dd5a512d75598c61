use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Client as ReqwestClient, Method};
use secrecy::ExposeSecret as _;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::endpoint::{Endpoint, Environment, Hosts};
use crate::error::Rejected;
use crate::sign::{self, NONCE_LEN, NonceSource};
use crate::types::request::KvList;
use crate::types::{
    GetTokenResponse, JsCode2SessionResponse, KvPair, MidasCancelPayResponse,
    MidasGetBalanceResponse, MidasPayResponse, MidasPresentResponse, PaymentRequest,
    SetUserStorageResponse, UnifiedOrderRequest, UnifiedOrderResponse,
};
use crate::{Result, Timestamp};

const SIGN_TYPE_MD5: &str = "MD5";
const SIG_METHOD_HMAC_SHA256: &str = "hmac_sha256";
const MIDAS_ZONE_ID: &str = "1";

/// Client for the mini-program and merchant APIs.
///
/// Cheap to clone; clones share the HTTP connection pool and nonce generator.
#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
    hosts: Hosts,
    nonce: NonceSource,
    client: ReqwestClient,
}

impl Client {
    /// Creates a client against the production hosts.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_client(config, ReqwestClient::new())
    }

    /// Creates a client against the production hosts with a custom HTTP client.
    pub fn with_client(config: Config, client: ReqwestClient) -> Result<Self> {
        Ok(Self::with_hosts(config, Hosts::production()?, client))
    }

    /// Creates a client against arbitrary hosts.
    #[must_use]
    pub fn with_hosts(config: Config, hosts: Hosts, client: ReqwestClient) -> Self {
        Self {
            config,
            hosts,
            nonce: NonceSource::default(),
            client,
        }
    }

    /// Replaces the order nonce generator.
    #[must_use]
    pub fn with_nonce_source(mut self, nonce: NonceSource) -> Self {
        self.nonce = nonce;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exchanges a login code for the user's openid and session key.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn login(&self, js_code: &str) -> Result<JsCode2SessionResponse> {
        let params = [
            ("appid", self.config.appid()),
            ("secret", self.config.secret().expose_secret()),
            ("js_code", js_code),
            ("grant_type", "authorization_code"),
        ];
        self.get(Endpoint::JsCode2Session, &params).await
    }

    /// Creates a payment order and returns the signed payload for the client-side payment call.
    ///
    /// Fails with [`Kind::Rejected`](crate::error::Kind::Rejected) unless the backend reports
    /// success on both codes and issues a prepay id.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip(self, order),
            fields(out_trade_no = %order.out_trade_no, total_fee = %order.total_fee)
        )
    )]
    pub async fn unified_order(&self, order: &UnifiedOrderRequest) -> Result<PaymentRequest> {
        let mch_key = self.config.mch_key().expose_secret();
        let nonce_str = self.nonce.generate(NONCE_LEN);

        let mut params: HashMap<&str, &str> = HashMap::from([
            ("appid", self.config.appid()),
            ("mch_id", self.config.mch_id()),
            ("nonce_str", nonce_str.as_str()),
            ("body", order.body.as_str()),
            ("out_trade_no", order.out_trade_no.as_str()),
            ("total_fee", order.total_fee.as_str()),
            ("spbill_create_ip", order.spbill_create_ip.as_str()),
            ("notify_url", self.config.notify_url()),
            ("trade_type", self.config.trade_type()),
            ("openid", order.openid.as_str()),
            ("sign_type", SIGN_TYPE_MD5),
        ]);
        let signature = sign::generic_sign(mch_key, &params);
        params.insert("sign", &signature);

        let response: UnifiedOrderResponse = self.get(Endpoint::UnifiedOrder, &params).await?;
        if !response.is_success() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                return_code = %response.return_code,
                result_code = %response.result_code,
                err_code = %response.err_code,
                "unified order rejected"
            );
            return Err(Rejected {
                return_code: response.return_code,
                return_msg: response.return_msg,
                result_code: response.result_code,
                err_code: response.err_code,
                err_code_des: response.err_code_des,
            }
            .into());
        }

        Ok(payment_request(
            self.config.appid(),
            mch_key,
            &response,
            Utc::now().timestamp(),
        ))
    }

    /// Fetches an application access token.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn get_token(&self) -> Result<GetTokenResponse> {
        let params = [
            ("appid", self.config.appid()),
            ("secret", self.config.secret().expose_secret()),
            ("grant_type", "client_credential"),
        ];
        self.get(Endpoint::Token, &params).await
    }

    /// Writes key-value pairs to the user's cloud storage.
    ///
    /// The body is signed with the user's session key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, access_token, session_key, kv_list))
    )]
    pub async fn set_user_storage(
        &self,
        openid: &str,
        access_token: &str,
        session_key: &str,
        kv_list: &[KvPair],
    ) -> Result<SetUserStorageResponse> {
        let body = serde_json::to_vec(&KvList { kv_list })?;
        let signature = sign::login_status_sign(session_key, &body)?;
        let params = [
            ("appid", self.config.appid()),
            ("openid", openid),
            ("access_token", access_token),
            ("signature", signature.as_str()),
            ("sig_method", SIG_METHOD_HMAC_SHA256),
        ];
        self.post(Endpoint::SetUserStorage, &params, body).await
    }

    /// Queries the user's virtual-currency balance.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, access_token))
    )]
    pub async fn midas_get_balance(
        &self,
        openid: &str,
        access_token: &str,
        pf: &str,
        env: Environment,
    ) -> Result<MidasGetBalanceResponse> {
        self.midas(
            Endpoint::MidasGetBalance,
            env,
            openid,
            access_token,
            pf,
            Map::new(),
        )
        .await
    }

    /// Deducts `amt` from the user's virtual-currency balance.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, access_token))
    )]
    pub async fn midas_pay(
        &self,
        openid: &str,
        access_token: &str,
        pf: &str,
        bill_no: &str,
        amt: i32,
        env: Environment,
    ) -> Result<MidasPayResponse> {
        let extra = object([("amt", json!(amt)), ("bill_no", json!(bill_no))]);
        self.midas(Endpoint::MidasPay, env, openid, access_token, pf, extra)
            .await
    }

    /// Gifts `present_counts` units of virtual currency to the user.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, access_token))
    )]
    pub async fn midas_present(
        &self,
        openid: &str,
        access_token: &str,
        pf: &str,
        bill_no: &str,
        present_counts: i32,
        env: Environment,
    ) -> Result<MidasPresentResponse> {
        let extra = object([
            ("bill_no", json!(bill_no)),
            ("present_counts", json!(present_counts)),
        ]);
        self.midas(Endpoint::MidasPresent, env, openid, access_token, pf, extra)
            .await
    }

    /// Reverses an earlier [`midas_pay`](Self::midas_pay) identified by `bill_no`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, access_token))
    )]
    pub async fn midas_cancel_pay(
        &self,
        openid: &str,
        access_token: &str,
        pf: &str,
        bill_no: &str,
        env: Environment,
    ) -> Result<MidasCancelPayResponse> {
        let extra = object([("bill_no", json!(bill_no))]);
        self.midas(Endpoint::MidasCancelPay, env, openid, access_token, pf, extra)
            .await
    }

    async fn midas<R: DeserializeOwned + Default>(
        &self,
        endpoint: Endpoint,
        env: Environment,
        openid: &str,
        access_token: &str,
        pf: &str,
        extra: Map<String, Value>,
    ) -> Result<R> {
        let (offer_id, secret) = self.config.midas()?;
        let url = self.hosts.url(endpoint, env)?;

        let mut payload = object([
            ("openid", json!(openid)),
            ("appid", json!(self.config.appid())),
            ("offer_id", json!(offer_id)),
            ("ts", json!(Utc::now().timestamp())),
            ("zone_id", json!(MIDAS_ZONE_ID)),
            ("pf", json!(pf)),
        ]);
        payload.extend(extra);
        sign::sign_midas_payload(secret.expose_secret(), url.path(), access_token, &mut payload)?;
        let body = serde_json::to_vec(&payload)?;

        crate::request(
            &self.client,
            Method::POST,
            url,
            &[("access_token", access_token)],
            Some(body),
            self.config.decode_policy(),
        )
        .await
    }

    async fn get<Q, R>(&self, endpoint: Endpoint, query: &Q) -> Result<R>
    where
        Q: serde::Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let url = self.hosts.url(endpoint, Environment::Production)?;
        crate::request(
            &self.client,
            Method::GET,
            url,
            query,
            None,
            self.config.decode_policy(),
        )
        .await
    }

    async fn post<Q, R>(&self, endpoint: Endpoint, query: &Q, body: Vec<u8>) -> Result<R>
    where
        Q: serde::Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let url = self.hosts.url(endpoint, Environment::Production)?;
        crate::request(
            &self.client,
            Method::POST,
            url,
            query,
            Some(body),
            self.config.decode_policy(),
        )
        .await
    }
}

/// Builds the signed client-side payment payload for an accepted order.
fn payment_request(
    appid: &str,
    mch_key: &str,
    response: &UnifiedOrderResponse,
    timestamp: Timestamp,
) -> PaymentRequest {
    let time_stamp = timestamp.to_string();
    let package = format!("prepay_id={}", response.prepay_id);
    let pay_sign = sign::generic_sign(
        mch_key,
        [
            ("appId", appid),
            ("timeStamp", time_stamp.as_str()),
            ("nonceStr", response.nonce_str.as_str()),
            ("package", package.as_str()),
            ("signType", SIGN_TYPE_MD5),
        ],
    );

    PaymentRequest {
        time_stamp,
        nonce_str: response.nonce_str.clone(),
        package,
        sign_type: SIGN_TYPE_MD5.to_owned(),
        pay_sign,
    }
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}
