use serde::{Deserialize, Serialize};

/// Input values for a single payment order.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnifiedOrderRequest {
    /// Paying user.
    pub openid: String,
    /// Merchant-side order reference.
    pub out_trade_no: String,
    /// Order description shown to the user.
    pub body: String,
    /// Amount in minor currency units, decimal encoded.
    pub total_fee: String,
    /// Client IP the order originates from.
    pub spbill_create_ip: String,
}

impl UnifiedOrderRequest {
    #[must_use]
    pub fn new(
        openid: &str,
        out_trade_no: &str,
        body: &str,
        total_fee: &str,
        spbill_create_ip: &str,
    ) -> Self {
        Self {
            openid: openid.to_owned(),
            out_trade_no: out_trade_no.to_owned(),
            body: body.to_owned(),
            total_fee: total_fee.to_owned(),
            spbill_create_ip: spbill_create_ip.to_owned(),
        }
    }
}

/// One entry written by `set_user_storage`.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: String,
}

impl KvPair {
    #[must_use]
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct KvList<'a> {
    pub kv_list: &'a [KvPair],
}

/// Signed payload handed to the client-side payment call.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
}
