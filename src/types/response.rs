//! Response records.
//!
//! Every field defaults when absent and unknown fields are ignored, so a
//! record always decodes from any JSON object. Platform errors arrive as a
//! non-zero `errcode`; check [`is_success`](GetTokenResponse::is_success).

use serde::Deserialize;

macro_rules! errcode_status {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                /// `true` when the platform reported `errcode == 0`.
                #[must_use]
                pub fn is_success(&self) -> bool {
                    self.errcode == 0
                }
            }
        )+
    };
}

/// Result of `jscode2session`.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JsCode2SessionResponse {
    pub openid: String,
    pub session_key: String,
    pub unionid: String,
    #[serde(alias = "errorcode")]
    pub errcode: i32,
    pub errmsg: String,
}

/// Result of the merchant `unifiedorder` call.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UnifiedOrderResponse {
    pub return_code: String,
    pub return_msg: String,
    pub device_info: String,
    pub appid: String,
    pub mch_id: String,
    pub nonce_str: String,
    pub sign: String,
    pub result_code: String,
    pub err_code: String,
    pub err_code_des: String,
    pub trade_type: String,
    pub prepay_id: String,
    pub code_url: String,
}

impl UnifiedOrderResponse {
    /// Both codes are `SUCCESS` and a prepay id was issued.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.return_code == SUCCESS && self.result_code == SUCCESS && !self.prepay_id.is_empty()
    }
}

const SUCCESS: &str = "SUCCESS";

/// Result of `cgi-bin/token`.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GetTokenResponse {
    pub access_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub errcode: i32,
    pub errmsg: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetUserStorageResponse {
    pub errcode: i32,
    pub errmsg: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MidasGetBalanceResponse {
    pub errcode: i32,
    pub errmsg: String,
    /// Total balance, including gifted currency.
    pub balance: i64,
    /// Gifted part of `balance`.
    pub gen_balance: i64,
    /// 1 when the user has never topped up.
    pub first_save: i32,
    pub save_amt: i64,
    pub save_sum: i64,
    pub cost_sum: i64,
    pub present_sum: i64,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MidasPayResponse {
    pub errcode: i32,
    pub errmsg: String,
    pub bill_no: String,
    pub balance: i64,
    pub used_gen_amt: i64,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MidasPresentResponse {
    pub errcode: i32,
    pub errmsg: String,
    pub bill_no: String,
    pub balance: i64,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MidasCancelPayResponse {
    pub errcode: i32,
    pub errmsg: String,
    pub bill_no: String,
}

errcode_status!(
    JsCode2SessionResponse,
    GetTokenResponse,
    SetUserStorageResponse,
    MidasGetBalanceResponse,
    MidasPayResponse,
    MidasPresentResponse,
    MidasCancelPayResponse,
);
