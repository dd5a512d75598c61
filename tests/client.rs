#![allow(clippy::unwrap_used, reason = "Do not need additional syntax for setting up tests")]

use httpmock::prelude::*;
use reqwest::Client as ReqwestClient;
use serde_json::{Value, json};
use wxapp_sdk::error::{Decode, Rejected};
use wxapp_sdk::sign::{NONCE_LEN, NonceSource, generic_sign, midas_sign};
use wxapp_sdk::types::{KvPair, UnifiedOrderRequest};
use wxapp_sdk::{Client, Config, DecodePolicy, Environment, Hosts, Kind};

const NONCE_SEED: u64 = 2024;

fn config(decode_policy: DecodePolicy) -> Config {
    Config::builder()
        .appid("wx1")
        .secret("app-secret".to_owned())
        .mch_id("m1")
        .mch_key("pay-key".to_owned())
        .notify_url("https://example.com/notify")
        .midas_offer_id("o1")
        .midas_secret("midas-secret".to_owned())
        .decode_policy(decode_policy)
        .build()
}

fn client(server: &MockServer) -> Client {
    client_with(server, DecodePolicy::Strict)
}

fn client_with(server: &MockServer, decode_policy: DecodePolicy) -> Client {
    let hosts = Hosts::new(&server.base_url(), &server.base_url()).unwrap();
    Client::with_hosts(config(decode_policy), hosts, ReqwestClient::new())
        .with_nonce_source(NonceSource::from_seed(NONCE_SEED))
}

fn order() -> UnifiedOrderRequest {
    UnifiedOrderRequest::new("user-1", "T1", "coins", "100", "10.0.0.1")
}

mod session {
    use super::*;

    #[tokio::test]
    async fn login_exchanges_code() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/sns/jscode2session")
                    .query_param("appid", "wx1")
                    .query_param("secret", "app-secret")
                    .query_param("js_code", "code-1")
                    .query_param("grant_type", "authorization_code");
                then.status(200).json_body(json!({
                    "openid": "user-1",
                    "session_key": "sk",
                    "unionid": "union-1",
                }));
            })
            .await;

        let response = client(&server).login("code-1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.openid, "user-1", "openid");
        assert_eq!(response.session_key, "sk", "session key");
        assert!(response.is_success(), "no errcode");
    }

    #[tokio::test]
    async fn get_token_reads_body_of_error_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/cgi-bin/token")
                    .query_param("grant_type", "client_credential");
                then.status(500)
                    .json_body(json!({ "errcode": -1, "errmsg": "system error" }));
            })
            .await;

        let response = client(&server).get_token().await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.errcode, -1, "errcode");
        assert_eq!(response.errmsg, "system error", "errmsg");
        assert!(!response.is_success(), "failure");
    }

    #[tokio::test]
    async fn get_token_decodes_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cgi-bin/token");
                then.status(200)
                    .json_body(json!({ "access_token": "TOKEN", "expires_in": 7200 }));
            })
            .await;

        let response = client(&server).get_token().await.unwrap();

        assert_eq!(response.access_token, "TOKEN", "token");
        assert_eq!(response.expires_in, 7200, "expiry");
    }
}

mod order {
    use super::*;

    #[tokio::test]
    async fn success_yields_signed_payment_request() {
        let server = MockServer::start_async().await;

        let nonce = NonceSource::from_seed(NONCE_SEED).generate(NONCE_LEN);
        let expected_sign = generic_sign(
            "pay-key",
            [
                ("appid", "wx1"),
                ("mch_id", "m1"),
                ("nonce_str", nonce.as_str()),
                ("body", "coins"),
                ("out_trade_no", "T1"),
                ("total_fee", "100"),
                ("spbill_create_ip", "10.0.0.1"),
                ("notify_url", "https://example.com/notify"),
                ("trade_type", "JSAPI"),
                ("openid", "user-1"),
                ("sign_type", "MD5"),
            ],
        );

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/pay/unifiedorder")
                    .query_param("nonce_str", nonce.as_str())
                    .query_param("sign_type", "MD5")
                    .query_param("sign", expected_sign.as_str());
                then.status(200).json_body(json!({
                    "return_code": "SUCCESS",
                    "result_code": "SUCCESS",
                    "nonce_str": "SERVERNONCE",
                    "prepay_id": "abc123",
                }));
            })
            .await;

        let payment = client(&server).unified_order(&order()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(payment.package, "prepay_id=abc123", "package");
        assert_eq!(payment.nonce_str, "SERVERNONCE", "nonce");
        assert_eq!(payment.sign_type, "MD5", "sign type");
        let pay_sign = generic_sign(
            "pay-key",
            [
                ("appId", "wx1"),
                ("timeStamp", payment.time_stamp.as_str()),
                ("nonceStr", payment.nonce_str.as_str()),
                ("package", payment.package.as_str()),
                ("signType", payment.sign_type.as_str()),
            ],
        );
        assert_eq!(payment.pay_sign, pay_sign, "pay sign verifies");
    }

    #[tokio::test]
    async fn return_code_fail_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pay/unifiedorder");
                then.status(200).json_body(json!({
                    "return_code": "FAIL",
                    "return_msg": "invalid sign",
                }));
            })
            .await;

        let err = client(&server).unified_order(&order()).await.unwrap_err();

        assert_eq!(err.kind(), Kind::Rejected, "kind");
        let rejected = err.downcast_ref::<Rejected>().unwrap();
        assert_eq!(rejected.return_code, "FAIL", "return code");
        assert_eq!(rejected.return_msg, "invalid sign", "return msg");
    }

    #[tokio::test]
    async fn result_code_fail_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pay/unifiedorder");
                then.status(200).json_body(json!({
                    "return_code": "SUCCESS",
                    "result_code": "FAIL",
                    "err_code": "ORDERPAID",
                    "err_code_des": "order paid",
                }));
            })
            .await;

        let err = client(&server).unified_order(&order()).await.unwrap_err();

        let rejected = err.downcast_ref::<Rejected>().unwrap();
        assert_eq!(rejected.result_code, "FAIL", "result code");
        assert_eq!(rejected.err_code, "ORDERPAID", "err code");
    }

    #[tokio::test]
    async fn missing_prepay_id_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pay/unifiedorder");
                then.status(200)
                    .json_body(json!({ "return_code": "SUCCESS", "result_code": "SUCCESS" }));
            })
            .await;

        let err = client(&server).unified_order(&order()).await.unwrap_err();

        assert_eq!(err.kind(), Kind::Rejected, "kind");
    }

    #[tokio::test]
    async fn lenient_decode_of_garbage_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pay/unifiedorder");
                then.status(200).body("<xml><return_code>SUCCESS</return_code></xml>");
            })
            .await;

        let err = client_with(&server, DecodePolicy::Lenient)
            .unified_order(&order())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::Rejected, "zero-valued response fails the success check");
    }

    #[tokio::test]
    async fn strict_decode_of_garbage_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pay/unifiedorder");
                then.status(200).body("<xml><return_code>SUCCESS</return_code></xml>");
            })
            .await;

        let err = client(&server).unified_order(&order()).await.unwrap_err();

        assert_eq!(err.kind(), Kind::Decode, "kind");
        let decode = err.downcast_ref::<Decode>().unwrap();
        assert_eq!(decode.status_code.as_u16(), 200, "status");
        assert!(decode.body.starts_with("<xml>"), "{}", decode.body);
    }
}

mod storage {
    use super::*;

    #[tokio::test]
    async fn set_user_storage_signs_body_with_session_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/wxa/set_user_storage")
                    .query_param("appid", "wx1")
                    .query_param("openid", "user-1")
                    .query_param("access_token", "tok")
                    .query_param("sig_method", "hmac_sha256")
                    .query_param(
                        "signature",
                        "012d11e032dd342668f77d13c350fbf384ec472a79e490e5727fbdf20d173a99",
                    )
                    .header("content-type", "application/json")
                    .body(r#"{"kv_list":[{"key":"score","value":"42"}]}"#);
                then.status(200).json_body(json!({ "errcode": 0, "errmsg": "ok" }));
            })
            .await;

        let response = client(&server)
            .set_user_storage("user-1", "tok", "session-key", &[KvPair::new("score", "42")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success(), "errcode 0");
    }
}

mod midas {
    use super::*;

    /// Accepts a request whose `sig` and `mp_sig` were computed with the
    /// configured Midas secret over the path the request was sent to.
    fn signed_for_requested_path(req: &HttpMockRequest) -> bool {
        let Ok(Value::Object(mut sent)) = serde_json::from_slice::<Value>(req.body_ref()) else {
            return false;
        };
        let path = req.uri().path().to_owned();
        if !sent.get("ts").is_some_and(Value::is_i64) {
            return false;
        }

        let Some(Value::String(mp_sig)) = sent.remove("mp_sig") else {
            return false;
        };
        if midas_sign("midas-secret", &path, &sent).unwrap() != mp_sig {
            return false;
        }

        let Some(Value::String(sig)) = sent.remove("sig") else {
            return false;
        };
        sent.remove("access_token");
        midas_sign("midas-secret", &path, &sent).unwrap() == sig
    }

    #[tokio::test]
    async fn get_balance_posts_doubly_signed_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cgi-bin/midas/getbalance")
                    .query_param("access_token", "tok")
                    .header("content-type", "application/json")
                    .body_includes(r#""appid":"wx1""#)
                    .body_includes(r#""offer_id":"o1""#)
                    .body_includes(r#""zone_id":"1""#)
                    .body_includes(r#""access_token":"tok""#)
                    .body_includes(r#""sig":""#)
                    .body_includes(r#""mp_sig":""#)
                    .is_true(signed_for_requested_path);
                then.status(200).json_body(json!({
                    "errcode": 0,
                    "balance": 100,
                    "gen_balance": 10,
                    "first_save": 1,
                }));
            })
            .await;

        let response = client(&server)
            .midas_get_balance("user-1", "tok", "android", Environment::Production)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.balance, 100, "balance");
        assert_eq!(response.gen_balance, 10, "gifted balance");
        assert_eq!(response.first_save, 1, "first save");
    }

    #[tokio::test]
    async fn pay_uses_sandbox_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cgi-bin/midas/sandbox/pay")
                    .is_true(signed_for_requested_path)
                    .body_includes(r#""amt":10"#)
                    .body_includes(r#""bill_no":"B1""#);
                then.status(200).json_body(json!({
                    "errcode": 0,
                    "bill_no": "B1",
                    "balance": 90,
                    "used_gen_amt": 0,
                }));
            })
            .await;

        let response = client(&server)
            .midas_pay("user-1", "tok", "android", "B1", 10, Environment::Sandbox)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.bill_no, "B1", "bill");
        assert_eq!(response.balance, 90, "balance");
    }

    #[tokio::test]
    async fn present_sends_present_counts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cgi-bin/midas/present")
                    .is_true(signed_for_requested_path)
                    .body_includes(r#""present_counts":5"#);
                then.status(200)
                    .json_body(json!({ "errcode": 0, "bill_no": "B2", "balance": 105 }));
            })
            .await;

        let response = client(&server)
            .midas_present("user-1", "tok", "android", "B2", 5, Environment::Production)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.balance, 105, "balance");
    }

    #[tokio::test]
    async fn cancel_pay_targets_cancel_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cgi-bin/midas/sandbox/cancelpay")
                    .is_true(signed_for_requested_path)
                    .body_includes(r#""bill_no":"B1""#);
                then.status(200).json_body(json!({ "errcode": 0, "bill_no": "B1" }));
            })
            .await;

        let response = client(&server)
            .midas_cancel_pay("user-1", "tok", "android", "B1", Environment::Sandbox)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.bill_no, "B1", "bill");
    }

    #[tokio::test]
    async fn platform_error_is_returned_as_record() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/cgi-bin/midas/pay");
                then.status(200)
                    .json_body(json!({ "errcode": 90013, "errmsg": "balance not enough" }));
            })
            .await;

        let response = client(&server)
            .midas_pay("user-1", "tok", "android", "B1", 1_000, Environment::Production)
            .await
            .unwrap();

        assert_eq!(response.errcode, 90013, "errcode");
        assert!(!response.is_success(), "failure");
    }

    #[tokio::test]
    async fn missing_configuration_is_a_validation_error() {
        let config = Config::builder()
            .appid("wx1")
            .secret("app-secret".to_owned())
            .mch_id("m1")
            .notify_url("https://example.com/notify")
            .build();
        let hosts = Hosts::new("http://127.0.0.1:1", "http://127.0.0.1:1").unwrap();
        let client = Client::with_hosts(config, hosts, ReqwestClient::new());

        let err = client
            .midas_get_balance("user-1", "tok", "android", Environment::Production)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::Validation, "kind");
    }
}

mod transport {
    use super::*;

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        // Port 1 is reserved and nothing listens on it in test environments.
        let hosts = Hosts::new("http://127.0.0.1:1", "http://127.0.0.1:1").unwrap();
        let client = Client::with_hosts(config(DecodePolicy::Strict), hosts, ReqwestClient::new());

        let err = client.get_token().await.unwrap_err();

        assert_eq!(err.kind(), Kind::Transport, "kind");
    }

    #[tokio::test]
    async fn lenient_policy_returns_zero_value() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cgi-bin/token");
                then.status(502).body("bad gateway");
            })
            .await;

        let response = client_with(&server, DecodePolicy::Lenient)
            .get_token()
            .await
            .unwrap();

        assert_eq!(response.access_token, "", "zero value");
        assert_eq!(response.errcode, 0, "zero value");
    }
}
