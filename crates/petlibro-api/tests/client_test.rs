#![allow(clippy::unwrap_used)]
// Integration tests for `PetLibroClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::task::JoinSet;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petlibro_api::{Error, PetLibroClient, Region, hash_password};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PetLibroClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = PetLibroClient::with_client(
        reqwest::Client::new(),
        base_url,
        Region::Us,
        "Europe/Paris",
    );
    (server, client)
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": null, "data": data }))
}

fn code(code: i64, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "msg": msg, "data": null }))
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": token })))
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_sends_digest_and_fixed_headers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .and(header("source", "ANDROID"))
        .and(header("language", "EN"))
        .and(header("timezone", "Europe/Paris"))
        .and(header("version", "1.3.45"))
        .and(body_partial_json(json!({
            "appId": 1,
            "country": "US",
            "email": "owner@example.com",
            "password": hash_password("hunter2"),
        })))
        .respond_with(ok(json!({ "token": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .login("owner@example.com", &secret("hunter2"))
        .await
        .unwrap();

    assert!(client.is_authenticated());
    assert_eq!(client.token().unwrap().expose_secret(), "tok-1");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(code(1102, "account or password error"))
        .mount(&server)
        .await;

    let result = client.login("owner@example.com", &secret("wrong")).await;

    assert!(
        matches!(result, Err(Error::InvalidCredentials)),
        "expected InvalidCredentials, got: {result:?}"
    );
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_without_token_fails() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "memberId": 42 })))
        .mount(&server)
        .await;

    let result = client.login("owner@example.com", &secret("pw")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_logout_clears_token() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/member/auth/logout"))
        .and(header("token", "tok-1"))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    client.logout().await.unwrap();

    assert!(!client.is_authenticated());
    let result = client.list_devices().await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_token() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .and(header("token", "tok-1"))
        .and(body_partial_json(json!({})))
        .respond_with(ok(json!([
            {
                "deviceSn": "ABC123",
                "productName": "Granary Smart Feeder",
                "productIdentifier": "PLAF108",
                "name": "Kitchen feeder",
                "mac": "aa:bb:cc:dd:ee:ff"
            },
            {
                "deviceSn": "XYZ789",
                "productName": "Mystery Box"
            }
        ])))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].serial, "ABC123");
    assert_eq!(devices[0].product_name.as_deref(), Some("Granary Smart Feeder"));
    assert_eq!(devices[0].name.as_deref(), Some("Kitchen feeder"));
    assert_eq!(devices[1].product_identifier, None);
}

#[tokio::test]
async fn test_device_real_info_addresses_by_serial() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/realInfo"))
        .and(body_partial_json(json!({ "id": "ABC123", "deviceSn": "ABC123" })))
        .respond_with(ok(json!({ "barnDoorState": true, "electricQuantity": 80 })))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let fields = client.device_real_info("ABC123").await.unwrap();

    assert_eq!(fields.get("barnDoorState"), Some(&json!(true)));
    assert_eq!(fields.get("electricQuantity"), Some(&json!(80)));
}

#[tokio::test]
async fn test_null_payload_is_empty_map() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/baseInfo"))
        .respond_with(ok(json!(null)))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let fields = client.device_base_info("ABC123").await.unwrap();

    assert!(fields.is_empty());
}

#[tokio::test]
async fn test_manual_feed_body() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/manualFeeding"))
        .and(body_partial_json(json!({ "deviceSn": "ABC123", "grainNum": 2 })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    client.manual_feed("ABC123", 2).await.unwrap();
}

#[tokio::test]
async fn test_feeding_plan_commands() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/setting/updateFeedingPlanSwitch"))
        .and(body_partial_json(json!({ "deviceSn": "ABC123", "enable": false })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/device/feedingPlan/enableTodayAll"))
        .and(body_partial_json(json!({ "deviceSn": "ABC123", "enable": true })))
        .respond_with(ok(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    client.set_feeding_plan("ABC123", false).await.unwrap();
    client.set_feeding_plan_today_all("ABC123", true).await.unwrap();
}

// ── Session expiry tests ────────────────────────────────────────────

#[tokio::test]
async fn test_session_expiry_relogs_and_retries_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": "tok-1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": "tok-2" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .and(header("token", "tok-1"))
        .respond_with(code(1009, "login expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .and(header("token", "tok-2"))
        .respond_with(ok(json!([{ "deviceSn": "ABC123", "productName": "Granary Feeder" }])))
        .expect(1)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(client.token().unwrap().expose_secret(), "tok-2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expiry_relogs_once() {
    let (server, client) = setup().await;
    let client = Arc::new(client);

    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": "tok-1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Slow re-login keeps the other expired calls queued on the lock.
    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": "tok-2" })).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/device/device/realInfo"))
        .and(header("token", "tok-1"))
        .respond_with(code(1009, "login expired"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/device/device/realInfo"))
        .and(header("token", "tok-2"))
        .respond_with(ok(json!({ "online": true })))
        .expect(8)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();

    let mut calls = JoinSet::new();
    for n in 0..8 {
        let client = Arc::clone(&client);
        calls.spawn(async move { client.device_real_info(&format!("SN{n}")).await });
    }

    let mut succeeded = 0;
    while let Some(joined) = calls.join_next().await {
        let fields = joined.unwrap().unwrap();
        assert_eq!(fields.get("online"), Some(&json!(true)));
        succeeded += 1;
    }

    assert_eq!(succeeded, 8);
    assert_eq!(client.token().unwrap().expose_secret(), "tok-2");
}

#[tokio::test]
async fn test_second_session_expiry_is_authentication_failure() {
    let (server, client) = setup().await;

    // Initial login plus exactly one re-login: no loop.
    Mock::given(method("POST"))
        .and(path("/member/auth/login"))
        .respond_with(ok(json!({ "token": "tok" })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/device/device/realInfo"))
        .respond_with(code(1009, "login expired"))
        .expect(2)
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let result = client.device_real_info("ABC123").await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_session_expiry_without_cached_credentials() {
    let (server, client) = setup().await;
    client.set_token(Some(secret("stored-token")));

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .respond_with(code(1009, "login expired"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_code() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/data/grainStatus"))
        .respond_with(code(2001, "device offline"))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let result = client.device_grain_status("ABC123").await;

    match result {
        Err(Error::Api { code, ref message }) => {
            assert_eq!(code, 2001);
            assert!(message.contains("offline"), "unexpected message: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_status() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let result = client.list_devices().await;

    match result {
        Err(ref err @ Error::HttpStatus { status, .. }) => {
            assert_eq!(status, 502);
            assert!(err.is_transport());
            assert!(err.is_transient());
        }
        other => panic!("expected HttpStatus error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body() {
    let (server, client) = setup().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("POST"))
        .and(path("/device/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    client.login("owner@example.com", &secret("pw")).await.unwrap();
    let result = client.list_devices().await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
