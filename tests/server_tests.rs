//! Built-in server over a real socket.

use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use routegate::config::ServerConfig;

mod common;

fn config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.token_secret = "test-secret".into();
    config.auth.login_password = "letmein".into();
    config
}

async fn login(client: &reqwest::Client, base: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{base}/auth/login"))
        .json(&json!({ "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_info_and_request_id() {
    let (addr, shutdown) = common::start_server(config()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{addr}/v1/info"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["name"], "routegate");

    let res = client.get(format!("http://{addr}/v1/info")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_rejections() {
    let (addr, shutdown) = common::start_server(config()).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let res = client
        .post(format!("{base}/auth/login"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "ok": false, "error": "Invalid JSON body" })
    );

    let res = login(&client, &base, "   ").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Password is required");

    let res = login(&client, &base, "wrong").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Invalid password.");

    shutdown.trigger();
}

#[tokio::test]
async fn test_login_cookie_unlocks_me() {
    let (addr, shutdown) = common::start_server(config()).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let res = client.get(format!("{base}/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "ok": false, "error": "Unauthorized" })
    );

    let res = login(&client, &base, "letmein").await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    assert_eq!(cookie, format!("accessToken={token}; HttpOnly; Path=/"));

    let res = client
        .get(format!("{base}/auth/me"))
        .header(header::COOKIE, format!("accessToken={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["data"]["user"], "admin");

    let res = client
        .get(format!("{base}/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{base}/auth/me"))
        .bearer_auth("forged.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    shutdown.trigger();
}

#[tokio::test]
async fn test_wizard_status_round_trip() {
    let (addr, shutdown) = common::start_server(config()).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let res = client.get(format!("{base}/status/wizard")).send().await.unwrap();
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "ok": true, "data": false })
    );

    let res = client
        .post(format!("{base}/status/ready"))
        .json(&json!({ "isReady": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = login(&client, &base, "letmein")
        .await
        .json::<Value>()
        .await
        .unwrap()["data"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .post(format!("{base}/status/ready"))
        .bearer_auth(&token)
        .json(&json!({ "isReady": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{base}/status/wizard")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["data"], true);

    shutdown.trigger();
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (addr, shutdown) = common::start_server(config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{addr}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::SET_COOKIE],
        "accessToken=; HttpOnly; Path=/; Max-Age=0"
    );

    shutdown.trigger();
}
