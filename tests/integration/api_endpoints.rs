//! Integration tests for the HTTP command surface
//!
//! These tests verify that:
//! - Every command route replies with the confirmation text
//! - Registry errors map to 400/404/409
//! - Authentication middleware guards everything but health
//! - Cycles can be triggered through the scheduler

use std::net::SocketAddr;

use axum::http::StatusCode;
use guardia_status::api::{ApiState, spawn_api_server};
use guardia_status::commands::CommandSurface;
use guardia_status::config::ApiConfig;
use guardia_status::monitor::MonitorHandle;
use serde_json::{Value, json};

use crate::helpers::{Harness, alive, harness};

const TOKEN: &str = "test-token";

async fn spawn_test_api(h: &Harness, scheduler: Option<MonitorHandle>) -> SocketAddr {
    let state = ApiState::new(CommandSurface::new(h.core.clone()), scheduler);

    let config = ApiConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        token: Some(TOKEN.to_string()),
        cors: true,
    };

    spawn_api_server(config, state).await.unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let h = harness().await;
    let addr = spawn_test_api(&h, None).await;

    let response = client().get(url(addr, "/api/v1/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["endpoints"], 0);
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let h = harness().await;
    let addr = spawn_test_api(&h, None).await;

    let missing = client().get(url(addr, "/api/v1/status")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers()["www-authenticate"], "Bearer");

    let basic = client()
        .get(url(addr, "/api/v1/status"))
        .basic_auth("admin", Some(TOKEN))
        .send()
        .await
        .unwrap();
    assert_eq!(basic.status(), StatusCode::UNAUTHORIZED);

    let wrong = client()
        .get(url(addr, "/api/v1/status"))
        .bearer_auth("nope")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let ok = client()
        .get(url(addr, "/api/v1/status"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_list_remove() {
    let h = harness().await;
    let addr = spawn_test_api(&h, None).await;

    let response = client()
        .post(url(addr, "/api/v1/endpoints"))
        .bearer_auth(TOKEN)
        .json(&json!({ "address": "mc.example.com", "name": "Survival" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Added Survival (mc.example.com) to the list");
    assert_eq!(body["persisted"], true);

    let duplicate = client()
        .post(url(addr, "/api/v1/endpoints"))
        .bearer_auth(TOKEN)
        .json(&json!({ "address": "mc.example.com", "name": "Again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let invalid = client()
        .post(url(addr, "/api/v1/endpoints"))
        .bearer_auth(TOKEN)
        .json(&json!({ "address": "", "name": "Empty" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let choices: Value = client()
        .get(url(addr, "/api/v1/endpoints?prefix=mc"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(choices, json!([{ "name": "Survival", "value": "mc.example.com" }]));

    let removed = client()
        .delete(url(addr, "/api/v1/endpoints/mc.example.com"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);
    let body: Value = removed.json().await.unwrap();
    assert_eq!(body["message"], "Removed Survival (mc.example.com) from the list");

    let missing = client()
        .delete(url(addr, "/api/v1/endpoints/mc.example.com"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_address_with_port() {
    let h = harness().await;
    h.core.add_endpoint("mc.example.com:25570", "Modded").await.unwrap();
    let addr = spawn_test_api(&h, None).await;

    let removed = client()
        .delete(url(addr, "/api/v1/endpoints/mc.example.com%3A25570"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);
    assert!(h.core.registry().is_empty().await);
}

#[tokio::test]
async fn test_settings_routes() {
    let h = harness().await;
    let addr = spawn_test_api(&h, None).await;

    let display: Value = client()
        .put(url(addr, "/api/v1/display"))
        .bearer_auth(TOKEN)
        .json(&json!({ "channel_id": "1100000000000000001" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(display["message"], "Set the channel to <#1100000000000000001>");

    let alert: Value = client()
        .put(url(addr, "/api/v1/alert"))
        .bearer_auth(TOKEN)
        .json(&json!({ "channel_id": 5, "message": "{server} is gone" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        alert["message"],
        "Set the alert to <#5> with message {server} is gone"
    );

    let toggle: Value = client()
        .post(url(addr, "/api/v1/display/show-address"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggle["message"], "Set show_ip to True");
}

#[tokio::test]
async fn test_display_create_failure_is_bad_gateway() {
    let h = harness().await;
    h.display.fail_create();
    let addr = spawn_test_api(&h, None).await;

    let response = client()
        .put(url(addr, "/api/v1/display"))
        .bearer_auth(TOKEN)
        .json(&json!({ "channel_id": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_status_lists_endpoints() {
    let h = harness().await;
    h.core.add_endpoint("mc.example.com", "Survival").await.unwrap();
    h.probe.script("mc.example.com", [alive(5, 20)]);
    h.core.run_cycle().await;
    let addr = spawn_test_api(&h, None).await;

    let body: Value = client()
        .get(url(addr, "/api/v1/status"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"]["entries"][0]["label"], "Survival (mc.example.com)");
    assert_eq!(body["status"]["entries"][0]["value"], "🟢 Online");
    assert_eq!(body["endpoints"][0]["state"], "up");
    assert_eq!(body["endpoints"][0]["population"]["online"], 5);
}

#[tokio::test]
async fn test_cycle_route() {
    let h = harness().await;
    h.core.add_endpoint("mc.example.com", "Survival").await.unwrap();

    let without = spawn_test_api(&h, None).await;
    let response = client()
        .post(url(without, "/api/v1/cycle"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let scheduler = MonitorHandle::spawn(h.core.clone());
    let with = spawn_test_api(&h, Some(scheduler.clone())).await;
    let report: Value = client()
        .post(url(with, "/api/v1/cycle"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["probed"], 1);

    scheduler.shutdown().await;
}
