use crate::e2e::helpers;

use helpers::stub_providers::StubProvider;
use helpers::{TestContext, TestOptions};
use hyper::StatusCode;
use test_context::test_context;
use tts_relay::infrastructure::repositories::ProviderError;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/status").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let mut futures = Vec::new();
    for _ in 0..10 {
        let client = ctx.client.clone();
        futures.push(async move { client.get("/health").await });
    }

    let results = futures::future::join_all(futures).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn it_should_report_providers_in_chain_order() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![
            StubProvider::failing("polly", ProviderError::Unavailable("offline".into())),
            StubProvider::failing("espeak", ProviderError::Rejected("unused".into())),
        ],
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.get("/status").await.unwrap();
    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["status"], "ok");

    let providers = body["providers"].as_array().unwrap();
    let ids: Vec<&str> = providers.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["polly", "espeak"]);
    assert_eq!(providers[0]["configured"], true);
    assert_eq!(providers[0]["health"], "ready");
    assert!(providers[0]["capabilities"]["supports_pitch"].is_boolean());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_cache_and_limit_settings(ctx: &TestContext) {
    let response = ctx.client.get("/status").await.unwrap();

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["cache"]["enabled"], true);
    assert_eq!(body["cache"]["ttl_seconds"], 600);
    assert_eq!(body["limits"]["max_text_length"], 1000);
}
