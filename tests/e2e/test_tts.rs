use crate::e2e::helpers;

use helpers::stub_providers::StubProvider;
use helpers::{TestContext, TestOptions, STUB_AUDIO};
use hyper::StatusCode;
use serde_json::json;
use std::time::{Duration, SystemTime};
use test_context::test_context;
use tts_relay::domain::tts::AudioFormat;
use tts_relay::infrastructure::repositories::ProviderError;
use tts_relay::infrastructure::storage::FileJanitor;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_text_to_speech(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "Hello", "voice": "en-us-female" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg")
        .assert_header("x-provider", "primary")
        .assert_header("x-cache", "MISS")
        .assert_header_exists("content-disposition");

    assert_eq!(response.body_bytes, STUB_AUDIO);
    assert_eq!(ctx.provider(0).calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_the_legacy_synthesize_route(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "Hello there" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert!(response.header("content-type").unwrap().starts_with("audio/"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_over_the_limit_without_calling_providers(ctx: &TestContext) {
    let text = "a".repeat(1001);

    let response = ctx.client.post("/tts", &json!({ "text": text })).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("1000");
    assert_eq!(ctx.provider(0).calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    let response = ctx.client.post("/tts", &json!({ "text": "   " })).await.unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.provider(0).calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_json(ctx: &TestContext) {
    let response = ctx.client.post_raw("/tts", "{\"text\": ").await.unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.body.as_ref().unwrap().get("error").is_some());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unknown_voice(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "Hello", "voice": "klingon" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("klingon");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_neural_voice_ids(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts", &json!({ "text": "Hello", "voice": "en-GB-RyanNeural" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let sent = ctx.provider(0).last_request().unwrap();
    assert_eq!(sent.voice.key, "en-gb-male");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_apply_style_presets_from_the_language_field(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/generate",
            &json!({ "text": "Once upon a time", "language": "story", "gender": "male" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let sent = ctx.provider(0).last_request().unwrap();
    assert_eq!(sent.voice.key, "en-gb-female");
    assert_eq!((sent.pitch, sent.rate), (-5, -5));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_numeric_strings_for_prosody(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/tts",
            &json!({ "text": "Hello", "pitch": "10", "rate": "-20", "gap": "300" }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_repeated_requests_from_cache(ctx: &TestContext) {
    let body = json!({ "text": "Cached phrase", "voice": "en-gb-male", "pitch": 5 });

    let first = ctx.client.post("/tts", &body).await.unwrap();
    first.assert_status(StatusCode::OK).assert_header("x-cache", "MISS");

    let second = ctx.client.post("/tts", &body).await.unwrap();
    second
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "HIT")
        .assert_header("x-provider", "primary");

    assert_eq!(first.body_bytes, second.body_bytes);
    assert_eq!(ctx.provider(0).calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_different_parameters_as_different_requests(ctx: &TestContext) {
    ctx.client
        .post("/tts", &json!({ "text": "Hello", "pitch": 0 }))
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    ctx.client
        .post("/tts", &json!({ "text": "Hello", "pitch": 10 }))
        .await
        .unwrap()
        .assert_header("x-cache", "MISS");

    assert_eq!(ctx.provider(0).calls(), 2);
}

#[tokio::test]
async fn it_should_synthesize_again_after_cache_ttl_expires() {
    let ctx = TestContext::with_options(TestOptions {
        cache_ttl: Duration::from_secs(1),
        ..TestOptions::default()
    })
    .await;
    let body = json!({ "text": "Short lived" });

    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "MISS");
    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "HIT");

    tokio::time::sleep(Duration::from_millis(1200)).await;

    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "MISS");
    assert_eq!(ctx.provider(0).calls(), 2);
}

#[tokio::test]
async fn it_should_always_call_providers_when_cache_is_disabled() {
    let ctx = TestContext::with_options(TestOptions {
        cache_enabled: false,
        ..TestOptions::default()
    })
    .await;
    let body = json!({ "text": "No cache" });

    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "MISS");
    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "MISS");

    assert_eq!(ctx.provider(0).calls(), 2);
}

#[tokio::test]
async fn it_should_fall_back_to_the_next_provider() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![
            StubProvider::failing("first", ProviderError::Unavailable("connection refused".into())),
            StubProvider::succeeding("second", b"RIFF-wav-bytes", AudioFormat::Wav),
        ],
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.post("/tts", &json!({ "text": "Fallback" })).await.unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("x-provider", "second")
        .assert_header("content-type", "audio/wav");
    assert_eq!(response.body_bytes, b"RIFF-wav-bytes");
    assert_eq!(ctx.provider(0).calls(), 1);
    assert_eq!(ctx.provider(1).calls(), 1);
}

#[tokio::test]
async fn it_should_fall_back_past_rejected_and_timed_out_providers() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![
            StubProvider::failing("rejects", ProviderError::Rejected("no such voice".into())),
            StubProvider::hanging("hangs", Duration::from_secs(5)),
            StubProvider::succeeding("works", STUB_AUDIO, AudioFormat::Mp3),
        ],
        provider_timeout: Duration::from_millis(200),
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.post("/tts", &json!({ "text": "Keep going" })).await.unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("x-provider", "works");
}

#[tokio::test]
async fn it_should_return_server_error_when_every_provider_fails() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![
            StubProvider::failing("first", ProviderError::Unavailable("internal detail".into())),
            StubProvider::failing("second", ProviderError::Rejected("bad key".into())),
        ],
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.post("/tts", &json!({ "text": "Doomed" })).await.unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("application/json"));

    let body = response.body.as_ref().unwrap();
    let attempts = body.get("attempts").and_then(|a| a.as_array()).unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["provider"], "first");
    assert_eq!(attempts[1]["kind"], "rejected");
    assert!(!String::from_utf8_lossy(&response.body_bytes).contains("internal detail"));
}

#[tokio::test]
async fn it_should_not_cache_failures() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![StubProvider::failing(
            "down",
            ProviderError::Unavailable("down".into()),
        )],
        ..TestOptions::default()
    })
    .await;
    let body = json!({ "text": "Try twice" });

    ctx.client.post("/tts", &body).await.unwrap();
    ctx.client.post("/tts", &body).await.unwrap();

    assert_eq!(ctx.provider(0).calls(), 2);
}

#[tokio::test]
async fn it_should_ask_callers_to_retry_while_a_provider_warms_up() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![
            StubProvider::failing(
                "huggingface",
                ProviderError::Busy {
                    retry_after_secs: 20,
                    detail: "model loading".into(),
                },
            ),
            StubProvider::succeeding("never-reached", STUB_AUDIO, AudioFormat::Mp3),
        ],
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.post("/tts", &json!({ "text": "Warm up" })).await.unwrap();

    response
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)
        .assert_header("retry-after", "20");
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["retry_after_seconds"], 20);
    assert_eq!(body["provider"], "huggingface");
    assert_eq!(ctx.provider(1).calls(), 0);
}

#[tokio::test]
async fn it_should_return_gateway_timeout_when_the_last_provider_times_out() {
    let ctx = TestContext::with_options(TestOptions {
        providers: vec![StubProvider::hanging("slow", Duration::from_secs(5))],
        provider_timeout: Duration::from_millis(200),
        ..TestOptions::default()
    })
    .await;

    let response = ctx.client.post("/tts", &json!({ "text": "Too slow" })).await.unwrap();

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn it_should_rate_limit_synthesis_per_client() {
    let ctx = TestContext::with_options(TestOptions {
        rate_limit_per_hour: 2,
        ..TestOptions::default()
    })
    .await;
    let body = json!({ "text": "Limited" });

    for _ in 0..2 {
        ctx.client.post("/tts", &body).await.unwrap().assert_status(StatusCode::OK);
    }

    let response = ctx.client.post("/tts", &body).await.unwrap();
    response
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_header_exists("retry-after");

    // Another forwarded client has its own budget
    ctx.client
        .post_with_headers("/tts", &body, &[("x-forwarded-for", "203.0.113.9")])
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    // Health checks are never limited
    ctx.client.get("/health").await.unwrap().assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_generate_a_downloadable_file(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/generate", &json!({ "text": "Download me", "voice": "hi-in-female" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["provider"], "primary");
    assert_eq!(body["cached"], false);

    let file_url = body["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("/audio/"));
    assert!(file_url.ends_with(".primary.mp3"));

    let audio = ctx.client.get(file_url).await.unwrap();
    audio
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg");
    assert_eq!(audio.body_bytes, STUB_AUDIO);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_serve_files_outside_the_audio_directory(ctx: &TestContext) {
    let response = ctx.client.get("/audio/..%2FCargo.toml").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);

    let response = ctx.client.get("/audio/missing.primary.mp3").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_stop_serving_files_removed_by_the_janitor(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/generate", &json!({ "text": "Ephemeral" }))
        .await
        .unwrap();
    let file_url = response.body.as_ref().unwrap()["file_url"]
        .as_str()
        .unwrap()
        .to_string();
    let file_name = file_url.trim_start_matches("/audio/");

    let path = ctx.audio_dir.path().join(file_name);
    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(an_hour_ago)
        .unwrap();

    let janitor = FileJanitor::new(
        ctx.audio_dir.path(),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );
    assert_eq!(janitor.sweep().await, 1);

    ctx.client
        .get(&file_url)
        .await
        .unwrap()
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_resynthesize_when_the_cached_file_is_gone(ctx: &TestContext) {
    let body = json!({ "text": "Vanishing" });
    let response = ctx.client.post("/generate", &body).await.unwrap();
    let file_name = response.body.as_ref().unwrap()["filename"]
        .as_str()
        .unwrap()
        .to_string();

    std::fs::remove_file(ctx.audio_dir.path().join(&file_name)).unwrap();

    let response = ctx.client.post("/tts", &body).await.unwrap();
    response
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "MISS");
    assert_eq!(ctx.provider(0).calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_survive_a_memory_cache_reset(ctx: &TestContext) {
    let body = json!({ "text": "Persistent" });
    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "MISS");

    ctx.cache.as_ref().unwrap().clear_memory();

    ctx.client.post("/tts", &body).await.unwrap().assert_header("x-cache", "HIT");
    assert_eq!(ctx.provider(0).calls(), 1);
}
