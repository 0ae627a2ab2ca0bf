use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_the_voice_catalog(ctx: &TestContext) {
    let response = ctx.client.get("/voices").await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["default"], "en-us-female");

    let voices = body["voices"].as_array().unwrap();
    assert_eq!(voices.len(), 8);

    let keys: Vec<&str> = voices.iter().map(|v| v["key"].as_str().unwrap()).collect();
    for expected in ["en-us-female", "en-gb-male", "hi-in-female", "ur-pk-male"] {
        assert!(keys.contains(&expected), "missing voice {expected}");
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_describe_each_voice(ctx: &TestContext) {
    let response = ctx.client.get("/voices").await.unwrap();
    let body = response.body.as_ref().unwrap();

    let urdu = body["voices"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["key"] == "ur-pk-female")
        .unwrap();

    assert_eq!(urdu["language"], "ur");
    assert_eq!(urdu["gender"], "female");
    assert!(!urdu["providers"].as_array().unwrap().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_rate_limit_the_catalog(ctx: &TestContext) {
    for _ in 0..5 {
        ctx.client
            .get("/voices")
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_neural_voice_aliases(ctx: &TestContext) {
    let response = ctx.client.get("/voices").await.unwrap();
    let body = response.body.as_ref().unwrap();

    let aliases: Vec<&str> = body["voices"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|v| v["aliases"].as_array().unwrap())
        .map(|a| a.as_str().unwrap())
        .collect();

    assert_eq!(aliases.len(), 16);
    assert!(aliases.contains(&"en-US-JennyNeural"));
    assert!(aliases.contains(&"ur-PK-AsadNeural"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_style_presets(ctx: &TestContext) {
    let response = ctx.client.get("/voices").await.unwrap();
    let body = response.body.as_ref().unwrap();

    let presets = body["presets"].as_array().unwrap();
    let keys: Vec<&str> = presets.iter().map(|p| p["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["story", "horror", "cartoon", "news"]);

    let cartoon = presets.iter().find(|p| p["key"] == "cartoon").unwrap();
    assert_eq!(cartoon["pitch"], 25);
}
