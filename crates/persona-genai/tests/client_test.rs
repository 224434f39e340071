use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use persona_genai::{GenAiClient, GenAiConfig, GenAiError, ImageTransformer, PersonaChat};
use persona_types::{EncodedImage, Role};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Canned reply plus a log of what the fake service received.
#[derive(Clone)]
struct Fake {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn generate(
    State(fake): State<Fake>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((call, key, body));
    (fake.status, Json(fake.reply.clone()))
}

async fn spawn_fake(status: StatusCode, reply: Value) -> (String, Fake) {
    let fake = Fake {
        status,
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate))
        .with_state(fake.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1beta", addr), fake)
}

fn client(base_url: &str) -> GenAiClient {
    GenAiClient::new(GenAiConfig::new("test-key").with_base_url(base_url)).unwrap()
}

fn photo() -> EncodedImage {
    EncodedImage::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], "image/jpeg").unwrap()
}

#[test]
fn new_requires_api_key() {
    let result = GenAiClient::new(GenAiConfig::new("   "));
    assert!(matches!(result, Err(GenAiError::Config(_))));
}

#[tokio::test]
async fn transform_returns_first_inline_image() {
    let (base, fake) = spawn_fake(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Your majesty:"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                ]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;

    let role = Role::new("queen").unwrap();
    let image = client(&base).transform_image(&photo(), &role).await.unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "iVBORw0KGgo=");

    let seen = fake.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (call, key, body) = &seen[0];
    assert_eq!(call, "gemini-2.5-flash-image-preview:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], photo().data);
    assert!(parts[1]["text"].as_str().unwrap().contains("queen"));
    assert_eq!(
        body["generationConfig"]["responseModalities"],
        json!(["TEXT", "IMAGE"])
    );
}

#[tokio::test]
async fn transform_without_image_part_fails() {
    let (base, _fake) = spawn_fake(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"parts": [{"text": "I cannot edit this photo."}]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;

    let role = Role::new("knight").unwrap();
    let result = client(&base).transform_image(&photo(), &role).await;
    assert!(matches!(result, Err(GenAiError::NoImage)), "got {:?}", result);
}

fn image_reply(mime_type: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": mime_type, "data": data}}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn transform_rejects_image_that_is_not_base64() {
    let (base, _fake) = spawn_fake(StatusCode::OK, image_reply("image/png", "!!! not base64 !!!")).await;

    let role = Role::new("queen").unwrap();
    let result = client(&base).transform_image(&photo(), &role).await;
    assert!(
        matches!(result, Err(GenAiError::MalformedResponse(_))),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn transform_rejects_unsupported_image_type() {
    let (base, _fake) = spawn_fake(StatusCode::OK, image_reply("image/x-icon", "AAABAAEAEBA=")).await;

    let role = Role::new("queen").unwrap();
    let result = client(&base).transform_image(&photo(), &role).await;
    assert!(matches!(result, Err(GenAiError::NoImage)), "got {:?}", result);
}

#[tokio::test]
async fn transform_treats_empty_image_payload_as_missing() {
    let (base, _fake) = spawn_fake(StatusCode::OK, image_reply("image/png", "")).await;

    let role = Role::new("queen").unwrap();
    let result = client(&base).transform_image(&photo(), &role).await;
    assert!(matches!(result, Err(GenAiError::NoImage)), "got {:?}", result);
}

#[tokio::test]
async fn chat_rejects_overlong_message_without_calling_out() {
    let (base, fake) = spawn_fake(StatusCode::OK, json!({})).await;

    let role = Role::new("pirate").unwrap();
    let message = "a".repeat(persona_genai::MAX_MESSAGE_CHARS + 1);
    let result = client(&base).chat(&role, &message).await;
    assert!(
        matches!(
            result,
            Err(GenAiError::MessageTooLong { chars, max })
                if chars == persona_genai::MAX_MESSAGE_CHARS + 1 && max == persona_genai::MAX_MESSAGE_CHARS
        ),
        "got {:?}",
        result
    );
    assert!(fake.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn chat_parses_structured_reply() {
    let (base, fake) = spawn_fake(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "{\"language\": \"hi_IN\", \"response\": \"Namaste, praja!\"}"}
                ]}
            }]
        }),
    )
    .await;

    let role = Role::new("queen").unwrap();
    let reply = client(&base).chat(&role, "namaste rani").await.unwrap();
    assert_eq!(reply.language, "hi-IN");
    assert_eq!(reply.response, "Namaste, praja!");

    let seen = fake.seen.lock().unwrap();
    let (call, _, body) = &seen[0];
    assert_eq!(call, "gemini-2.5-flash:generateContent");
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("You are a queen."));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "namaste rani");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert!(body["generationConfig"]["responseSchema"].is_object());
}

#[tokio::test]
async fn chat_tolerates_code_fence() {
    let (base, _fake) = spawn_fake(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "```json\n{\"language\": \"\", \"response\": \"Arr!\"}\n```"}
                ]}
            }]
        }),
    )
    .await;

    let role = Role::new("pirate").unwrap();
    let reply = client(&base).chat(&role, "hello").await.unwrap();
    assert_eq!(reply.language, "en-US");
    assert_eq!(reply.response, "Arr!");
}

#[tokio::test]
async fn chat_rejects_unstructured_text() {
    let (base, _fake) = spawn_fake(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "Just words"}]}}]}),
    )
    .await;

    let role = Role::new("pirate").unwrap();
    let result = client(&base).chat(&role, "hello").await;
    assert!(
        matches!(result, Err(GenAiError::MalformedResponse(_))),
        "got {:?}",
        result
    );
}

#[tokio::test]
async fn api_errors_carry_service_message() {
    let (base, _fake) = spawn_fake(
        StatusCode::BAD_REQUEST,
        json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}),
    )
    .await;

    let role = Role::new("wizard").unwrap();
    match client(&base).chat(&role, "hi").await {
        Err(GenAiError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "INVALID_ARGUMENT: API key not valid");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn blocked_prompts_are_reported() {
    let (base, _fake) = spawn_fake(
        StatusCode::OK,
        json!({"promptFeedback": {"blockReason": "SAFETY"}}),
    )
    .await;

    let role = Role::new("wizard").unwrap();
    let result = client(&base).transform_image(&photo(), &role).await;
    assert!(matches!(result, Err(GenAiError::Blocked(reason)) if reason == "SAFETY"));
}
