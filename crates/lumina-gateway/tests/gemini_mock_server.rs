use std::time::Duration;

use lumina_gateway::{ConceptGateway, GatewayError, GeminiGateway, TransportKind};
use lumina_schema::{ImageData, SwatchRole};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEXT_PATH: &str = "/models/gemini-3-flash-preview:generateContent";
const IMAGE_PATH: &str = "/models/gemini-2.5-flash-image:generateContent";

fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 340}
    })
}

fn image_response(mime: &str, data: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"text": "Here is the logo."},
                {"inlineData": {"mimeType": mime, "data": data}}
            ]},
            "finishReason": "STOP"
        }]
    })
}

fn three_concepts() -> serde_json::Value {
    let concept = |name: &str, hex: &str| {
        serde_json::json!({
            "conceptName": name,
            "visualDescription": format!("{name} mark in negative space"),
            "meaning": format!("Why {name} works"),
            "colorPalette": [
                {"type": "Primary", "name": "Indigo", "hex": hex},
                {"type": "Secondary", "name": "Slate", "hex": "#334155"},
                {"type": "Accent", "name": "Amber", "hex": "#F59E0B"}
            ]
        })
    };
    serde_json::json!([
        concept("Bean Arc", "#4F46E5"),
        concept("Steam Sigil", "#0EA5E9"),
        concept("Roast Crest", "#16A34A"),
    ])
}

#[tokio::test]
async fn generate_concepts_sends_schema_and_parses_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "required": ["conceptName", "visualDescription", "meaning", "colorPalette"]
                    }
                }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(&three_concepts().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let concepts = gateway
        .generate_concepts("Acme", "Coffee", "Modern & Minimalist")
        .await
        .unwrap();

    let names: Vec<_> = concepts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Bean Arc", "Steam Sigil", "Roast Crest"]);
    assert_eq!(concepts[0].palette[0].role, SwatchRole::Primary);
    assert_eq!(concepts[2].palette[0].hex, "#16A34A");
}

#[tokio::test]
async fn generate_concepts_tolerates_other_counts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("[]")))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let concepts = gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap();
    assert!(concepts.is_empty());
}

#[tokio::test]
async fn missing_required_field_is_malformed_response() {
    let server = MockServer::start().await;
    let mut concepts = three_concepts();
    concepts[1]
        .as_object_mut()
        .unwrap()
        .remove("meaning");

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(&concepts.to_string())),
        )
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let err = gateway
        .generate_concepts("Acme", "Coffee", "Bold")
        .await
        .unwrap_err();
    assert!(
        matches!(err, GatewayError::MalformedResponse(_)),
        "expected malformed, got {err}"
    );
}

#[tokio::test]
async fn palette_entry_without_hex_is_malformed_response() {
    let server = MockServer::start().await;
    let mut concepts = three_concepts();
    concepts[0]["colorPalette"][2]
        .as_object_mut()
        .unwrap()
        .remove("hex");

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(&concepts.to_string())),
        )
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let err = gateway
        .generate_concepts("Acme", "Coffee", "Bold")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn non_json_text_is_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("Sorry, I can't help.")),
        )
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let err = gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn http_errors_are_transport_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("bad-key", server.uri());
    let err = gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap_err();
    match err {
        GatewayError::Transport { kind, message } => {
            assert_eq!(kind, TransportKind::Auth);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let err = gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Transport {
            kind: TransportKind::RateLimit,
            ..
        }
    ));
}

#[tokio::test]
async fn slow_gateway_times_out_as_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("[]"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let gateway =
        GeminiGateway::with_timeout("test-key", server.uri(), Duration::from_millis(50));
    let err = gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Transport {
            kind: TransportKind::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn refine_concept_returns_replacement() {
    let server = MockServer::start().await;
    let refined = three_concepts()[1].clone();

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"responseSchema": {"type": "OBJECT"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&refined.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let original: lumina_schema::Concept =
        serde_json::from_value(three_concepts()[0].clone()).unwrap();
    let concept = gateway
        .refine_concept(&original, "make it bolder")
        .await
        .unwrap();
    assert_eq!(concept.name, "Steam Sigil");
}

#[tokio::test]
async fn generate_image_uses_image_model_and_square_ratio() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"imageConfig": {"aspectRatio": "1:1"}}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(image_response("image/png", "iVBORw0KGgo=")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let image = gateway.generate_image("a paper crane").await.unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn image_response_without_inline_data_is_missing_image() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response("I can only describe it.")),
        )
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let err = gateway.generate_image("a paper crane").await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingImageData));
}

#[tokio::test]
async fn edit_image_sends_existing_image() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(serde_json::json!({
            "contents": [{
                "parts": [{"inlineData": {"mimeType": "image/png", "data": "b2xk"}}]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_response("image/png", "bmV3")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri());
    let edited = gateway
        .edit_image(&ImageData::new("image/png", "b2xk"), "add a blue shadow")
        .await
        .unwrap();
    assert_eq!(edited.data, "bmV3");
}

#[tokio::test]
async fn custom_models_change_the_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-exp:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("[]")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = GeminiGateway::new("test-key", server.uri()).with_models("gemini-exp", "img-exp");
    assert_eq!(gateway.image_model(), "img-exp");
    gateway.generate_concepts("Acme", "Coffee", "Bold").await.unwrap();
}
