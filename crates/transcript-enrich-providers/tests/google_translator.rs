// crates/transcript-enrich-providers/tests/google_translator.rs
// ============================================================================
// Module: Google Web Translator Tests
// Description: Tests for request shape, response decoding, and error mapping.
// Purpose: Validate the provider against a local loopback HTTP server.
// Dependencies: transcript-enrich-providers, tiny_http, tokio
// ============================================================================
//! ## Overview
//! Ensures the provider issues the expected query parameters, decodes the
//! nested-array response document, and maps transport and malformed-response
//! failures onto the right error variants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::thread;

use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;
use transcript_enrich_core::TranslateError;
use transcript_enrich_core::Translator;
use transcript_enrich_providers::GoogleTranslatorConfig;
use transcript_enrich_providers::GoogleWebTranslator;
use transcript_enrich_providers::decode_translation;

/// Serves one request with a fixed body and status, returning the endpoint
/// URL and the raw request URL the server observed.
fn serve_once(
    body: String,
    status: u16,
) -> (String, thread::JoinHandle<Option<String>>) {
    let server = Server::http("127.0.0.1:0").expect("bind loopback server");
    let addr = server.server_addr().to_ip().expect("ip address");
    let endpoint = format!("http://{addr}/translate_a/single");
    let handle = thread::spawn(move || {
        let request = server.recv().ok()?;
        let url = request.url().to_string();
        let response = Response::from_string(body).with_status_code(status);
        let _ = request.respond(response);
        Some(url)
    });
    (endpoint, handle)
}

fn translator_for(endpoint: String) -> GoogleWebTranslator {
    GoogleWebTranslator::new(GoogleTranslatorConfig {
        endpoint,
        ..GoogleTranslatorConfig::default()
    })
    .expect("client construction")
}

/// Verifies the decoder concatenates translated segments and reads the
/// detected language.
#[test]
fn decode_concatenates_segments() {
    let document = json!([
        [
            ["Hi friend, ", "Hola amigo, ", null],
            ["how are you?", "como estas?", null]
        ],
        null,
        "es"
    ]);
    let translation = decode_translation(&document).expect("decode");
    assert_eq!(translation.text, "Hi friend, how are you?");
    assert_eq!(translation.detected_language, "es");
}

/// Verifies a document without a segment list is rejected.
#[test]
fn decode_rejects_missing_segments() {
    let document = json!({ "error": "unexpected shape" });
    assert!(matches!(decode_translation(&document), Err(TranslateError::Malformed(_))));
}

/// Verifies segments without translated text are skipped, not fatal.
#[test]
fn decode_skips_textless_segments() {
    let document = json!([
        [["Hi friend", "Hola amigo", null], [null, "\n", null]],
        null,
        "es"
    ]);
    let translation = decode_translation(&document).expect("decode");
    assert_eq!(translation.text, "Hi friend");
}

/// Verifies a document without a detected language is rejected.
#[test]
fn decode_rejects_missing_detected_language() {
    let document = json!([[["Hi friend", "Hola amigo", null]], null, null]);
    assert!(matches!(decode_translation(&document), Err(TranslateError::Malformed(_))));
}

/// Verifies an empty translation is rejected rather than cached downstream
/// as real content.
#[test]
fn decode_rejects_empty_translation() {
    let document = json!([[["", "Hola amigo", null]], null, "es"]);
    assert!(matches!(decode_translation(&document), Err(TranslateError::Malformed(_))));
}

/// Verifies a full round trip: request shape on the wire and the decoded
/// translation coming back.
#[tokio::test(flavor = "multi_thread")]
async fn translate_round_trip_over_loopback() {
    let body = json!([[["Hi friend", "Hola amigo", null]], null, "es"]).to_string();
    let (endpoint, handle) = serve_once(body, 200);

    let translator = translator_for(endpoint);
    let translation = translator.translate("Hola amigo").await.expect("translate");
    assert_eq!(translation.text, "Hi friend");
    assert_eq!(translation.detected_language, "es");

    let url = handle.join().expect("server thread").expect("request observed");
    assert!(url.contains("client=gtx"));
    assert!(url.contains("sl=auto"));
    assert!(url.contains("tl=en"));
    assert!(url.contains("dt=t"));
    assert!(url.contains("q=Hola"));
}

/// Verifies a non-success status maps to a transport error.
#[tokio::test(flavor = "multi_thread")]
async fn translate_maps_server_error_to_transport() {
    let (endpoint, handle) = serve_once("upstream unavailable".to_string(), 503);

    let translator = translator_for(endpoint);
    let result = translator.translate("Hola amigo").await;
    assert!(matches!(result, Err(TranslateError::Transport(_))));
    handle.join().expect("server thread");
}

/// Verifies a non-JSON body maps to a malformed-response error.
#[tokio::test(flavor = "multi_thread")]
async fn translate_maps_bad_body_to_malformed() {
    let (endpoint, handle) = serve_once("<html>not json</html>".to_string(), 200);

    let translator = translator_for(endpoint);
    let result = translator.translate("Hola amigo").await;
    assert!(matches!(result, Err(TranslateError::Malformed(_))));
    handle.join().expect("server thread");
}

/// Verifies a body above the configured size limit is rejected.
#[tokio::test(flavor = "multi_thread")]
async fn translate_rejects_oversized_body() {
    let oversized = "x".repeat(4 * 1024);
    let (endpoint, handle) = serve_once(oversized, 200);

    let translator = GoogleWebTranslator::new(GoogleTranslatorConfig {
        endpoint,
        max_response_bytes: 1024,
        ..GoogleTranslatorConfig::default()
    })
    .expect("client construction");
    let result = translator.translate("Hola amigo").await;
    assert!(matches!(result, Err(TranslateError::Malformed(_))));
    handle.join().expect("server thread");
}
