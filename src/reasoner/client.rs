//! Reasoner client with bounded retry

use super::parse::{parse_best_effort, ParsedResponse};
use super::transport::{HttpTransport, Transport};
use crate::config::ReasonerConfig;
use crate::error::KycError;
use crate::io::decoder::mime_type;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

/// Text returned when the reply envelope carries no candidate text
pub const NO_RESPONSE: &str = "No response received.";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Image attached inline to a reasoner request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// MIME type sniffed from the encoded bytes
    pub mime_type: &'static str,
    /// Base64 of the encoded bytes
    pub data: String,
}

impl ImagePayload {
    /// Encode document bytes for inline transfer
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type(bytes),
            data: STANDARD.encode(bytes),
        }
    }
}

/// Client for the external reasoner
///
/// Built once and shared between analyzers and the decision step.
pub struct ReasonerClient {
    config: ReasonerConfig,
    transport: Box<dyn Transport>,
}

impl ReasonerClient {
    /// Client over HTTP using the configured timeout
    pub fn new(config: ReasonerConfig) -> Result<Self, KycError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, transport))
    }

    /// Client over a caller-supplied transport
    pub fn with_transport(config: ReasonerConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Configured endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send a prompt (and optionally an image) and return the reply text
    ///
    /// Never fails: after `max_attempts` failed attempts the result is a
    /// synthetic `{"status":"fail","message":...}` payload naming the endpoint.
    pub fn ask(&self, prompt: &str, image: Option<&ImagePayload>) -> String {
        let body = request_body(prompt, image);
        let headers: Vec<(&str, &str)> = match self.config.api_key.as_deref() {
            Some(key) => vec![(API_KEY_HEADER, key)],
            None => Vec::new(),
        };
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.transport.post_json(&self.config.endpoint, &headers, &body) {
                Ok(envelope) => {
                    log::debug!("Reasoner answered on attempt {}/{}", attempt, attempts);
                    return envelope_text(&envelope);
                }
                Err(err) => {
                    log::warn!("Reasoner attempt {}/{} failed: {}", attempt, attempts, err);
                    if attempt < attempts {
                        std::thread::sleep(self.config.retry_delay());
                    }
                }
            }
        }

        unavailable_payload(attempts, &self.config.endpoint)
    }

    /// [`ask`](Self::ask) followed by [`parse_best_effort`]
    pub fn ask_json(&self, prompt: &str, image: Option<&ImagePayload>) -> ParsedResponse {
        parse_best_effort(&self.ask(prompt, image))
    }
}

impl std::fmt::Debug for ReasonerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn request_body(prompt: &str, image: Option<&ImagePayload>) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(image) = image {
        parts.push(json!({
            "inline_data": {
                "mime_type": image.mime_type,
                "data": image.data,
            }
        }));
    }
    json!({ "contents": [{ "parts": parts }] })
}

/// Candidate text of a `generateContent` reply
fn envelope_text(envelope: &Value) -> String {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}

fn unavailable_payload(attempts: u32, endpoint: &str) -> String {
    json!({
        "status": "fail",
        "message": format!("API call failed after {} attempts, endpoint {}", attempts, endpoint),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Fails the first `failures` calls, then answers with `text`
    struct FlakyTransport {
        failures: usize,
        text: String,
        calls: Arc<AtomicUsize>,
        last_headers: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl Transport for FlakyTransport {
        fn post_json(&self, _url: &str, headers: &[(&str, &str)], _body: &Value) -> Result<Value, KycError> {
            *self.last_headers.lock().unwrap() = headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(KycError::TransportError("HTTP 503".to_string()));
            }
            Ok(json!({ "candidates": [{ "content": { "parts": [{ "text": self.text }] } }] }))
        }
    }

    fn config(endpoint: &str) -> ReasonerConfig {
        ReasonerConfig {
            endpoint: endpoint.to_string(),
            api_key: Some("k3y".to_string()),
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    fn flaky(failures: usize, text: &str) -> (FlakyTransport, Arc<AtomicUsize>, Arc<Mutex<Vec<(String, String)>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let headers = Arc::new(Mutex::new(Vec::new()));
        (
            FlakyTransport {
                failures,
                text: text.to_string(),
                calls: calls.clone(),
                last_headers: headers.clone(),
            },
            calls,
            headers,
        )
    }

    #[test]
    fn test_exhausted_retries_yield_fail_payload() {
        let (transport, calls, _) = flaky(usize::MAX, "");
        let client = ReasonerClient::with_transport(config("http://reasoner.test/judge"), transport);

        let reply = client.ask("hello", None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let parsed = parse_best_effort(&reply);
        assert_eq!(parsed.str_field("status"), Some("fail"));
        assert_eq!(
            parsed.str_field("message"),
            Some("API call failed after 3 attempts, endpoint http://reasoner.test/judge")
        );
    }

    #[test]
    fn test_recovers_after_transient_failure() {
        let (transport, calls, headers) = flaky(2, "{\"status\":\"success\"}");
        let client = ReasonerClient::with_transport(config("http://reasoner.test"), transport);

        assert_eq!(client.ask("hello", None), "{\"status\":\"success\"}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *headers.lock().unwrap(),
            vec![("x-goog-api-key".to_string(), "k3y".to_string())]
        );
    }

    #[test]
    fn test_envelope_without_text() {
        assert_eq!(envelope_text(&json!({})), NO_RESPONSE);
        assert_eq!(envelope_text(&json!({ "candidates": [] })), NO_RESPONSE);
        assert_eq!(
            envelope_text(&json!({ "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }] })),
            "hi"
        );
    }

    #[test]
    fn test_request_body_with_image() {
        let image = ImagePayload {
            mime_type: "image/png",
            data: "AAAA".to_string(),
        };
        let body = request_body("look", Some(&image));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "look");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "AAAA");

        let text_only = request_body("look", None);
        assert_eq!(text_only["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_image_payload_encodes_base64() {
        let payload = ImagePayload::from_bytes(b"\xFF\xD8\xFFjpeg");
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&payload.data).unwrap(), b"\xFF\xD8\xFFjpeg");
    }

    #[test]
    fn test_debug_hides_credential() {
        let (transport, _, _) = flaky(0, "");
        let client = ReasonerClient::with_transport(config("http://reasoner.test"), transport);
        assert!(!format!("{:?}", client).contains("k3y"));
    }
}
