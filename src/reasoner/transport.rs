//! Reasoner transport

use crate::error::KycError;
use serde_json::Value;
use std::time::Duration;

/// One JSON POST round trip
///
/// Implementations must treat a non-2xx status as an error. The client layers
/// retry on top, so a transport makes exactly one attempt per call.
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with the extra `headers` and return the decoded reply
    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value, KycError>;
}

/// Blocking HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, KycError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value, KycError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send()?.error_for_status()?;
        log::debug!("Reasoner replied with HTTP {}", response.status());
        Ok(response.json::<Value>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();
        let result = transport.post_json(
            "http://127.0.0.1:9/generate",
            &[("x-goog-api-key", "secret")],
            &serde_json::json!({}),
        );

        match result {
            Err(KycError::TransportError(msg)) => assert!(!msg.contains("secret")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
