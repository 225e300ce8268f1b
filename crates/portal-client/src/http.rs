//! Transport plumbing shared by every service: URL building, bearer auth,
//! and collapsing all failure modes into one [`ServiceFailure`] shape.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};

use portal_core::types::NULL_SEGMENT;
use portal_core::{ServiceFailure, ServiceResult};

use crate::error::ClientError;

pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";
pub const INVALID_JSON: &str = "Invalid JSON response.";

/// One connection to the portal backend. Implements every service port.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    base: Url,
}

impl PortalClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn get(&self, segments: &[&str]) -> RequestBuilder {
        self.client.get(self.url(segments))
    }

    pub(crate) fn post(&self, segments: &[&str]) -> RequestBuilder {
        self.client.post(self.url(segments))
    }

    pub(crate) fn delete(&self, segments: &[&str]) -> RequestBuilder {
        self.client.delete(self.url(segments))
    }

    /// Send and decode. Every failure becomes a [`ServiceFailure`]; an empty
    /// 2xx body decodes to `Value::Null`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> ServiceResult<Value> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request failed before a response arrived");
            ServiceFailure::new(NETWORK_ERROR)
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, %status, "failed reading response body");
            ServiceFailure::new(NETWORK_ERROR)
        })?;
        debug!(%status, bytes = body.len(), "response received");

        let payload = if body.iter().all(u8::is_ascii_whitespace) {
            Ok(Value::Null)
        } else {
            serde_json::from_slice::<Value>(&body)
        };

        if !status.is_success() {
            let message = payload
                .ok()
                .as_ref()
                .and_then(server_message)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(ServiceFailure::with_status(message, status.as_u16()));
        }
        payload.map_err(|e| {
            warn!(error = %e, %status, "response body is not JSON");
            ServiceFailure::with_status(INVALID_JSON, status.as_u16())
        })
    }
}

pub(crate) fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    if token.trim().is_empty() {
        request
    } else {
        request.bearer_auth(token)
    }
}

/// A filter value as a path segment: trimmed, or `null` when unconstrained.
pub(crate) fn segment(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NULL_SEGMENT)
}

/// The server's own `message` (or `error`) field.
pub(crate) fn server_message(payload: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|k| payload.get(k).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

/// Elements of a list response: either a bare array or `{<envelope>: [...]}`.
/// Any other shape is an empty list.
pub(crate) fn list_payload(payload: Value, envelope: &str) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(envelope) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// `token` at the top level or under `data`. Empty when absent.
pub(crate) fn token_payload(payload: &Value) -> String {
    payload
        .get("token")
        .or_else(|| payload.get("data").and_then(|d| d.get("token")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> PortalClient {
        PortalClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_encodes_segments() {
        let c = client("http://localhost:8080");
        assert_eq!(
            c.url(&["doctor", "filter", "Dr Lee", "null", "a/b"]).as_str(),
            "http://localhost:8080/doctor/filter/Dr%20Lee/null/a%2Fb"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let c = client("http://localhost:8080/api/");
        assert_eq!(c.url(&["doctor"]).as_str(), "http://localhost:8080/api/doctor");
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = PortalClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
        assert!(PortalClient::new("mailto:a@b.c", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn segment_uses_null_for_unconstrained() {
        assert_eq!(segment(None), "null");
        assert_eq!(segment(Some("   ")), "null");
        assert_eq!(segment(Some(" cardio ")), "cardio");
    }

    #[test]
    fn list_payload_shapes() {
        assert_eq!(list_payload(json!([1, 2]), "doctors").len(), 2);
        assert_eq!(list_payload(json!({"doctors": [1]}), "doctors").len(), 1);
        assert!(list_payload(json!({"doctors": "x"}), "doctors").is_empty());
        assert!(list_payload(json!({"other": [1]}), "doctors").is_empty());
        assert!(list_payload(json!("text"), "doctors").is_empty());
        assert!(list_payload(Value::Null, "doctors").is_empty());
    }

    #[test]
    fn server_message_prefers_message_then_error() {
        assert_eq!(
            server_message(&json!({"message": "m", "error": "e"})).as_deref(),
            Some("m")
        );
        assert_eq!(server_message(&json!({"error": "e"})).as_deref(), Some("e"));
        assert_eq!(server_message(&json!({"message": " "})), None);
    }

    #[test]
    fn token_payload_locations() {
        assert_eq!(token_payload(&json!({"token": "a"})), "a");
        assert_eq!(token_payload(&json!({"data": {"token": "b"}})), "b");
        assert_eq!(token_payload(&json!({})), "");
    }
}
