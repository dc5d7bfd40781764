//! Signed client for the Lyyti v2 REST API.
//!
//! Every request carries an `Authorization: LYYTI-API-V2 ...` header whose
//! signature is an HMAC-SHA256, keyed with the private key, over the base64
//! encoding of `"{public_key},{timestamp},{path}"`. The hex digest is sent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Production API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.lyyti.com/v2/";

const ACCEPT_JSON: &str = "application/json; charset=utf-8";
const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
const CONTENT_TYPE_MERGE_PATCH: &str = "application/merge-patch+json";

// ============================================================================
// Error Types
// ============================================================================

/// Class of transport-level failure, exposed as a numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Builder = 1,
    Connect = 2,
    Timeout = 3,
    Redirect = 4,
    Body = 5,
    Request = 6,
    Other = 99,
}

impl TransportFailure {
    pub fn code(self) -> u16 {
        self as u16
    }

    fn classify(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Builder
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::Redirect
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else if err.is_request() {
            Self::Request
        } else {
            Self::Other
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error {code}: {message}", code = .failure.code())]
    Transport {
        failure: TransportFailure,
        message: String,
    },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ApiError {
    /// Numeric error code for transport failures.
    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::Transport { failure, .. } => Some(failure.code()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            failure: TransportFailure::classify(&err),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Signing
// ============================================================================

/// Public/private key pair issued by Lyyti.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub public_key: String,
    pub private_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Both keys are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Compute the request signature for `path` at `timestamp`.
pub fn sign(credentials: &Credentials, timestamp: i64, path: &str) -> Result<String, ApiError> {
    let message = BASE64.encode(format!(
        "{},{},{}",
        credentials.public_key, timestamp, path
    ));
    let mut mac = HmacSha256::new_from_slice(credentials.private_key.as_bytes())
        .map_err(|e| ApiError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Value of the `Authorization` header.
pub fn authorization_header(
    credentials: &Credentials,
    timestamp: i64,
    path: &str,
) -> Result<String, ApiError> {
    let signature = sign(credentials, timestamp, path)?;
    Ok(format!(
        "LYYTI-API-V2 public_key={}, timestamp={}, signature={}",
        credentials.public_key, timestamp, signature
    ))
}

// ============================================================================
// Response helpers
// ============================================================================

/// API path listing the participants of an event, filtered by status.
pub fn participants_path(eid: &str, status: &str) -> String {
    format!("events/{eid}/participants?status={status}")
}

/// Extract a non-negative `results_count` from a response body.
///
/// Accepts a JSON integer or a numeric string.
pub fn results_count(body: &Value) -> Option<u64> {
    match body.get("results_count")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the Lyyti API.
#[derive(Debug, Clone)]
pub struct LyytiClient {
    client: Client,
    base_url: String,
}

impl LyytiClient {
    /// Create a client against `base_url` with default HTTP settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("lyyti-participant-counts/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for a relative API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Signed GET request.
    pub async fn get(&self, credentials: &Credentials, path: &str) -> Result<Value, ApiError> {
        self.call(credentials, path, Method::GET, None).await
    }

    /// Signed request, timestamped now.
    pub async fn call(
        &self,
        credentials: &Credentials,
        path: &str,
        method: Method,
        payload: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.call_at(credentials, path, method, payload, Utc::now().timestamp())
            .await
    }

    /// Signed request with an explicit unix timestamp.
    ///
    /// Makes exactly one HTTP call with the requested method. A payload is
    /// only sent for non-GET methods. The response body is parsed as JSON and
    /// returned as-is, whatever the status code; a body that is not JSON
    /// yields `Value::Null`.
    pub async fn call_at(
        &self,
        credentials: &Credentials,
        path: &str,
        method: Method,
        payload: Option<&Value>,
        timestamp: i64,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        debug!(method = %method, url = %url, "Calling Lyyti API");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCEPT, ACCEPT_JSON)
            .header(
                AUTHORIZATION,
                authorization_header(credentials, timestamp, path)?,
            );

        if let Some(payload) = payload.filter(|_| method != Method::GET) {
            let content_type = if method == Method::PATCH {
                CONTENT_TYPE_MERGE_PATCH
            } else {
                CONTENT_TYPE_JSON
            };
            request = request
                .header(CONTENT_TYPE, content_type)
                .body(serde_json::to_vec(payload)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(status = %status, path = %path, "Lyyti API returned non-success status");
        }

        Ok(serde_json::from_slice(&body).unwrap_or_else(|e| {
            debug!(error = %e, "Lyyti API response is not JSON");
            Value::Null
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::new("pub-key", "priv-key")
    }

    fn client_for(server: &MockServer) -> LyytiClient {
        LyytiClient::new(format!("{}/v2/", server.uri())).unwrap()
    }

    #[test]
    fn test_sign_is_deterministic() {
        let path = participants_path("123", "reactedyes,show");
        let first = sign(&credentials(), 1_700_000_000, &path).unwrap();
        let second = sign(&credentials(), 1_700_000_000, &path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        assert_ne!(first, sign(&credentials(), 1_700_000_001, &path).unwrap());
        assert_ne!(
            first,
            sign(&Credentials::new("pub-key", "other"), 1_700_000_000, &path).unwrap()
        );
    }

    #[test]
    fn test_sign_matches_manual_hmac() {
        let message = BASE64.encode("pub-key,42,events/1/participants?status=show");
        let mut mac = HmacSha256::new_from_slice(b"priv-key").unwrap();
        mac.update(message.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        let signature = sign(&credentials(), 42, "events/1/participants?status=show").unwrap();
        assert_eq!(signature, expected);
    }

    #[test]
    fn test_authorization_header_format() {
        let header = authorization_header(&credentials(), 42, "events").unwrap();
        let signature = sign(&credentials(), 42, "events").unwrap();
        assert_eq!(
            header,
            format!("LYYTI-API-V2 public_key=pub-key, timestamp=42, signature={signature}")
        );
    }

    #[test]
    fn test_results_count_extraction() {
        assert_eq!(results_count(&json!({"results_count": 42})), Some(42));
        assert_eq!(results_count(&json!({"results_count": 0})), Some(0));
        assert_eq!(results_count(&json!({"results_count": "17"})), Some(17));
        assert_eq!(results_count(&json!({"results_count": -1})), None);
        assert_eq!(results_count(&json!({"results_count": 1.5})), None);
        assert_eq!(results_count(&json!({"results_count": null})), None);
        assert_eq!(results_count(&json!({})), None);
        assert_eq!(results_count(&Value::Null), None);
    }

    #[test]
    fn test_endpoint_joining() {
        let client = LyytiClient::new("https://api.lyyti.com/v2/").unwrap();
        assert_eq!(
            client.endpoint("events/1/participants?status=show"),
            "https://api.lyyti.com/v2/events/1/participants?status=show"
        );

        let client = LyytiClient::new("http://localhost:8080/v2").unwrap();
        assert_eq!(client.endpoint("/events"), "http://localhost:8080/v2/events");
    }

    #[test]
    fn test_credentials_debug_redacts_private_key() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("pub-key"));
        assert!(!debug.contains("priv-key"));
    }

    #[tokio::test]
    async fn test_get_sends_signed_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/events/123/participants"))
            .and(query_param("status", "reactedyes,show"))
            .and(header("accept", "application/json; charset=utf-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results_count": 42})))
            .expect(1)
            .mount(&server)
            .await;

        let api_path = participants_path("123", "reactedyes,show");
        let body = client_for(&server)
            .call_at(&credentials(), &api_path, Method::GET, None, 1_700_000_000)
            .await
            .unwrap();
        assert_eq!(body, json!({"results_count": 42}));

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(
            auth,
            authorization_header(&credentials(), 1_700_000_000, &api_path).unwrap()
        );
        assert!(requests[0].headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_get_ignores_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let payload = json!({"ignored": true});
        client_for(&server)
            .call(&credentials(), "events", Method::GET, Some(&payload))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
        assert!(requests[0].headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_patch_uses_merge_patch_content_type() {
        let server = MockServer::start().await;
        let payload = json!({"title": "Renamed"});
        Mock::given(method("PATCH"))
            .and(path("/v2/events/9"))
            .and(header("content-type", "application/merge-patch+json"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .call(&credentials(), "events/9", Method::PATCH, Some(&payload))
            .await
            .unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_post_uses_json_content_type() {
        let server = MockServer::start().await;
        let payload = json!({"name": "Guest"});
        Mock::given(method("POST"))
            .and(path("/v2/events/9/participants"))
            .and(header("content-type", "application/json; charset=utf-8"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .call(&credentials(), "events/9/participants", Method::POST, Some(&payload))
            .await
            .unwrap();
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn test_error_status_body_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid signature"})),
            )
            .mount(&server)
            .await;

        let body = client_for(&server).get(&credentials(), "events").await.unwrap();
        assert_eq!(body["error"], "invalid signature");
        assert_eq!(results_count(&body), None);
    }

    #[tokio::test]
    async fn test_method_without_payload_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/events/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server)
            .call(&credentials(), "events/9", Method::DELETE, None)
            .await
            .unwrap();
        assert_eq!(body["deleted"], true);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.is_empty());
        assert!(requests[0].headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_non_json_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
            .mount(&server)
            .await;

        let body = client_for(&server).get(&credentials(), "events").await.unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = LyytiClient::new("http://127.0.0.1:1/v2/").unwrap();
        let err = client.get(&credentials(), "events").await.unwrap_err();

        match &err {
            ApiError::Transport { failure, message } => {
                assert_eq!(*failure, TransportFailure::Connect);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), Some(2));
    }
}
