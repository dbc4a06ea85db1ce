use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::types::TransportConfig;
use crate::error::{GatewayError, Result};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// How a transport authenticates against its upstream.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    /// API-marketplace style key plus host header.
    RapidApi { key: String, host: String },
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::RapidApi { host, .. } => write!(f, "RapidApi {{ host: {host}, key: <redacted> }}"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl Credentials {
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match self {
            Self::None => {}
            Self::RapidApi { key, host } => {
                headers.insert(
                    HeaderName::from_static("x-rapidapi-key"),
                    header_value("X-RapidAPI-Key", key)?,
                );
                headers.insert(
                    HeaderName::from_static("x-rapidapi-host"),
                    header_value("X-RapidAPI-Host", host)?,
                );
            }
            Self::Bearer(token) => {
                let mut value = header_value("Authorization", &format!("Bearer {token}"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        GatewayError::Configuration(format!("{name} contains characters not allowed in a header"))
    })
}

/// A decoded upstream reply, kept regardless of status.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Keep the body of a 2xx reply, otherwise turn the reply into an HTTP error.
    pub fn into_success(self, service: &str) -> Result<Value> {
        if self.is_success() {
            return Ok(self.body);
        }
        Err(GatewayError::Http {
            service: service.to_string(),
            status: self.status,
            reason: upstream_message(&self.body)
                .unwrap_or_else(|| format!("upstream returned HTTP {}", self.status)),
        })
    }
}

/// Best-effort human message from an error body (envelope, flat or plain text).
fn upstream_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("error").filter(|e| e.is_string()))
        .or_else(|| body.as_str().map(|_| body))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}

/// JSON-over-HTTP client bound to one upstream (a provider or the proxy).
///
/// Reads are retried on connection failures, `429` and `5xx`, never on a
/// timeout; writes are sent once.
pub struct HttpTransport {
    http: Client,
    service: String,
    base_url: String,
    read_retries: u32,
}

impl HttpTransport {
    pub fn new(
        service: impl Into<String>,
        base_url: &str,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self> {
        let service = service.into();
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(credentials.headers()?)
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!("cannot build HTTP client for {service}: {e}"))
            })?;

        Ok(Self {
            http,
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            read_retries: config.read_retries,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Url>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key.as_ref(), value.as_ref());
            }
        }
        Ok(url)
    }

    /// Idempotent GET returning the decoded body of a 2xx reply.
    pub async fn get_json<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.url(path, query)?;

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = RETRY_BACKOFF * attempt;
                debug!(service = %self.service, attempt, delay_ms = delay.as_millis(), "Retrying read");
                tokio::time::sleep(delay).await;
            }

            let outcome = match self.send(Method::GET, &url, None).await {
                Ok(response) => response.into_success(&self.service),
                Err(e) => Err(e),
            };

            match outcome {
                Err(e) if is_retryable(&e) && attempt < self.read_retries => {
                    warn!(service = %self.service, error = %e, attempt, "Read failed, will retry");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(service = %self.service, error = %e, %url, "Read failed");
                    return Err(e);
                }
                Ok(body) => return Ok(body),
            }
        }
    }

    /// POST sent exactly once, returning the decoded body of a 2xx reply.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.post(path, body)
            .await?
            .into_success(&self.service)
            .inspect_err(|e| warn!(service = %self.service, error = %e, path, "Write rejected"))
    }

    /// POST sent exactly once; non-2xx replies are returned rather than mapped
    /// so callers can read an error envelope.
    pub async fn post(&self, path: &str, body: &Value) -> Result<JsonResponse> {
        let url = self.url::<&str, &str>(path, &[])?;
        self.send(Method::POST, &url, Some(body))
            .await
            .inspect_err(|e| warn!(service = %self.service, error = %e, %url, "Write failed"))
    }

    async fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<JsonResponse> {
        debug!(service = %self.service, %method, %url, "Outbound request");

        let mut request = self.http.request(method, url.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.network_error(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.network_error(&e))?;

        debug!(service = %self.service, status, body_len = text.len(), "Response received");
        trace!(service = %self.service, body = %text, "Raw response");

        let success = (200..300).contains(&status);
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(e) if success => {
                    return Err(GatewayError::malformed(
                        &self.service,
                        format!("response is not JSON: {e}"),
                    ));
                }
                Err(_) => Value::String(text.chars().take(200).collect()),
            }
        };

        Ok(JsonResponse { status, body })
    }

    fn network_error(&self, e: &reqwest::Error) -> GatewayError {
        GatewayError::Network {
            service: self.service.clone(),
            reason: e.to_string(),
            timed_out: e.is_timeout(),
        }
    }
}

/// Percent-encode a caller-supplied id for use as a single path segment.
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

/// A timed-out read is not retried: one timeout already spent the caller's wait.
fn is_retryable(error: &GatewayError) -> bool {
    match error {
        GatewayError::Network { timed_out, .. } => !timed_out,
        GatewayError::Http { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_set_and_sensitive() {
        let headers = Credentials::Bearer("tok".into()).headers().unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok");
        assert!(auth.is_sensitive());
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn rapidapi_headers() {
        let headers = Credentials::RapidApi {
            key: "k".into(),
            host: "booking-com.p.rapidapi.com".into(),
        }
        .headers()
        .unwrap();
        assert_eq!(headers.get("x-rapidapi-key").unwrap(), "k");
        assert_eq!(
            headers.get("x-rapidapi-host").unwrap(),
            "booking-com.p.rapidapi.com"
        );
    }

    #[test]
    fn invalid_header_value_is_configuration_error() {
        let err = Credentials::Bearer("bad\nkey".into()).headers().unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let s = format!("{:?}", Credentials::Bearer("secret".into()));
        assert!(!s.contains("secret"));
    }

    #[test]
    fn url_joins_path_and_query() {
        let transport = HttpTransport::new(
            "test",
            "http://localhost:9/api/",
            &Credentials::None,
            &TransportConfig::default(),
        )
        .unwrap();
        let url = transport
            .url("/hotels/search", &[("city", "Fès"), ("guests", "2")])
            .unwrap();
        assert_eq!(url.path(), "/api/hotels/search");
        assert!(url.as_str().contains("city=F%C3%A8s"));
        assert!(url.as_str().contains("guests=2"));
    }

    #[test]
    fn path_segment_escapes_separators() {
        assert_eq!(path_segment("veh-311"), "veh-311");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn error_reply_message_extraction() {
        let envelope = serde_json::json!({
            "success": false,
            "error": { "service": "proxy", "message": "sold out", "status": 409 }
        });
        assert_eq!(upstream_message(&envelope).as_deref(), Some("sold out"));
        assert_eq!(
            upstream_message(&serde_json::json!({ "message": "nope" })).as_deref(),
            Some("nope")
        );
        assert_eq!(
            upstream_message(&Value::String("Bad Gateway".into())).as_deref(),
            Some("Bad Gateway")
        );
        assert!(upstream_message(&Value::Null).is_none());
    }

    #[test]
    fn non_success_reply_becomes_http_error() {
        let reply = JsonResponse {
            status: 404,
            body: serde_json::json!({ "message": "no such hotel" }),
        };
        match reply.into_success("hotels-provider").unwrap_err() {
            GatewayError::Http { status, reason, .. } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "no such hotel");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn retry_classification() {
        let http = |status| GatewayError::Http {
            service: "s".into(),
            status,
            reason: String::new(),
        };
        assert!(is_retryable(&http(429)));
        assert!(is_retryable(&http(503)));
        assert!(!is_retryable(&http(404)));
        assert!(!is_retryable(&GatewayError::malformed("s", "bad")));
        assert!(is_retryable(&GatewayError::Network {
            service: "s".into(),
            reason: "refused".into(),
            timed_out: false,
        }));
        assert!(!is_retryable(&GatewayError::Network {
            service: "s".into(),
            reason: "operation timed out".into(),
            timed_out: true,
        }));
    }
}
