//! HTTP Proxy Client.
//!
//! Issues outbound requests through an upstream scraping proxy that rotates
//! IPs and optionally pins a session via `session_id`. Every response's
//! synthetic cookie-jar header (`Zr-Cookies`) is parsed into a plain
//! name→value map and merged into whatever cookie map the caller already
//! holds — the caller decides how to fold `cookie_delta` into its own
//! state, this client never retains anything between calls.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ProxyError;

const COOKIE_HEADER_NAME: &str = "zr-cookies";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMethod {
    Get,
    Put,
    Post,
}

impl ProxyMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            ProxyMethod::Get => reqwest::Method::GET,
            ProxyMethod::Put => reqwest::Method::PUT,
            ProxyMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Result of a single proxied call ( contract).
pub struct ProxyResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Parsed `Zr-Cookies` response header, empty if the proxy sent none.
    pub cookie_delta: HashMap<String, String>,
}

#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    proxy_endpoint: String,
    api_key: String,
}

impl ProxyClient {
    /// Build a client pointed at `proxy_endpoint`, authenticating with
    /// `api_key`. Uses a 30 s default per-call timeout.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` cannot be constructed
    /// (only possible from a malformed TLS backend config).
    #[must_use]
    pub fn new(proxy_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(proxy_endpoint, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn with_timeout(
        proxy_endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build proxy HTTP client");
        Self {
            http,
            proxy_endpoint: proxy_endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Issue one proxied request. Retries are caller-driven — this method
    /// performs exactly one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Network`] on transport failure,
    /// [`ProxyError::UpstreamStatus`] on a non-2xx response from the proxy
    /// itself (the proxied target's own status is relayed in `body`/`status`
    /// and is not treated as a transport error here).
    pub async fn request(
        &self,
        method: ProxyMethod,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ProxyResponse, ProxyError> {
        let mut request = self
            .http
            .request(method.as_reqwest(), &self.proxy_endpoint)
            .query(&[("apikey", self.api_key.as_str()), ("url", url), ("custom_headers", "true")]);

        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", session_id)]);
        }

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                header_map.insert(name, value);
            }
        }
        request = request.headers(header_map);

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.as_str().to_lowercase(), value.to_string());
            }
        }

        let cookie_delta = response_headers
            .get(COOKIE_HEADER_NAME)
            .map(|raw| parse_cookie_header(raw))
            .unwrap_or_default();

        // A 5xx here means the proxy itself (not the proxied target) failed —
        // e.g. quota exhaustion or an upstream-unreachable condition the proxy
        // reports as its own status. Target-side 4xx (like BigBasket's stale
        // "buildId" 404) is meaningful to the caller and passed through as a
        // normal `status`, not an error.
        if status >= 500 {
            return Err(ProxyError::UpstreamStatus {
                status,
                url: url.to_string(),
            });
        }

        let body_text = response.text().await?;

        Ok(ProxyResponse {
            status,
            headers: response_headers,
            body: body_text,
            cookie_delta,
        })
    }
}

/// Parse a `key1=value1; key2=value2` cookie header into a map. Grounded on
/// `universal_function.py::parse_cookies`; malformed pairs are skipped
/// rather than failing the whole parse.
#[must_use]
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.trim();
            let value = parts.next()?.trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}

/// Serialize a cookie map back into a `key1=value1; key2=value2` header
/// value. Grounded on `universal_function.py::dict_to_cookie_string`.
#[must_use]
pub fn cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    pairs.join("; ")
}
