//! HTTP transport backed by reqwest

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_CHARSET, DATE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};
use url::Url;

use crate::config::TransportConfig;
use crate::error::{DereferenceError, TransportError, TransportResult};
use crate::transport::{Accept, Dereferenced, Transport};

/// `Date` header format (RFC 1123, always UTC)
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// HTTP transport performing one bounded GET per dereference
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Pre-validated user agent
    user_agent: HeaderValue,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: &TransportConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, config)
    }

    /// Create HTTP transport with custom client
    pub fn with_client(client: Client, config: &TransportConfig) -> TransportResult<Self> {
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            TransportError::Client(format!("Invalid user agent {:?}: {}", config.user_agent, e))
        })?;

        Ok(Self { client, user_agent })
    }

    /// Headers sent with every request
    pub fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        let date = Utc::now().format(DATE_FORMAT).to_string();
        if let Ok(date) = HeaderValue::from_str(&date) {
            headers.insert(DATE, date);
        }
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers
    }

    /// Headers for a request with the given `Accept` selection
    pub fn request_headers(&self, accept: Accept) -> HeaderMap {
        let mut headers = self.default_headers();
        if let Some(media_type) = accept.header_value() {
            headers.insert(ACCEPT, HeaderValue::from_static(media_type));
        }
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, iri: &str, accept: Accept) -> TransportResult<Dereferenced> {
        let url = Url::parse(iri).map_err(|source| TransportError::InvalidUrl {
            iri: iri.to_string(),
            source,
        })?;

        info!("GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(self.request_headers(accept))
            .send()
            .await
            .map_err(|e| TransportError::request(iri, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} returned {}", iri, status);
            return Ok(Dereferenced::Rejected(DereferenceError::new(status, iri)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::request(iri, e))?;
        let object = serde_json::from_slice(&body).map_err(|source| TransportError::Body {
            iri: iri.to_string(),
            source,
        })?;

        debug!("GET {} returned {} ({} bytes)", iri, status, body.len());
        Ok(Dereferenced::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn transport() -> HttpTransport {
        HttpTransport::new(&TransportConfig::default()).unwrap()
    }

    #[test]
    fn test_default_headers() {
        let headers = transport().default_headers();

        assert_eq!(headers[ACCEPT_CHARSET], "utf-8");
        assert_eq!(headers[USER_AGENT], "ap-testsuite");
        assert!(!headers.contains_key(ACCEPT));

        let date = headers[DATE].to_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(date, DATE_FORMAT).is_ok());
    }

    #[test]
    fn test_request_headers_accept() {
        let transport = transport();

        let headers = transport.request_headers(Accept::ActivityStreams);
        assert_eq!(headers[ACCEPT], "application/activity+json");

        let headers = transport.request_headers(Accept::LinkedDataProfile);
        assert_eq!(
            headers[ACCEPT],
            r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#
        );

        let headers = transport.request_headers(Accept::Default);
        assert!(!headers.contains_key(ACCEPT));
    }

    #[test]
    fn test_invalid_user_agent() {
        let config = TransportConfig {
            user_agent: "bad\nagent".to_string(),
            ..TransportConfig::default()
        };
        assert!(HttpTransport::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = transport().get("not a url", false).await;
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }
}
