//! Transport trait and the reqwest-backed implementation
//!
//! Each virtual user owns one transport instance. Cookies set by the server
//! (the session cookie in particular) persist across calls for the lifetime
//! of that instance, which is what makes the bootstrap sequence and every
//! later RPC call land in the same authenticated server session.

use crate::config::HttpConfig;
use crate::errors::HttpError;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// One HTTP exchange as seen by the core: status, headers, raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue, HttpError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Request-execution interface consumed by the session engine.
///
/// Implementations must persist cookies across calls for one instance.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request with optional query parameters
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<HttpResponse, HttpError>;

    /// Issue a POST request with a JSON body
    async fn post_json(&self, path: &str, body: &JsonValue) -> Result<HttpResponse, HttpError>;

    /// Issue a POST request with a form-encoded body
    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, HttpError>;
}

/// Transport backed by a reqwest client with a per-instance cookie store
#[derive(Debug, Clone)]
pub struct WebTransport {
    client: Client,
    base: Url,
}

impl WebTransport {
    /// Create a transport rooted at `base_url` with the given settings
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self, HttpError> {
        let base = Url::parse(base_url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        debug!(
            "Creating WebTransport for {} with timeout: {}s",
            base,
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()?;

        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn finish(
        &self,
        response: reqwest::Response,
    ) -> Result<HttpResponse, HttpError> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        info!("HTTP response received: {}", status);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait::async_trait]
impl Transport for WebTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.finish(response).await
    }

    async fn post_json(&self, path: &str, body: &JsonValue) -> Result<HttpResponse, HttpError> {
        let url = self.url(path)?;
        debug!("POST {} (json)", url);
        let response = self.client.post(url).json(body).send().await?;
        self.finish(response).await
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let url = self.url(path)?;
        debug!("POST {} (form)", url);
        let response = self.client.post(url).form(form).send().await?;
        self.finish(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let mut response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(response.is_success());

        response.status = 302;
        assert!(!response.is_success());

        response.status = 500;
        assert!(!response.is_success());
    }

    #[test]
    fn test_response_json_parsing() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: r#"{"result": 7}"#.to_string(),
        };
        assert_eq!(response.json().unwrap()["result"], 7);

        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: "<html></html>".to_string(),
        };
        assert!(response.json().is_err());
    }

    #[test]
    fn test_transport_rejects_bad_base_url() {
        assert!(WebTransport::new("not a url", &HttpConfig::default()).is_err());
    }
}
