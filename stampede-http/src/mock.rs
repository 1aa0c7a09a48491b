//! Offline transport with canned responses
//!
//! Mirrors the shape of [`WebTransport`](crate::transport::WebTransport) but
//! serves queued responses keyed by `"METHOD:path"` and records every call,
//! so the session engine can run without a server. When several responses
//! are queued for one key they are consumed in order; the last one is
//! retained and replayed for any further calls.

use crate::errors::HttpError;
use crate::transport::{HttpResponse, Transport};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// One call observed by the mock, in issue order
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Option<JsonValue>,
}

/// Transport serving canned responses, for offline runs and tests
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response for `"METHOD:path"`
    pub fn on(&self, method: &str, path: &str, response: HttpResponse) {
        let key = format!("{}:{}", method, path);
        debug!("Adding mock response for {}", key);
        self.responses
            .lock()
            .expect("mock state poisoned")
            .entry(key)
            .or_default()
            .push_back(response);
    }

    /// Queue a 200 response whose body is the serialized JSON value
    pub fn on_json(&self, method: &str, path: &str, body: JsonValue) {
        self.on(
            method,
            path,
            HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: body.to_string(),
            },
        );
    }

    /// Queue a 200 response with a raw text body
    pub fn on_text(&self, method: &str, path: &str, body: &str) {
        self.on(
            method,
            path,
            HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: body.to_string(),
            },
        );
    }

    /// Queue an empty response with the given status code
    pub fn on_status(&self, method: &str, path: &str, status: u16) {
        self.on(
            method,
            path,
            HttpResponse {
                status,
                headers: HashMap::new(),
                body: String::new(),
            },
        );
    }

    /// Every call issued so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock state poisoned").clone()
    }

    fn dispatch(
        &self,
        method: &str,
        path: &str,
        body: Option<JsonValue>,
    ) -> Result<HttpResponse, HttpError> {
        self.calls
            .lock()
            .expect("mock state poisoned")
            .push(RecordedCall {
                method: method.to_string(),
                path: path.to_string(),
                body,
            });

        let key = format!("{}:{}", method, path);
        let mut responses = self.responses.lock().expect("mock state poisoned");
        let queue = responses
            .get_mut(&key)
            .ok_or_else(|| HttpError::MockMissing(key.clone()))?;

        // Keep the final queued response around for repeated calls
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or(HttpError::MockMissing(key))
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        path: &str,
        _query: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        self.dispatch("GET", path, None)
    }

    async fn post_json(&self, path: &str, body: &JsonValue) -> Result<HttpResponse, HttpError> {
        self.dispatch("POST", path, Some(body.clone()))
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let body = JsonValue::Object(
            form.iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        );
        self.dispatch("POST", path, Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_serves_and_records() {
        let mock = MockTransport::new();
        mock.on_json("GET", "/web", json!({"ok": true}));

        let response = mock.get("/web", &[]).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap()["ok"], true);

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].path, "/web");
    }

    #[tokio::test]
    async fn test_mock_replays_last_response() {
        let mock = MockTransport::new();
        mock.on_status("POST", "/web/action/run", 200);

        for _ in 0..3 {
            let response = mock.post_json("/web/action/run", &json!({})).await.unwrap();
            assert_eq!(response.status, 200);
        }
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_consumes_queue_in_order() {
        let mock = MockTransport::new();
        mock.on_status("GET", "/web", 302);
        mock.on_status("GET", "/web", 200);

        assert_eq!(mock.get("/web", &[]).await.unwrap().status, 302);
        assert_eq!(mock.get("/web", &[]).await.unwrap().status, 200);
        assert_eq!(mock.get("/web", &[]).await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_mock_missing_response_is_an_error() {
        let mock = MockTransport::new();
        assert!(matches!(
            mock.get("/nowhere", &[]).await,
            Err(HttpError::MockMissing(_))
        ));
    }
}
