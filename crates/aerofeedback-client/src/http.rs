//! HTTP plumbing shared by the service façades

use aerofeedback_core::config::ApiConfig;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::token::TokenStore;

/// Low-level client for the `AeroFeedback` REST backend.
///
/// Reads the bearer token from its [`TokenStore`] on every request and turns
/// non-2xx answers into [`ClientError::Api`] carrying the server's own
/// message when it sent one.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    health_path: String,
    health_timeout: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` with default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::from_config(&config, tokens)
    }

    /// Create a client from the `api` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("aerofeedback/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            health_path: config.health_path.clone(),
            health_timeout: config.health_timeout(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session token store
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request, attaching the stored bearer token if there is one
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub async fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let request = self.client.request(method, self.url(path));
        Ok(match self.tokens.load().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Send `request` and return its JSON body.
    ///
    /// A body that is not JSON is replaced by `null`. On a non-2xx status
    /// the server's `detail` or `message` becomes the error message, or
    /// `fallback` when neither is present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] for non-2xx statuses and a transport
    /// error when the request could not be completed.
    pub async fn send_json(&self, request: RequestBuilder, fallback: &str) -> ClientResult<Value> {
        let response = request.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();

        let bytes = response.bytes().await.map_err(ClientError::from_transport)?;
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);

        if status.is_success() {
            debug!(status = status.as_u16(), "Request succeeded");
            return Ok(body);
        }

        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
        Err(ClientError::api(status.as_u16(), message))
    }

    /// Issue a body-less request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send_json`].
    pub async fn call(&self, method: Method, path: &str, fallback: &str) -> ClientResult<Value> {
        debug!(%method, path, "Calling backend");
        let request = self.request(method.clone(), path).await?;
        self.send_json(request, fallback)
            .await
            .inspect_err(|e| warn!(%method, path, error = %e, "{fallback}"))
    }

    /// Issue a request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send_json`].
    pub async fn call_with_body<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(%method, path, "Calling backend");
        let request = self.request(method.clone(), path).await?.json(body);
        self.send_json(request, fallback)
            .await
            .inspect_err(|e| warn!(%method, path, error = %e, "{fallback}"))
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Network`] when the health endpoint cannot be
    /// reached within the health timeout or answers with a non-2xx status.
    pub async fn probe_health(&self) -> ClientResult<()> {
        let url = self.url(&self.health_path);
        debug!(%url, "Probing backend health");

        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(ClientError::Network(format!(
                "Health check returned {}",
                response.status()
            ))),
            Err(e) => Err(ClientError::Network(format!("Health check failed: {e}"))),
        }
    }
}

/// Pull `field` out of a response envelope and deserialize it
///
/// # Errors
///
/// Returns [`ClientError::MissingField`] when the field is absent or null,
/// and a JSON error when it has the wrong shape.
pub fn unwrap_field<T: DeserializeOwned>(mut body: Value, field: &'static str) -> ClientResult<T> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Err(ClientError::MissingField { field }),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

/// Server error text: `detail` as a string or a list of `{msg}` objects,
/// then `message`.
fn error_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;
    use aerofeedback_core::Department;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(&json!({"detail": "Form not found", "message": "ignored"})),
            Some("Form not found".to_string())
        );
        assert_eq!(
            error_message(&json!({"message": "Trainer is inactive"})),
            Some("Trainer is inactive".to_string())
        );
    }

    #[test]
    fn test_error_message_joins_validation_details() {
        let body = json!({
            "detail": [
                {"loc": ["body", "title"], "msg": "field required"},
                {"loc": ["body", "reason"], "msg": "too short"}
            ]
        });
        assert_eq!(
            error_message(&body),
            Some("field required; too short".to_string())
        );
    }

    #[test]
    fn test_error_message_absent() {
        assert_eq!(error_message(&Value::Null), None);
        assert_eq!(error_message(&json!({"detail": ""})), None);
        assert_eq!(error_message(&json!({"detail": []})), None);
    }

    #[test]
    fn test_unwrap_field() {
        let departments: Vec<Department> = unwrap_field(
            json!({"departments": [{"id": 1, "name": "Flight Operations"}]}),
            "departments",
        )
        .unwrap();
        assert_eq!(departments[0].name, "Flight Operations");

        let err = unwrap_field::<Vec<Department>>(json!({"items": []}), "departments").unwrap_err();
        assert!(matches!(err, ClientError::MissingField { field: "departments" }));

        let err = unwrap_field::<Vec<Department>>(json!({"departments": null}), "departments")
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingField { .. }));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client =
            ApiClient::new("http://localhost:8000/", Arc::new(MemoryTokenStore::new())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/forms"), "http://localhost:8000/api/forms");
    }
}
