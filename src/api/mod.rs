//! REST transport for the Rubrica API.
//!
//! `ApiClient` owns the HTTP connection pool, base URL, and credentials.
//! Every successful body is unwrapped from the `data` envelope; failed
//! responses are classified by status class so the query layer can tell a
//! rejected request apart from a broken backend.

mod error;

pub use error::{ApiError, FailureKind, FetchFailure};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use rubrica_api_types::{ApiEnvelope, Record, RecordPage, Resource};

use crate::query::ResourceGateway;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?.join("/")?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("rubrica/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(ApiError::Url)
    }

    fn resource_path(resource: Resource) -> String {
        format!("api/{}", resource.path())
    }

    fn record_path(resource: Resource, id: &str) -> String {
        format!("api/{}/{id}", resource.path())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&BTreeMap<String, String>>,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut url = self.url(path)?;
        if let Some(params) = query {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        debug!(%method, %url, "API request");

        let mut req = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            if let Ok(header) = HeaderValue::from_str(&format!("Bearer {key}")) {
                req = req.header(AUTHORIZATION, header);
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        Self::handle(resp).await
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(Self::classify(status.as_u16(), &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
    }

    /// 4xx means the server rejected the request and its state is presumed
    /// unchanged; everything else non-success is a server failure.
    fn classify(status: u16, body: &[u8]) -> ApiError {
        let message = Self::error_message(body);
        if (400..500).contains(&status) {
            ApiError::Validation { status, message }
        } else {
            ApiError::Server { status, message }
        }
    }

    /// Pull a human-readable message out of an error body. The backend
    /// sends `{"error": "..."}`, sometimes `{"error": {"message": "..."}}`;
    /// anything else falls back to the raw text.
    fn error_message(body: &[u8]) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
            let candidate = value
                .get("error")
                .map(|e| e.get("message").unwrap_or(e))
                .or_else(|| value.get("message"));
            if let Some(serde_json::Value::String(msg)) = candidate {
                return msg.clone();
            }
        }
        String::from_utf8_lossy(body).into_owned()
    }

    pub async fn list_records(
        &self,
        resource: Resource,
        params: &BTreeMap<String, String>,
    ) -> Result<RecordPage, ApiError> {
        let envelope: ApiEnvelope<RecordPage> = self
            .request(
                Method::GET,
                &Self::resource_path(resource),
                Some(params),
                None,
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_record(&self, resource: Resource, id: &str) -> Result<Record, ApiError> {
        let envelope: ApiEnvelope<Record> = self
            .request(Method::GET, &Self::record_path(resource, id), None, None)
            .await?;
        Ok(envelope.data)
    }

    pub async fn create_record(
        &self,
        resource: Resource,
        payload: &serde_json::Value,
    ) -> Result<Record, ApiError> {
        let envelope: ApiEnvelope<Record> = self
            .request(
                Method::POST,
                &Self::resource_path(resource),
                None,
                Some(payload),
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn update_record(
        &self,
        resource: Resource,
        id: &str,
        payload: &serde_json::Value,
    ) -> Result<Record, ApiError> {
        let envelope: ApiEnvelope<Record> = self
            .request(
                Method::PUT,
                &Self::record_path(resource, id),
                None,
                Some(payload),
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete_record(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        let resp = {
            let url = self.url(&Self::record_path(resource, id))?;
            debug!(%url, "API request (DELETE)");
            let mut req = self.client.request(Method::DELETE, url);
            if let Some(key) = &self.api_key {
                if let Ok(header) = HeaderValue::from_str(&format!("Bearer {key}")) {
                    req = req.header(AUTHORIZATION, header);
                }
            }
            req.send().await?
        };
        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await?;
            return Err(Self::classify(status.as_u16(), &bytes));
        }
        Ok(())
    }

    /// Box this client as the gateway the query layer consumes.
    pub fn into_gateway(self) -> Arc<dyn ResourceGateway> {
        Arc::new(self)
    }
}

impl ResourceGateway for ApiClient {
    fn list(
        &self,
        resource: Resource,
        params: BTreeMap<String, String>,
    ) -> BoxFuture<'static, Result<RecordPage, FetchFailure>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .list_records(resource, &params)
                .await
                .map_err(FetchFailure::from)
        })
    }

    fn get(
        &self,
        resource: Resource,
        id: String,
    ) -> BoxFuture<'static, Result<Record, FetchFailure>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .get_record(resource, &id)
                .await
                .map_err(FetchFailure::from)
        })
    }

    fn create(
        &self,
        resource: Resource,
        payload: serde_json::Value,
    ) -> BoxFuture<'static, Result<Record, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.create_record(resource, &payload).await })
    }

    fn update(
        &self,
        resource: Resource,
        id: String,
        payload: serde_json::Value,
    ) -> BoxFuture<'static, Result<Record, ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.update_record(resource, &id, &payload).await })
    }

    fn delete(&self, resource: Resource, id: String) -> BoxFuture<'static, Result<(), ApiError>> {
        let client = self.clone();
        Box::pin(async move { client.delete_record(resource, &id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_include_the_api_prefix() {
        assert_eq!(ApiClient::resource_path(Resource::Customers), "api/customers");
        assert_eq!(
            ApiClient::record_path(Resource::SupportTickets, "t9"),
            "api/support-tickets/t9"
        );
    }

    #[test]
    fn error_message_unwraps_known_shapes() {
        assert_eq!(
            ApiClient::error_message(br#"{"error": "bad request"}"#),
            "bad request"
        );
        assert_eq!(
            ApiClient::error_message(br#"{"error": {"message": "name taken"}}"#),
            "name taken"
        );
        assert_eq!(
            ApiClient::error_message(br#"{"message": "not found"}"#),
            "not found"
        );
        assert_eq!(ApiClient::error_message(b"plain text"), "plain text");
    }

    #[test]
    fn status_classes_map_to_error_variants() {
        assert!(ApiClient::classify(422, b"{}").is_validation());
        assert!(!ApiClient::classify(500, b"{}").is_validation());
        assert_eq!(ApiClient::classify(503, b"{}").status(), Some(503));
    }

    #[test]
    fn base_url_normalizes_to_root() {
        let client = ApiClient::new("http://localhost:3001", None, 30).expect("client");
        let url = client.url("api/customers").expect("url");
        assert_eq!(url.as_str(), "http://localhost:3001/api/customers");
    }
}
