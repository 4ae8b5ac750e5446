//! BaseX-style REST document store over HTTP

use crate::query::query_envelope;
use crate::store::{DocumentStore, StoreError, StoreResult};
use ineosync_core::{RecordKind, StoreConfig};
use reqwest::Client;
use tracing::{debug, error};

pub struct BasexStore {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    content_type: String,
}

impl BasexStore {
    pub fn new(base_url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            content_type: "application/xml".to_string(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.base_url, &config.user, &config.password)
            .with_content_type(&config.content_type)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// REST endpoint of the database holding records of `kind`.
    pub fn endpoint(&self, kind: RecordKind) -> String {
        format!("{}/rest/{}", self.base_url, kind)
    }
}

#[async_trait::async_trait]
impl DocumentStore for BasexStore {
    fn name(&self) -> &str {
        "basex"
    }

    async fn execute(&self, kind: RecordKind, query: &str) -> StoreResult<String> {
        let url = self.endpoint(kind);
        debug!("Store query: {} ({} bytes)", url, query.len());

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header("content-type", &self.content_type)
            .body(query_envelope(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Store error {} on {}: {}", status, url, body);
            return Err(StoreError::request_failed(status.as_u16(), body));
        }

        Ok(body)
    }
}
