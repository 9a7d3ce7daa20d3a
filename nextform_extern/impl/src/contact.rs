use std::sync::Arc;

use anyhow::Context;
use nextform_extern_contracts::{ContactApiError, ContactApiService};
use nextform_models::contact::ContactFormData;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

const CONTACT_ROUTE: &str = "api/contact";

#[derive(Debug, Clone)]
pub struct ContactApiServiceImpl {
    config: ContactApiServiceConfig,
    client: HttpClient,
}

#[derive(Debug, Clone)]
pub struct ContactApiServiceConfig {
    endpoint: Arc<Url>,
}

impl ContactApiServiceConfig {
    /// Derive the contact endpoint from the base url of the backend. A path
    /// on the base url is kept, so `https://host/prefix` resolves to
    /// `https://host/prefix/api/contact`.
    pub fn new(base_url: &Url) -> anyhow::Result<Self> {
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let endpoint = base_url
            .join(CONTACT_ROUTE)
            .with_context(|| format!("Invalid api base url: {base_url}"))?;

        Ok(Self {
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ContactApiServiceImpl {
    pub fn new(config: ContactApiServiceConfig, client: HttpClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ContactApiServiceConfig {
        &self.config
    }
}

impl ContactApiService for ContactApiServiceImpl {
    async fn submit(&self, form: &ContactFormData) -> Result<(), ContactApiError> {
        debug!(endpoint = %self.config.endpoint, "Submitting contact form");

        let response = self
            .client
            .post((*self.config.endpoint).clone())
            .json(form)
            .send()
            .await
            .context("Failed to send contact form")?;

        let status = response.status();
        if status.is_success() {
            let body = response.json::<serde_json::Value>().await.ok();
            debug!(?body, "Contact form accepted");
            return Ok(());
        }

        let detail = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(ErrorResponse::into_detail);

        Err(ContactApiError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Only a plain string is shown to the user. Structured details (e.g. a
    /// list of validation issues) are dropped.
    fn into_detail(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(detail) => Some(detail),
            _ => None,
        }
    }
}
