use anyhow::Context;
use nextform_config::ApiConfig;
use nextform_extern_impl::{
    contact::{ContactApiServiceConfig, ContactApiServiceImpl},
    http::HttpClient,
};
use tracing::info;

/// Create the client of the contact endpoint
pub fn connect(config: &ApiConfig) -> anyhow::Result<ContactApiServiceImpl> {
    let client =
        HttpClient::new(config.timeout.map(Into::into)).context("Failed to create HTTP client")?;
    let config = ContactApiServiceConfig::new(&config.base_url)?;
    info!(endpoint = %config.endpoint(), "Using contact endpoint");
    Ok(ContactApiServiceImpl::new(config, client))
}
