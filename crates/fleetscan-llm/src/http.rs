//! HTTP plumbing shared by the vendor adapters.

use crate::error_parsing::error_for_status;
use crate::provider::{ProviderConfig, ProviderResult};

/// Build a client with the configured request and connect timeouts.
pub(crate) fn build_client(config: &ProviderConfig) -> ProviderResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()?)
}

/// Send `request` and return the body of a 2xx response.
///
/// Non-success statuses become [`crate::ProviderError`] values via
/// [`error_for_status`]; transport failures convert through `From`.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> ProviderResult<String> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(status.as_u16(), &body));
    }
    Ok(response.text().await?)
}
