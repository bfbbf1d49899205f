//! Shared HTTP plumbing for the API clients.

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{FetchError, Result};

pub(crate) fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .build()?;
    Ok(client)
}

/// Send `request` and return the body text, turning non-2xx responses into
/// [`FetchError::Status`].  Decoding is left to the client's `parse_*`.
pub(crate) async fn get_body(request: RequestBuilder, source_name: &str) -> Result<String> {
    let response = request.send().await?;
    let status = response.status();
    debug!(source = source_name, %status, url = %response.url(), "response");
    if !status.is_success() {
        return Err(FetchError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Attach a bearer token when there is one.
pub(crate) fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
