use crate::config::HttpConfig;
use crate::error::{QueryError, QueryResult, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::time::Duration;

/// One client shared by all portal adapters for the whole run.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Turns a non-2xx response into [`QueryError::Status`].
pub fn ensure_success(resp: reqwest::Response) -> QueryResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(QueryError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}
