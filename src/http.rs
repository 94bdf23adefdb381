use std::time::Duration;

use log::debug;
use reqwest::{Client, Response};

use crate::error::{Error, Result};

/// Browser identification presented to YouTube and to generic web pages.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Client for YouTube and the hosted model: default TLS verification.
pub fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?)
}

/// Client for arbitrary web pages: certificate verification is disabled so
/// sites with self-signed or expired certificates can still be read.
pub fn insecure_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()?)
}

/// Turn a non-success status into `Error::Http` (or `Error::Restricted` for 451).
pub fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    debug!("{url} returned {status}");
    if status.as_u16() == 451 {
        return Err(Error::Restricted(format!("{url} is unavailable for legal reasons")));
    }
    Err(Error::Http { status, url })
}
