//! HTTP transport with redirect protection
//!
//! Redirects are followed by hand so that credentials are only attached
//! while the request stays on the origin it started on. Asset downloads on
//! GitHub redirect to a storage host, which therefore never sees the token.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, HeaderMap, LINK, LOCATION, RETRY_AFTER};
use std::time::Duration;
use url::Url;

use crate::credentials::ScopedCredentials;
use crate::error::{RepoError, Result};

/// `User-Agent` sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("warehub/", env!("CARGO_PKG_VERSION"));

/// `Accept` for GitHub REST API listings
pub const API_ACCEPT: &str = "application/vnd.github+json";

/// `Accept` asking the API to serve an asset's bytes
pub const ASSET_ACCEPT: &str = "application/octet-stream";

const MAX_REDIRECTS: u32 = 10;

/// Default wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER: u64 = 60;

/// Secure HTTP client wrapper with redirect protection
pub struct SecureHttpClient {
    client: reqwest::Client,
    credentials: ScopedCredentials,
    timeout: Duration,
}

impl SecureHttpClient {
    /// Create a new secure HTTP client
    pub fn new(credentials: ScopedCredentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            // Redirects are handled manually to keep credentials on-origin
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            credentials,
            timeout,
        })
    }

    /// Create without credentials (public repositories)
    pub fn public(timeout: Duration) -> Result<Self> {
        Self::new(ScopedCredentials::default(), timeout)
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a URL with secure redirect handling, mapping error statuses
    /// onto [`RepoError`]
    pub async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let original_url = url.to_string();
        let mut current_url = original_url.clone();
        let mut redirects = 0;

        loop {
            let mut request = self.client.get(&current_url).header(ACCEPT, accept);

            if ScopedCredentials::same_origin(&original_url, &current_url) {
                if let Some(creds) = self.credentials.for_url(&current_url) {
                    request = request.header(AUTHORIZATION, creds.auth_header());
                }
            } else {
                tracing::debug!(
                    from = %original_url,
                    to = %current_url,
                    "cross-origin redirect, credentials not forwarded"
                );
            }

            let response = request.send().await.map_err(|e| self.send_error(e))?;
            let status = response.status();

            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(RepoError::NetworkError {
                        message: format!("Too many redirects (max {})", MAX_REDIRECTS),
                    });
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| RepoError::NetworkError {
                        message: "Redirect without Location header".to_string(),
                    })?;

                let base = Url::parse(&current_url)?;
                current_url = base.join(location)?.to_string();
                continue;
            }

            if let Some(err) = rate_limit_error(status, response.headers()) {
                return Err(err);
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(RepoError::Authentication {
                    url: current_url,
                    status: status.as_u16(),
                });
            }

            if !status.is_success() {
                return Err(RepoError::HttpError {
                    status: status.as_u16(),
                    message: format!("Request to {} failed", current_url),
                });
            }

            return Ok(response);
        }
    }

    /// Stream a body into `sink` chunk by chunk, refusing anything larger
    /// than `limit` bytes. Returns the number of bytes delivered.
    pub async fn download_capped<F>(&self, url: &str, accept: &str, limit: u64, mut sink: F) -> Result<u64>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut response = self.get(url, accept).await?;

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(RepoError::AssetTooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.send_error(e))? {
            received += chunk.len() as u64;
            if received > limit {
                return Err(RepoError::AssetTooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
            sink(&chunk)?;
        }
        Ok(received)
    }

    fn send_error(&self, e: reqwest::Error) -> RepoError {
        if e.is_timeout() {
            RepoError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            RepoError::from(e)
        }
    }
}

/// GitHub signals exhaustion with 429, or with 403 and a zero
/// `x-ratelimit-remaining`
fn rate_limit_error(status: StatusCode, headers: &HeaderMap) -> Option<RepoError> {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(RepoError::RateLimited {
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
        });
    }

    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    if status == StatusCode::FORBIDDEN && exhausted {
        let until_reset = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|reset| reset.saturating_sub(chrono::Utc::now().timestamp()).max(1) as u64);
        return Some(RepoError::RateLimited {
            retry_after: retry_after.or(until_reset).unwrap_or(DEFAULT_RETRY_AFTER),
        });
    }

    None
}

/// Target of the `rel="next"` entry in a `Link` header
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
