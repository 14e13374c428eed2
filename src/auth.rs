//! Auth Client (spec §4.2).
//!
//! Exchanges an API key for a short-lived bearer token via a single HTTP
//! GET. A 401 is fatal and is never retried; 5xx and transport errors are
//! retried with backoff up to three attempts before being surfaced to the
//! Connection Manager as a transient failure.

use std::time::Duration;

use crate::constants::CLIENT_INFORMATION;
use crate::error::{IntrinioError, Result};
use crate::provider::ProviderProfile;

/// Maximum retry attempts for transient auth failures (spec §4.2).
const MAX_AUTH_ATTEMPTS: u32 = 3;

/// A fetched bearer token.
///
/// Tokens are consumed exactly once per dial (spec §3 Lifecycle); the
/// `fetched_at` timestamp lets the Connection Manager decide whether to
/// re-auth before attempting to reuse a connection.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub fetched_at: std::time::Instant,
}

impl Token {
    /// Vendor tokens are valid for roughly seven days; anything older than
    /// six is treated as stale and forces re-auth on next connect
    /// (spec §3: "a stale token triggers re-auth on next connect").
    pub fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() > Duration::from_secs(6 * 24 * 60 * 60)
    }
}

/// Fetches bearer tokens from the vendor auth endpoint for a given
/// provider profile.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    api_key: String,
}

impl AuthClient {
    /// Build a new auth client for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// `fetchToken(apiKey) -> (token, expiryHint)` (spec §4.2).
    ///
    /// Retries transient failures (5xx, network errors) with a short linear
    /// backoff; a 401 response is returned immediately as
    /// [`IntrinioError::Auth`] and never retried.
    pub async fn fetch_token(&self, profile: &ProviderProfile) -> Result<Token> {
        self.fetch_token_from_url(&profile.auth_url(&self.api_key))
            .await
    }

    /// Same as [`fetch_token`](Self::fetch_token) but against an explicit
    /// URL, bypassing `ProviderProfile`'s https-only scheme. Exposed so
    /// tests can point at a plain-HTTP fake server.
    pub async fn fetch_token_from_url(&self, url: &str) -> Result<Token> {
        let mut last_err = None;

        for attempt in 1..=MAX_AUTH_ATTEMPTS {
            match self.try_fetch(url).await {
                Ok(token) => return Ok(token),
                Err(IntrinioError::Auth(msg)) => {
                    tracing::error!(%msg, "authentication rejected, not retrying");
                    return Err(IntrinioError::Auth(msg));
                }
                Err(other) => {
                    tracing::warn!(attempt, error = %other, "transient auth failure, retrying");
                    last_err = Some(other);
                    if attempt < MAX_AUTH_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| IntrinioError::Auth("auth retries exhausted".to_owned())))
    }

    async fn try_fetch(&self, url: &str) -> Result<Token> {
        let resp = self
            .http
            .get(url)
            .header("Client-Information", CLIENT_INFORMATION)
            .send()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(IntrinioError::Auth(format!(
                "vendor rejected API key (HTTP {status})"
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntrinioError::TransientNetwork(format!(
                "HTTP {status}: {body}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IntrinioError::TransientNetwork(e.to_string()))?;
        Ok(Token {
            value: body.trim().to_owned(),
            fetched_at: std::time::Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_not_stale_when_fresh() {
        let token = Token {
            value: "abc".to_owned(),
            fetched_at: std::time::Instant::now(),
        };
        assert!(!token.is_stale());
    }

    #[tokio::test]
    async fn fetch_token_rejects_401_without_retry() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let body = "Unauthorized";
            let resp = format!(
                "HTTP/1.1 401 Unauthorized\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(resp.as_bytes()).await.unwrap();
        });

        let client = AuthClient::new("bad-key");
        let err = client
            .fetch_token_from_url(&format!("http://{addr}/auth?api_key=bad-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntrinioError::Auth(_)));

        server.await.unwrap();
    }
}
