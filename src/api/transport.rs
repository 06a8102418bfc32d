use crate::api::{
    api_structs::{TokenRequest, TokenResponse},
    rate_limit::RateLimiter
};
use reqwest::StatusCode;
use std::{collections::HashMap, time::Duration};
use thiserror::Error;
use tokio::{sync::Mutex as AsyncMutex, time::Instant};
use tracing::{debug, warn};

/// A token this close to expiry is treated as expired, so it cannot lapse
/// mid-flight.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("malformed payload: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("no credentials registered for client key '{0}'")]
    UnknownClient(String)
}

/// Client-credentials grant parameters for one client key.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String
}

struct CachedToken {
    access_token: String,
    expires_at: Instant
}

/// One cached bearer token per client key. Explicit state, constructed per
/// client instance, never process-global.
pub struct TokenCache {
    tokens: AsyncMutex<HashMap<String, CachedToken>>
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> TokenCache {
        TokenCache {
            tokens: AsyncMutex::new(HashMap::new())
        }
    }

    /// The cached token for the key, if it is still valid past the expiry
    /// margin.
    pub async fn current(&self, client_key: &str) -> Option<String> {
        let tokens = self.tokens.lock().await;
        let cached = tokens.get(client_key)?;

        if cached.expires_at.checked_sub(TOKEN_EXPIRY_MARGIN)? <= Instant::now() {
            return None;
        }

        Some(cached.access_token.clone())
    }

    pub async fn store(&self, client_key: &str, access_token: String, expires_in: u64) {
        let mut tokens = self.tokens.lock().await;
        tokens.insert(
            client_key.to_owned(),
            CachedToken {
                access_token,
                expires_at: Instant::now() + Duration::from_secs(expires_in)
            }
        );
    }
}

/// Wraps outbound HTTP calls with rate limiting, bearer-token attachment and
/// the single-refresh auth retry.
pub struct AuthorizedClient {
    http: reqwest::Client,
    limiter: RateLimiter,
    tokens: TokenCache,
    credentials: HashMap<String, Credentials>
}

impl AuthorizedClient {
    pub fn new(http: reqwest::Client, limiter: RateLimiter) -> AuthorizedClient {
        AuthorizedClient {
            http,
            limiter,
            tokens: TokenCache::new(),
            credentials: HashMap::new()
        }
    }

    pub fn with_credentials(mut self, client_key: &str, credentials: Credentials) -> AuthorizedClient {
        self.credentials.insert(client_key.to_owned(), credentials);
        self
    }

    /// Sends one request under the given client key and limiter bucket.
    ///
    /// A 401/403 response forces exactly one token refresh and one retry of
    /// the same request; a second rejection is an `ApiError::Auth`. The
    /// builder closure is invoked once per attempt.
    pub async fn send<F>(&self, build: F, client_key: &str, bucket: &str) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder
    {
        self.limiter.acquire(bucket).await;

        let token = match self.tokens.current(client_key).await {
            Some(token) => token,
            None => self.refresh(client_key).await?
        };

        let response = build(&self.http).bearer_auth(&token).send().await?;
        if !Self::rejected(response.status()) {
            return Ok(response);
        }

        warn!(client_key, status = %response.status(), "request rejected, forcing token refresh");

        let token = self.refresh(client_key).await?;
        let retried = build(&self.http).bearer_auth(&token).send().await?;
        if Self::rejected(retried.status()) {
            return Err(ApiError::Auth(format!(
                "request rejected with {} after token refresh",
                retried.status()
            )));
        }

        Ok(retried)
    }

    fn rejected(status: StatusCode) -> bool {
        status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
    }

    /// Performs a client-credentials grant and caches the result. Concurrent
    /// callers may refresh redundantly; last write wins.
    async fn refresh(&self, client_key: &str) -> Result<String, ApiError> {
        let credentials = self
            .credentials
            .get(client_key)
            .ok_or_else(|| ApiError::UnknownClient(client_key.to_owned()))?;

        let request = TokenRequest {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            grant_type: "client_credentials".to_string(),
            scope: "public".to_string()
        };

        let response = self.http.post(&credentials.token_url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Auth(format!(
                "token grant failed with status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        debug!(client_key, expires_in = token.expires_in, "token refreshed");
        self.tokens
            .store(client_key, token.access_token.clone(), token.expires_in)
            .await;

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream}
    };

    const TOKEN_BODY: &str = r#"{"access_token":"fresh","expires_in":3600}"#;

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let body_len = head
                    .lines()
                    .find_map(|line| line.to_ascii_lowercase().strip_prefix("content-length:").map(str::to_owned))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    async fn write_response(stream: &mut TcpStream, status_line: &str, body: &str) {
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    }

    /// Canned server: the token endpoint always grants, the API endpoint
    /// returns 401 for the first `rejections` hits and 200 afterwards.
    async fn spawn_auth_server(rejections: usize) -> (String, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let api_hits = Arc::new(AtomicUsize::new(0));
        let token_hits = Arc::new(AtomicUsize::new(0));

        let api = api_hits.clone();
        let token = token_hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;

                if request.starts_with("POST /token") {
                    token.fetch_add(1, Ordering::SeqCst);
                    write_response(&mut stream, "200 OK", TOKEN_BODY).await;
                } else {
                    let hit = api.fetch_add(1, Ordering::SeqCst);
                    if hit < rejections {
                        write_response(&mut stream, "401 Unauthorized", "{}").await;
                    } else {
                        write_response(&mut stream, "200 OK", r#"{"ok":true}"#).await;
                    }
                }
            }
        });

        (format!("http://{addr}"), api_hits, token_hits)
    }

    fn client_for(base: &str) -> AuthorizedClient {
        AuthorizedClient::new(reqwest::Client::new(), RateLimiter::per_minute(100)).with_credentials(
            "osu",
            Credentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                token_url: format!("{base}/token")
            }
        )
    }

    #[tokio::test]
    async fn test_rejection_recovers_after_one_forced_refresh() {
        let (base, api_hits, token_hits) = spawn_auth_server(1).await;
        let client = client_for(&base);
        let url = format!("{base}/api");

        let response = client.send(|http| http.get(&url), "osu", "bucket").await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // First attempt rejected, exactly one retry
        assert_eq!(api_hits.load(Ordering::SeqCst), 2);
        // Cold-cache grant plus the forced refresh
        assert_eq!(token_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_rejection_is_auth_error() {
        let (base, api_hits, _) = spawn_auth_server(10).await;
        let client = client_for(&base);
        let url = format!("{base}/api");

        let result = client.send(|http| http.get(&url), "osu", "bucket").await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
        // Never more than one retry per send
        assert_eq!(api_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_cache_miss_when_empty() {
        let cache = TokenCache::new();
        assert_eq!(cache.current("osu").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_cache_hit_before_margin() {
        let cache = TokenCache::new();
        cache.store("osu", "abc".to_string(), 60).await;

        assert_eq!(cache.current("osu").await, Some("abc".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_expires_early_by_margin() {
        let cache = TokenCache::new();
        cache.store("osu", "abc".to_string(), 20).await;

        // 20s lifetime minus the 15s margin leaves 5s of usable validity
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.current("osu").await, Some("abc".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.current("osu").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_cache_keys_are_independent() {
        let cache = TokenCache::new();
        cache.store("a", "token-a".to_string(), 3600).await;

        assert_eq!(cache.current("a").await, Some("token-a".to_string()));
        assert_eq!(cache.current("b").await, None);
    }

    #[tokio::test]
    async fn test_send_without_credentials_is_unknown_client() {
        let client = AuthorizedClient::new(reqwest::Client::new(), RateLimiter::per_minute(10));

        let result = client.send(|http| http.get("http://localhost/x"), "missing", "bucket").await;

        assert!(matches!(result, Err(ApiError::UnknownClient(_))));
    }
}
