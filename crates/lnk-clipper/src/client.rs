use crate::error::ClipperError;
use async_trait::async_trait;
use lnk_core::{ClipContent, Clipper};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Header carrying the shared clipper token.
const TOKEN_HEADER: &str = "x-user-id";

/// Configuration for [`HttpClipper`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ClipperConfig {
    /// Full URL of the clipping endpoint. Empty disables the client.
    #[builder(setter(into))]
    pub endpoint: String,
    /// Shared token sent with every request. Empty disables the client.
    #[builder(setter(into))]
    pub token: String,
    /// Total per-attempt timeout, also forwarded to the remote service.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    /// Number of attempts before giving up.
    #[builder(default = DEFAULT_RETRIES)]
    pub retries: u32,
    /// Fixed delay between attempts.
    #[builder(default = DEFAULT_RETRY_DELAY)]
    pub retry_delay: Duration,
}

/// HTTP implementation of [`Clipper`].
///
/// Posts `{url, timeout}` to the clipping service and retries transport
/// and server errors up to the configured bound with a fixed delay.
/// Exhausted retries come back as `None`; a raw transport error never
/// reaches the caller. With an empty endpoint or token the client is
/// disabled and every `clip` returns `None` immediately.
pub struct HttpClipper {
    config: ClipperConfig,
    session: Option<reqwest::Client>,
}

impl HttpClipper {
    pub fn new(config: ClipperConfig) -> Result<Self, ClipperError> {
        if config.endpoint.is_empty() || config.token.is_empty() {
            debug!("clipper endpoint or token missing, client disabled");
            return Ok(Self {
                config,
                session: None,
            });
        }

        let token = HeaderValue::from_str(&config.token)
            .map_err(|e| ClipperError::Initialization(format!("invalid clipper token: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);

        let session = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClipperError::Initialization(e.to_string()))?;

        Ok(Self {
            config,
            session: Some(session),
        })
    }

    /// Whether the client was configured with an endpoint and token.
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    async fn try_clip(
        &self,
        session: &reqwest::Client,
        url: &str,
    ) -> Result<ClipContent, reqwest::Error> {
        let response = session
            .post(self.config.endpoint.as_str())
            .json(&serde_json::json!({
                "url": url,
                "timeout": self.config.timeout.as_secs(),
            }))
            .send()
            .await?
            .error_for_status()?;

        response.json::<ClipContent>().await
    }
}

#[async_trait]
impl Clipper for HttpClipper {
    async fn clip(&self, url: &str) -> Option<ClipContent> {
        let session = self.session.as_ref()?;

        for attempt in (1..=self.config.retries).rev() {
            match self.try_clip(session, url).await {
                Ok(content) => {
                    debug!(url, "url clipped");
                    return Some(content);
                }
                Err(e) => {
                    warn!(url, error = %e, "error clipping");
                    if attempt > 1 {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        None
    }

    async fn close(&self) {
        // The connection pool is released when the client is dropped.
        debug!("clipper closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(endpoint: &str, token: &str) -> ClipperConfig {
        ClipperConfig::builder()
            .endpoint(endpoint)
            .token(token)
            .retry_delay(Duration::from_millis(10))
            .build()
    }

    /// Serves a fixed HTTP response to every connection, counting them.
    async fn spawn_server(body: &'static str, status: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                read_request(&mut socket).await;

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{addr}/clip"), hits)
    }

    /// Reads a whole HTTP request (headers plus content-length body).
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]);
            let body_len = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    #[test]
    fn empty_endpoint_disables_client() {
        let client = HttpClipper::new(config("", "token")).unwrap();
        assert!(!client.is_enabled());

        let client = HttpClipper::new(config("http://clipper.local/clip", "")).unwrap();
        assert!(!client.is_enabled());
    }

    #[tokio::test]
    async fn disabled_client_clips_nothing() {
        let client = HttpClipper::new(config("", "")).unwrap();
        assert_eq!(client.clip("https://example.com").await, None);
    }

    #[tokio::test]
    async fn clip_parses_the_snapshot() {
        let (endpoint, hits) =
            spawn_server(r#"{"title":"a page","text":"body text"}"#, "200 OK").await;
        let client = HttpClipper::new(config(&endpoint, "token")).unwrap();

        let content = client.clip("https://example.com").await.unwrap();

        assert_eq!(content.get("title").map(String::as_str), Some("a page"));
        assert_eq!(content.get("text").map(String::as_str), Some("body text"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_exhaust_retries() {
        let (endpoint, hits) = spawn_server("", "500 Internal Server Error").await;
        let client = HttpClipper::new(config(&endpoint, "token")).unwrap();

        assert_eq!(client.clip("https://example.com").await, None);
        assert_eq!(hits.load(Ordering::SeqCst), DEFAULT_RETRIES as usize);
    }

    #[tokio::test]
    async fn unreachable_server_returns_none() {
        // Bind-then-drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/clip", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpClipper::new(config(&endpoint, "token")).unwrap();
        assert_eq!(client.clip("https://example.com").await, None);
    }
}
