use std::time::Duration;

use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

use crate::core::error::{TwitcherError, TwitcherResult};
use crate::core::notification::Notifier;

/// Plain-text POST delivery to the configured endpoint. Anything but a 200
/// counts as a failure; the caller decides what to do with it.
pub struct HttpNotifier {
    http_client: Client,
    post_url: String,
}

impl HttpNotifier {
    pub fn new(post_url: String) -> TwitcherResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http_client,
            post_url,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .http_client
            .post(&self.post_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(message.to_string())
            .send()
            .await
            .map_err(TwitcherError::from)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TwitcherError::EndpointError {
                status_code: status.as_u16(),
            }
            .into());
        }

        info!("Notification sent successfully: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request_complete(raw: &[u8]) -> bool {
        let Some(head_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= head_end + 4 + body_len
    }

    /// One-shot HTTP endpoint that answers with `status_line` and hands back
    /// the raw request it saw.
    async fn stub_endpoint(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn send_posts_plain_text_and_accepts_200() {
        let (url, handle) = stub_endpoint("HTTP/1.1 200 OK").await;
        let notifier = HttpNotifier::new(url).unwrap();

        notifier.send("Robin, Blue Jay").await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: text/plain"));
        assert!(request.ends_with("Robin, Blue Jay"));
    }

    #[tokio::test]
    async fn send_treats_non_200_as_failure() {
        let (url, handle) = stub_endpoint("HTTP/1.1 500 Internal Server Error").await;
        let notifier = HttpNotifier::new(url).unwrap();

        let err = notifier.send("Robin").await.unwrap_err();
        assert!(err.to_string().contains("500"));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn send_fails_when_endpoint_is_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let notifier = HttpNotifier::new(url).unwrap();
        assert!(notifier.send("Robin").await.is_err());
    }
}
