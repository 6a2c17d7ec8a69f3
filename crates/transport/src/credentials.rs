//! HTTP credential issuer
//!
//! Exchanges the conversation language and voice for a short-lived realtime
//! session token at the application backend.

use async_trait::async_trait;
use std::time::Duration;

use voice_coach_config::RealtimeConfig;
use voice_coach_core::{CredentialIssuer, CredentialRequest, Error, Result, SessionCredential};

/// Longest error body echoed into error messages
const MAX_ERROR_BODY: usize = 200;

/// Credential issuer backed by a REST endpoint
///
/// `POST {endpoint}` with `{"language": .., "voice": ..}`; the endpoint answers
/// `{"token": .., "model": ..}`.
#[derive(Debug, Clone)]
pub struct HttpCredentialIssuer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCredentialIssuer {
    /// Create an issuer for the given endpoint
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create an issuer from realtime settings
    pub fn from_settings(config: &RealtimeConfig) -> Result<Self> {
        Self::new(
            config.credential_endpoint.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CredentialIssuer for HttpCredentialIssuer {
    async fn issue(&self, request: &CredentialRequest) -> Result<SessionCredential> {
        tracing::debug!(
            endpoint = %self.endpoint,
            language = %request.language,
            voice = %request.voice,
            "Requesting realtime session credential"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(Error::Credential(format!("{} {}", status, body)));
        }

        let credential: SessionCredential = response
            .json()
            .await
            .map_err(|e| Error::Credential(format!("Malformed credential response: {}", e)))?;

        if credential.token.is_empty() || credential.model.is_empty() {
            return Err(Error::Credential(
                "Credential response is missing token or model".to_string(),
            ));
        }

        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

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

                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}/api/realtime/session", addr), handle)
    }

    fn request() -> CredentialRequest {
        CredentialRequest {
            language: "en".to_string(),
            voice: "alloy".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_success() {
        let (url, server) =
            serve_once("200 OK", r#"{"token":"ek_abc","model":"gpt-realtime"}"#).await;
        let issuer = HttpCredentialIssuer::new(url, Duration::from_secs(5)).unwrap();

        let credential = issuer.issue(&request()).await.unwrap();
        assert_eq!(credential.token, "ek_abc");
        assert_eq!(credential.model, "gpt-realtime");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/realtime/session"));
        assert!(raw.contains(r#""language":"en""#));
        assert!(raw.contains(r#""voice":"alloy""#));
    }

    #[tokio::test]
    async fn test_issue_rejected_status() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"error":"no session"}"#).await;
        let issuer = HttpCredentialIssuer::new(url, Duration::from_secs(5)).unwrap();

        let err = issuer.issue(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Credential(ref msg) if msg.contains("401")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_malformed_body() {
        let (url, server) = serve_once("200 OK", r#"{"token":"ek_abc"}"#).await;
        let issuer = HttpCredentialIssuer::new(url, Duration::from_secs(5)).unwrap();

        let err = issuer.issue(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_unreachable() {
        let issuer =
            HttpCredentialIssuer::new("http://127.0.0.1:9/session", Duration::from_millis(500))
                .unwrap();
        let err = issuer.issue(&request()).await.unwrap_err();
        assert!(err.is_negotiation());
    }
}
