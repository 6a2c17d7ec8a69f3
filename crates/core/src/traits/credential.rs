//! Session credential issuance

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Request for a short-lived realtime session credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    /// Conversation language code (e.g. "en")
    pub language: String,
    /// Requested output voice
    pub voice: String,
}

/// Short-lived credential used to open the transport
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token: String,
    pub model: String,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Issues session credentials (usually a backend REST endpoint)
#[async_trait]
pub trait CredentialIssuer: Send + Sync + 'static {
    async fn issue(&self, request: &CredentialRequest) -> Result<SessionCredential>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = SessionCredential {
            token: "ek_secret".to_string(),
            model: "gpt-realtime".to_string(),
        };
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("ek_secret"));
        assert!(debug.contains("gpt-realtime"));
    }
}
