use crate::app::ports::CredentialPort;
use async_trait::async_trait;

/// A token fixed at construction.
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self { token: token.filter(|t| !t.trim().is_empty()) }
    }
}

#[async_trait]
impl CredentialPort for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Reads the token from an environment variable on every lookup, so a refreshed
/// token is picked up without rebuilding the client.
pub struct EnvCredentials {
    var: String,
    fallback: Option<String>,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>, fallback: Option<String>) -> Self {
        Self { var: var.into(), fallback: fallback.filter(|t| !t.trim().is_empty()) }
    }
}

#[async_trait]
impl CredentialPort for EnvCredentials {
    async fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.fallback.clone())
    }
}
