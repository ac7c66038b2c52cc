use crate::constants::PDF_CONTENT_TYPE;
use crate::types::{HttpMethod, RequestBody};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Source of the caller's bearer credential.
#[async_trait]
pub trait CredentialPort: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Network transport. `Err` means no response was received at all.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Pass cookies and other ambient credentials along with the request.
    pub include_credentials: bool,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            include_credentials: false,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Bytes,
    pub content_type: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains(PDF_CONTENT_TYPE)
    }
}

/// Documents bundled with the application, used when the service is unreachable.
#[async_trait]
pub trait StaticAssetPort: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Bytes, String>;
}

/// Small persisted string values under well-known keys.
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    async fn set(&self, key: &str, value: &str) -> Result<(), String>;
}

/// Save-as target for acquired documents.
#[async_trait]
pub trait DownloadSinkPort: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, String>;
}

/// Opens a location in a new viewing context.
#[async_trait]
pub trait ViewerPort: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), String>;
}
