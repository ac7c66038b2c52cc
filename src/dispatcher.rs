//! Generic request dispatcher.
//!
//! One call per `execute`: cache lookup for repeatable GETs, auth and content
//! headers, then the transport. Only a missing response (transport failure)
//! may be replaced by a bundled static asset; an HTTP error status always
//! reaches the caller.

use crate::app::ports::{CredentialPort, HttpClientPort, HttpRequest, HttpResponse, StaticAssetPort};
use crate::cache::ResponseCache;
use crate::constants::JSON_CONTENT_TYPE;
use crate::error::{ClientError, Result};
use crate::observability::ClientMetrics;
use crate::types::{ApiPayload, RequestBody, RequestDescriptor};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct RequestDispatcher {
    base_url: String,
    http: Arc<dyn HttpClientPort>,
    credentials: Arc<dyn CredentialPort>,
    assets: Arc<dyn StaticAssetPort>,
    cache: ResponseCache,
}

impl RequestDispatcher {
    pub fn new(
        base_url: impl Into<String>,
        http: Arc<dyn HttpClientPort>,
        credentials: Arc<dyn CredentialPort>,
        assets: Arc<dyn StaticAssetPort>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            credentials,
            assets,
            cache: ResponseCache::new(cache_ttl),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Absolute URL for an endpoint or a service-relative location (leading `/`).
    pub fn resolve_url(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.base_url, location)
        } else {
            location.to_string()
        }
    }

    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiPayload> {
        let cache_key = descriptor.honors_cache().then(|| descriptor.signature());

        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key) {
                debug!("Using cached response for {}", descriptor.endpoint);
                ClientMetrics::cache_hit();
                return Ok(hit);
            }
            ClientMetrics::cache_miss();
        }

        match self.dispatch(descriptor).await {
            Ok(payload) => {
                if let Some(key) = cache_key {
                    self.cache.put(key, payload.clone());
                }
                Ok(payload)
            }
            Err(err) if err.is_transport() => {
                let Some(path) = descriptor.fallback_asset_path.as_deref() else {
                    return Err(err);
                };
                warn!("{} {} failed ({}), using fallback: {}", descriptor.method, descriptor.endpoint, err, path);
                match self.fetch_static_asset(path).await {
                    Ok(payload) => {
                        ClientMetrics::static_fallback_used();
                        if let (Some(key), ApiPayload::Decoded(_)) = (cache_key, &payload) {
                            self.cache.put(key, payload.clone());
                        }
                        Ok(payload)
                    }
                    Err(fallback_err) => {
                        warn!("Fallback {} also failed: {}", path, fallback_err);
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Plain GET of an absolute location: no auth header, no cache, body taken as binary.
    pub async fn fetch_location(&self, url: &str) -> Result<Bytes> {
        debug!("Fetching direct location {}", url);
        let response = self.send(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }
        Ok(response.bytes)
    }

    /// Load a bundled asset: `.pdf` assets stay binary, anything else is parsed as JSON.
    pub async fn fetch_static_asset(&self, path: &str) -> Result<ApiPayload> {
        let bytes = self
            .assets
            .fetch(path)
            .await
            .map_err(|e| ClientError::Storage(format!("Failed to fetch fallback file {}: {}", path, e)))?;
        if path.to_ascii_lowercase().ends_with(".pdf") {
            return Ok(ApiPayload::Binary(bytes));
        }
        Ok(ApiPayload::Decoded(serde_json::from_slice(&bytes)?))
    }

    async fn dispatch(&self, descriptor: &RequestDescriptor) -> Result<ApiPayload> {
        let url = self.resolve_url(&descriptor.endpoint);
        info!("Sending {} request to: {}", descriptor.method, url);

        let mut headers = Vec::new();
        match self.credentials.bearer_token().await {
            Some(token) => headers.push(("Authorization".to_string(), format!("Bearer {}", token))),
            None => debug!("No auth token available for {}", descriptor.endpoint),
        }
        // Form bodies get their content type (with boundary) from the transport
        if let Some(RequestBody::Json(_)) = &descriptor.body {
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
        }

        let request = HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body: descriptor.body.clone(),
            include_credentials: true,
        };
        let response = self.send(request).await?;

        if !response.is_success() {
            return Err(api_error(&response));
        }
        decode(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let started = Instant::now();
        let url = request.url.clone();
        match self.http.send(request).await {
            Ok(response) => {
                let elapsed = started.elapsed();
                info!("Request to {} completed in {}ms with status {}", url, elapsed.as_millis(), response.status);
                ClientMetrics::request_completed(response.status, elapsed.as_secs_f64());
                Ok(response)
            }
            Err(e) => {
                ClientMetrics::transport_failure();
                Err(ClientError::Transport(e))
            }
        }
    }
}

fn decode(response: HttpResponse) -> Result<ApiPayload> {
    if response.is_pdf() {
        return Ok(ApiPayload::Binary(response.bytes));
    }
    Ok(ApiPayload::Decoded(serde_json::from_slice(&response.bytes)?))
}

/// Error for a non-success response: the body's `message` or `detail` when present.
fn api_error(response: &HttpResponse) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(&response.bytes)
        .ok()
        .and_then(|body| {
            ["message", "detail"].iter().find_map(|field| match body.get(*field) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
        })
        .unwrap_or_else(|| format!("HTTP error {}", response.status));
    ClientError::Api { status: response.status, message }
}
