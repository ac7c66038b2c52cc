use crate::app::ports::{HttpClientPort, HttpRequest, HttpResponse};
use crate::error::{ClientError, Result};
use crate::types::{HttpMethod, RequestBody};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

const USER_AGENT: &str = concat!("esg-reports/", env!("CARGO_PKG_VERSION"));

/// reqwest transport. Credentialed requests share a cookie store; anonymous
/// ones (signed direct links) go through a client without one.
pub struct ReqwestHttp {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new() -> Result<Self> {
        let credentialed = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        let anonymous = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { credentialed, anonymous })
    }
}

fn multipart_form(parts: Vec<crate::types::FormPart>) -> std::result::Result<Form, String> {
    let mut form = Form::new();
    for part in parts {
        let mut file = Part::bytes(part.bytes.to_vec()).file_name(part.file_name);
        if let Some(content_type) = part.content_type {
            file = file.mime_str(&content_type).map_err(|e| e.to_string())?;
        }
        form = form.part(part.field, file);
    }
    Ok(form)
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, String> {
        let client = if request.include_credentials { &self.credentialed } else { &self.anonymous };
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        tracing::debug!("HTTP {} request to: {}", method, request.url);

        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.body(value.to_string()),
            Some(RequestBody::Form(parts)) => builder.multipart(multipart_form(parts)?),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        tracing::debug!("HTTP response: status={}, size={} bytes, type={}", status, bytes.len(), content_type);
        Ok(HttpResponse { status, bytes, content_type })
    }
}
