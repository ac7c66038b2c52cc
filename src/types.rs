use crate::constants::{PDF_CONTENT_TYPE, XLSX_CONTENT_TYPE, XLS_CONTENT_TYPE};
use crate::error::{ClientError, Result};
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file part of a multipart form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FormPart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a spreadsheet from disk into a part named after the file.
    pub async fn from_path(field: &str, path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Config(format!("invalid file path: {}", path.display())))?
            .to_string();
        let content_type = match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "xlsx" => Some(XLSX_CONTENT_TYPE.to_string()),
            Some(ext) if ext == "xls" => Some(XLS_CONTENT_TYPE.to_string()),
            _ => None,
        };
        Ok(Self { field: field.to_string(), file_name, content_type, bytes: Bytes::from(bytes) })
    }

    fn signature(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{}={}#{}", self.field, self.file_name, hex::encode(hasher.finalize()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<FormPart>),
}

impl RequestBody {
    fn signature(&self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Form(parts) => parts.iter().map(FormPart::signature).collect::<Vec<_>>().join("&"),
        }
    }
}

/// Immutable description of one call through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Option<RequestBody>,
    pub fallback_asset_path: Option<String>,
    pub cacheable: bool,
}

impl RequestDescriptor {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            body: None,
            fallback_asset_path: None,
            cacheable: false,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: RequestBody) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            body: Some(body),
            fallback_asset_path: None,
            cacheable: false,
        }
    }

    pub fn with_fallback(mut self, asset_path: impl Into<String>) -> Self {
        self.fallback_asset_path = Some(asset_path.into());
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Caching only ever applies to GET requests, whatever `cacheable` says.
    pub fn honors_cache(&self) -> bool {
        self.cacheable && self.method == HttpMethod::Get
    }

    /// Deterministic cache key over method, endpoint and body.
    pub fn signature(&self) -> String {
        let body = self.body.as_ref().map(RequestBody::signature).unwrap_or_default();
        format!("{}:{}:{}", self.method, self.endpoint, body)
    }
}

/// Response of one dispatch, decided once from the declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    Decoded(serde_json::Value),
    Binary(Bytes),
}

impl ApiPayload {
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            ApiPayload::Decoded(value) => Ok(serde_json::from_value(value)?),
            ApiPayload::Binary(_) => Err(ClientError::UnexpectedPayload { expected: "structured data" }),
        }
    }

    pub fn into_binary(self) -> Result<Bytes> {
        match self {
            ApiPayload::Binary(bytes) => Ok(bytes),
            ApiPayload::Decoded(_) => Err(ClientError::UnexpectedPayload { expected: PDF_CONTENT_TYPE }),
        }
    }
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Metadata for one generated report, as listed by `GET /reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: i64,
    pub filename: String,
    pub created_at: String,
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(rename = "file_size", default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ReportRecord {
    /// Keep the usable records of a raw listing, silently dropping the rest.
    pub fn from_listing(values: Vec<serde_json::Value>) -> Vec<ReportRecord> {
        let total = values.len();
        let records: Vec<ReportRecord> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<ReportRecord>(value).ok())
            .filter(ReportRecord::is_usable)
            .collect();
        if records.len() != total {
            tracing::debug!("Dropped {} unusable report records", total - records.len());
        }
        records
    }

    pub fn is_usable(&self) -> bool {
        !self.filename.trim().is_empty() && !self.created_at.trim().is_empty()
    }

    pub fn title(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ if !self.filename.is_empty() => self.filename.clone(),
            _ => format!("Report {}", self.id),
        }
    }

    /// File name used when saving the report: the title with whitespace runs collapsed to `_`.
    pub fn download_filename(&self) -> String {
        let title = self.title();
        let stem = whitespace_regex().replace_all(&title, "_").into_owned();
        if stem.to_ascii_lowercase().ends_with(".pdf") {
            stem
        } else {
            format!("{}.pdf", stem)
        }
    }

    /// Creation date as "May 1, 2024"; the raw value when it cannot be parsed.
    pub fn display_date(&self) -> String {
        let raw = self.created_at.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.format("%B %-d, %Y").to_string();
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return dt.format("%B %-d, %Y").to_string();
        }
        raw.to_string()
    }
}

/// Time-limited direct-access location for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
    pub filename: String,
}

/// Metrics computed by the service from an uploaded spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsgMetrics {
    #[serde(default)]
    pub labor_rights_compliance_score: Option<f64>,
    #[serde(default)]
    pub anti_corruption_training: Option<f64>,
    #[serde(default)]
    pub disability_representation: Option<f64>,
    /// Every chart series keyed by its response field (e.g. `water_usage`).
    #[serde(flatten)]
    pub series: BTreeMap<String, serde_json::Value>,
}

impl EsgMetrics {
    pub fn series_names(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }
}

/// Stages of a report download, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionStage {
    SignedUrl,
    Proxy,
    StaticFallback,
}

impl AcquisitionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionStage::SignedUrl => "signed_url",
            AcquisitionStage::Proxy => "proxy",
            AcquisitionStage::StaticFallback => "static_fallback",
        }
    }
}

impl fmt::Display for AcquisitionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one acquisition stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub stage: AcquisitionStage,
    pub success: bool,
    pub size_bytes: Option<u64>,
}

impl DownloadOutcome {
    pub fn succeeded(stage: AcquisitionStage, size_bytes: u64) -> Self {
        Self { stage, success: true, size_bytes: Some(size_bytes) }
    }

    pub fn failed(stage: AcquisitionStage) -> Self {
        Self { stage, success: false, size_bytes: None }
    }
}
