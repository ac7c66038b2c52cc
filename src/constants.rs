/// Endpoint and storage-key constants shared by the dispatcher and the use cases.
/// Paths are a contract with the remote service; keep them in one place.

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "ESG_API_URL";
/// Environment variable holding the bearer token unless configured otherwise.
pub const DEFAULT_TOKEN_ENV: &str = "ESG_API_TOKEN";
/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ESG_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;

// Remote endpoints
pub const UPLOAD_FILE_ENDPOINT: &str = "/uploadfile/";
pub const GENERATE_REPORT_ENDPOINT: &str = "/report";
pub const REPORTS_ENDPOINT: &str = "/reports";

/// `GET /reports/{id}`: the authenticated proxy download.
pub fn report_endpoint(report_id: i64) -> String {
    format!("{}/{}", REPORTS_ENDPOINT, report_id)
}

/// `GET /reports/{id}/signed-url`: a short-lived direct-access location.
pub fn signed_url_endpoint(report_id: i64) -> String {
    format!("{}/{}/signed-url", REPORTS_ENDPOINT, report_id)
}

// Multipart field names expected by the service
pub const UPLOAD_FILE_FIELD: &str = "file";
pub const GENERATE_REPORT_FIELD: &str = "excel_file";

// Bundled static assets, relative to the asset directory
pub const FALLBACK_METRICS_ASSET: &str = "mock-data/esg-metrics.json";
pub const FALLBACK_REPORT_ASSET: &str = "ESG_Report.pdf";

// Persisted local state
pub const MIRROR_KEY: &str = "userReports";
pub const DOWNLOAD_HISTORY_KEY: &str = "downloadedReports";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_CONTENT_TYPE: &str = "application/vnd.ms-excel";
