use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::app::ports::DownloadSinkPort;
use crate::constants::{
    FALLBACK_METRICS_ASSET, FALLBACK_REPORT_ASSET, GENERATE_REPORT_ENDPOINT, GENERATE_REPORT_FIELD,
    UPLOAD_FILE_ENDPOINT, UPLOAD_FILE_FIELD,
};
use crate::dispatcher::RequestDispatcher;
use crate::error::{ClientError, Result};
use crate::types::{EsgMetrics, FormPart, RequestBody, RequestDescriptor};

/// Spreadsheet uploads: metric extraction and PDF report generation.
pub struct ReportGeneration {
    dispatcher: Arc<RequestDispatcher>,
    sink: Arc<dyn DownloadSinkPort>,
}

impl ReportGeneration {
    pub fn new(dispatcher: Arc<RequestDispatcher>, sink: Arc<dyn DownloadSinkPort>) -> Self {
        Self { dispatcher, sink }
    }

    pub async fn upload_esg_file(&self, mut file: FormPart) -> Result<EsgMetrics> {
        file.field = UPLOAD_FILE_FIELD.to_string();
        info!("Uploading {} for metric extraction", file.file_name);
        let descriptor = RequestDescriptor::post(UPLOAD_FILE_ENDPOINT, RequestBody::Form(vec![file]))
            .with_fallback(FALLBACK_METRICS_ASSET);
        self.dispatcher.execute(&descriptor).await?.into_json()
    }

    pub async fn generate_report(&self, mut file: FormPart) -> Result<Bytes> {
        file.field = GENERATE_REPORT_FIELD.to_string();
        info!("Generating ESG report from {}", file.file_name);
        let descriptor = RequestDescriptor::post(GENERATE_REPORT_ENDPOINT, RequestBody::Form(vec![file]))
            .with_fallback(FALLBACK_REPORT_ASSET);
        let pdf = self.dispatcher.execute(&descriptor).await?.into_binary()?;
        if pdf.is_empty() {
            return Err(ClientError::EmptyPayload);
        }
        Ok(pdf)
    }

    /// Generate a report and save it under a timestamped name.
    pub async fn generate_and_save(&self, file: FormPart) -> Result<PathBuf> {
        let pdf = self.generate_report(file).await?;
        let filename = report_filename(Utc::now());
        self.sink.save(&filename, &pdf).await.map_err(ClientError::Storage)
    }
}

/// `ESG_Report_2024-05-01T09-30-00.pdf`
pub fn report_filename(at: DateTime<Utc>) -> String {
    format!("ESG_Report_{}.pdf", at.format("%Y-%m-%dT%H-%M-%S"))
}
