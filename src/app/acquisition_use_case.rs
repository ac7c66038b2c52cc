use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::app::ports::{DownloadSinkPort, ViewerPort};
use crate::constants::{report_endpoint, signed_url_endpoint, FALLBACK_REPORT_ASSET};
use crate::dispatcher::RequestDispatcher;
use crate::error::{ClientError, Result};
use crate::observability::ClientMetrics;
use crate::types::{AcquisitionStage, DownloadOutcome, RequestDescriptor, SignedUrl};

/// Escalation order for downloads. Stages run one at a time, never raced.
pub const DOWNLOAD_STAGES: [AcquisitionStage; 3] = [
    AcquisitionStage::SignedUrl,
    AcquisitionStage::Proxy,
    AcquisitionStage::StaticFallback,
];

#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub outcome: DownloadOutcome,
    pub error: String,
}

/// A completed download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReceipt {
    pub outcome: DownloadOutcome,
    pub saved_to: PathBuf,
    /// Stages that failed before `outcome.stage` succeeded, in order.
    pub escalations: Vec<StageFailure>,
}

impl DownloadReceipt {
    /// True when the bundled placeholder was saved instead of the real report.
    pub fn is_degraded(&self) -> bool {
        self.outcome.stage == AcquisitionStage::StaticFallback
    }
}

/// Downloads and views single reports.
pub struct ReportAcquisition {
    dispatcher: Arc<RequestDispatcher>,
    sink: Arc<dyn DownloadSinkPort>,
    viewer: Arc<dyn ViewerPort>,
}

impl ReportAcquisition {
    pub fn new(
        dispatcher: Arc<RequestDispatcher>,
        sink: Arc<dyn DownloadSinkPort>,
        viewer: Arc<dyn ViewerPort>,
    ) -> Self {
        Self { dispatcher, sink, viewer }
    }

    /// Fetch report `report_id` through the stage chain and save the first
    /// non-empty document under `filename`.
    pub async fn download(&self, report_id: i64, filename: &str) -> Result<DownloadReceipt> {
        info!("Downloading report {} as {}", report_id, filename);
        let mut escalations = Vec::new();

        for stage in DOWNLOAD_STAGES {
            match self.attempt(stage, report_id).await.and_then(validate) {
                Ok(bytes) => {
                    ClientMetrics::download_stage(stage, true);
                    let saved_to = self.save(filename, &bytes).await?;
                    let outcome = DownloadOutcome::succeeded(stage, bytes.len() as u64);
                    if stage == AcquisitionStage::StaticFallback {
                        warn!("Report {} unavailable, saved the example report instead", report_id);
                    }
                    return Ok(DownloadReceipt { outcome, saved_to, escalations });
                }
                Err(err) => {
                    ClientMetrics::download_stage(stage, false);
                    warn!("Report {} {} stage failed: {}", report_id, stage, err);
                    escalations.push(StageFailure { outcome: DownloadOutcome::failed(stage), error: err.to_string() });
                }
            }
        }

        let last_error = escalations
            .last()
            .map(|f| f.error.clone())
            .unwrap_or_else(|| "no download stage attempted".to_string());
        Err(ClientError::Exhausted { report_id, last_error })
    }

    /// Open the report's signed location in the viewer. No proxy or static
    /// fallback: failures go straight back to the caller. Returns the opened URL.
    pub async fn view(&self, report_id: i64) -> Result<String> {
        let signed = self.signed_url(report_id).await?;
        let url = self.dispatcher.resolve_url(&signed.url);
        info!("Opening report {} at {}", report_id, url);
        self.viewer.open(&url).await.map_err(ClientError::Viewer)?;
        Ok(url)
    }

    pub async fn signed_url(&self, report_id: i64) -> Result<SignedUrl> {
        let descriptor = RequestDescriptor::get(signed_url_endpoint(report_id));
        self.dispatcher.execute(&descriptor).await?.into_json()
    }

    async fn attempt(&self, stage: AcquisitionStage, report_id: i64) -> Result<Bytes> {
        match stage {
            AcquisitionStage::SignedUrl => {
                let signed = self.signed_url(report_id).await?;
                let url = self.dispatcher.resolve_url(&signed.url);
                self.dispatcher.fetch_location(&url).await
            }
            AcquisitionStage::Proxy => {
                let descriptor = RequestDescriptor::get(report_endpoint(report_id));
                self.dispatcher.execute(&descriptor).await?.into_binary()
            }
            AcquisitionStage::StaticFallback => {
                self.dispatcher.fetch_static_asset(FALLBACK_REPORT_ASSET).await?.into_binary()
            }
        }
    }

    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.sink.save(filename, bytes).await.map_err(ClientError::Storage)?;
        ClientMetrics::saved(bytes.len());
        Ok(path)
    }
}

/// Servers can answer 200 with an empty body; that is not a document.
fn validate(bytes: Bytes) -> Result<Bytes> {
    if bytes.is_empty() {
        return Err(ClientError::EmptyPayload);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;
    use crate::app::test_support::{json_response, pdf_response, MapAssets, RecordingSink, RecordingViewer, ScriptedHttp};
    use crate::infra::credentials::StaticCredentials;
    use serde_json::json;
    use std::time::Duration;

    const SIGNED: &str = "http://api.test/reports/5/signed-url";
    const DIRECT: &str = "http://api.test/file-access/5?token=abc";
    const PROXY: &str = "http://api.test/reports/5";

    struct Harness {
        http: Arc<ScriptedHttp>,
        assets: Arc<MapAssets>,
        sink: Arc<RecordingSink>,
        viewer: Arc<RecordingViewer>,
        acquisition: ReportAcquisition,
    }

    fn harness(assets: MapAssets, sink: RecordingSink) -> Harness {
        let http = Arc::new(ScriptedHttp::new());
        let assets = Arc::new(assets);
        let sink = Arc::new(sink);
        let viewer = Arc::new(RecordingViewer::default());
        let dispatcher = RequestDispatcher::new(
            "http://api.test",
            http.clone(),
            Arc::new(StaticCredentials::new(Some("t".into()))),
            assets.clone(),
            Duration::from_secs(60),
        );
        let acquisition = ReportAcquisition::new(Arc::new(dispatcher), sink.clone(), viewer.clone());
        Harness { http, assets, sink, viewer, acquisition }
    }

    fn signed_ok(http: &ScriptedHttp) {
        http.respond(SIGNED, Ok(json_response(200, json!({"url": "/file-access/5?token=abc", "filename": "r5.pdf"}))));
    }

    fn empty_ok() -> HttpResponse {
        HttpResponse { status: 200, bytes: Bytes::new(), content_type: "application/pdf".into() }
    }

    #[tokio::test]
    async fn signed_url_path_saves_direct_bytes() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        signed_ok(&h.http);
        h.http.respond(DIRECT, Ok(pdf_response(b"%PDF direct")));

        let receipt = h.acquisition.download(5, "Report_5.pdf").await.unwrap();

        assert_eq!(receipt.outcome, DownloadOutcome::succeeded(AcquisitionStage::SignedUrl, 11));
        assert!(receipt.escalations.is_empty());
        assert!(!receipt.is_degraded());
        assert_eq!(h.sink.saved(), vec![("Report_5.pdf".to_string(), b"%PDF direct".to_vec())]);
        assert_eq!(h.http.calls_to(PROXY), 0);
    }

    #[tokio::test]
    async fn signed_url_error_falls_back_to_proxy() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        h.http.respond(SIGNED, Ok(json_response(500, json!({"detail": "storage misconfigured"}))));
        h.http.respond(PROXY, Ok(pdf_response(b"%PDF proxied")));

        let receipt = h.acquisition.download(5, "Report_5.pdf").await.unwrap();

        assert_eq!(receipt.outcome.stage, AcquisitionStage::Proxy);
        assert!(receipt.outcome.success);
        assert_eq!(receipt.escalations.len(), 1);
        assert_eq!(receipt.escalations[0].outcome, DownloadOutcome::failed(AcquisitionStage::SignedUrl));
        assert_eq!(receipt.escalations[0].error, "storage misconfigured");
        assert_eq!(h.sink.saved(), vec![("Report_5.pdf".to_string(), b"%PDF proxied".to_vec())]);
    }

    #[tokio::test]
    async fn direct_fetch_failure_falls_back_to_proxy() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        signed_ok(&h.http);
        h.http.respond(DIRECT, Err("connection reset".into()));
        h.http.respond(PROXY, Ok(pdf_response(b"%PDF proxied")));

        let receipt = h.acquisition.download(5, "r.pdf").await.unwrap();
        assert_eq!(receipt.outcome.stage, AcquisitionStage::Proxy);
    }

    #[tokio::test]
    async fn empty_direct_payload_escalates() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        signed_ok(&h.http);
        h.http.respond(DIRECT, Ok(empty_ok()));
        h.http.respond(PROXY, Ok(pdf_response(b"%PDF proxied")));

        let receipt = h.acquisition.download(5, "r.pdf").await.unwrap();
        assert_eq!(receipt.outcome.stage, AcquisitionStage::Proxy);
        assert_eq!(receipt.escalations[0].error, "Downloaded file is empty");
    }

    #[tokio::test]
    async fn both_live_paths_failing_saves_the_static_report() {
        let h = harness(MapAssets::default().with("ESG_Report.pdf", b"%PDF example"), RecordingSink::default());
        h.http.respond(SIGNED, Err("offline".into()));
        h.http.respond(PROXY, Err("offline".into()));

        let receipt = h.acquisition.download(5, "Report_5.pdf").await.unwrap();

        assert!(receipt.is_degraded());
        assert_eq!(receipt.outcome, DownloadOutcome::succeeded(AcquisitionStage::StaticFallback, 12));
        assert_eq!(receipt.escalations.len(), 2);
        assert_eq!(h.sink.saved(), vec![("Report_5.pdf".to_string(), b"%PDF example".to_vec())]);
    }

    #[tokio::test]
    async fn empty_proxy_payload_escalates_to_static() {
        let h = harness(MapAssets::default().with("ESG_Report.pdf", b"%PDF example"), RecordingSink::default());
        h.http.respond(SIGNED, Err("offline".into()));
        h.http.respond(PROXY, Ok(empty_ok()));

        let receipt = h.acquisition.download(5, "r.pdf").await.unwrap();
        assert!(receipt.is_degraded());
    }

    #[tokio::test]
    async fn every_stage_failing_is_an_error() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        h.http.respond(SIGNED, Err("offline".into()));
        h.http.respond(PROXY, Ok(json_response(403, json!({"detail": "Forbidden"}))));

        let err = h.acquisition.download(5, "r.pdf").await.unwrap_err();
        assert!(matches!(err, ClientError::Exhausted { report_id: 5, .. }));
        assert!(h.sink.saved().is_empty());
    }

    #[tokio::test]
    async fn empty_static_report_is_an_error() {
        let h = harness(MapAssets::default().with("ESG_Report.pdf", b""), RecordingSink::default());
        h.http.respond(SIGNED, Err("offline".into()));
        h.http.respond(PROXY, Err("offline".into()));

        let err = h.acquisition.download(5, "r.pdf").await.unwrap_err();
        assert_eq!(err.to_string(), "All download stages failed for report 5: Downloaded file is empty");
    }

    #[tokio::test]
    async fn sink_failure_is_terminal() {
        let sink = RecordingSink { fail_with: Some("disk full".into()), ..Default::default() };
        let h = harness(MapAssets::default().with("ESG_Report.pdf", b"%PDF example"), sink);
        signed_ok(&h.http);
        h.http.respond(DIRECT, Ok(pdf_response(b"%PDF direct")));

        let err = h.acquisition.download(5, "r.pdf").await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(h.http.calls_to(PROXY), 0);
        assert_eq!(h.assets.fetch_count(), 0);
    }

    #[tokio::test]
    async fn view_opens_the_resolved_signed_url() {
        let h = harness(MapAssets::default(), RecordingSink::default());
        signed_ok(&h.http);

        let url = h.acquisition.view(5).await.unwrap();

        assert_eq!(url, DIRECT);
        assert_eq!(*h.viewer.opened.lock().unwrap(), vec![DIRECT.to_string()]);
        assert_eq!(h.http.calls_to(DIRECT), 0);
    }

    #[tokio::test]
    async fn view_failure_does_not_fall_back() {
        let h = harness(MapAssets::default().with("ESG_Report.pdf", b"%PDF example"), RecordingSink::default());
        h.http.respond(SIGNED, Err("offline".into()));
        h.http.respond(PROXY, Ok(pdf_response(b"%PDF proxied")));

        let err = h.acquisition.view(5).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(h.http.calls_to(PROXY), 0);
        assert_eq!(h.assets.fetch_count(), 0);
        assert!(h.viewer.opened.lock().unwrap().is_empty());
        assert!(h.sink.saved().is_empty());
    }
}
