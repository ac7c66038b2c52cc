use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::app::ports::KeyValueStorePort;
use crate::constants::{DOWNLOAD_HISTORY_KEY, MIRROR_KEY, REPORTS_ENDPOINT};
use crate::dispatcher::RequestDispatcher;
use crate::error::{ClientError, Result};
use crate::types::{ReportRecord, RequestDescriptor};

/// Where a painted listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    /// The locally persisted mirror; possibly stale.
    Mirror,
    /// The service's answer; always supersedes the mirror.
    Authoritative,
}

#[derive(Debug, Deserialize)]
struct ReportListing {
    #[serde(default)]
    reports: Option<Vec<serde_json::Value>>,
}

/// The caller's report list, with a persisted mirror for instant paint.
pub struct ReportDirectory {
    dispatcher: Arc<RequestDispatcher>,
    store: Arc<dyn KeyValueStorePort>,
}

impl ReportDirectory {
    pub fn new(dispatcher: Arc<RequestDispatcher>, store: Arc<dyn KeyValueStorePort>) -> Self {
        Self { dispatcher, store }
    }

    /// The persisted mirror, or empty when it is absent or unreadable.
    pub async fn load_mirror(&self) -> Vec<ReportRecord> {
        let raw = match self.store.get(MIRROR_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read cached reports: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => {
                let records = ReportRecord::from_listing(values);
                info!("Loaded reports from cache: {}", records.len());
                records
            }
            Err(e) => {
                warn!("Failed to parse cached reports: {}", e);
                Vec::new()
            }
        }
    }

    /// Overwrite the mirror, unless `records` is empty. Returns whether it wrote.
    pub async fn save_mirror(&self, records: &[ReportRecord]) -> Result<bool> {
        if records.is_empty() {
            return Ok(false);
        }
        let raw = serde_json::to_string(records)?;
        self.store.set(MIRROR_KEY, &raw).await.map_err(ClientError::Storage)?;
        Ok(true)
    }

    /// Authoritative listing from the service; refreshes the mirror on success.
    pub async fn fetch_reports(&self) -> Result<Vec<ReportRecord>> {
        let descriptor = RequestDescriptor::get(REPORTS_ENDPOINT).cacheable();
        let listing: ReportListing = self.dispatcher.execute(&descriptor).await?.into_json()?;
        let Some(values) = listing.reports else {
            warn!("Report listing has no reports array");
            return Ok(Vec::new());
        };
        let records = ReportRecord::from_listing(values);
        info!("Found {} valid reports", records.len());

        // The mirror is a cache; failing to refresh it must not fail the listing
        if let Err(e) = self.save_mirror(&records).await {
            warn!("Failed to update cached reports: {}", e);
        }
        Ok(records)
    }

    /// Paint the mirror first (when there is one), then the authoritative listing.
    pub async fn activate<F>(&self, mut paint: F) -> Result<Vec<ReportRecord>>
    where
        F: FnMut(ListingSource, &[ReportRecord]),
    {
        let mirror = self.load_mirror().await;
        if !mirror.is_empty() {
            paint(ListingSource::Mirror, &mirror);
        }
        let records = self.fetch_reports().await?;
        paint(ListingSource::Authoritative, &records);
        Ok(records)
    }
}

/// Report ids already downloaded from this machine. Only used to tell a first
/// download from a repeat one.
pub struct DownloadHistory {
    store: Arc<dyn KeyValueStorePort>,
}

impl DownloadHistory {
    pub fn new(store: Arc<dyn KeyValueStorePort>) -> Self {
        Self { store }
    }

    async fn load(&self) -> BTreeSet<i64> {
        match self.store.get(DOWNLOAD_HISTORY_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read download history: {}", e);
                BTreeSet::new()
            }
        }
    }

    pub async fn contains(&self, report_id: i64) -> bool {
        self.load().await.contains(&report_id)
    }

    /// Remember a download. Returns true when this is the first one for the report.
    pub async fn record(&self, report_id: i64) -> Result<bool> {
        let mut ids = self.load().await;
        if !ids.insert(report_id) {
            return Ok(false);
        }
        let raw = serde_json::to_string(&ids)?;
        self.store.set(DOWNLOAD_HISTORY_KEY, &raw).await.map_err(ClientError::Storage)?;
        Ok(true)
    }
}
