use std::sync::Arc;

use crate::app::acquisition_use_case::ReportAcquisition;
use crate::app::directory_use_case::{DownloadHistory, ReportDirectory};
use crate::app::generation_use_case::ReportGeneration;
use crate::app::ports::{CredentialPort, DownloadSinkPort, HttpClientPort, KeyValueStorePort, StaticAssetPort, ViewerPort};
use crate::config::Config;
use crate::dispatcher::RequestDispatcher;
use crate::error::Result;
use crate::infra::credentials::EnvCredentials;
use crate::infra::download_sink::FsDownloadSink;
use crate::infra::http_client::ReqwestHttp;
use crate::infra::local_store::FileKeyValueStore;
use crate::infra::static_assets::BundledAssets;
use crate::infra::viewer::SystemBrowser;
use crate::observability::register_metrics;

/// Adapters the client is assembled from.
pub struct ClientPorts {
    pub http: Arc<dyn HttpClientPort>,
    pub credentials: Arc<dyn CredentialPort>,
    pub assets: Arc<dyn StaticAssetPort>,
    pub store: Arc<dyn KeyValueStorePort>,
    pub sink: Arc<dyn DownloadSinkPort>,
    pub viewer: Arc<dyn ViewerPort>,
}

/// One dispatcher (and so one response cache) shared by every use case.
pub struct EsgClient {
    dispatcher: Arc<RequestDispatcher>,
    directory: ReportDirectory,
    history: DownloadHistory,
    acquisition: ReportAcquisition,
    generation: ReportGeneration,
}

impl EsgClient {
    /// Wire the production adapters from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ports = ClientPorts {
            http: Arc::new(ReqwestHttp::new()?),
            credentials: Arc::new(EnvCredentials::new(config.api.token_env.clone(), config.api.token.clone())),
            assets: Arc::new(BundledAssets::new(config.storage.assets_dir.clone())),
            store: Arc::new(FileKeyValueStore::new(config.storage.state_dir.clone())),
            sink: Arc::new(FsDownloadSink::new(config.storage.download_dir.clone())),
            viewer: Arc::new(SystemBrowser),
        };
        Ok(Self::with_ports(config, ports))
    }

    pub fn with_ports(config: &Config, ports: ClientPorts) -> Self {
        register_metrics();
        let dispatcher = Arc::new(RequestDispatcher::new(
            config.api.base_url.clone(),
            ports.http,
            ports.credentials,
            ports.assets,
            config.cache_ttl(),
        ));
        Self {
            directory: ReportDirectory::new(dispatcher.clone(), ports.store.clone()),
            history: DownloadHistory::new(ports.store),
            acquisition: ReportAcquisition::new(dispatcher.clone(), ports.sink.clone(), ports.viewer),
            generation: ReportGeneration::new(dispatcher.clone(), ports.sink),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn directory(&self) -> &ReportDirectory {
        &self.directory
    }

    pub fn history(&self) -> &DownloadHistory {
        &self.history
    }

    pub fn acquisition(&self) -> &ReportAcquisition {
        &self.acquisition
    }

    pub fn generation(&self) -> &ReportGeneration {
        &self.generation
    }
}
