pub mod credentials;
pub mod download_sink;
pub mod http_client;
pub mod local_store;
pub mod static_assets;
pub mod viewer;
