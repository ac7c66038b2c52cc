//! Hand-written port doubles shared by the unit tests.

use crate::app::ports::{DownloadSinkPort, HttpClientPort, HttpRequest, HttpResponse, StaticAssetPort, ViewerPort};
use crate::constants::{JSON_CONTENT_TYPE, PDF_CONTENT_TYPE};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
    let bytes = Bytes::from(body.to_string());
    HttpResponse { status, bytes, content_type: JSON_CONTENT_TYPE.into() }
}

pub fn pdf_response(body: &'static [u8]) -> HttpResponse {
    HttpResponse {
        status: 200,
        bytes: Bytes::from_static(body),
        content_type: PDF_CONTENT_TYPE.into(),
    }
}

/// Transport answering from a fixed url → response table and recording every request.
pub struct ScriptedHttp {
    routes: Mutex<HashMap<String, Result<HttpResponse, String>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), calls: Mutex::new(Vec::new()) }
    }

    pub fn respond(&self, url: &str, response: Result<HttpResponse, String>) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let url = request.url.clone();
        self.calls.lock().unwrap().push(request);
        self.routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(format!("no route to {}", url)))
    }
}

#[derive(Default)]
pub struct MapAssets {
    files: HashMap<String, Bytes>,
    fetches: Mutex<Vec<String>>,
}

impl MapAssets {
    pub fn with(mut self, path: &str, bytes: &'static [u8]) -> Self {
        self.files.insert(path.to_string(), Bytes::from_static(bytes));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl StaticAssetPort for MapAssets {
    async fn fetch(&self, path: &str) -> Result<Bytes, String> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.files.get(path).cloned().ok_or_else(|| format!("asset not found: {}", path))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_with: Option<String>,
}

impl RecordingSink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl DownloadSinkPort for RecordingSink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, String> {
        if let Some(reason) = &self.fail_with {
            return Err(reason.clone());
        }
        self.saved.lock().unwrap().push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

#[derive(Default)]
pub struct RecordingViewer {
    pub opened: Mutex<Vec<String>>,
}

#[async_trait]
impl ViewerPort for RecordingViewer {
    async fn open(&self, url: &str) -> Result<(), String> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
