//! Scripted network for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hearth_core::{AppConfig, CacheDb, Error, InstallPolicy};
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};

use super::{Worker, WorkerConfig};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};

#[derive(Debug, Clone)]
enum Script {
    Respond { status: u16, body: String },
    Slow { delay: Duration, status: u16, body: String },
    Offline,
    Hang,
}

#[derive(Debug)]
struct Call {
    method: String,
    url: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Answers from a URL -> script table and records every call in order.
/// Unknown URLs behave as offline.
#[derive(Debug, Default)]
pub(crate) struct FakeFetcher {
    routes: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every asset the test site precaches or warms, all reachable.
    pub(crate) fn site() -> Self {
        let fetcher = Self::new();
        fetcher.respond("https://reno.example/", 200, "<h1>home</h1>");
        fetcher.respond("https://reno.example/offline.html", 200, "<h1>offline</h1>");
        fetcher.respond("https://reno.example/static/js/bundle.js", 200, "console.log(1)");
        fetcher.respond("https://reno.example/about", 200, "<h1>about</h1>");
        fetcher
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.script(url, Script::Respond { status, body: body.to_string() });
    }

    /// Answer after `delay`, long enough for concurrent events to overlap.
    pub(crate) fn respond_slowly(&self, url: &str, delay: Duration, status: u16, body: &str) {
        self.script(url, Script::Slow { delay, status, body: body.to_string() });
    }

    pub(crate) fn offline(&self, url: &str) {
        self.script(url, Script::Offline);
    }

    pub(crate) fn hang(&self, url: &str) {
        self.script(url, Script::Hang);
    }

    /// Take the whole site offline.
    pub(crate) fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }

    fn script(&self, url: &str, script: Script) {
        self.routes.lock().unwrap().insert(url.to_string(), script);
    }

    /// `METHOD url` for every call, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| format!("{} {}", call.method, call.url))
            .collect()
    }

    pub(crate) fn bodies(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().iter().map(|call| call.body.clone()).collect()
    }

    /// Value of header `name` on every call, in order.
    pub(crate) fn header_values(&self, name: &str) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string))
            .collect()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| call.url == url).count()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(Call {
            method: request.method.to_string(),
            url: url.clone(),
            headers: request.headers.clone(),
            body: request.body.as_ref().map(|b| b.to_vec()).unwrap_or_default(),
        });

        let script = self.routes.lock().unwrap().get(&url).cloned().unwrap_or(Script::Offline);
        match script {
            Script::Respond { status, body } => Ok(plain(status, body)),
            Script::Slow { delay, status, body } => {
                tokio::time::sleep(delay).await;
                Ok(plain(status, body))
            }
            Script::Offline => Err(Error::Network(format!("offline: {url}"))),
            Script::Hang => std::future::pending().await,
        }
    }
}

fn plain(status: u16, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    Response::new(StatusCode::from_u16(status).unwrap(), headers, body)
}

pub(crate) fn site_config(policy: InstallPolicy) -> AppConfig {
    AppConfig {
        origin: "https://reno.example".into(),
        cache_version: "hearth-test-v1".into(),
        precache: vec!["/".into(), "/offline.html".into(), "/static/js/bundle.js".into()],
        runtime_cache: vec!["/about".into()],
        install_policy: policy,
        timeout_ms: 200,
        ..Default::default()
    }
}

pub(crate) async fn worker_with(app: &AppConfig, fetcher: FakeFetcher) -> Worker<FakeFetcher> {
    let db = CacheDb::open_in_memory().await.unwrap();
    let config = WorkerConfig::from_app(app).unwrap();
    Worker::new(config, db, fetcher)
}

pub(crate) async fn site_worker(fetcher: FakeFetcher) -> Worker<FakeFetcher> {
    worker_with(&site_config(InstallPolicy::Strict), fetcher).await
}
