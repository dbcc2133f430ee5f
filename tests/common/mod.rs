#![allow(dead_code)]

use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde_json::{Value, json};
use spider_media::downloader::redirect::{DEFAULT_MAX_REDIRECTS, follow_redirects};
use spider_media::prelude::*;
use spider_media::{MediaPipelineBuilder, Settings};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

/// Downloader answering from request meta and a route table.
///
/// - `meta["fail"]`: fail with that message
/// - `meta["body"]`: body of the 200 response
/// - `meta["delay_ms"]`: sleep before answering
/// - a gate registered for the URL holds the download until opened
#[derive(Default)]
pub struct MockDownloader {
    routes: HashMap<String, Response>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
    hops: Mutex<Vec<String>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, response: Response) -> Self {
        self.routes.insert(response.url.to_string(), response);
        self
    }

    /// Holds downloads of `url` until the returned `Notify` is signalled.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(Url::parse(url).unwrap().to_string(), Arc::clone(&notify));
        notify
    }

    /// URLs handed to `download`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        let url = Url::parse(url).unwrap().to_string();
        self.calls().iter().filter(|c| **c == url).count()
    }

    /// Every HTTP hop, redirects included.
    pub fn hops(&self) -> Vec<String> {
        self.hops.lock().unwrap().clone()
    }

    fn route(&self, request: &Request) -> Response {
        self.hops.lock().unwrap().push(request.url.to_string());
        if let Some(response) = self.routes.get(request.url.as_str()) {
            return response.clone();
        }
        let body = request
            .meta
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Response::new(request.url.clone()).with_body(body)
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(
        &self,
        request: Request,
        _info: &SpiderInfo,
    ) -> Result<Response, SpiderError> {
        self.calls.lock().unwrap().push(request.url.to_string());

        let gate = self.gates.lock().unwrap().get(request.url.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(ms) = request.meta.get("delay_ms").and_then(Value::as_u64) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if let Some(message) = request.meta.get("fail").and_then(Value::as_str) {
            return Err(SpiderError::GeneralError(message.to_string()));
        }

        follow_redirects(request, DEFAULT_MAX_REDIRECTS, |req| {
            std::future::ready(Ok(self.route(&req)))
        })
        .await
    }
}

#[derive(Debug, Default)]
pub struct TestItem {
    pub id: usize,
    pub requests: Vec<Request>,
    pub results: Vec<MediaOutcome>,
    pub invalid: bool,
}

impl TestItem {
    pub fn new(id: usize, requests: Vec<Request>) -> Self {
        TestItem {
            id,
            requests,
            ..Default::default()
        }
    }
}

/// Records every hook call and stores the results on the item.
///
/// - `meta["result"]`: resolve the request to that value without downloading
/// - `meta["explode"]`: fail `media_to_download`
pub struct RecordingPolicy {
    pub name: &'static str,
    pub store_files: bool,
    pub calls: Mutex<Vec<&'static str>>,
    pub completed: Mutex<Vec<usize>>,
}

impl Default for RecordingPolicy {
    fn default() -> Self {
        RecordingPolicy {
            name: "MediaPipeline",
            store_files: false,
            calls: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingPolicy {
    /// Behaves like a file store: non-200 responses are failures, successes
    /// become file metadata.
    pub fn storing_files() -> Self {
        RecordingPolicy {
            store_files: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, hook: &str) -> usize {
        self.calls().iter().filter(|c| **c == hook).count()
    }

    /// Ids of completed items, in completion order.
    pub fn completed(&self) -> Vec<usize> {
        self.completed.lock().unwrap().clone()
    }

    fn record(&self, hook: &'static str) {
        self.calls.lock().unwrap().push(hook);
    }
}

#[async_trait]
impl MediaPolicy for RecordingPolicy {
    type Item = TestItem;

    fn name(&self) -> &str {
        self.name
    }

    fn get_media_requests(
        &self,
        item: &TestItem,
        _info: &SpiderInfo,
    ) -> Result<MediaRequests, PipelineError> {
        self.record("get_media_requests");
        if item.invalid {
            return Err(PipelineError::ItemError(format!("item {} is malformed", item.id)));
        }
        Ok(item.requests.clone().into())
    }

    async fn media_to_download(
        &self,
        request: &mut Request,
        _info: &SpiderInfo,
        _item: &TestItem,
    ) -> Result<MediaAction, MediaError> {
        self.record("media_to_download");
        if let Some(message) = request.meta.get("explode").and_then(Value::as_str) {
            return Err(MediaError::Hook(anyhow::anyhow!(message.to_string())));
        }
        match request.meta.get("result") {
            Some(value) => Ok(MediaAction::Resolved(MediaValue::Value(value.clone()))),
            None => Ok(MediaAction::Download),
        }
    }

    async fn media_downloaded(
        &self,
        response: Response,
        request: &Request,
        _info: &SpiderInfo,
        _item: &TestItem,
    ) -> Result<MediaValue, MediaError> {
        self.record("media_downloaded");
        if !self.store_files {
            return Ok(MediaValue::Response(response));
        }
        if response.status != StatusCode::OK {
            return Err(MediaError::media(format!(
                "File (code: {}): Error downloading file from {}",
                response.status.as_u16(),
                request.url
            )));
        }
        Ok(MediaValue::Value(json!({
            "url": request.url.as_str(),
            "status": "downloaded",
            "size": response.body.len(),
        })))
    }

    async fn media_failed(
        &self,
        error: MediaError,
        _request: &Request,
        _info: &SpiderInfo,
        _item: &TestItem,
    ) -> Result<MediaValue, MediaError> {
        self.record("media_failed");
        Err(error)
    }

    async fn item_completed(
        &self,
        results: Vec<MediaOutcome>,
        mut item: TestItem,
        _info: &SpiderInfo,
    ) -> Result<TestItem, PipelineError> {
        self.record("item_completed");
        self.completed.lock().unwrap().push(item.id);
        item.results = results;
        Ok(item)
    }
}

/// Only says which requests an item needs; every other hook keeps its
/// library default, `item_completed` included.
pub struct RequestsOnly;

#[async_trait]
impl MediaPolicy for RequestsOnly {
    type Item = Vec<Request>;

    fn get_media_requests(
        &self,
        item: &Vec<Request>,
        _info: &SpiderInfo,
    ) -> Result<MediaRequests, PipelineError> {
        Ok(item.clone().into())
    }
}

/// A `RequestsOnly` pipeline with an open `media.com` session.
pub fn default_policy_pipeline(
    downloader: Arc<MockDownloader>,
    settings: Settings,
) -> (MediaPipeline<RequestsOnly>, Arc<SpiderInfo>) {
    let pipeline = MediaPipelineBuilder::new(RequestsOnly)
        .shared_downloader(downloader)
        .settings(settings)
        .build()
        .unwrap();
    let info = pipeline.open_session("media.com");
    (pipeline, info)
}

pub type TestPipeline = MediaPipeline<RecordingPolicy>;

/// A pipeline with an open `media.com` session.
pub fn pipeline_with(
    policy: RecordingPolicy,
    downloader: Arc<MockDownloader>,
    settings: Settings,
) -> (Arc<TestPipeline>, Arc<SpiderInfo>) {
    let pipeline = MediaPipelineBuilder::new(policy)
        .shared_downloader(downloader)
        .settings(settings)
        .build()
        .unwrap();
    let info = pipeline.open_session("media.com");
    (Arc::new(pipeline), info)
}

pub fn setup() -> (Arc<TestPipeline>, Arc<SpiderInfo>, Arc<MockDownloader>) {
    let downloader = Arc::new(MockDownloader::new());
    let (pipeline, info) = pipeline_with(
        RecordingPolicy::default(),
        Arc::clone(&downloader),
        Settings::new(),
    );
    (pipeline, info, downloader)
}

pub fn request(url: &str) -> Request {
    Request::parse(url).unwrap()
}

pub fn redirect_response(from: &str, status: u16, location: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, HeaderValue::from_str(location).unwrap());
    Response::new(Url::parse(from).unwrap())
        .with_status(StatusCode::from_u16(status).unwrap())
        .with_headers(headers)
}

/// Processes `item` on a separate task.
pub fn spawn_item(
    pipeline: &Arc<TestPipeline>,
    info: &Arc<SpiderInfo>,
    item: TestItem,
) -> tokio::task::JoinHandle<Result<TestItem, PipelineError>> {
    let pipeline = Arc::clone(pipeline);
    let info = Arc::clone(info);
    tokio::spawn(async move { pipeline.process_item_with(item, &info).await })
}

/// Yields until `condition` holds.
pub async fn until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

pub fn body(outcome: &MediaOutcome) -> String {
    let value = outcome.as_ref().as_ref().expect("expected a successful outcome");
    let response = value.as_response().expect("expected a response");
    String::from_utf8_lossy(&response.body).into_owned()
}

/// Captures ERROR events emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.0))
    }
}

impl LogCapture {
    pub fn start() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .without_time()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn records(&self) -> Vec<String> {
        let raw = self.0.lock().unwrap();
        String::from_utf8_lossy(&raw)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}
