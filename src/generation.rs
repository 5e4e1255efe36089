//! Shape generation from text prompts.
//!
//! A [`ShapeService`] turns a [`GenerationRequest`] into a point cloud.
//! Services may be slow, so the [`GenerationWorker`] runs each request on
//! its own thread and hands back a [`GenerationOutcome`] over a channel.
//! Every failure is logged on the worker thread and reaches the frame loop
//! only as an outcome without a cloud.
//!
//! # Response format
//!
//! Both bundled services read the same JSON document:
//!
//! ```text
//! {"points": [x1, y1, z1, x2, y2, z2, ...]}
//! ```
//!
//! A bare array is accepted too. Non-finite coordinates become `0.0`, a
//! trailing partial point is dropped, and a response without a single whole
//! point is an error.

use std::fs;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archetype::ShapeArchetype;
use crate::cloud::PointCloud;
use crate::error::GenerationError;

/// Points requested when a request does not say otherwise.
pub const DEFAULT_POINT_COUNT: usize = 2000;

/// A prompt and the number of points wanted back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_point_count")]
    pub point_count: usize,
}

fn default_point_count() -> usize {
    DEFAULT_POINT_COUNT
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            point_count: DEFAULT_POINT_COUNT,
        }
    }

    pub fn with_point_count(mut self, point_count: usize) -> Self {
        self.point_count = point_count;
        self
    }
}

/// Something that can turn a prompt into points.
///
/// Implementations run on worker threads and may block.
pub trait ShapeService: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn generate(&self, request: &GenerationRequest) -> Result<PointCloud, GenerationError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointsResponse {
    Object { points: Vec<f64> },
    Flat(Vec<f64>),
}

/// Parse a service response into a cloud.
pub fn parse_points(json: &str) -> Result<PointCloud, GenerationError> {
    let values = match serde_json::from_str::<PointsResponse>(json) {
        Ok(PointsResponse::Object { points }) | Ok(PointsResponse::Flat(points)) => points,
        // The untagged error is uninformative, so report the object shape.
        Err(_) => serde_json::from_str::<PointsObject>(json)?.points,
    };

    let whole = values.len() - values.len() % 3;
    if whole != values.len() {
        debug!(dropped = values.len() - whole, "dropping trailing partial point");
    }
    if whole == 0 {
        return Err(GenerationError::Empty);
    }

    let coords: Vec<f32> = values[..whole]
        .iter()
        .map(|&v| {
            let v = v as f32;
            if v.is_finite() {
                v
            } else {
                0.0
            }
        })
        .collect();

    PointCloud::from_flat(coords).map_err(|_| GenerationError::Empty)
}

#[derive(Deserialize)]
struct PointsObject {
    points: Vec<f64>,
}

/// File-name slug for a prompt: lowercase ASCII alphanumerics joined by
/// single dashes.
///
/// `"Buddha Statue"` becomes `"buddha-statue"`.
pub fn prompt_slug(prompt: &str) -> String {
    let mut slug = String::with_capacity(prompt.len());
    for c in prompt.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Service used when nothing is configured. Every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl ShapeService for Unconfigured {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn generate(&self, _request: &GenerationRequest) -> Result<PointCloud, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Serves prompts from a directory of prepared responses.
///
/// The prompt `"Buddha Statue"` is answered from `<dir>/buddha-statue.json`.
#[derive(Debug, Clone)]
pub struct LibraryService {
    dir: PathBuf,
}

impl LibraryService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that answers `prompt`.
    pub fn entry_path(&self, prompt: &str) -> PathBuf {
        self.dir.join(format!("{}.json", prompt_slug(prompt)))
    }
}

impl ShapeService for LibraryService {
    fn name(&self) -> &str {
        "library"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<PointCloud, GenerationError> {
        let path = self.entry_path(&request.prompt);
        debug!(path = %path.display(), "reading library entry");
        let json = fs::read_to_string(&path)?;
        parse_points(&json)
    }
}

/// Runs an external generator program.
///
/// The program is invoked as `<program> <args...> <prompt> <point_count>`
/// and must print a response document on stdout. It is killed if it runs
/// longer than the timeout.
#[derive(Debug, Clone)]
pub struct CommandService {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandService {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus, GenerationError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(GenerationError::Timeout(self.timeout));
            }
            thread::sleep(Duration::from_millis(20));
        }
    }
}

/// Read a child pipe to the end on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut out);
        }
        out
    })
}

impl ShapeService for CommandService {
    fn name(&self) -> &str {
        &self.program
    }

    fn generate(&self, request: &GenerationRequest) -> Result<PointCloud, GenerationError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.prompt)
            .arg(request.point_count.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait(&mut child)?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(GenerationError::Service {
                status: status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }
        parse_points(&stdout)
    }
}

/// Result of one request, delivered to the frame loop.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Archetype whose slot the cloud belongs to.
    pub shape: ShapeArchetype,
    pub request: GenerationRequest,
    /// `None` when generation failed for any reason.
    pub cloud: Option<PointCloud>,
}

/// Runs requests in the background and collects their outcomes.
pub struct GenerationWorker {
    service: Arc<dyn ShapeService>,
    tx: Sender<GenerationOutcome>,
    rx: Receiver<GenerationOutcome>,
    pending: usize,
}

impl GenerationWorker {
    pub fn new(service: Arc<dyn ShapeService>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            service,
            tx,
            rx,
            pending: 0,
        }
    }

    /// Name of the backing service.
    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Start generating `request` for `shape`'s slot.
    pub fn submit(&mut self, shape: ShapeArchetype, request: GenerationRequest) {
        info!(%shape, prompt = %request.prompt, points = request.point_count, service = self.service.name(), "generation requested");
        self.pending += 1;

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let fallback = GenerationOutcome {
            shape,
            request: request.clone(),
            cloud: None,
        };

        let spawned = thread::Builder::new()
            .name("shape-generation".into())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| service.generate(&request)));
                let cloud = match result {
                    Ok(Ok(cloud)) => {
                        info!(%shape, points = cloud.point_count(), "generation finished");
                        Some(cloud)
                    }
                    Ok(Err(err)) => {
                        warn!(%shape, prompt = %request.prompt, error = %err, "generation failed");
                        None
                    }
                    Err(_) => {
                        warn!(%shape, prompt = %request.prompt, "shape service panicked");
                        None
                    }
                };
                let _ = tx.send(GenerationOutcome { shape, request, cloud });
            });

        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn generation thread");
            let _ = self.tx.send(fallback);
        }
    }

    /// Whether any request is still running.
    #[inline]
    pub fn is_generating(&self) -> bool {
        self.pending > 0
    }

    /// Collect finished outcomes without waiting.
    pub fn poll(&mut self) -> Vec<GenerationOutcome> {
        let outcomes: Vec<_> = self.rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(outcomes.len());
        outcomes
    }

    /// Wait up to `timeout` for the next outcome.
    pub fn wait(&mut self, timeout: Duration) -> Option<GenerationOutcome> {
        let outcome = self.rx.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(outcome)
    }
}

impl std::fmt::Debug for GenerationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationWorker")
            .field("service", &self.service.name())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    impl ShapeService for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _request: &GenerationRequest) -> Result<PointCloud, GenerationError> {
            PointCloud::from_flat(self.0.clone()).map_err(|_| GenerationError::Empty)
        }
    }

    struct Panicking;

    impl ShapeService for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn generate(&self, _request: &GenerationRequest) -> Result<PointCloud, GenerationError> {
            panic!("service exploded");
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = GenerationRequest::new("Buddha Statue");
        assert_eq!(request.point_count, 2000);
        let request: GenerationRequest = serde_json::from_str(r#"{"prompt": "cat"}"#).unwrap();
        assert_eq!(request.point_count, DEFAULT_POINT_COUNT);
    }

    #[test]
    fn test_parse_points() {
        let cloud = parse_points(r#"{"points": [1, 2, 3, 4, 5, 6]}"#).unwrap();
        assert_eq!(cloud.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let bare = parse_points("[0.5, -0.5, 0.25]").unwrap();
        assert_eq!(bare.point_count(), 1);
    }

    #[test]
    fn test_parse_points_sanitizes() {
        let cloud = parse_points(r#"{"points": [1e300, 2, 3, 4, 5]}"#).unwrap();
        assert_eq!(cloud.as_slice(), &[0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_points_failures() {
        assert!(matches!(parse_points(r#"{"points": []}"#), Err(GenerationError::Empty)));
        assert!(matches!(parse_points(r#"{"points": [1, 2]}"#), Err(GenerationError::Empty)));
        assert!(matches!(parse_points("{\"shape\": 1}"), Err(GenerationError::Malformed(_))));
        assert!(matches!(parse_points("not json"), Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn test_prompt_slug() {
        assert_eq!(prompt_slug("Buddha Statue"), "buddha-statue");
        assert_eq!(prompt_slug("  A  tall, red tree! "), "a-tall-red-tree");
        assert_eq!(prompt_slug("???"), "");
    }

    #[test]
    fn test_unconfigured_fails() {
        let err = Unconfigured.generate(&GenerationRequest::new("x")).unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured));
    }

    #[test]
    fn test_library_service() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("buddha-statue.json"), r#"{"points": [0, 1, 0, 1, 0, 1]}"#).unwrap();
        let service = LibraryService::new(dir.path());

        let cloud = service.generate(&GenerationRequest::new("Buddha Statue")).unwrap();
        assert_eq!(cloud.point_count(), 2);

        let missing = service.generate(&GenerationRequest::new("dragon")).unwrap_err();
        assert!(matches!(missing, GenerationError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_service() {
        let service = CommandService::new("sh").with_args(["-c", "echo '{\"points\": [1, 2, 3]}'", "gen"]);
        let cloud = service.generate(&GenerationRequest::new("tree")).unwrap();
        assert_eq!(cloud.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_service_failure_and_timeout() {
        let failing = CommandService::new("sh").with_args(["-c", "echo nope >&2; exit 3", "gen"]);
        match failing.generate(&GenerationRequest::new("tree")) {
            Err(GenerationError::Service { stderr, .. }) => assert_eq!(stderr, "nope"),
            other => panic!("expected service error, got {other:?}"),
        }

        let slow = CommandService::new("sh")
            .with_args(["-c", "sleep 5", "gen"])
            .with_timeout(Duration::from_millis(100));
        assert!(matches!(
            slow.generate(&GenerationRequest::new("tree")),
            Err(GenerationError::Timeout(_))
        ));
    }

    #[test]
    fn test_worker_delivers_outcome() {
        let mut worker = GenerationWorker::new(Arc::new(Fixed(vec![1.0, 2.0, 3.0])));
        assert!(!worker.is_generating());

        worker.submit(ShapeArchetype::AiCustom, GenerationRequest::new("anything"));
        assert!(worker.is_generating());

        let outcome = worker.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.shape, ShapeArchetype::AiCustom);
        assert_eq!(outcome.request.prompt, "anything");
        assert_eq!(outcome.cloud.unwrap().point_count(), 1);
        assert!(!worker.is_generating());
    }

    #[test]
    fn test_worker_collapses_failures() {
        let mut worker = GenerationWorker::new(Arc::new(Unconfigured));
        worker.submit(ShapeArchetype::AiPrimary, GenerationRequest::new("Buddha Statue"));
        let outcome = worker.wait(Duration::from_secs(5)).unwrap();
        assert!(outcome.cloud.is_none());

        let mut worker = GenerationWorker::new(Arc::new(Panicking));
        worker.submit(ShapeArchetype::AiPrimary, GenerationRequest::new("Buddha Statue"));
        let outcome = worker.wait(Duration::from_secs(5)).unwrap();
        assert!(outcome.cloud.is_none());
        assert!(!worker.is_generating());
    }

    #[test]
    fn test_poll_is_non_blocking() {
        let mut worker = GenerationWorker::new(Arc::new(Unconfigured));
        assert!(worker.poll().is_empty());
    }
}
