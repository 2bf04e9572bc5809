// Shared helpers for integration tests.
//
// Provides hand-written fakes for every side-effecting seam of the update
// pipeline and a builder that points a full `Context` at a temporary
// directory, so each test runs in isolation without network or real
// processes.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use orca_nightly::config::{Config, Layout, PathsConfig};
use orca_nightly::context::Context;
use orca_nightly::desktop::IconExtractor;
use orca_nightly::error::DesktopError;
use orca_nightly::exec::{ExecResult, Executor};
use orca_nightly::launch::Confirm;
use orca_nightly::logging::{Log, Logger};
use orca_nightly::release::Transport;

/// Transport serving canned JSON bodies and download payloads by URL.
///
/// Unknown URLs fail like an HTTP 404. Every requested URL is recorded.
#[derive(Debug, Default)]
pub struct FakeTransport {
    json: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `GET url` on the JSON endpoint.
    pub fn with_json(mut self, url: &str, body: &str) -> Self {
        self.json.insert(url.to_string(), body.to_string());
        self
    }

    /// Serve `content` when `url` is downloaded.
    pub fn with_file(mut self, url: &str, content: &[u8]) -> Self {
        self.files.insert(url.to_string(), content.to_vec());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn record(&self, url: &str) {
        self.requests
            .lock()
            .expect("requests lock")
            .push(url.to_string());
    }
}

impl Transport for FakeTransport {
    fn get_json(&self, url: &str) -> anyhow::Result<String> {
        self.record(url);
        self.json
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("http status: 404"))
    }

    fn download(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        self.record(url);
        let content = self
            .files
            .get(url)
            .ok_or_else(|| anyhow::anyhow!("http status: 404"))?;
        std::fs::write(dest, content)?;
        Ok(content.len() as u64)
    }
}

/// Executor that simulates `PATH` lookups and records launches.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    available: Vec<String>,
    runs: Mutex<Vec<String>>,
    spawned: Mutex<Vec<PathBuf>>,
}

impl FakeExecutor {
    /// Executor where each of `programs` is on `PATH`.
    pub fn with_available(programs: &[&str]) -> Self {
        Self {
            available: programs.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().expect("runs lock").clone()
    }

    pub fn spawned(&self) -> Vec<PathBuf> {
        self.spawned.lock().expect("spawned lock").clone()
    }
}

impl Executor for FakeExecutor {
    fn run_in(&self, _: &Path, program: &Path, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.runs
            .lock()
            .expect("runs lock")
            .push(format!("{} {}", program.display(), args.join(" ")));
        Ok(ExecResult {
            success: true,
            code: Some(0),
            ..ExecResult::default()
        })
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.runs
            .lock()
            .expect("runs lock")
            .push(format!("{program} {}", args.join(" ")));
        Ok(ExecResult {
            success: true,
            code: Some(0),
            ..ExecResult::default()
        })
    }

    fn which(&self, program: &str) -> bool {
        self.available.iter().any(|p| p == program)
    }

    fn spawn_detached(&self, program: &Path) -> anyhow::Result<()> {
        self.spawned
            .lock()
            .expect("spawned lock")
            .push(program.to_path_buf());
        Ok(())
    }
}

/// Icon extractor that writes a fixed PNG, or always fails.
#[derive(Debug)]
pub struct FakeExtractor {
    pub succeed: bool,
}

impl IconExtractor for FakeExtractor {
    fn extract(&self, _: &Path, dest: &Path) -> Result<(), DesktopError> {
        if !self.succeed {
            return Err(DesktopError::IconExtraction(
                "artifact is not a type 2 AppImage".to_string(),
            ));
        }
        std::fs::create_dir_all(dest.parent().expect("icon parent")).expect("create icon dir");
        std::fs::write(dest, b"\x89PNG").expect("write icon");
        Ok(())
    }
}

/// Confirmation source with a fixed answer.
#[derive(Debug)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _: &str) -> bool {
        self.0
    }
}

/// An isolated environment backed by a [`tempfile::TempDir`].
///
/// All locations of the [`Layout`] live under the temporary directory, which
/// is deleted when dropped.
pub struct IntegrationTestContext {
    pub root: tempfile::TempDir,
    pub config: Config,
    pub transport: Arc<FakeTransport>,
    pub executor: Arc<FakeExecutor>,
    pub extractor: Arc<FakeExtractor>,
    pub answer: bool,
    pub dry_run: bool,
    pub logger: Arc<Logger>,
}

impl IntegrationTestContext {
    /// Create a context with default configuration, FUSE available, a
    /// working icon extractor, and an empty transport.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
            config: Config::default(),
            transport: Arc::new(FakeTransport::new()),
            executor: Arc::new(FakeExecutor::with_available(&["fusermount3"])),
            extractor: Arc::new(FakeExtractor { succeed: true }),
            answer: false,
            dry_run: false,
            logger: Arc::new(Logger::new(None)),
        }
    }

    pub fn with_transport(mut self, transport: FakeTransport) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_executor(mut self, executor: FakeExecutor) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn with_extractor(mut self, succeed: bool) -> Self {
        self.extractor = Arc::new(FakeExtractor { succeed });
        self
    }

    pub fn with_repositories(mut self, repositories: &[&str]) -> Self {
        self.config.repositories = repositories.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_answer(mut self, answer: bool) -> Self {
        self.answer = answer;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Path to the temporary root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Layout with every location under the temporary root.
    pub fn layout(&self) -> Layout {
        let paths = PathsConfig {
            install_dir: Some(self.root_path().join("install")),
            ..self.config.paths.clone()
        };
        Layout::resolve(&paths, &self.root_path().join("share"))
    }

    /// Build the pipeline context wired to this environment's fakes.
    pub fn context(&self) -> Context {
        Context::new(
            self.config.clone(),
            self.layout(),
            Arc::clone(&self.logger) as Arc<dyn Log>,
            self.dry_run,
        )
        .with_transport(Arc::clone(&self.transport) as Arc<dyn Transport>)
        .with_executor(Arc::clone(&self.executor) as Arc<dyn Executor>)
        .with_extractor(Arc::clone(&self.extractor) as Arc<dyn IconExtractor>)
        .with_confirm(Arc::new(FixedAnswer(self.answer)))
    }

    /// Sorted file names in the install directory.
    pub fn installed_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.layout().install_dir)
            .map(|read| {
                read.map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// API URL of the nightly release of `repository` with default settings.
pub fn api_url(repository: &str) -> String {
    format!("https://api.github.com/repos/{repository}/releases/tags/nightly-builds")
}

/// A release payload listing `assets` as `(name, url)` pairs.
pub fn release_json(assets: &[(&str, &str)]) -> String {
    let assets: Vec<serde_json::Value> = assets
        .iter()
        .map(|(name, url)| serde_json::json!({ "name": name, "browser_download_url": url }))
        .collect();
    serde_json::json!({ "tag_name": "nightly-builds", "assets": assets }).to_string()
}

/// Bytes that look like a type 2 AppImage header.
pub fn appimage_bytes(marker: &str) -> Vec<u8> {
    let mut bytes = b"\x7fELF\x02\x01\x01\x00AI\x02".to_vec();
    bytes.extend_from_slice(marker.as_bytes());
    bytes
}
