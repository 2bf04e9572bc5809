//! Shared state for one run of the update pipeline.
use std::sync::Arc;

use crate::config::{Config, Layout};
use crate::desktop::{AppImageIconExtractor, IconExtractor};
use crate::exec::{Executor, SystemExecutor};
use crate::launch::{Confirm, TerminalConfirm};
use crate::logging::Log;
use crate::release::{Transport, UreqTransport};

/// Everything a pipeline stage needs, with every side-effecting capability
/// behind a trait object so tests can substitute fakes.
pub struct Context {
    /// Loaded and validated configuration.
    pub config: Config,
    /// Resolved filesystem locations.
    pub layout: Layout,
    /// Logger for output and stage recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Network access.
    pub transport: Arc<dyn Transport>,
    /// Process execution and `PATH` lookup.
    pub executor: Arc<dyn Executor>,
    /// Icon extraction from the installed artifact.
    pub extractor: Arc<dyn IconExtractor>,
    /// Source of the launch answer.
    pub confirm: Arc<dyn Confirm>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("layout", &self.layout)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("transport", &self.transport)
            .field("executor", &self.executor)
            .field("extractor", &self.extractor)
            .field("confirm", &self.confirm)
            .finish()
    }
}

impl Context {
    /// Create a context backed by the real network, processes, and terminal.
    #[must_use]
    pub fn new(config: Config, layout: Layout, log: Arc<dyn Log>, dry_run: bool) -> Self {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        Self {
            config,
            layout,
            log,
            dry_run,
            transport: Arc::new(UreqTransport::new()),
            extractor: Arc::new(AppImageIconExtractor::new(Arc::clone(&executor))),
            executor,
            confirm: Arc::new(TerminalConfirm),
        }
    }

    /// Replace the network transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the executor. The icon extractor keeps its own executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the icon extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn IconExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the launch confirmation source.
    #[must_use]
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }
}
