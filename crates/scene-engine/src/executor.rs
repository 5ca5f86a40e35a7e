//! Scene engine
//!
//! Entry point for running scenes. A run takes the execution gate, loads the
//! document, then executes its groups one after another through a
//! [`GroupScheduler`] that shares a single [`DependencyResolver`] across all
//! groups, so `waitFor` may reference actions of earlier groups.

use crate::error::EngineError;
use crate::gate::{EngineState, ExecutionGate, GateGuard};
use crate::group::GroupScheduler;
use crate::report::{RunReport, RunStatus};
use crate::resolver::DependencyResolver;
use scene_config::{EngineConfig, SceneFormat, SceneLoadError, SceneLoadResult, SceneLoader};
use scene_core::{ActionInvoker, ActionState, Context, SceneDocument, SceneEventData};
use scene_event_bus::SceneEventBus;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Source label for documents handed over in memory
const DOCUMENT_SOURCE: &str = "<document>";

/// Loads and executes scenes, one at a time
pub struct SceneEngine {
    invoker: Arc<dyn ActionInvoker>,
    event_bus: Arc<SceneEventBus>,
    config: EngineConfig,
    loader: SceneLoader,
    gate: ExecutionGate,
}

impl SceneEngine {
    pub fn new(
        invoker: Arc<dyn ActionInvoker>,
        event_bus: Arc<SceneEventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            loader: SceneLoader::from_config(&config),
            invoker,
            event_bus,
            config,
            gate: ExecutionGate::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<SceneEventBus> {
        &self.event_bus
    }

    /// Current engine state
    pub fn state(&self) -> EngineState {
        self.gate.state()
    }

    /// Observe engine state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.gate.subscribe()
    }

    /// Load the scene at `path` and execute it
    ///
    /// Returns immediately with [`RunStatus::Rejected`] when another run is
    /// in progress; the file is not read in that case.
    pub async fn run(&self, path: impl AsRef<Path>) -> RunReport {
        let path = path.as_ref();
        let source = path.display().to_string();
        let context = Context::new();

        let Some(guard) = self.acquire(&source, &context) else {
            return RunReport::rejected(context, source);
        };
        let mut report = RunReport::new(context, source);

        guard.transition(EngineState::LoadingDocument);
        match self.load(path).await {
            Ok(document) => self.execute(&guard, document, report).await,
            Err(e) => {
                error!(source = %report.source, "Failed to load scene: {}", e);
                report.fail(EngineError::Load(e));
                self.finish(report)
            }
        }
    }

    /// Validate and execute an already-parsed document
    pub async fn run_document(&self, document: SceneDocument) -> RunReport {
        let context = Context::new();

        let Some(guard) = self.acquire(DOCUMENT_SOURCE, &context) else {
            return RunReport::rejected(context, DOCUMENT_SOURCE);
        };
        let mut report = RunReport::new(context, DOCUMENT_SOURCE);

        guard.transition(EngineState::LoadingDocument);
        match self.loader.validate(&document) {
            Ok(()) => self.execute(&guard, document, report).await,
            Err(e) => {
                error!(scene = %document.name(), "Scene rejected: {}", e);
                report.scene = Some(document.name().to_string());
                report.fail(EngineError::Load(e));
                self.finish(report)
            }
        }
    }

    fn acquire(&self, source: &str, context: &Context) -> Option<GateGuard<'_>> {
        match self.gate.try_acquire() {
            Some(guard) => {
                info!(source, run = %context, "Starting scene run");
                self.event_bus.emit(
                    SceneEventData::RunStarted {
                        source: source.to_string(),
                    },
                    context,
                );
                Some(guard)
            }
            None => {
                warn!(source, state = %self.gate.state(), "A scene is already running, rejecting run");
                self.event_bus.emit(
                    SceneEventData::RunRejected {
                        source: source.to_string(),
                    },
                    context,
                );
                None
            }
        }
    }

    async fn load(&self, path: &Path) -> SceneLoadResult<SceneDocument> {
        debug!("Reading scene file: {:?}", path);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SceneLoadError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })?;

        self.loader.load_bytes(&bytes, SceneFormat::from_path(path))
    }

    async fn execute(
        &self,
        guard: &GateGuard<'_>,
        document: SceneDocument,
        mut report: RunReport,
    ) -> RunReport {
        report.scene = Some(document.name().to_string());
        info!(
            scene = %document.name(),
            groups = document.groups.len(),
            actions = document.action_count(),
            "Executing scene"
        );

        let scheduler = GroupScheduler::new(
            self.invoker.clone(),
            self.event_bus.clone(),
            self.config.clone(),
            report.context.clone(),
        );
        let mut resolver = DependencyResolver::new();

        for (index, group) in document.groups.iter().enumerate() {
            guard.transition(EngineState::ExecutingGroup(index));

            match scheduler.run_group(index, group, &mut resolver).await {
                Ok(outcome) if outcome.is_success() => {
                    report.groups_completed += 1;
                }
                Ok(outcome) => {
                    error!(
                        group = index,
                        failed = ?outcome.failed,
                        "Group failed"
                    );
                    report.fail(EngineError::GroupFailed {
                        group: index,
                        failed: outcome.failed,
                    });
                    if !self.config.continue_on_group_failure {
                        break;
                    }
                }
                Err(e) => {
                    error!(group = index, "Failed to wire group: {}", e);
                    report.fail(e);
                    break;
                }
            }
        }

        report.actions.extend(scheduler.states());
        // Actions of groups that never ran
        for (_, _, action) in document.iter_actions() {
            report
                .actions
                .entry(action.id)
                .or_insert(ActionState::Skipped);
        }

        self.finish(report)
    }

    fn finish(&self, report: RunReport) -> RunReport {
        match report.status {
            RunStatus::Succeeded => info!(
                scene = report.scene.as_deref().unwrap_or_default(),
                groups = report.groups_completed,
                "Scene run finished"
            ),
            status => warn!(
                scene = report.scene.as_deref().unwrap_or_default(),
                groups = report.groups_completed,
                %status,
                "Scene run did not succeed"
            ),
        }

        self.event_bus.emit(
            SceneEventData::RunFinished {
                status: report.status.to_string(),
            },
            &report.context,
        );

        report
    }
}
