//! Scene runner
//!
//! Loads a scene document and executes it once against a simulated delta
//! robot. Exits non-zero unless the run succeeded.

mod builtin_actions;
mod delta;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use scene_action_registry::ActionRegistry;
use scene_config::EngineConfig;
use scene_core::SceneEventKind;
use scene_engine::SceneEngine;
use scene_event_bus::SceneEventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::builtin_actions::register_builtin_actions;
use crate::delta::SimulatedDelta;

#[derive(Parser, Debug)]
#[command(name = "scene-runner", about = "Run a scene document once")]
struct Cli {
    /// Scene file (.json, .yaml or .yml)
    scene: PathBuf,

    /// Engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Multiplier for simulated movement durations
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let registry = Arc::new(ActionRegistry::new());
    register_builtin_actions(&registry, Arc::new(SimulatedDelta::new(cli.time_scale)))?;
    info!(actions = registry.action_count(), "Registered built-in actions");

    let bus = Arc::new(SceneEventBus::new());
    let mut failures = bus.subscribe(SceneEventKind::ActionFailed);
    let engine = SceneEngine::new(registry, bus, config);

    let report = engine.run(&cli.scene).await;

    while let Ok(event) = failures.try_recv() {
        warn!(event = ?event.data, "Action failure");
    }

    info!(
        run = %report.context,
        status = %report.status,
        groups = report.groups_completed,
        actions = report.actions.len(),
        "Run report"
    );

    let succeeded = report.is_success();
    match report.failure {
        Some(failure) => Err(failure).with_context(|| format!("scene {}", report.source)),
        None if !succeeded => {
            bail!("scene {} was not run: {}", report.source, report.status)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::{ActionId, ActionState};
    use std::path::Path;

    fn scenes_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes")
    }

    #[tokio::test]
    async fn test_demo_scene_runs() {
        let registry = Arc::new(ActionRegistry::new());
        let delta = Arc::new(SimulatedDelta::new(0.0));
        register_builtin_actions(&registry, delta.clone()).unwrap();

        let config = EngineConfig::load(scenes_dir().join("engine.yaml")).unwrap();
        let engine = SceneEngine::new(registry, Arc::new(SceneEventBus::new()), config);

        let report = engine.run(scenes_dir().join("delta-demo.json")).await;

        assert!(report.is_success(), "{report:?}");
        assert_eq!(report.groups_completed, 2);
        assert_eq!(report.actions_in(ActionState::Done).len(), 8);
        assert_eq!(report.action_state(ActionId(8)), Some(ActionState::Done));
        assert_eq!(delta.position().await, [10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cli_args() {
        let cli = Cli::parse_from(["scene-runner", "scene.yaml", "--config", "engine.yaml"]);
        assert_eq!(cli.scene, PathBuf::from("scene.yaml"));
        assert_eq!(cli.config, Some(PathBuf::from("engine.yaml")));
        assert_eq!(cli.time_scale, 1.0);
    }
}
