//! Core types for scene execution
//!
//! This crate provides the fundamental types shared by the scene loader,
//! the action registry and the execution engine: the parsed scene document,
//! action identifiers and states, the run Context, scene events and the
//! `ActionInvoker` boundary that performs the actual device operations.

mod action;
mod context;
mod document;
mod event;
mod invoker;

pub use action::{ActionId, ActionState, SceneAction};
pub use context::Context;
pub use document::{SceneDocument, SceneGroup, SceneMetadata, UnresolvedDependency};
pub use event::{SceneEvent, SceneEventData, SceneEventKind};
pub use invoker::{ActionCall, ActionError, ActionInvoker, ActionResult};

/// The only scene format version accepted by the loader
pub const FORMAT_VERSION: &str = "0.0.1";
