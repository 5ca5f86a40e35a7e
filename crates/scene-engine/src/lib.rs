//! Scene Engine
//!
//! This crate executes scene documents: ordered groups of named action
//! chains, where any action may additionally wait for any action wired
//! before it.
//!
//! # Ordering rules
//!
//! - Groups run strictly one after another
//! - Chains of one group run concurrently
//! - Within a chain, actions run in declaration order
//! - An action with `waitFor` runs after the referenced action instead of
//!   after its chain predecessor
//!
//! Each group is wired into a task graph first (every action gets a
//! completion handle registered in the [`DependencyResolver`]), then all
//! chains are released at once. A failed action skips everything that
//! depends on it.
//!
//! # Key Types
//!
//! - [`SceneEngine`] - Loads and runs scenes, one at a time
//! - [`ExecutionGate`] - Single-flight lock with scoped release
//! - [`ChainRunner`] - Wires one chain into the task graph
//! - [`GroupScheduler`] - Releases a group and awaits its completion
//! - [`RunReport`] - Outcome of a run

pub mod chain;
pub mod completion;
pub mod error;
pub mod executor;
pub mod gate;
pub mod group;
pub mod report;
pub mod resolver;

pub use chain::{ChainRunner, WiredAction, WiredChain};
pub use completion::{Completion, CompletionHandle};
pub use error::{EngineError, EngineResult};
pub use executor::SceneEngine;
pub use gate::{EngineState, ExecutionGate, GateGuard};
pub use group::{GroupOutcome, GroupScheduler};
pub use report::{RunReport, RunStatus};
pub use resolver::DependencyResolver;
