//! Scene document model
//!
//! A scene is a list of groups executed one after another. Each group maps
//! chain names to ordered action lists; the chains of one group run
//! concurrently.

use crate::action::{ActionId, SceneAction};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Scene metadata block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Human-readable scene name
    pub name: String,

    /// Format version literal, checked by the loader
    #[serde(rename = "formatVersion", alias = "format_version")]
    pub format_version: String,

    /// Any other metadata keys
    #[serde(flatten)]
    pub extras: IndexMap<String, serde_json::Value>,
}

/// A schedulable unit: named chains that run concurrently
///
/// Chains keep the order they were declared in. That order is the wiring
/// order, which decides which `waitFor` references resolve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneGroup(pub IndexMap<String, Vec<SceneAction>>);

impl SceneGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain, replacing any chain with the same name
    pub fn with_chain(mut self, name: impl Into<String>, actions: Vec<SceneAction>) -> Self {
        self.0.insert(name.into(), actions);
        self
    }

    /// Iterate chains in declaration order
    pub fn chains(&self) -> impl Iterator<Item = (&str, &[SceneAction])> {
        self.0.iter().map(|(name, actions)| (name.as_str(), actions.as_slice()))
    }

    pub fn chain(&self, name: &str) -> Option<&[SceneAction]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn chain_count(&self) -> usize {
        self.0.len()
    }

    pub fn action_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.action_count() == 0
    }
}

/// A `waitFor` that does not point at an action wired earlier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    /// The referencing action
    pub id: ActionId,
    /// The id it waits for
    pub wait_for: ActionId,
    /// Group index of the referencing action
    pub group: usize,
    /// Chain of the referencing action
    pub chain: String,
}

/// A parsed scene, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub metadata: SceneMetadata,

    /// Groups in execution order
    #[serde(rename = "actions")]
    pub groups: Vec<SceneGroup>,
}

impl SceneDocument {
    pub fn new(name: impl Into<String>, format_version: impl Into<String>) -> Self {
        Self {
            metadata: SceneMetadata {
                name: name.into(),
                format_version: format_version.into(),
                extras: IndexMap::new(),
            },
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: SceneGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn action_count(&self) -> usize {
        self.groups.iter().map(SceneGroup::action_count).sum()
    }

    /// Iterate every action in wiring order: group, then chain, then position
    pub fn iter_actions(&self) -> impl Iterator<Item = (usize, &str, &SceneAction)> {
        self.groups.iter().enumerate().flat_map(|(index, group)| {
            group.chains().flat_map(move |(chain, actions)| {
                actions.iter().map(move |action| (index, chain, action))
            })
        })
    }

    pub fn find_action(&self, id: ActionId) -> Option<&SceneAction> {
        self.iter_actions()
            .map(|(_, _, action)| action)
            .find(|action| action.id == id)
    }

    /// Ids declared more than once, ascending
    pub fn duplicate_ids(&self) -> Vec<ActionId> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();

        for (_, _, action) in self.iter_actions() {
            if !seen.insert(action.id) {
                duplicates.insert(action.id);
            }
        }

        duplicates.into_iter().collect()
    }

    /// `waitFor` references that the incremental wiring walk cannot resolve
    ///
    /// A reference resolves only when its target appears strictly earlier in
    /// wiring order, so forward and self references are reported here.
    pub fn unresolved_dependencies(&self) -> Vec<UnresolvedDependency> {
        let mut wired = HashSet::new();
        let mut unresolved = Vec::new();

        for (group, chain, action) in self.iter_actions() {
            if let Some(wait_for) = action.wait_for {
                if !wired.contains(&wait_for) {
                    unresolved.push(UnresolvedDependency {
                        id: action.id,
                        wait_for,
                        group,
                        chain: chain.to_string(),
                    });
                }
            }
            wired.insert(action.id);
        }

        unresolved
    }
}
