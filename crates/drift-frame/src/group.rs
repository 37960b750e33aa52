//! Groups: ordered children plus an explicit update chain.

use std::fmt;
use std::sync::Arc;

use drift_core::{NodeId, UpdateError};
use indexmap::IndexMap;

use crate::frame::Frame;

/// A callable run immediately before (systole) or after (diastole) a
/// group's update chain.
pub type GroupHook = Arc<dyn Fn(&mut Frame) -> Result<(), UpdateError> + Send + Sync>;

/// One resolved entry of an update chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChainEntry {
    /// The entry as written, relative to the group (may be dotted).
    pub(crate) name: String,
    /// Resolved node.
    pub(crate) node: NodeId,
}

/// An ordered mapping from names to child nodes.
///
/// The update chain is separate from the children: a child that is not
/// listed is never visited by [`Frame::update()`].
#[derive(Clone, Default)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) chain: Vec<ChainEntry>,
    pub(crate) systole: Option<GroupHook>,
    pub(crate) diastole: Option<GroupHook>,
}

impl Group {
    pub(crate) fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// Name within the parent group (empty for the root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Child names in insertion order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Look up a direct child.
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Update chain entries in evaluation order.
    pub fn chain(&self) -> impl Iterator<Item = &str> {
        self.chain.iter().map(|e| e.name.as_str())
    }

    /// Whether a systole hook is installed.
    pub fn has_systole(&self) -> bool {
        self.systole.is_some()
    }

    /// Whether a diastole hook is installed.
    pub fn has_diastole(&self) -> bool {
        self.diastole.is_some()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("chain", &self.chain().collect::<Vec<_>>())
            .field("systole", &self.systole.is_some())
            .field("diastole", &self.diastole.is_some())
            .finish()
    }
}
