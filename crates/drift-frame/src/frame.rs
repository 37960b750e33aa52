//! The field tree: an arena of nodes addressed by dotted path.

use drift_core::{FieldPath, FrameError, NodeId};
use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewMutD};

use crate::clamp;
use crate::field::{Domain, Field, Updater};
use crate::group::{ChainEntry, Group, GroupHook};

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Field(Field),
    Group(Group),
}

/// Hierarchical store of fields and groups.
///
/// Nodes live in an arena and are never removed, so a [`NodeId`] stays
/// valid for the lifetime of the frame. The root group is always
/// [`NodeId::ROOT`] at the empty path.
///
/// # Examples
///
/// ```
/// use drift_frame::{Frame, Updater};
/// use drift_frame::ndarray::{arr1, ArrayD};
///
/// let mut frame = Frame::new();
/// frame.add_group("", "gas", "gas quantities").unwrap();
/// frame.add_field("gas", "T", arr1(&[100.0, 50.0]).into_dyn(), "temperature").unwrap();
/// frame.add_field("gas", "cs", ArrayD::zeros(vec![2]), "sound speed").unwrap();
/// frame
///     .set_updater(
///         "gas.cs",
///         Updater::computed(|f| Ok(f.get("gas.T")?.mapv(f64::sqrt))),
///     )
///     .unwrap();
/// frame.set_chain("gas", &["cs"]).unwrap();
/// frame.set_chain("", &["gas"]).unwrap();
///
/// frame.update().unwrap();
/// assert_eq!(frame.get("gas.cs").unwrap()[[0]], 10.0);
/// ```
#[derive(Clone, Debug)]
pub struct Frame {
    nodes: Vec<Node>,
    paths: Vec<FieldPath>,
    index: IndexMap<String, NodeId>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Create a frame holding only the empty root group.
    pub fn new() -> Self {
        let mut index = IndexMap::new();
        index.insert(String::new(), NodeId::ROOT);
        Self {
            nodes: vec![Node::Group(Group::new("", ""))],
            paths: vec![FieldPath::root()],
            index,
        }
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Resolve a dotted path to its node.
    pub fn resolve(&self, path: &str) -> Result<NodeId, FrameError> {
        if let Some(&id) = self.index.get(path) {
            return Ok(id);
        }
        // Distinguish malformed paths from missing ones.
        FieldPath::parse(path)?;
        Err(FrameError::PathNotFound {
            path: path.to_string(),
        })
    }

    /// Whether anything exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Whether `path` names a group.
    pub fn is_group(&self, path: &str) -> bool {
        self.index
            .get(path)
            .is_some_and(|id| matches!(self.nodes[id.index()], Node::Group(_)))
    }

    /// Path of a node, or `None` if the id is out of range.
    pub fn node_path(&self, id: NodeId) -> Option<&FieldPath> {
        self.paths.get(id.index())
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn path_of(&self, id: NodeId) -> &FieldPath {
        &self.paths[id.index()]
    }

    /// The field at `path`.
    pub fn field(&self, path: &str) -> Result<&Field, FrameError> {
        match &self.nodes[self.resolve(path)?.index()] {
            Node::Field(field) => Ok(field),
            Node::Group(_) => Err(FrameError::NotAField {
                path: path.to_string(),
            }),
        }
    }

    fn field_mut(&mut self, path: &str) -> Result<&mut Field, FrameError> {
        let id = self.resolve(path)?;
        match &mut self.nodes[id.index()] {
            Node::Field(field) => Ok(field),
            Node::Group(_) => Err(FrameError::NotAField {
                path: path.to_string(),
            }),
        }
    }

    /// The group at `path`.
    pub fn group(&self, path: &str) -> Result<&Group, FrameError> {
        match &self.nodes[self.resolve(path)?.index()] {
            Node::Group(group) => Ok(group),
            Node::Field(_) => Err(FrameError::NotAGroup {
                path: path.to_string(),
            }),
        }
    }

    fn group_mut(&mut self, path: &str) -> Result<&mut Group, FrameError> {
        let id = self.resolve(path)?;
        match &mut self.nodes[id.index()] {
            Node::Group(group) => Ok(group),
            Node::Field(_) => Err(FrameError::NotAGroup {
                path: path.to_string(),
            }),
        }
    }

    /// Current value of the field at `path`.
    pub fn get(&self, path: &str) -> Result<&ArrayD<f64>, FrameError> {
        Ok(self.field(path)?.value())
    }

    /// Value of a single-element field.
    pub fn scalar(&self, path: &str) -> Result<f64, FrameError> {
        let value = self.get(path)?;
        match value.iter().next() {
            Some(&v) if value.len() == 1 => Ok(v),
            _ => Err(FrameError::ShapeMismatch {
                path: path.to_string(),
                expected: Vec::new(),
                found: value.shape().to_vec(),
            }),
        }
    }

    /// All fields in depth-first tree order.
    pub fn fields(&self) -> Vec<(&FieldPath, &Field)> {
        let mut out = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            match &self.nodes[id.index()] {
                Node::Field(field) => out.push((&self.paths[id.index()], field)),
                Node::Group(group) => stack.extend(group.children.values().rev().copied()),
            }
        }
        out
    }

    // ── Construction ────────────────────────────────────────────

    fn insert_child(&mut self, parent: &str, name: &str, node: Node) -> Result<NodeId, FrameError> {
        let parent_path = FieldPath::parse(parent)?;
        let child = parent_path.join(name)?;
        if child.segments().len() != parent_path.segments().len() + 1 {
            return Err(FrameError::InvalidPath {
                path: name.to_string(),
                reason: "child names must be a single non-empty segment".into(),
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        let group = self.group_mut(parent)?;
        if group.children.contains_key(name) {
            return Err(FrameError::DuplicateName {
                group: parent.to_string(),
                name: name.to_string(),
            });
        }
        group.children.insert(name.to_string(), id);
        self.index.insert(child.as_str().to_string(), id);
        self.nodes.push(node);
        self.paths.push(child);
        Ok(id)
    }

    /// Add an empty group under `parent`.
    pub fn add_group(&mut self, parent: &str, name: &str, description: &str) -> Result<NodeId, FrameError> {
        self.insert_child(parent, name, Node::Group(Group::new(name, description)))
    }

    /// Add a frozen field whose shape is taken from `initial`.
    ///
    /// The new field is not part of any update chain.
    pub fn add_field(
        &mut self,
        group: &str,
        name: &str,
        initial: ArrayD<f64>,
        description: &str,
    ) -> Result<NodeId, FrameError> {
        self.insert_child(group, name, Node::Field(Field::new(name, initial, description)))
    }

    // ── Field mutation ──────────────────────────────────────────

    /// Replace a field's value. The shape must match the declared shape.
    pub fn set(&mut self, path: &str, value: ArrayD<f64>) -> Result<(), FrameError> {
        self.field_mut(path)?.assign(path, value)
    }

    /// Set every entry of a field to `value`.
    pub fn fill(&mut self, path: &str, value: f64) -> Result<(), FrameError> {
        self.field_mut(path)?.value.fill(value);
        Ok(())
    }

    /// Mutable view for in-place edits. The shape cannot change.
    pub fn value_mut(&mut self, path: &str) -> Result<ArrayViewMutD<'_, f64>, FrameError> {
        Ok(self.field_mut(path)?.value.view_mut())
    }

    /// Replace a field's updater.
    pub fn set_updater(&mut self, path: &str, updater: Updater) -> Result<(), FrameError> {
        self.field_mut(path)?.updater = updater;
        Ok(())
    }

    /// Stop recomputing a field; it keeps its current value.
    pub fn freeze(&mut self, path: &str) -> Result<(), FrameError> {
        self.set_updater(path, Updater::Frozen)
    }

    /// Declare the admissible value range of a field.
    pub fn set_domain(&mut self, path: &str, domain: Domain) -> Result<(), FrameError> {
        self.field_mut(path)?.domain = domain;
        Ok(())
    }

    /// Raise every entry at or below the floor field to
    /// [`FLOOR_FRACTION`](crate::FLOOR_FRACTION) of the floor.
    ///
    /// Returns the number of entries changed.
    pub fn clamp_to_floor(&mut self, path: &str, floor_path: &str) -> Result<usize, FrameError> {
        let floor = self.get(floor_path)?.clone();
        let values = self.value_mut(path)?;
        clamp::clamp_to_floor(path, values, floor.view())
    }

    // ── Group configuration ─────────────────────────────────────

    fn resolve_entry(&self, group: &str, entry: &str) -> Result<ChainEntry, FrameError> {
        let unknown = || FrameError::UnknownChainEntry {
            group: group.to_string(),
            entry: entry.to_string(),
        };
        if entry.is_empty() {
            return Err(unknown());
        }
        let full = FieldPath::parse(group)?.join(entry).map_err(|_| unknown())?;
        let node = self.index.get(full.as_str()).copied().ok_or_else(unknown)?;
        Ok(ChainEntry {
            name: entry.to_string(),
            node,
        })
    }

    /// Replace the update chain of `group`.
    ///
    /// Entries are relative paths to descendants of the group and may be
    /// dotted (`"v.rad"`). The chain is resolved now; on error it is left
    /// unchanged.
    pub fn set_chain<S: AsRef<str>>(&mut self, group: &str, entries: &[S]) -> Result<(), FrameError> {
        self.group(group)?;
        let chain = entries
            .iter()
            .map(|e| self.resolve_entry(group, e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.group_mut(group)?.chain = chain;
        Ok(())
    }

    /// Append one entry to the update chain of `group`.
    pub fn append_to_chain(&mut self, group: &str, entry: &str) -> Result<(), FrameError> {
        self.group(group)?;
        let entry = self.resolve_entry(group, entry)?;
        self.group_mut(group)?.chain.push(entry);
        Ok(())
    }

    /// Update chain of `group`, as written.
    pub fn chain(&self, group: &str) -> Result<Vec<String>, FrameError> {
        Ok(self.group(group)?.chain().map(str::to_string).collect())
    }

    /// Install or clear the hook run before `group`'s chain.
    pub fn set_systole(&mut self, group: &str, hook: Option<GroupHook>) -> Result<(), FrameError> {
        self.group_mut(group)?.systole = hook;
        Ok(())
    }

    /// Install or clear the hook run after `group`'s chain.
    pub fn set_diastole(&mut self, group: &str, hook: Option<GroupHook>) -> Result<(), FrameError> {
        self.group_mut(group)?.diastole = hook;
        Ok(())
    }

    pub(crate) fn assign_node(&mut self, id: NodeId, value: ArrayD<f64>) -> Result<(), FrameError> {
        let path = &self.paths[id.index()];
        match &mut self.nodes[id.index()] {
            Node::Field(field) => field.assign(path.as_str(), value),
            Node::Group(_) => Err(FrameError::NotAField {
                path: path.as_str().to_string(),
            }),
        }
    }
}
