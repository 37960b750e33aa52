//! Update-chain evaluation.

use drift_core::{FieldPath, FrameError, NodeId, UpdateError};
use tracing::trace;

use crate::check::check_values;
use crate::field::Updater;
use crate::frame::{Frame, Node};

impl Frame {
    /// Evaluate the root group's update chain.
    ///
    /// A single left-to-right pass: nested groups are refreshed
    /// recursively in chain order, computed fields are recomputed from
    /// the current state and frozen fields are skipped. There is no
    /// cycle or staleness detection; a field read before it is
    /// recomputed later in the same pass yields its previous value.
    pub fn update(&mut self) -> Result<(), UpdateError> {
        self.update_node(NodeId::ROOT)
    }

    /// Refresh a single field, or a group and its chain.
    pub fn update_path(&mut self, path: &str) -> Result<(), UpdateError> {
        let id = self.resolve(path)?;
        self.update_node(id)
    }

    /// Fields visited by [`update()`](Self::update), in visit order.
    ///
    /// A field listed in more than one chain appears once per visit.
    pub fn evaluation_order(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        self.collect_order(NodeId::ROOT, &mut out);
        out
    }

    fn collect_order(&self, id: NodeId, out: &mut Vec<FieldPath>) {
        match self.node(id) {
            Node::Field(_) => out.push(self.path_of(id).clone()),
            Node::Group(group) => {
                for entry in &group.chain {
                    self.collect_order(entry.node, out);
                }
            }
        }
    }

    fn update_node(&mut self, id: NodeId) -> Result<(), UpdateError> {
        match self.node(id) {
            Node::Field(_) => self.update_field(id),
            Node::Group(_) => self.update_group(id),
        }
    }

    fn update_group(&mut self, id: NodeId) -> Result<(), UpdateError> {
        let Node::Group(group) = self.node(id) else {
            return Ok(());
        };
        let entries: Vec<NodeId> = group.chain.iter().map(|e| e.node).collect();
        let systole = group.systole.clone();
        let diastole = group.diastole.clone();

        if let Some(hook) = systole {
            hook(self)?;
        }
        for entry in entries {
            self.update_node(entry)?;
        }
        if let Some(hook) = diastole {
            hook(self)?;
        }
        Ok(())
    }

    fn update_field(&mut self, id: NodeId) -> Result<(), UpdateError> {
        let Node::Field(field) = self.node(id) else {
            return Ok(());
        };
        let compute = match field.updater() {
            Updater::Computed(f) => f.clone(),
            Updater::Frozen => return Ok(()),
        };
        let domain = field.domain();
        let path = self.path_of(id).as_str().to_string();

        let value = compute(self).map_err(|e| UpdateError::from_compute(&path, e))?;
        check_values(&path, value.view(), domain)?;
        self.assign_node(id, value).map_err(|source| match source {
            FrameError::ShapeMismatch { .. } => UpdateError::Dependency {
                field: path.clone(),
                source,
            },
            other => UpdateError::Frame(other),
        })?;
        trace!(field = %path, "recomputed");
        Ok(())
    }
}
