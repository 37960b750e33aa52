//! Strongly-typed identifiers and the [`Shape`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a node (field or group) inside a frame's arena.
///
/// Nodes are never removed, so a `NodeId` stays valid for the lifetime
/// of the frame that issued it. `NodeId(0)` is always the root group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root group of every frame.
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Stable identifier of an instruction in the integration pipeline.
///
/// Assigned once when the instruction is added and never reused, so
/// removing one instruction cannot change which instruction a later
/// removal or toggle refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstructionId(pub u64);

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for InstructionId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a persisted snapshot.
///
/// Index 0 is the state at initialization; scheduled snapshots follow
/// in increasing time order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SnapshotIndex(pub u32);

impl SnapshotIndex {
    /// The index following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SnapshotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl From<u32> for SnapshotIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Shape of a field value.
///
/// Uses `SmallVec<[usize; 4]>` so the shapes in use (0-d time, radial
/// profiles, radius × species tables) never touch the heap.
pub type Shape = SmallVec<[usize; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_index_formats_zero_padded() {
        assert_eq!(SnapshotIndex(7).to_string(), "0007");
        assert_eq!(SnapshotIndex(12345).to_string(), "12345");
        assert_eq!(SnapshotIndex(3).next(), SnapshotIndex(4));
    }

    #[test]
    fn instruction_id_display() {
        assert_eq!(InstructionId(3).to_string(), "#3");
    }
}
