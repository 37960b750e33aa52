//! Serializable snapshot records.

use drift_core::SnapshotIndex;
use drift_frame::ndarray::ArrayD;
use drift_frame::Frame;
use serde::{Deserialize, Serialize};

use crate::hash::{fold_field, start};

/// One field's value at snapshot time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Dotted path of the field.
    pub path: String,
    /// Field description.
    #[serde(default)]
    pub description: String,
    /// Declared shape.
    pub shape: Vec<usize>,
    /// Values in row-major order.
    pub data: Vec<f64>,
}

impl FieldRecord {
    /// Whether `data` holds exactly as many entries as `shape` implies.
    pub fn is_consistent(&self) -> bool {
        self.shape.iter().product::<usize>() == self.data.len()
    }
}

/// The full field tree at one scheduled time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Position in the snapshot sequence; 0 is the state at INIT.
    pub index: u32,
    /// Simulation time.
    pub time: f64,
    /// Every field of the tree, in tree order.
    pub fields: Vec<FieldRecord>,
}

impl SnapshotRecord {
    /// Capture every field of `frame`.
    pub fn capture(index: SnapshotIndex, time: f64, frame: &Frame) -> Self {
        let fields = frame
            .fields()
            .into_iter()
            .map(|(path, field)| FieldRecord {
                path: path.as_str().to_string(),
                description: field.description().to_string(),
                shape: field.shape().to_vec(),
                data: field.value().iter().copied().collect(),
            })
            .collect();
        Self {
            index: index.0,
            time,
            fields,
        }
    }

    /// Typed snapshot index.
    pub fn snapshot_index(&self) -> SnapshotIndex {
        SnapshotIndex(self.index)
    }

    /// Look up a field record by path.
    pub fn field_record(&self, path: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// A field's value as an array, or `None` if it is absent or
    /// inconsistent.
    pub fn field(&self, path: &str) -> Option<ArrayD<f64>> {
        let record = self.field_record(path)?;
        ArrayD::from_shape_vec(record.shape.clone(), record.data.clone()).ok()
    }

    /// FNV-1a digest of every field, matching
    /// [`state_hash`](crate::state_hash) of the captured frame.
    pub fn hash(&self) -> u64 {
        self.fields.iter().fold(start(), |hash, f| {
            fold_field(hash, &f.path, &f.shape, f.data.iter())
        })
    }

    /// First field whose data length disagrees with its shape.
    pub fn first_inconsistent(&self) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| !f.is_consistent())
    }
}
