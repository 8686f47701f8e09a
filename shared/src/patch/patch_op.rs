use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incremental operation, serialized as `{ "op": ..., "path"?: ..., "value"?: ... }`
///
/// `path` is a dot-separated chain of object keys; an absent path targets the
/// root object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Replace the whole value
    Set { value: Value },
    /// Shallow merge into the root (no path) or into a named field. Arrays
    /// merge element-wise by `id`, objects merge key-wise, anything else is
    /// overwritten.
    Merge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
    },
    /// Append one element to an array field
    Insert { path: String, value: Value },
    /// Delete by index (number), by element `id` (string, or `{ "id": .. }`),
    /// or by object key (string)
    Remove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        value: Value,
    },
}

impl PatchOp {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::Set { .. } => "set",
            PatchOp::Merge { .. } => "merge",
            PatchOp::Insert { .. } => "insert",
            PatchOp::Remove { .. } => "remove",
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            PatchOp::Set { .. } => None,
            PatchOp::Insert { path, .. } => Some(path),
            PatchOp::Merge { path, .. } | PatchOp::Remove { path, .. } => path.as_deref(),
        }
    }
}
