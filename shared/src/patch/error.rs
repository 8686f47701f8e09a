use thiserror::Error;

/// Errors that can occur while applying a patch to a replica
///
/// Patch ops come from the host, but a replica that has drifted (or a patch
/// produced against a different revision) can make any op invalid. Applying
/// is all-or-nothing: the first error aborts the whole op list and the
/// replica keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// Path contained an empty segment (e.g. `"a..b"`)
    #[error("Empty segment in patch path {path:?}")]
    EmptyPathSegment { path: String },

    /// A path segment did not exist
    #[error("Path {path} not found")]
    PathNotFound { path: String },

    /// Path traversal or a root-level op hit something that is not an object
    #[error("Value at {path} is not an object")]
    NotAnObject { path: String },

    /// `insert` targeted something that is not an array
    #[error("Value at {path} is not an array")]
    NotAnArray { path: String },

    /// `remove` by index past the end of an array
    #[error("Index {index} out of range for array at {path} (len {len})")]
    IndexOutOfRange {
        path: String,
        index: u64,
        len: usize,
    },

    /// `remove` by id found no matching element
    #[error("No element with id {id} in array at {path}")]
    ElementNotFound { path: String, id: String },

    /// `remove` by key found no such key
    #[error("No key {key} in object at {path}")]
    KeyNotFound { path: String, key: String },

    /// `remove` selector has the wrong shape for its target
    #[error("Invalid remove selector for value at {path}")]
    InvalidSelector { path: String },

    /// `merge` value is incompatible with the target
    #[error("Cannot merge into value at {path}: {reason}")]
    InvalidMerge { path: String, reason: &'static str },
}
