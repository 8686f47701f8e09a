//! Incremental operations over a replicated JSON value.
//!
//! A patch is an ordered list of [`PatchOp`]s that takes a replica from
//! revision `N` to `N + 1`. Ops mutate in place and are not safe to replay,
//! so the revision guard on the receiving side is what keeps them correct.

mod apply;
mod diff;
mod error;
mod patch_op;

pub use apply::apply_ops;
pub use diff::diff;
pub use error::PatchError;
pub use patch_op::PatchOp;
