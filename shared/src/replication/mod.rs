mod change;
mod replicated_object;
mod replicator;

pub use change::{Change, ChangePayload};
pub use replicated_object::{DispatchStatus, Dispatched, ObjectsView, ReplicatedObject};
pub use replicator::Replicator;
