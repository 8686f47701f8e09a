mod error;
mod handle;
mod narrator;
mod runtime;
mod scheduler;

pub use error::{NarrationError, RuntimeError};
pub use handle::{HostHandle, HostInput};
pub use narrator::{Narrator, NullNarrator};
pub use runtime::HostRuntime;
pub use scheduler::Scheduler;
