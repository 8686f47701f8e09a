mod checked_map;
mod command;
mod error;
mod model;
mod registry;

pub use command::{parse_body, CommandContext, Effect, NoObjects, Outcome, StateSource};
pub use error::RegistryError;
pub use model::{SyncModel, DEFAULT_INCREMENTAL_MAX};
pub use registry::{ModelEntry, Registry};
