use std::fmt::Debug;

use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::patch::{self, PatchOp};

use super::command::{CommandContext, Outcome};

pub const DEFAULT_INCREMENTAL_MAX: usize = 32;

/// Declares one replicated object: its id, seed state, wire projection and
/// the closed set of commands that may change it.
///
/// The host owns the only writable instance. Guests hold replicas that are
/// only ever replaced or patched from host messages, and they validate every
/// incoming value with [`SyncModel::deserialize`] before trusting it.
pub trait SyncModel: Sized + Send + Sync + 'static {
    type State: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Command: Debug;

    /// Globally unique object id
    const ID: &'static str;
    /// Every command kind [`SyncModel::parse`] understands
    const COMMANDS: &'static [&'static str];
    /// A change needing more ops than this is sent as a full replace
    const INCREMENTAL_MAX: usize = DEFAULT_INCREMENTAL_MAX;
    /// Whether a freshly started guest asks for a snapshot right away
    const REQUEST_ON_START: bool = true;

    /// Seed state on the host
    fn initial() -> Self::State;

    fn serialize(state: &Self::State) -> Value {
        match serde_json::to_value(state) {
            Ok(value) => value,
            Err(err) => {
                warn!("SyncModel {}: state could not be serialized: {}", Self::ID, err);
                Value::Null
            }
        }
    }

    /// `None` for anything that is not a valid state
    fn deserialize(value: &Value) -> Option<Self::State> {
        Self::State::deserialize(value).ok()
    }

    /// Incremental ops from `prev` to `next` (both serialized), or `None` if
    /// the change should travel as a snapshot
    fn diff(prev: &Value, next: &Value) -> Option<Vec<PatchOp>> {
        patch::diff(prev, next)
    }

    /// Validate a command body. `None` drops the command.
    fn parse(kind: &str, body: &Value) -> Option<Self::Command>;

    fn authorize(_ctx: &CommandContext<'_>, _state: &Self::State, _command: &Self::Command) -> bool {
        true
    }

    fn handle(
        ctx: &CommandContext<'_>,
        state: &Self::State,
        command: Self::Command,
    ) -> Outcome<Self::State>;
}
