use std::{any::Any, time::Duration};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{content::Content, policy::SyncPolicy, types::Actor};

use super::model::SyncModel;

/// Side work a handler asks for. Handlers never perform I/O themselves; the
/// host runs these after the state change has been committed.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Run another command as the host, right after the current one
    Dispatch { kind: String, body: Value },
    /// Ask the narrator to describe `lines`; the text comes back as a host
    /// command of `reply_kind` with body `{ "text": .. }`
    Narrate {
        lines: Vec<String>,
        reply_kind: String,
    },
    /// Run `kind` as a host command after `after`, unless cancelled first
    Schedule {
        key: String,
        after: Duration,
        kind: String,
        body: Value,
    },
    /// Cancel a pending [`Effect::Schedule`] by key
    Cancel { key: String },
}

/// What a command handler produced: the next state (if it changed
/// anything) and the effects to run afterwards.
#[derive(Debug)]
pub struct Outcome<S> {
    pub next: Option<S>,
    pub effects: Vec<Effect>,
}

impl<S> Outcome<S> {
    pub fn unchanged() -> Self {
        Self {
            next: None,
            effects: Vec::new(),
        }
    }

    pub fn changed(next: S) -> Self {
        Self {
            next: Some(next),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Read access to the authoritative state of every object.
pub trait StateSource {
    fn state_of(&self, id: &str) -> Option<&dyn Any>;
}

/// A source with no objects, for handlers that run in isolation.
pub struct NoObjects;

impl StateSource for NoObjects {
    fn state_of(&self, _id: &str) -> Option<&dyn Any> {
        None
    }
}

/// Everything a command handler may look at besides its own state.
pub struct CommandContext<'a> {
    pub actor: &'a Actor,
    pub now_ms: u64,
    /// Random per-command token, used to mint ids for new entries
    pub nonce: &'a str,
    pub policy: &'a SyncPolicy,
    pub content: &'a dyn Content,
    objects: &'a dyn StateSource,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        actor: &'a Actor,
        now_ms: u64,
        nonce: &'a str,
        policy: &'a SyncPolicy,
        content: &'a dyn Content,
        objects: &'a dyn StateSource,
    ) -> Self {
        Self {
            actor,
            now_ms,
            nonce,
            policy,
            content,
            objects,
        }
    }

    /// Current state of another model. The object being handled is not
    /// visible here; it is passed to the handler directly.
    pub fn read<M: SyncModel>(&self) -> Option<&'a M::State> {
        let objects: &'a dyn StateSource = self.objects;
        objects.state_of(M::ID)?.downcast_ref::<M::State>()
    }
}

/// Deserialize a command body, `None` if it does not fit `T`.
pub fn parse_body<T: DeserializeOwned>(body: &Value) -> Option<T> {
    T::deserialize(body).ok()
}
