use std::any::{type_name, TypeId};

use log::{debug, info};
use serde_json::Value;

use crate::replication::{ReplicatedObject, Replicator};

use super::{checked_map::CheckedMap, error::RegistryError, model::SyncModel};

/// Type-erased facts about one registered [`SyncModel`].
pub struct ModelEntry {
    id: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    commands: &'static [&'static str],
    request_on_start: bool,
    validate: fn(&Value) -> bool,
    spawn: fn() -> Box<dyn ReplicatedObject>,
}

fn validate<M: SyncModel>(value: &Value) -> bool {
    M::deserialize(value).is_some()
}

fn spawn<M: SyncModel>() -> Box<dyn ReplicatedObject> {
    Box::new(Replicator::<M>::new())
}

impl ModelEntry {
    fn of<M: SyncModel>() -> Self {
        Self {
            id: M::ID,
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            commands: M::COMMANDS,
            request_on_start: M::REQUEST_ON_START,
            validate: validate::<M>,
            spawn: spawn::<M>,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn commands(&self) -> &'static [&'static str] {
        self.commands
    }

    pub fn request_on_start(&self) -> bool {
        self.request_on_start
    }

    /// True if `value` deserializes into this model's state
    pub fn validate(&self, value: &Value) -> bool {
        (self.validate)(value)
    }

    /// A fresh host-side replicator seeded with the model's initial state
    pub fn spawn(&self) -> Box<dyn ReplicatedObject> {
        (self.spawn)()
    }
}

/// The set of active sync models, built once at startup and shared by the
/// host and guests that use it.
#[derive(Default)]
pub struct Registry {
    models: CheckedMap<&'static str, ModelEntry>,
    commands: CheckedMap<&'static str, &'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `M` active. Registering the same model again is a no-op, so
    /// feature modules can each make sure their models are present.
    pub fn register<M: SyncModel>(&mut self) -> Result<&mut Self, RegistryError> {
        if let Some(existing) = self.models.get(&M::ID) {
            if existing.type_id == TypeId::of::<M>() {
                debug!("Registry: {} already registered", M::ID);
                return Ok(self);
            }
            return Err(RegistryError::DuplicateObject {
                id: M::ID,
                existing: existing.type_name,
                incoming: type_name::<M>(),
            });
        }

        for (index, kind) in M::COMMANDS.iter().enumerate() {
            let owner = self
                .commands
                .get(kind)
                .copied()
                .or_else(|| M::COMMANDS[..index].contains(kind).then_some(M::ID));
            if let Some(owner) = owner {
                return Err(RegistryError::DuplicateCommand {
                    kind: *kind,
                    owner,
                    incoming: M::ID,
                });
            }
        }

        for kind in M::COMMANDS {
            // uniqueness checked above
            let _ = self.commands.try_insert(kind, M::ID);
        }
        let _ = self.models.try_insert(M::ID, ModelEntry::of::<M>());
        info!("Registry: registered {} with {} commands", M::ID, M::COMMANDS.len());

        Ok(self)
    }

    pub fn entry(&self, id: &str) -> Result<&ModelEntry, RegistryError> {
        self.models
            .get(id)
            .ok_or_else(|| RegistryError::UnknownModel { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entry(id).is_ok()
    }

    /// Object id whose model handles `kind`
    pub fn model_for_command(&self, kind: &str) -> Option<&'static str> {
        self.commands.get(kind).copied()
    }

    /// Registered models in registration order
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
