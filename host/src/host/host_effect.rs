use std::time::Duration;

use serde_json::Value;

use lobby_shared::Effect;

/// The part of an [`Effect`] that outlives a command: everything but
/// `Dispatch`, which the host runs inline before the command returns.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEffect {
    Narrate {
        lines: Vec<String>,
        reply_kind: String,
    },
    Schedule {
        key: String,
        after: Duration,
        kind: String,
        body: Value,
    },
    Cancel {
        key: String,
    },
}

/// Either a follow-up command to run now, or an effect for the runtime
pub(crate) enum Routed {
    FollowUp { kind: String, body: Value },
    Deferred(HostEffect),
}

impl From<Effect> for Routed {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Dispatch { kind, body } => Routed::FollowUp { kind, body },
            Effect::Narrate { lines, reply_kind } => {
                Routed::Deferred(HostEffect::Narrate { lines, reply_kind })
            }
            Effect::Schedule {
                key,
                after,
                kind,
                body,
            } => Routed::Deferred(HostEffect::Schedule {
                key,
                after,
                kind,
                body,
            }),
            Effect::Cancel { key } => Routed::Deferred(HostEffect::Cancel { key }),
        }
    }
}
