use std::{collections::HashMap, time::Duration};

use log::debug;
use serde_json::Value;
use tokio::{sync::mpsc, task::AbortHandle};

use super::handle::HostInput;

struct Scheduled {
    generation: u64,
    handle: AbortHandle,
}

/// Cancellable delayed commands, one per key.
///
/// A timer that fires carries the generation it was scheduled with; if the
/// key was cancelled or rescheduled in the meantime the wake-up is stale and
/// [`Scheduler::fire`] refuses it.
#[derive(Default)]
pub struct Scheduler {
    timers: HashMap<String, Scheduled>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        key: String,
        after: Duration,
        kind: String,
        body: Value,
        sender: mpsc::UnboundedSender<HostInput>,
    ) {
        self.cancel(&key);
        self.next_generation += 1;
        let generation = self.next_generation;
        let timer_key = key.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = sender.send(HostInput::Timer {
                key: timer_key,
                generation,
                kind,
                body,
            });
        });
        debug!("Scheduler: {} due in {:?}", key, after);
        self.timers.insert(
            key,
            Scheduled {
                generation,
                handle: task.abort_handle(),
            },
        );
    }

    pub fn cancel(&mut self, key: &str) -> bool {
        match self.timers.remove(key) {
            Some(scheduled) => {
                scheduled.handle.abort();
                debug!("Scheduler: cancelled {}", key);
                true
            }
            None => false,
        }
    }

    /// Claim a wake-up. True only for the live generation of `key`.
    pub fn fire(&mut self, key: &str, generation: u64) -> bool {
        match self.timers.get(key) {
            Some(scheduled) if scheduled.generation == generation => {
                self.timers.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn is_scheduled(&self, key: &str) -> bool {
        self.timers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn cancel_all(&mut self) {
        for (_, scheduled) in self.timers.drain() {
            scheduled.handle.abort();
        }
    }
}
