use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::json;
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use crate::host::{Host, HostEffect};

use super::{
    handle::{HostHandle, HostInput},
    narrator::Narrator,
    scheduler::Scheduler,
};

enum Wake {
    Input(HostInput),
    StallCheck,
    Closed,
}

/// Drives a [`Host`] from a single task.
///
/// Inputs are handled strictly one at a time, so every command runs to
/// completion before the next is looked at. Effects left behind by a command
/// are turned into timers and narration tasks whose results come back as
/// further inputs.
pub struct HostRuntime {
    host: Host,
    narrator: Arc<dyn Narrator>,
    scheduler: Scheduler,
    sender: mpsc::UnboundedSender<HostInput>,
    receiver: mpsc::UnboundedReceiver<HostInput>,
}

impl HostRuntime {
    pub fn new(host: Host, narrator: Arc<dyn Narrator>) -> (Self, HostHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = HostHandle::new(sender.clone());
        let runtime = Self {
            host,
            narrator,
            scheduler: Scheduler::new(),
            sender,
            receiver,
        };
        (runtime, handle)
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Run until [`HostHandle::shutdown`] is called, then give the host back.
    pub async fn run(mut self) -> Host {
        let mut stall_check = time::interval(self.host.config().stall_check_interval);
        stall_check.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        stall_check.tick().await;

        info!("Host runtime started");
        // effects queued before the runtime took over
        self.run_effects();
        loop {
            let wake = tokio::select! {
                input = self.receiver.recv() => match input {
                    Some(input) => Wake::Input(input),
                    None => Wake::Closed,
                },
                _ = stall_check.tick() => Wake::StallCheck,
            };
            match wake {
                Wake::Input(input) => {
                    if !self.handle_input(input) {
                        break;
                    }
                }
                Wake::StallCheck => {
                    let resent = self.host.check_stalls(Instant::now().into_std());
                    if resent > 0 {
                        debug!("Host runtime: resent {} snapshots", resent);
                    }
                }
                Wake::Closed => break,
            }
            self.run_effects();
        }

        self.scheduler.cancel_all();
        info!("Host runtime stopped");
        self.host
    }

    /// Returns false when the loop should stop.
    fn handle_input(&mut self, input: HostInput) -> bool {
        let now = Instant::now().into_std();
        match input {
            HostInput::Connect { peer, channel } => self.host.connect_peer(peer, channel),
            HostInput::Disconnect { peer } => {
                if let Err(err) = self.host.disconnect_peer(&peer) {
                    debug!("Host runtime: {}", err);
                }
            }
            HostInput::Message { peer, text } => {
                self.host.receive_at(&peer, &text, now);
            }
            HostInput::Drained { peer } => {
                if let Err(err) = self.host.peer_drained(&peer) {
                    debug!("Host runtime: {}", err);
                }
            }
            HostInput::Command { kind, body } => {
                self.host.command_at(&kind, body, now);
            }
            HostInput::Timer {
                key,
                generation,
                kind,
                body,
            } => {
                if self.scheduler.fire(&key, generation) {
                    debug!("Host runtime: timer {} fired", key);
                    self.host.command_at(&kind, body, now);
                } else {
                    debug!("Host runtime: stale timer {} ignored", key);
                }
            }
            HostInput::Narration { reply_kind, text } => {
                self.host.command_at(&reply_kind, json!({ "text": text }), now);
            }
            HostInput::Inspect(f) => f(&self.host),
            HostInput::Shutdown => return false,
        }
        true
    }

    fn run_effects(&mut self) {
        loop {
            let effects = self.host.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                self.run_effect(effect);
            }
        }
    }

    fn run_effect(&mut self, effect: HostEffect) {
        match effect {
            HostEffect::Schedule {
                key,
                after,
                kind,
                body,
            } => self
                .scheduler
                .schedule(key, after, kind, body, self.sender.clone()),
            HostEffect::Cancel { key } => {
                self.scheduler.cancel(&key);
            }
            HostEffect::Narrate { lines, reply_kind } => self.narrate(lines, reply_kind),
        }
    }

    fn narrate(&self, lines: Vec<String>, reply_kind: String) {
        let narrator = self.narrator.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            match narrator.narrate(lines).await {
                Ok(text) => {
                    let _ = sender.send(HostInput::Narration { reply_kind, text });
                }
                Err(err) => warn!("Host runtime: narration dropped: {}", err),
            }
        });
    }
}
