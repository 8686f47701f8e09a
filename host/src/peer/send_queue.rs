use std::collections::VecDeque;

use log::{debug, warn};

use lobby_shared::SyncPolicy;

use super::channel::{ChannelState, PeerChannel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the channel
    Sent,
    /// Held back by backpressure or a failed send
    Queued,
    /// The channel is not open
    Dropped,
}

/// Backpressure-aware outbound buffer for one peer.
///
/// Messages go straight to the channel while its buffer is below the high
/// water mark, and into a bounded pending queue otherwise. Once anything is
/// pending, later messages queue behind it so the peer sees them in order.
/// Overflow drops the oldest pending message; delivery is not guaranteed
/// here, replicas recover through snapshots instead.
pub struct PeerSendQueue {
    channel: Box<dyn PeerChannel>,
    pending: VecDeque<String>,
    dropped: u64,
}

impl PeerSendQueue {
    pub fn new(channel: Box<dyn PeerChannel>) -> Self {
        Self {
            channel,
            pending: VecDeque::new(),
            dropped: 0,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Messages discarded on overflow since the queue was created
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn send(&mut self, text: String, policy: &SyncPolicy) -> SendOutcome {
        if self.channel.state() != ChannelState::Open {
            debug!("Peer channel not open, dropping {} byte message", text.len());
            return SendOutcome::Dropped;
        }

        if !self.pending.is_empty() {
            self.enqueue(text, policy);
            self.flush(policy);
            return if self.pending.is_empty() {
                SendOutcome::Sent
            } else {
                SendOutcome::Queued
            };
        }

        if self.channel.buffered_amount() > policy.high_water_mark() {
            self.enqueue(text, policy);
            return SendOutcome::Queued;
        }

        match self.channel.send(&text) {
            Ok(()) => SendOutcome::Sent,
            Err(err) => {
                warn!("{}, queueing message for retry", err);
                self.enqueue(text, policy);
                SendOutcome::Queued
            }
        }
    }

    /// Send pending messages while the channel stays under the flush mark.
    /// Returns how many were sent.
    pub fn flush(&mut self, policy: &SyncPolicy) -> usize {
        let flush_mark = policy.flush_mark();
        let mut sent = 0;

        while self.channel.state() == ChannelState::Open {
            let Some(next) = self.pending.front() else {
                break;
            };
            let buffered = self.channel.buffered_amount();
            if buffered > 0 && buffered + next.len() > flush_mark {
                break;
            }
            if let Err(err) = self.channel.send(next) {
                warn!("{} while flushing, {} messages still pending", err, self.pending.len());
                break;
            }
            self.pending.pop_front();
            sent += 1;
        }

        sent
    }

    fn enqueue(&mut self, text: String, policy: &SyncPolicy) {
        self.pending.push_back(text);
        while self.pending.len() > policy.max_queue.max(1) {
            self.pending.pop_front();
            self.dropped += 1;
            warn!(
                "Peer send queue full ({} messages), dropped oldest message",
                policy.max_queue
            );
        }
    }
}
