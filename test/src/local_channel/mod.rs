/// In-memory peer channel for E2E testing
/// Frames sent by the host wait in an inbox until the test delivers them,
/// and the buffered byte count can be forced up to simulate congestion

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use lobby_host::{ChannelState, PeerChannel, SendError};

struct Wire {
    state: ChannelState,
    buffered: usize,
    inbox: VecDeque<String>,
    fail_sends: bool,
    sent: usize,
}

impl Default for Wire {
    fn default() -> Self {
        Self {
            state: ChannelState::Open,
            buffered: 0,
            inbox: VecDeque::new(),
            fail_sends: false,
            sent: 0,
        }
    }
}

/// The host's end of a local channel
pub struct LocalChannel {
    wire: Arc<Mutex<Wire>>,
}

/// The test's view of a [`LocalChannel`]
#[derive(Clone)]
pub struct ChannelProbe {
    wire: Arc<Mutex<Wire>>,
}

impl LocalChannel {
    pub fn new() -> (Self, ChannelProbe) {
        let wire = Arc::new(Mutex::new(Wire::default()));
        (Self { wire: wire.clone() }, ChannelProbe { wire })
    }
}

impl PeerChannel for LocalChannel {
    fn state(&self) -> ChannelState {
        lock(&self.wire).state
    }

    fn buffered_amount(&self) -> usize {
        lock(&self.wire).buffered
    }

    fn send(&mut self, text: &str) -> Result<(), SendError> {
        let mut wire = lock(&self.wire);
        if wire.fail_sends {
            return Err(SendError);
        }
        wire.buffered += text.len();
        wire.sent += 1;
        wire.inbox.push_back(text.to_string());
        Ok(())
    }
}

impl ChannelProbe {
    /// Everything put on the wire since the last call. Transmitting empties
    /// the channel's buffer.
    pub fn deliver(&self) -> Vec<String> {
        let mut wire = lock(&self.wire);
        wire.buffered = 0;
        wire.inbox.drain(..).collect()
    }

    /// Pretend `bytes` are still waiting to go out
    pub fn congest(&self, bytes: usize) {
        lock(&self.wire).buffered = bytes;
    }

    pub fn set_state(&self, state: ChannelState) {
        lock(&self.wire).state = state;
    }

    pub fn fail_sends(&self, fail: bool) {
        lock(&self.wire).fail_sends = fail;
    }

    pub fn buffered(&self) -> usize {
        lock(&self.wire).buffered
    }

    /// Frames accepted by the channel so far
    pub fn sent(&self) -> usize {
        lock(&self.wire).sent
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.wire).inbox.len()
    }
}

fn lock(wire: &Mutex<Wire>) -> MutexGuard<'_, Wire> {
    wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
