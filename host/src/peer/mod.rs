mod channel;
mod peer_queues;
mod send_queue;

pub use channel::{ChannelState, PeerChannel, SendError};
pub use peer_queues::PeerQueues;
pub use send_queue::{PeerSendQueue, SendOutcome};
