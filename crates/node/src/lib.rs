mod behavior;
mod buffer;
mod error;
mod node;
mod peer;

pub use behavior::{NodeBehavior, SybilBehavior};
pub use error::{Failure, NodeError};
pub use node::LedgerNode;
pub use peer::{Peer, PeerConfig};
