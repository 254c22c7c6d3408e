use std::sync::Arc;
use std::time::Duration;

use ledger::Blockchain;
use ledger_types::consts::{CHAIN_FILE_NAME, DIFFICULTY};
use ledger_types::signing::SigningOracle;
use ledger_types::{Block, Transaction};
use store::{FileStore, Store, StoreError};
use sync::{Friend, HttpChainFetcher, LoggingObserver, PullScheduler, INITIAL_DELAY, PULL_PERIOD};
use tokio::task::JoinHandle;
use tracing::info;

use crate::behavior::{NodeBehavior, SybilBehavior};
use crate::error::NodeError;
use crate::node::LedgerNode;

/// Settings for one peer process.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Port identity of this peer; also keys its store directory.
    pub port: u16,
    /// Base urls of the peers this node polls.
    pub friends: Vec<String>,
    /// Run the adversarial variant instead of the honest one.
    pub sybil: bool,
    pub initial_delay: Duration,
    pub pull_period: Duration,
    pub difficulty: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            friends: Vec::new(),
            sybil: false,
            initial_delay: INITIAL_DELAY,
            pull_period: PULL_PERIOD,
            difficulty: DIFFICULTY,
        }
    }
}

impl PeerConfig {
    /// Directory of the node's single store slot, keyed by identity.
    pub fn store_directory(&self) -> String {
        if self.sybil {
            "./sybil".to_string()
        } else {
            format!("./blockchain{}", self.port)
        }
    }
}

/// A peer on the network, both server and client: it answers for its own
/// chain and periodically asks its friends for theirs, adopting a
/// friend's chain when it is valid and further along. Both sides share
/// one store slot.
pub struct Peer {
    node: Arc<LedgerNode>,
    behavior: Arc<dyn NodeBehavior>,
    scheduler: PullScheduler,
}

impl Peer {
    /// Builds a peer over a file store keyed by the config's identity.
    pub fn open(config: &PeerConfig, oracle: Arc<dyn SigningOracle>) -> Result<Self, StoreError> {
        let store: Arc<dyn Store<Blockchain>> =
            Arc::new(FileStore::open(config.store_directory(), CHAIN_FILE_NAME)?);
        Ok(Self::with_store(config, oracle, store))
    }

    /// Builds a peer over an explicit store, with one friend per
    /// configured url, each watched by a logging observer.
    pub fn with_store(
        config: &PeerConfig,
        oracle: Arc<dyn SigningOracle>,
        store: Arc<dyn Store<Blockchain>>,
    ) -> Self {
        let friends: Vec<Arc<Friend>> = config
            .friends
            .iter()
            .map(|url| {
                let friend = Friend::new(
                    url.clone(),
                    Box::new(HttpChainFetcher::new(url)),
                    Arc::clone(&store),
                    Arc::clone(&oracle),
                    config.difficulty,
                );
                friend.add_observer(Arc::new(LoggingObserver::new(url.clone())));
                Arc::new(friend)
            })
            .collect();

        let node = Arc::new(LedgerNode::new(
            Arc::clone(&store),
            Arc::clone(&oracle),
            config.difficulty,
        ));
        let behavior: Arc<dyn NodeBehavior> = if config.sybil {
            info!("running the sybil variant");
            Arc::new(SybilBehavior::new())
        } else {
            Arc::clone(&node) as Arc<dyn NodeBehavior>
        };
        let scheduler =
            PullScheduler::with_cadence(friends, config.initial_delay, config.pull_period);

        Self {
            node,
            behavior,
            scheduler,
        }
    }

    /// Starts the periodic pulls from this peer's friends. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Stops scheduling pulls; work already in flight finishes on its own.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Offloads a mining request onto a worker context so the caller's
    /// surface stays responsive. `None` when the buffer is empty: nothing
    /// to mine, no work scheduled. Aborting the returned handle does not
    /// interrupt a mining pass already running.
    pub fn request_mining(&self) -> Option<JoinHandle<Result<bool, NodeError>>> {
        if self.node.transaction_buffer().is_empty() {
            return None;
        }
        let behavior = Arc::clone(&self.behavior);
        Some(tokio::task::spawn_blocking(move || behavior.mine()))
    }

    pub fn submit_transaction(&self, payload: &str) -> Result<Transaction, NodeError> {
        self.behavior.submit_transaction(payload)
    }

    /// Mines synchronously on the calling thread. Prefer
    /// [`Peer::request_mining`] from an async context.
    pub fn mine(&self) -> Result<bool, NodeError> {
        self.behavior.mine()
    }

    pub fn clear_buffer(&self) -> Result<Vec<Transaction>, NodeError> {
        self.behavior.clear_buffer()
    }

    /// Read-only copy of the unmined transactions.
    pub fn transaction_buffer(&self) -> Vec<Transaction> {
        self.node.transaction_buffer()
    }

    /// Blocks of this peer's chain, tip first.
    pub fn blocks(&self) -> Vec<Block> {
        self.node.blocks()
    }

    pub fn friends(&self) -> &[Arc<Friend>] {
        self.scheduler.friends()
    }

    /// Read-only copy of the friend urls.
    pub fn friend_urls(&self) -> Vec<String> {
        self.friends()
            .iter()
            .map(|friend| friend.address().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ledger_types::signing::Ed25519Oracle;
    use store::MemoryStore;

    use super::*;

    fn config() -> PeerConfig {
        PeerConfig {
            difficulty: 1,
            ..PeerConfig::default()
        }
    }

    fn peer(config: &PeerConfig) -> Peer {
        Peer::with_store(
            config,
            Arc::new(Ed25519Oracle::from_seed("peer")),
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn store_directory_is_keyed_by_identity() {
        let mut config = PeerConfig::default();
        assert_eq!(config.store_directory(), "./blockchain8081");

        config.port = 9000;
        assert_eq!(config.store_directory(), "./blockchain9000");

        config.sybil = true;
        assert_eq!(config.store_directory(), "./sybil");
    }

    #[test]
    fn peer_exposes_its_friend_urls() {
        let mut cfg = config();
        cfg.friends = vec![
            "http://localhost:8082".to_string(),
            "http://localhost:8083".to_string(),
        ];
        let peer = peer(&cfg);
        assert_eq!(peer.friend_urls(), cfg.friends);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_mining_skips_an_empty_buffer() {
        let peer = peer(&config());
        assert!(peer.request_mining().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_mining_runs_off_the_caller() {
        let peer = peer(&config());
        peer.submit_transaction("payload").unwrap();

        let handle = peer.request_mining().expect("buffer is not empty");
        let outcome = handle.await.unwrap().unwrap();

        assert!(outcome);
        assert_eq!(peer.blocks().len(), 1);
        assert!(peer.transaction_buffer().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_and_stop_are_idempotent_enough() {
        let peer = peer(&config());
        peer.start();
        peer.start();
        peer.stop();
        peer.stop();
        peer.start();
        peer.stop();
    }

    #[test]
    fn sybil_peer_refuses_operations_but_still_serves_views() {
        let mut cfg = config();
        cfg.sybil = true;
        let peer = peer(&cfg);

        assert!(matches!(
            peer.submit_transaction("payload"),
            Err(NodeError::MalformedTransaction { .. })
        ));
        assert!(!peer.mine().unwrap());
        assert!(peer.clear_buffer().unwrap().is_empty());

        // the views come from the real node state, which stays untouched
        assert!(peer.transaction_buffer().is_empty());
        assert!(peer.blocks().is_empty());
    }
}
