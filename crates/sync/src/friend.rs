use std::sync::{Arc, Mutex};

use ledger::Blockchain;
use ledger_types::signing::SigningOracle;
use store::{Store, StoreError};
use tracing::debug;

use crate::fetch::{ChainFetcher, FetchError};
use crate::observer::{PullEvent, PullObserver};

/// A known remote peer whose chain this node periodically pulls.
///
/// The store is shared with the node's serving side, not owned; adopting a
/// friend's chain overwrites the one slot both sides read. Observers
/// attached to a friend see every state of every pull cycle, and a late
/// subscriber is caught up on attachment.
pub struct Friend {
    address: String,
    fetcher: Box<dyn ChainFetcher>,
    store: Arc<dyn Store<Blockchain>>,
    oracle: Arc<dyn SigningOracle>,
    difficulty: usize,
    state: Mutex<PullState>,
}

#[derive(Default)]
struct PullState {
    observers: Vec<Arc<dyn PullObserver>>,
    last_event: Option<PullEvent>,
    last_failure: Option<Arc<PullError>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Friend {
    pub fn new(
        address: impl Into<String>,
        fetcher: Box<dyn ChainFetcher>,
        store: Arc<dyn Store<Blockchain>>,
        oracle: Arc<dyn SigningOracle>,
        difficulty: usize,
    ) -> Self {
        Self {
            address: address.into(),
            fetcher,
            store,
            oracle,
            difficulty,
            state: Mutex::new(PullState::default()),
        }
    }

    /// Base network address of this friend.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Attaches an observer. It receives `Added` immediately, then a
    /// replay of the most recent failure, or the most recent terminal
    /// event when the last cycle succeeded, so late subscribers are never
    /// left without status context.
    pub fn add_observer(&self, observer: Arc<dyn PullObserver>) {
        let (last_event, last_failure) = {
            let mut state = self.state.lock().expect("friend state poisoned");
            state.observers.push(Arc::clone(&observer));
            (state.last_event, state.last_failure.clone())
        };
        observer.on(PullEvent::Added);
        if let Some(failure) = last_failure {
            observer.on_failed(&failure);
        } else if let Some(event) = last_event {
            observer.on(event);
        }
    }

    /// Detaches an observer. Deliveries already dispatched are not
    /// recalled.
    pub fn remove_observer(&self, observer: &Arc<dyn PullObserver>) {
        self.state
            .lock()
            .expect("friend state poisoned")
            .observers
            .retain(|registered| !Arc::ptr_eq(registered, observer));
    }

    /// One pull cycle: fetch this friend's chain and adopt it when it is
    /// fully mined, fully verified, and further along than the stored one.
    /// Any transport, decode, or store failure ends the cycle with a
    /// failure notification and leaves the store untouched; the next
    /// scheduled cycle proceeds normally.
    pub fn pull(&self) {
        if let Err(error) = self.try_pull() {
            self.emit_failure(error);
        }
    }

    fn try_pull(&self) -> Result<(), PullError> {
        self.emit(PullEvent::Downloading);
        let remote = self.fetcher.fetch()?;
        self.emit(PullEvent::Downloaded);
        self.emit(PullEvent::Saving);

        let local = self.store.load()?.unwrap_or_default();
        if self.should_adopt(&remote, &local) {
            self.store.save(&remote)?;
            self.emit(PullEvent::Saved);
        } else {
            self.emit(PullEvent::Skipped);
        }
        Ok(())
    }

    /// The "longer chain" proxy compares last transaction ids rather than
    /// block counts, since transaction ids increase strictly across a
    /// whole chain. All three conditions must hold.
    fn should_adopt(&self, remote: &Blockchain, local: &Blockchain) -> bool {
        remote.is_mined(self.difficulty)
            && remote.is_verified(self.oracle.as_ref())
            && local.last_transaction_id().unwrap_or(0) < remote.last_transaction_id().unwrap_or(0)
    }

    fn emit(&self, event: PullEvent) {
        let observers = {
            let mut state = self.state.lock().expect("friend state poisoned");
            state.last_event = Some(event);
            state.last_failure = None;
            state.observers.clone()
        };
        debug!(friend = %self.address, event = %event, "pull state");
        for observer in observers {
            observer.on(event);
        }
    }

    fn emit_failure(&self, error: PullError) {
        let error = Arc::new(error);
        let observers = {
            let mut state = self.state.lock().expect("friend state poisoned");
            state.last_failure = Some(Arc::clone(&error));
            state.observers.clone()
        };
        debug!(friend = %self.address, error = %error, "pull failed");
        for observer in observers {
            observer.on_failed(&error);
        }
    }
}
