use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::friend::Friend;

/// How long a freshly started scheduler waits before the first pull round.
pub const INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Fixed delay between the end of one pull round and the start of the
/// next.
pub const PULL_PERIOD: Duration = Duration::from_secs(5);

/// Periodic driver that pulls every known friend's chain: an initial
/// delay, then rounds forever until stopped.
pub struct PullScheduler {
    friends: Vec<Arc<Friend>>,
    initial_delay: Duration,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PullScheduler {
    pub fn new(friends: Vec<Arc<Friend>>) -> Self {
        Self::with_cadence(friends, INITIAL_DELAY, PULL_PERIOD)
    }

    pub fn with_cadence(
        friends: Vec<Arc<Friend>>,
        initial_delay: Duration,
        period: Duration,
    ) -> Self {
        Self {
            friends,
            initial_delay,
            period,
            task: Mutex::new(None),
        }
    }

    /// Starts pulling on the configured cadence. A scheduler that is
    /// already running is left alone. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("scheduler task poisoned");
        if task.as_ref().is_some_and(|running| !running.is_finished()) {
            return;
        }

        let friends = self.friends.clone();
        let initial_delay = self.initial_delay;
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            loop {
                for friend in &friends {
                    let friend = Arc::clone(friend);
                    // pulls do blocking I/O; keep them off the async workers
                    if tokio::task::spawn_blocking(move || friend.pull())
                        .await
                        .is_err()
                    {
                        debug!("pull task panicked");
                    }
                }
                tokio::time::sleep(period).await;
            }
        }));
    }

    /// Stops scheduling future rounds immediately. A pull already running
    /// on its worker thread finishes on its own. Calling
    /// [`PullScheduler::start`] afterwards resumes the same cadence with a
    /// fresh initial delay.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().expect("scheduler task poisoned").take() {
            task.abort();
        }
    }

    pub fn friends(&self) -> &[Arc<Friend>] {
        &self.friends
    }
}
