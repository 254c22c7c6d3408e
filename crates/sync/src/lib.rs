mod fetch;
mod friend;
mod observer;
mod scheduler;

pub use fetch::{ChainFetcher, FetchError, HttpChainFetcher};
pub use friend::{Friend, PullError};
pub use observer::{LoggingObserver, PullEvent, PullObserver};
pub use scheduler::{PullScheduler, INITIAL_DELAY, PULL_PERIOD};
