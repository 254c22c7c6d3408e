mod chain;
mod wire;

pub use chain::Blockchain;
