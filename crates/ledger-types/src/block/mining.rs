use crate::hash::Hashcode;

/// The proof-of-work predicate: a hash is a solution when its lowercase
/// hex text starts with at least `difficulty` ASCII '0' characters.
///
/// The check is character-granular against the hex text, not byte-granular
/// against the raw digest, so each difficulty unit is worth 4 bits. A
/// difficulty greater than the hex length never has a solution; difficulty
/// 0 accepts anything.
pub fn is_solution(hash: &Hashcode, difficulty: usize) -> bool {
    let hex = hash.to_hex();
    if difficulty > hex.len() {
        return false;
    }
    hex.as_bytes()[..difficulty].iter().all(|&c| c == b'0')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MiningError {
    /// The nonce reached its maximum value without finding a solution.
    /// The remedy is to refresh any time-based salt and restart the search
    /// from zero; that is left to the caller and never done automatically.
    #[error("nonce exhausted without finding a solution")]
    NonceExhausted,
}
