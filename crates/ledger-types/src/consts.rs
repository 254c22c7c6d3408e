/// How many leading zero hex characters a block hash needs to count as
/// mined. Counted against the hex text, so each unit is worth 4 bits.
pub const DIFFICULTY: usize = 3;

/// File name of the single chain slot inside a node's store directory.
pub const CHAIN_FILE_NAME: &str = "bc.json";
