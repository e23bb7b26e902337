pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Blockchain;
pub use pow::MiningControl;

/// Difficulty of the genesis block (policy default).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Payload carried by the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// A SHA-256 digest is 64 hex characters; no hash can have more leading zeros.
pub const MAX_HASH_DIFFICULTY: u32 = 64;
