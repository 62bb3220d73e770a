use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("homoballot: domain error: {0}")]
    Domain(&'static str),

    #[error("homoballot: plaintext {0} is outside the message space")]
    InvalidPlaintext(String),

    #[error("homoballot: failed to decrypt ciphertext: {0}")]
    Decryption(&'static str),

    #[error("homoballot: ciphertext does not belong to this public key")]
    KeyMismatch,

    #[error("homoballot: ballot has {found} slots, expected {expected}")]
    BallotShape { expected: usize, found: usize },

    #[error("homoballot: unknown candidate {0}")]
    UnknownCandidate(u64),

    #[error("homoballot: election is already closed")]
    AlreadyClosed,

    #[error("homoballot: election is not closed yet")]
    NotClosed,

    #[error("homoballot: decrypted total {value} for slot {slot} is outside 0..={max}")]
    TallyOutOfRange { slot: usize, value: i64, max: u64 },

    #[error("homoballot: randomness source exhausted after {0} draws")]
    RandomnessExhausted(usize),

    #[error("homoballot: invalid election: {0}")]
    InvalidElection(&'static str),

    #[error("homoballot: invalid receipt {0:?}, expected 64 hex characters")]
    InvalidReceipt(String),

    #[error("homoballot: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
