use crate::*;
use digest::Digest;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

/// Voter receipt: SHA-256 commitment over a ballot's public ciphertexts, hex encoded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Receipt(pub String);

impl Receipt {
    /// Shortened form for display: the first 16 characters
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(16) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl FromStr for Receipt {
    type Err = Error;

    /// Parse a receipt typed in by a voter: 64 hex characters, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match hex::decode(s) {
            Ok(bytes) if bytes.len() == 32 => Ok(Receipt(s.to_ascii_lowercase())),
            _ => Err(Error::InvalidReceipt(s.to_owned())),
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Canonical serialization of a ballot for hashing: the JSON array of its public
/// ciphertexts. Randomness is never part of the commitment.
pub fn canonical_bytes(ballot: &Ballot) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec(&ballot.public())?)
}

pub fn receipt_for(ballot: &Ballot) -> Result<Receipt, Error> {
    Ok(Receipt(hash(&canonical_bytes(ballot)?)))
}
