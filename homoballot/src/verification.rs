use crate::*;
use std::fmt;
use tracing::instrument;

/// Outcome of the zero-sum check on a published tally.
///
/// `Failed` means the published totals do not match the accumulated ciphertexts
/// and should be treated as possible tampering. `Inconclusive` only means there is
/// nothing to check yet (for example, the election is still open).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Failed { slot: usize },
    Inconclusive,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        *self == Verification::Verified
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verification::Verified => write!(f, "verified"),
            Verification::Failed { slot } => write!(f, "failed at slot {}", slot),
            Verification::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// Check a published tally using only the public key and the record.
///
/// For every slot, recompute the public negation of the decrypted total, add it to
/// the positive total, and check the sum is exactly the encryption of zero under the
/// published zero randomness. Stops at the first mismatching slot.
#[instrument(level = "info", skip_all, fields(slots = record.positive_total.len()))]
pub fn verify_tally(public_key: &PublicKey, record: &TallyRecord) -> Verification {
    if record.positive_total.is_empty()
        || record.decrypted_total.is_empty()
        || record.zero_randomness.is_empty()
    {
        return Verification::Inconclusive;
    }
    // A published record checked against an altered key is not benign
    if let Err(e) = public_key.validate() {
        tracing::warn!(error = %e, "tally checked against a malformed public key");
        return failed(0);
    }

    let slots = record.positive_total.len();
    let mut consistent = slots.min(record.decrypted_total.len()).min(record.zero_randomness.len());
    if !record.candidates.is_empty() {
        consistent = consistent.min(record.candidates.len());
    }

    for slot in 0..consistent {
        if !verify_slot(public_key, record, slot) {
            return failed(slot);
        }
    }

    if consistent != slots
        || consistent != record.decrypted_total.len()
        || consistent != record.zero_randomness.len()
    {
        return failed(consistent);
    }

    Verification::Verified
}

fn verify_slot(public_key: &PublicKey, record: &TallyRecord, slot: usize) -> bool {
    let negative = match public_negation(public_key, record.decrypted_total[slot]) {
        Ok(negative) => negative,
        Err(_) => return false,
    };

    let zero_sum = match add(public_key, &record.positive_total[slot].public(), &negative) {
        Ok(zero_sum) => zero_sum,
        Err(_) => return false,
    };

    verify_zero(public_key, &zero_sum, &record.zero_randomness[slot])
}

fn failed(slot: usize) -> Verification {
    tracing::warn!(slot, "tally verification failed");
    Verification::Failed { slot }
}
