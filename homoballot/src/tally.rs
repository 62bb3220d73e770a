use crate::*;
use num_bigint::BigUint;
use num_traits::One;
use rayon::prelude::*;
use tracing::instrument;

/// The authority's complete tally of a closed election, one entry per candidate slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Frozen candidate ordering the slots are aligned to.
    pub candidates: Vec<CandidateId>,

    pub ballots_counted: u64,

    /// Homomorphic sum of every ballot's slot `i`.
    pub positive_total: Vec<Ciphertext>,

    /// `encrypt(-decrypted_total[i], randomness = 1)`, reproducible by anyone.
    pub negative_total: Vec<Ciphertext>,

    pub decrypted_total: Vec<i64>,

    /// Randomness under which `positive_total[i] + negative_total[i]` encrypts zero.
    #[serde(with = "crate::serde_decimal::vec_biguint")]
    pub zero_randomness: Vec<BigUint>,
}

impl Tally {
    /// The publication record. Ciphertexts are stripped of randomness and the
    /// negative totals are left out since anyone can recompute them.
    pub fn record(&self) -> TallyRecord {
        TallyRecord {
            candidates: self.candidates.clone(),
            ballots_counted: self.ballots_counted,
            positive_total: self.positive_total.iter().map(Ciphertext::public).collect(),
            decrypted_total: self.decrypted_total.clone(),
            zero_randomness: self.zero_randomness.clone(),
        }
    }
}

/// Published, append-only result of a closed election.
///
/// Missing fields deserialize as empty, which verification reports as inconclusive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TallyRecord {
    #[serde(default)]
    pub candidates: Vec<CandidateId>,

    #[serde(default)]
    pub ballots_counted: u64,

    #[serde(default)]
    pub positive_total: Vec<Ciphertext>,

    #[serde(default)]
    pub decrypted_total: Vec<i64>,

    #[serde(default, with = "crate::serde_decimal::vec_biguint")]
    pub zero_randomness: Vec<BigUint>,
}

/// The public commitment to a decrypted total: its negation encrypted with randomness `1`.
pub fn public_negation(public_key: &PublicKey, total: i64) -> Result<Ciphertext, Error> {
    let negated = total
        .checked_neg()
        .ok_or_else(|| Error::InvalidPlaintext(total.to_string()))?;
    encrypt_with_randomness(public_key, negated, &BigUint::one())
}

/// Homomorphically sum ballots slot-wise, in submission order.
///
/// Every ballot must have exactly `slots` ciphertexts. With no ballots the result
/// is `slots` encryptions of zero under randomness `1`.
#[instrument(level = "debug", skip_all, fields(ballots = ballots.len(), slots = slots))]
pub fn fold(public_key: &PublicKey, slots: usize, ballots: &[Ballot]) -> Result<Vec<Ciphertext>, Error> {
    check_shape(slots, ballots)?;

    let mut totals = vec![zero_ciphertext(); slots];
    for ballot in ballots {
        for (total, slot) in totals.iter_mut().zip(ballot.slots.iter()) {
            *total = add(public_key, total, slot)?;
        }
    }
    Ok(totals)
}

/// Same result as `fold`, computed by folding `shards` contiguous chunks of ballots
/// on the rayon pool and combining the partial sums in chunk order.
///
/// Modular multiplication is commutative and associative, so the output is
/// bit-identical to the sequential fold.
#[instrument(level = "debug", skip_all, fields(ballots = ballots.len(), slots = slots, shards = shards))]
pub fn fold_parallel(
    public_key: &PublicKey,
    slots: usize,
    ballots: &[Ballot],
    shards: usize,
) -> Result<Vec<Ciphertext>, Error> {
    check_shape(slots, ballots)?;
    if shards <= 1 || ballots.len() < 2 {
        return fold(public_key, slots, ballots);
    }

    let chunk_size = (ballots.len() + shards - 1) / shards;
    let partials = ballots
        .par_chunks(chunk_size)
        .map(|chunk| fold(public_key, slots, chunk))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut totals = vec![zero_ciphertext(); slots];
    for partial in partials {
        for (total, slot) in totals.iter_mut().zip(partial.iter()) {
            *total = add(public_key, total, slot)?;
        }
    }
    Ok(totals)
}

fn check_shape(slots: usize, ballots: &[Ballot]) -> Result<(), Error> {
    for ballot in ballots {
        if ballot.len() != slots {
            return Err(Error::BallotShape {
                expected: slots,
                found: ballot.len(),
            });
        }
    }
    Ok(())
}
