use crate::*;
use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

/// Candidate identifier. Ballot slots follow ascending identifier order.
pub type CandidateId = u64;

/// An encrypted ballot: one ciphertext per candidate, positionally aligned to the
/// election's frozen candidate ordering.
///
/// A well-formed ballot has exactly one slot encrypting `1` and all others `0`.
/// This cannot be checked publicly without breaking ballot secrecy; only the
/// aggregate is verified.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Ballot {
    pub slots: Vec<Ciphertext>,
}

impl Ballot {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A copy with all randomness stripped, for a public ledger.
    pub fn public(&self) -> Ballot {
        Ballot {
            slots: self.slots.iter().map(Ciphertext::public).collect(),
        }
    }

    /// Sanity check that every slot looks like a real encryption under `public_key`.
    ///
    /// Catches ballots stored in plaintext form (small integers or candidate ids),
    /// which can never be valid randomized ciphertexts except with negligible probability.
    pub fn is_well_encrypted(&self, public_key: &PublicKey) -> bool {
        !self.is_empty()
            && self
                .slots
                .iter()
                .all(|slot| slot.is_element_of(public_key) && slot.ciphertext >= public_key.n)
    }
}

/// Plaintext one-hot vector for `chosen` over the ordered `candidates`.
pub fn one_hot(candidates: &[CandidateId], chosen: CandidateId) -> Result<Vec<i64>, Error> {
    if !candidates.contains(&chosen) {
        return Err(Error::UnknownCandidate(chosen));
    }

    Ok(candidates
        .iter()
        .map(|candidate| if *candidate == chosen { 1 } else { 0 })
        .collect())
}

/// Encode a vote for `chosen` as a one-hot vector and encrypt every slot with fresh randomness.
#[instrument(level = "debug", skip_all, fields(slots = candidates.len()))]
pub fn encode_and_encrypt<R: RngCore + CryptoRng>(
    public_key: &PublicKey,
    candidates: &[CandidateId],
    chosen: CandidateId,
    rng: &mut R,
    config: &Config,
) -> Result<Ballot, Error> {
    let plaintext = one_hot(candidates, chosen)?;

    let mut slots = Vec::with_capacity(plaintext.len());
    for vote in plaintext {
        slots.push(encrypt(public_key, vote, rng, config)?);
    }

    Ok(Ballot { slots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{test_keypair, test_rng};
    use num_bigint::BigUint;

    #[test]
    fn one_hot_vectors() {
        assert_eq!(one_hot(&[3, 5, 9], 5).unwrap(), vec![0, 1, 0]);
        assert_eq!(one_hot(&[3, 5, 9], 3).unwrap(), vec![1, 0, 0]);
        assert_eq!(one_hot(&[42], 42).unwrap(), vec![1]);
        assert!(matches!(
            one_hot(&[3, 5, 9], 4),
            Err(Error::UnknownCandidate(4))
        ));
    }

    #[test]
    fn encrypts_every_slot() {
        let (public, private) = test_keypair();
        let mut rng = test_rng(10);
        let config = Config::default();

        let ballot = encode_and_encrypt(&public, &[10, 20, 30, 40], 30, &mut rng, &config).unwrap();
        assert_eq!(ballot.len(), 4);
        assert!(ballot.is_well_encrypted(&public));

        let decrypted: Vec<i64> = ballot
            .slots
            .iter()
            .map(|slot| decrypt(&public, &private, slot).unwrap())
            .collect();
        assert_eq!(decrypted, vec![0, 0, 1, 0]);

        // Every zero slot is encrypted independently
        assert_ne!(ballot.slots[0].ciphertext, ballot.slots[1].ciphertext);
        assert_ne!(ballot.slots[0].randomness, ballot.slots[1].randomness);
    }

    #[test]
    fn unknown_candidate() {
        let (public, _) = test_keypair();
        let mut rng = test_rng(11);
        let result = encode_and_encrypt(&public, &[1, 2], 3, &mut rng, &Config::default());
        assert!(matches!(result, Err(Error::UnknownCandidate(3))));
    }

    #[test]
    fn public_ballot_strips_randomness() {
        let (public, _) = test_keypair();
        let mut rng = test_rng(12);
        let ballot = encode_and_encrypt(&public, &[1, 2], 1, &mut rng, &Config::default()).unwrap();

        let public_ballot = ballot.public();
        assert_eq!(public_ballot.len(), 2);
        assert!(public_ballot.slots.iter().all(|s| s.randomness.is_none()));
        assert_eq!(public_ballot.slots[0].ciphertext, ballot.slots[0].ciphertext);
    }

    #[test]
    fn flags_plaintext_ballots() {
        let (public, _) = test_keypair();
        let plaintext_looking = Ballot {
            slots: vec![
                Ciphertext {
                    ciphertext: BigUint::from(17u8),
                    randomness: None,
                },
                Ciphertext {
                    ciphertext: BigUint::from(1u8),
                    randomness: None,
                },
            ],
        };
        assert!(!plaintext_looking.is_well_encrypted(&public));
        assert!(!Ballot { slots: vec![] }.is_well_encrypted(&public));
    }

    #[test]
    fn ballot_is_a_json_array() {
        let ballot = Ballot {
            slots: vec![
                Ciphertext {
                    ciphertext: BigUint::from(5u8),
                    randomness: Some(BigUint::from(2u8)),
                },
                Ciphertext {
                    ciphertext: BigUint::from(6u8),
                    randomness: None,
                },
            ],
        };
        let json = serde_json::to_string(&ballot).unwrap();
        assert_eq!(
            json,
            r#"[{"ciphertext":"5","randomness":"2"},{"ciphertext":"6","randomness":null}]"#
        );
        let back: Ballot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ballot);
    }
}
