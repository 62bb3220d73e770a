use crate::*;
use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

/// The election authority: sole holder of the private key.
///
/// Decryption and publication happen here, once, when an election closes. The
/// authority is also the only component able to recover the randomness of a
/// zero ciphertext, since it knows the plaintext structure it built.
#[derive(Debug, Clone)]
pub struct Authority {
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl Authority {
    /// Generate a fresh key pair for a new election.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, config: &Config) -> Result<Self, Error> {
        let (public_key, private_key) = generate_keypair(rng, config)?;
        Ok(Authority {
            public_key,
            private_key,
        })
    }

    /// Rebuild the authority from key material at rest.
    ///
    /// Fails with `Error::Domain` if the keys are malformed or do not belong together.
    pub fn from_keys(public_key: PublicKey, private_key: PrivateKey) -> Result<Self, Error> {
        public_key.validate()?;
        if private_key.phi.is_zero()
            || private_key.phi >= public_key.n
            || !is_coprime(&private_key.phi, &public_key.n)
        {
            return Err(Error::Domain("private key does not match public key"));
        }

        let authority = Authority {
            public_key,
            private_key,
        };

        // A mismatched exponent fails to open an encryption with randomness 2
        let probe = encrypt_with_randomness(&authority.public_key, 1, &BigUint::from(2u8))?;
        match authority.decrypt(&probe) {
            Ok(1) => Ok(authority),
            _ => Err(Error::Domain("private key does not match public key")),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Private key, for the storage layer to keep encrypted at rest.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<i64, Error> {
        decrypt(&self.public_key, &self.private_key, ciphertext)
    }

    /// Decrypt the accumulated totals and build the self-certifying tally.
    ///
    /// For each slot: decrypt, publicly encrypt the negation with randomness `1`,
    /// add it to the positive total and recover the randomness of the resulting
    /// zero ciphertext. Aborts if any total falls outside `0..=ballots_counted`.
    #[instrument(level = "info", skip_all, fields(slots = candidates.len(), ballots = ballots_counted))]
    pub fn decrypt_and_publish(
        &self,
        candidates: &[CandidateId],
        positive_total: Vec<Ciphertext>,
        ballots_counted: u64,
    ) -> Result<Tally, Error> {
        if positive_total.len() != candidates.len() {
            return Err(Error::BallotShape {
                expected: candidates.len(),
                found: positive_total.len(),
            });
        }

        let slots = candidates.len();
        let mut negative_total = Vec::with_capacity(slots);
        let mut decrypted_total = Vec::with_capacity(slots);
        let mut zero_randomness = Vec::with_capacity(slots);

        for (slot, total) in positive_total.iter().enumerate() {
            let value = self.decrypt(total)?;
            if value < 0 || value as u64 > ballots_counted {
                return Err(Error::TallyOutOfRange {
                    slot,
                    value,
                    max: ballots_counted,
                });
            }

            let negative = public_negation(&self.public_key, value)?;
            let zero_sum = add(&self.public_key, total, &negative)?;
            let randomness = self.extract_zero_randomness(&zero_sum)?;

            // The running sum carries its own randomness; both must agree
            if let Some(carried) = &zero_sum.randomness {
                if *carried != randomness {
                    return Err(Error::Decryption(
                        "carried randomness disagrees with the accumulated ciphertext",
                    ));
                }
            }

            tracing::debug!(slot, value, "decrypted slot");
            negative_total.push(negative);
            decrypted_total.push(value);
            zero_randomness.push(randomness);
        }

        // Each total is at most `ballots_counted`, so only the sum can overflow i64
        let counted: i128 = decrypted_total.iter().map(|v| i128::from(*v)).sum();
        if counted != i128::from(ballots_counted) {
            tracing::warn!(
                counted = %counted,
                ballots = ballots_counted,
                "decrypted totals do not add up to the number of ballots; some ballots are not one-hot"
            );
        }

        Ok(Tally {
            candidates: candidates.to_vec(),
            ballots_counted,
            positive_total,
            negative_total,
            decrypted_total,
            zero_randomness,
        })
    }

    /// Recover `r` from `c = r^n mod n^2`, an encryption of zero.
    ///
    /// Uses the private key: `r = c^(n^-1 mod phi) mod n`. Only valid for ciphertexts
    /// the authority itself knows to encrypt zero; anything else is rejected.
    fn extract_zero_randomness(&self, zero: &Ciphertext) -> Result<BigUint, Error> {
        if !zero.is_element_of(&self.public_key) {
            return Err(Error::Decryption("ciphertext is outside Z*_{n^2}"));
        }

        let n = &self.public_key.n;
        let exponent = mod_inverse(n, &self.private_key.phi)
            .map_err(|_| Error::Decryption("modulus is not invertible modulo phi"))?;
        let randomness = mod_pow(&(&zero.ciphertext % n), &exponent, n)?;

        if !verify_zero(&self.public_key, zero, &randomness) {
            return Err(Error::Decryption("ciphertext is not an encryption of zero"));
        }
        Ok(randomness)
    }
}
