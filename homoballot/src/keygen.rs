use crate::*;
use num_bigint::{BigUint, RandBigInt};
use num_prime::nt_funcs::is_prime;
use num_prime::PrimalityTestConfig;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use tracing::instrument;

/// Election public key.
///
/// Shared by every participant. The generator is fixed to `g = n + 1`, so the
/// ciphertext group is `Z*_{n^2}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    #[serde(with = "crate::serde_decimal::biguint")]
    pub g: BigUint,

    #[serde(with = "crate::serde_decimal::biguint")]
    pub n: BigUint,
}

impl PublicKey {
    /// Build the public key for modulus `n`
    pub fn from_modulus(n: BigUint) -> Self {
        PublicKey {
            g: &n + BigUint::one(),
            n,
        }
    }

    pub fn n_squared(&self) -> BigUint {
        &self.n * &self.n
    }

    /// Make sure the key is well-formed.
    ///
    /// Keys loaded from storage go through this before use.
    pub fn validate(&self) -> Result<(), Error> {
        if self.n <= BigUint::from(3u8) || !self.n.bit(0) {
            return Err(Error::Domain("public key modulus must be an odd composite"));
        }
        if self.g != &self.n + BigUint::one() {
            return Err(Error::Domain("public key generator must be n + 1"));
        }
        Ok(())
    }
}

/// Election private key: the decryption exponent `phi = (p - 1)(q - 1)`.
///
/// Only the election authority holds this. It is never published before close.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    #[serde(with = "crate::serde_decimal::biguint")]
    pub phi: BigUint,
}

// Keep the secret out of logs and panic messages
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey {{ phi: <{} bits> }}", self.phi.bits())
    }
}

/// Generate a fresh election key pair.
///
/// `rng` must be a cryptographically secure generator (in production `rand::rngs::OsRng`).
#[instrument(level = "info", skip_all, fields(bits = config.key_bits))]
pub fn generate_keypair<R: RngCore + CryptoRng>(
    rng: &mut R,
    config: &Config,
) -> Result<(PublicKey, PrivateKey), Error> {
    config.validate()?;
    let prime_bits = config.key_bits / 2;

    loop {
        let p = generate_prime(rng, prime_bits, config.max_prime_candidates)?;
        let q = generate_prime(rng, prime_bits, config.max_prime_candidates)?;
        if p == q {
            continue;
        }

        let n = &p * &q;
        let phi = (&p - BigUint::one()) * (&q - BigUint::one());

        // Always holds for equal-size primes, but decryption depends on it
        if !is_coprime(&n, &phi) {
            continue;
        }

        debug_assert_eq!(n.bits(), config.key_bits as u64);
        tracing::debug!(modulus_bits = n.bits(), "generated election key pair");

        return Ok((PublicKey::from_modulus(n), PrivateKey { phi }));
    }
}

/// Random prime of exactly `bits` bits with the top two bits set, so that the
/// product of two such primes has exactly `2 * bits` bits.
fn generate_prime<R: RngCore + CryptoRng>(
    rng: &mut R,
    bits: usize,
    max_candidates: usize,
) -> Result<BigUint, Error> {
    let top = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));

    for _ in 0..max_candidates {
        let candidate = rng.gen_biguint(bits as u64) | &top | BigUint::one();
        if is_prime(&candidate, Some(PrimalityTestConfig::strict())).probably() {
            return Ok(candidate);
        }
    }

    Err(Error::RandomnessExhausted(max_candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn generates_consistent_keys() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let config = Config::default().with_key_bits(256);
        let (public, private) = generate_keypair(&mut rng, &config).unwrap();

        public.validate().unwrap();
        assert_eq!(public.n.bits(), 256);
        assert_eq!(public.g, &public.n + BigUint::one());
        assert!(is_coprime(&public.n, &private.phi));
        assert!(private.phi < public.n);

        // Fermat-Euler: a^phi = 1 mod n for a coprime to n
        let a = BigUint::from(65537u32);
        assert_eq!(a.modpow(&private.phi, &public.n), BigUint::one());
    }

    #[test]
    fn same_seed_same_keys() {
        let config = Config::default().with_key_bits(256);
        let (a, _) = generate_keypair(&mut ChaCha20Rng::seed_from_u64(1), &config).unwrap();
        let (b, _) = generate_keypair(&mut ChaCha20Rng::seed_from_u64(1), &config).unwrap();
        let (c, _) = generate_keypair(&mut ChaCha20Rng::seed_from_u64(2), &config).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_bad_config() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let config = Config::default().with_key_bits(64);
        assert!(generate_keypair(&mut rng, &config).is_err());
    }

    #[test]
    fn key_serialization() {
        let public = PublicKey::from_modulus(BigUint::from(77u8));
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, r#"{"g":"78","n":"77"}"#);

        let private = PrivateKey {
            phi: BigUint::from(60u8),
        };
        assert_eq!(serde_json::to_string(&private).unwrap(), r#"{"phi":"60"}"#);
        assert!(!format!("{:?}", private).contains("60"));
    }

    #[test]
    fn validate_rejects_malformed_keys() {
        assert!(PublicKey::from_modulus(BigUint::from(77u8)).validate().is_ok());
        assert!(PublicKey::from_modulus(BigUint::from(76u8)).validate().is_err());

        let mut public = PublicKey::from_modulus(BigUint::from(77u8));
        public.g = BigUint::from(2u8);
        assert!(public.validate().is_err());
    }
}
