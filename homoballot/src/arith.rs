use crate::*;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

/// Compute `base^exponent mod modulus`.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint, Error> {
    if modulus.is_zero() {
        return Err(Error::Domain("modulus must be positive"));
    }
    Ok(base.modpow(exponent, modulus))
}

/// Multiplicative inverse of `value` modulo `modulus`, via the extended Euclidean algorithm.
///
/// Fails with `Error::Domain` when the inverse does not exist (`gcd(value, modulus) != 1`).
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Result<BigUint, Error> {
    if modulus.is_zero() {
        return Err(Error::Domain("modulus must be positive"));
    }

    let m = BigInt::from(modulus.clone());
    let a = BigInt::from(value % modulus);
    let egcd = a.extended_gcd(&m);
    if !egcd.gcd.is_one() {
        return Err(Error::Domain("value is not invertible for this modulus"));
    }

    // mod_floor against a positive modulus is never negative
    egcd.x
        .mod_floor(&m)
        .to_biguint()
        .ok_or(Error::Domain("inverse is negative"))
}

pub fn is_coprime(a: &BigUint, b: &BigUint) -> bool {
    a.gcd(b).is_one()
}

/// Uniform random integer in `[1, bound)`.
pub fn random_below<R: RngCore + CryptoRng>(rng: &mut R, bound: &BigUint) -> Result<BigUint, Error> {
    if *bound <= BigUint::one() {
        return Err(Error::Domain("random bound must be greater than one"));
    }
    Ok(rng.gen_biguint_range(&BigUint::one(), bound))
}

/// Uniform random integer in `[1, modulus)` that is coprime to `modulus`.
///
/// Draws are retried at most `max_draws` times.
pub fn random_coprime<R: RngCore + CryptoRng>(
    rng: &mut R,
    modulus: &BigUint,
    max_draws: usize,
) -> Result<BigUint, Error> {
    for _ in 0..max_draws {
        let candidate = random_below(rng, modulus)?;
        if is_coprime(&candidate, modulus) {
            return Ok(candidate);
        }
    }
    Err(Error::RandomnessExhausted(max_draws))
}
