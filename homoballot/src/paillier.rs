use crate::*;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand_core::{CryptoRng, RngCore};

/// A Paillier ciphertext, paired with the randomness that produced it.
///
/// The randomness travels with the ciphertext so homomorphic sums can carry the
/// combined randomness forward. It is `None` for public copies (for example in a
/// public ledger), and any sum involving a public copy has no randomness either.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext {
    #[serde(with = "crate::serde_decimal::biguint")]
    pub ciphertext: BigUint,

    #[serde(default, with = "crate::serde_decimal::option_biguint")]
    pub randomness: Option<BigUint>,
}

impl Ciphertext {
    /// A copy without the randomness, safe to publish.
    pub fn public(&self) -> Ciphertext {
        Ciphertext {
            ciphertext: self.ciphertext.clone(),
            randomness: None,
        }
    }

    /// Whether the ciphertext value is an element of `Z*_{n^2}` for this key.
    pub fn is_element_of(&self, public_key: &PublicKey) -> bool {
        !self.ciphertext.is_zero()
            && self.ciphertext < public_key.n_squared()
            && is_coprime(&self.ciphertext, &public_key.n)
    }
}

/// Encrypt `plaintext` with fresh randomness drawn coprime to `n`.
pub fn encrypt<R: RngCore + CryptoRng>(
    public_key: &PublicKey,
    plaintext: i64,
    rng: &mut R,
    config: &Config,
) -> Result<Ciphertext, Error> {
    let randomness = random_coprime(rng, &public_key.n, config.max_coprime_draws)?;
    encrypt_with_randomness(public_key, plaintext, &randomness)
}

/// Encrypt `plaintext` with caller-supplied randomness: `c = g^m * r^n mod n^2`.
///
/// Plaintexts are signed and must lie in `[-(n-1)/2, (n-1)/2]`.
pub fn encrypt_with_randomness(
    public_key: &PublicKey,
    plaintext: i64,
    randomness: &BigUint,
) -> Result<Ciphertext, Error> {
    let n = &public_key.n;
    if randomness.is_zero() || randomness >= n || !is_coprime(randomness, n) {
        return Err(Error::Domain("randomness must be a unit modulo n"));
    }

    let m = encode_plaintext(public_key, plaintext)?;
    let n_squared = public_key.n_squared();

    // g = n + 1, so g^m = 1 + m*n (mod n^2)
    let g_m = (BigUint::one() + &m * n) % &n_squared;
    let r_n = mod_pow(randomness, n, &n_squared)?;

    Ok(Ciphertext {
        ciphertext: (g_m * r_n) % &n_squared,
        randomness: Some(randomness.clone()),
    })
}

/// Decrypt a ciphertext: `m = L(c^phi mod n^2) * phi^-1 mod n` where `L(u) = (u - 1) / n`.
pub fn decrypt(
    public_key: &PublicKey,
    private_key: &PrivateKey,
    ciphertext: &Ciphertext,
) -> Result<i64, Error> {
    if !ciphertext.is_element_of(public_key) {
        return Err(Error::Decryption("ciphertext is outside Z*_{n^2}"));
    }

    let n = &public_key.n;
    let n_squared = public_key.n_squared();

    let u = mod_pow(&ciphertext.ciphertext, &private_key.phi, &n_squared)?;
    let (l, rem) = (u - BigUint::one()).div_rem(n);
    if !rem.is_zero() {
        return Err(Error::Decryption("private key does not match public key"));
    }

    let mu = mod_inverse(&private_key.phi, n)
        .map_err(|_| Error::Decryption("private key is not invertible modulo n"))?;
    let m = (l * mu) % n;

    decode_plaintext(public_key, &m)
}

/// Homomorphic addition: multiplies ciphertexts mod `n^2` and randomness mod `n`.
pub fn add(public_key: &PublicKey, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, Error> {
    check_operand(public_key, a)?;
    check_operand(public_key, b)?;

    let randomness = match (&a.randomness, &b.randomness) {
        (Some(ra), Some(rb)) => Some((ra * rb) % &public_key.n),
        _ => None,
    };

    Ok(Ciphertext {
        ciphertext: (&a.ciphertext * &b.ciphertext) % public_key.n_squared(),
        randomness,
    })
}

/// Check that `ciphertext` is exactly the encryption of zero under `claimed_randomness`.
pub fn verify_zero(
    public_key: &PublicKey,
    ciphertext: &Ciphertext,
    claimed_randomness: &BigUint,
) -> bool {
    match encrypt_with_randomness(public_key, 0, claimed_randomness) {
        Ok(expected) => expected.ciphertext == ciphertext.ciphertext,
        Err(_) => false,
    }
}

/// The ciphertext `encrypt(0, randomness = 1)`, neutral element for `add`.
pub fn zero_ciphertext() -> Ciphertext {
    Ciphertext {
        ciphertext: BigUint::one(),
        randomness: Some(BigUint::one()),
    }
}

fn check_operand(public_key: &PublicKey, ciphertext: &Ciphertext) -> Result<(), Error> {
    if !ciphertext.is_element_of(public_key) {
        return Err(Error::KeyMismatch);
    }
    if let Some(r) = &ciphertext.randomness {
        if r.is_zero() || *r >= public_key.n {
            return Err(Error::KeyMismatch);
        }
    }
    Ok(())
}

/// Map a signed plaintext onto `Z_n`
fn encode_plaintext(public_key: &PublicKey, plaintext: i64) -> Result<BigUint, Error> {
    let n = BigInt::from(public_key.n.clone());
    let m = BigInt::from(plaintext);
    let half = &n >> 1;
    if m.abs() > half {
        return Err(Error::InvalidPlaintext(plaintext.to_string()));
    }

    m.mod_floor(&n)
        .to_biguint()
        .ok_or_else(|| Error::InvalidPlaintext(plaintext.to_string()))
}

/// Inverse of `encode_plaintext`: residues above `(n-1)/2` are negative
fn decode_plaintext(public_key: &PublicKey, m: &BigUint) -> Result<i64, Error> {
    let half = &public_key.n >> 1;
    let value = if *m > half {
        BigInt::from(m.clone()) - BigInt::from(public_key.n.clone())
    } else {
        BigInt::from(m.clone())
    };

    value
        .to_i64()
        .ok_or(Error::Decryption("plaintext does not fit in a 64-bit integer"))
}
