use crate::*;

/// Engine parameters shared by key generation, encryption and tallying.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bit length of the Paillier modulus `n`.
    pub key_bits: usize,

    /// Number of worker shards used when folding ballots in parallel.
    pub shards: usize,

    /// Maximum draws when sampling randomness coprime to `n`.
    pub max_coprime_draws: usize,

    /// Maximum odd candidates tried per prime during key generation.
    pub max_prime_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        let shards = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Config {
            key_bits: 2048,
            shards,
            max_coprime_draws: 128,
            max_prime_candidates: 100_000,
        }
    }
}

impl Config {
    pub fn with_key_bits(mut self, key_bits: usize) -> Self {
        self.key_bits = key_bits;
        self
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Make sure the parameters are sane
    pub fn validate(&self) -> Result<(), Error> {
        if self.key_bits < 128 || self.key_bits % 2 != 0 {
            return Err(Error::Domain("key_bits must be even and at least 128"));
        }
        if self.shards == 0 {
            return Err(Error::Domain("shards must be at least 1"));
        }
        if self.max_coprime_draws == 0 || self.max_prime_candidates == 0 {
            return Err(Error::Domain("retry bounds must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.key_bits, 2048);
        assert!(config.shards >= 1);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Config::default().with_key_bits(64).validate().is_err());
        assert!(Config::default().with_key_bits(513).validate().is_err());
        assert!(Config::default().with_shards(0).validate().is_err());

        let mut config = Config::default();
        config.max_coprime_draws = 0;
        assert!(config.validate().is_err());
    }
}
