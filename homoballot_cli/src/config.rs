use std::env::var;

/// Engine settings taken from the environment. Command-line flags win over these.
pub struct Config {
    pub key_bits: Option<usize>,
    pub shards: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        let key_bits = match var("HOMOBALLOT_KEY_BITS") {
            Ok(val) => Some(crate::parse_arg("config", "HOMOBALLOT_KEY_BITS", &val)),
            Err(_e) => None,
        };

        let shards = match var("HOMOBALLOT_SHARDS") {
            Ok(val) => Some(crate::parse_arg("config", "HOMOBALLOT_SHARDS", &val)),
            Err(_e) => None,
        };

        Config { key_bits, shards }
    }

    /// Library configuration with flag and environment overrides applied
    pub fn engine(&self, matches: &clap::ArgMatches) -> homoballot::Config {
        let mut config = homoballot::Config::default();

        let key_bits = match matches.value_of("bits") {
            Some(bits) => Some(crate::parse_arg("config", "--bits", bits)),
            None => self.key_bits,
        };
        if let Some(key_bits) = key_bits {
            config = config.with_key_bits(key_bits);
        }

        let shards = match matches.value_of("shards") {
            Some(shards) => Some(crate::parse_arg("config", "--shards", shards)),
            None => self.shards,
        };
        if let Some(shards) = shards {
            config = config.with_shards(shards);
        }

        if let Err(e) = config.validate() {
            crate::fail("config", e);
        }
        config
    }
}
