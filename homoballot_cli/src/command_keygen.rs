use crate::{expand, fail, parse_arg, read_input, write_output};
use homoballot::{Authority, CandidateId, Election, PrivateKey, PublicKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// On-disk form of the election authority's keys
#[derive(Serialize, Deserialize)]
pub struct AuthorityFile {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

pub fn command_keygen(matches: &clap::ArgMatches, config: &homoballot::Config) {
    let candidates: Vec<CandidateId> = matches
        .values_of("CANDIDATES")
        .map(|values| values.map(|v| parse_arg("keygen", "candidate", v)).collect())
        .unwrap_or_default();

    let election_file = expand(matches.value_of("election").unwrap_or("election.json"));
    let authority_file = expand(matches.value_of("authority").unwrap_or("authority.json"));

    let (election, authority) = Election::new(candidates, &mut OsRng, config)
        .unwrap_or_else(|e| fail("keygen", e));

    let keys = AuthorityFile {
        public_key: authority.public_key().clone(),
        private_key: authority.private_key().clone(),
    };

    write_output("keygen", &authority_file, &keys);
    write_output("keygen", &election_file, &election);

    println!("election: {}", election.id);
    println!("candidates: {:?}", election.candidates);
    println!("public-key: {} bits", election.public_key.n.bits());
}

/// Load and check the authority's keys
pub fn load_authority(command: &str, filename: &str) -> Authority {
    let keys: AuthorityFile = read_input(command, filename);
    Authority::from_keys(keys.public_key, keys.private_key).unwrap_or_else(|e| fail(command, e))
}
