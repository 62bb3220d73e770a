use crate::{expand, fail, parse_arg, read_input, write_output};
use homoballot::{CandidateId, Election, StoredBallot};
use rand::rngs::OsRng;
use std::path::Path;

pub fn command_cast(matches: &clap::ArgMatches, config: &homoballot::Config) {
    let election_file = expand(matches.value_of("ELECTION").unwrap_or_default());
    let ballots_file = expand(matches.value_of("BALLOTS").unwrap_or_default());
    let chosen: CandidateId = parse_arg(
        "cast",
        "candidate",
        matches.value_of("CANDIDATE").unwrap_or_default(),
    );

    let election: Election = read_input("cast", &election_file);

    let mut ballots: Vec<StoredBallot> = if Path::new(&ballots_file).exists() {
        read_input("cast", &ballots_file)
    } else {
        Vec::new()
    };

    let (ballot, receipt) = election
        .cast(chosen, &mut OsRng, config)
        .unwrap_or_else(|e| fail("cast", e));

    // The ballot file is public: no randomness
    ballots.push(StoredBallot {
        receipt: receipt.clone(),
        ballot: ballot.public(),
    });
    write_output("cast", &ballots_file, &ballots);
    tracing::debug!(election = %election.id, ballots = ballots.len(), "appended ballot");

    println!("receipt: {}", receipt);
}
