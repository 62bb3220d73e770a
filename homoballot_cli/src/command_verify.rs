use crate::{expand, read_input};
use homoballot::{Election, Verification};

pub fn command_verify(matches: &clap::ArgMatches) {
    let election_file = expand(matches.value_of("ELECTION").unwrap_or_default());
    let election: Election = read_input("verify", &election_file);

    match election.verify() {
        Verification::Verified => {
            println!("> Tally verified OK");
        }
        Verification::Failed { slot } => {
            let candidate = election
                .candidates
                .get(slot)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_owned());
            println!(
                "> TALLY VERIFICATION FAILED at slot {} (candidate {}): the published result does not match the ballots",
                slot, candidate
            );
            std::process::exit(1);
        }
        Verification::Inconclusive => {
            println!("> Nothing to verify yet: the election is not closed");
            std::process::exit(2);
        }
    }
}
