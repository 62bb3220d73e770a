use crate::{expand, fail, read_input};
use homoballot::{Election, ElectionResults};

pub fn command_results(matches: &clap::ArgMatches) {
    let election_file = expand(matches.value_of("ELECTION").unwrap_or_default());
    let election: Election = read_input("results", &election_file);

    if !election.verify().is_verified() {
        fail("results", "published tally does not verify, run `homoballot verify`");
    }

    let results = election.results().unwrap_or_else(|e| fail("results", e));
    print_results(&results);
}

pub fn print_results(results: &ElectionResults) {
    println!("Results ({} ballots):", results.ballots_counted);
    for (rank, entry) in results.ranking.iter().enumerate() {
        println!(
            "  {}. {} got {} votes ({:.1}%)",
            rank + 1,
            entry.candidate,
            entry.votes,
            entry.percentage
        );
    }

    match results.winner {
        Some(winner) => println!("  The winner is {}", winner),
        None => println!("  No votes were cast"),
    }
}
