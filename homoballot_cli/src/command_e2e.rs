use crate::command_results::print_results;
use crate::{fail, parse_arg};
use homoballot::*;
use rand::rngs::OsRng;
use rand::Rng;

pub fn command_e2e(matches: &clap::ArgMatches, config: &homoballot::Config) {
    let num_candidates: u64 = parse_arg(
        "e2e",
        "candidates",
        matches.value_of("candidates").unwrap_or("3"),
    );
    let num_voters: usize = parse_arg("e2e", "voters", matches.value_of("voters").unwrap_or("25"));

    let candidates: Vec<CandidateId> = (1..=num_candidates).collect();
    let (mut election, authority) =
        Election::new(candidates.clone(), &mut OsRng, config).unwrap_or_else(|e| fail("e2e", e));
    println!("> Election {} created", election.id);

    let mut store = MemStore::default();
    let mut receipts = Vec::with_capacity(num_voters);
    for _ in 0..num_voters {
        let chosen = candidates[OsRng.gen_range(0..candidates.len())];
        let (ballot, receipt) = election
            .cast(chosen, &mut OsRng, config)
            .unwrap_or_else(|e| fail("e2e", e));
        store
            .add_ballot(election.id, &ballot)
            .unwrap_or_else(|e| fail("e2e", e));
        receipts.push(receipt);
    }
    println!("> {} ballots cast", store.ballot_count(election.id));

    for receipt in &receipts {
        if !store.contains_receipt(election.id, receipt) {
            fail("e2e", format!("receipt {} not found", receipt.short()));
        }
    }
    println!("> All receipts found");

    let record = election
        .close(&authority, &store, config)
        .unwrap_or_else(|e| fail("e2e", e))
        .clone();
    println!("> Election closed");

    match election.verify() {
        Verification::Verified => println!("> Tally verified OK"),
        outcome => fail("e2e", format!("tally verification {}", outcome)),
    }

    if matches.is_present("print-tally") {
        println!("Tally:");
        let json = serde_json::to_string_pretty(&record).unwrap_or_else(|e| fail("e2e", e));
        println!("{}", json);
    }

    if matches.is_present("print-results") {
        let results = election.results().unwrap_or_else(|e| fail("e2e", e));
        print_results(&results);
    }
}
