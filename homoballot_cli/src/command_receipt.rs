use crate::{expand, fail, read_input};
use homoballot::{Receipt, StoredBallot};

pub fn command_receipt(matches: &clap::ArgMatches) {
    let ballots_file = expand(matches.value_of("BALLOTS").unwrap_or_default());
    let receipt: Receipt = matches
        .value_of("RECEIPT")
        .unwrap_or_default()
        .parse::<Receipt>()
        .unwrap_or_else(|e| fail("receipt", e));

    let ballots: Vec<StoredBallot> = read_input("receipt", &ballots_file);

    // Receipts are recomputed from the stored ciphertexts, not trusted from the file
    let found = ballots.iter().position(|stored| {
        homoballot::receipt_for(&stored.ballot)
            .map(|r| r == receipt)
            .unwrap_or(false)
    });

    match found {
        Some(index) => println!("> Ballot {} found: {}", index + 1, receipt.short()),
        None => {
            println!("> No ballot matches receipt {}", receipt.short());
            std::process::exit(1);
        }
    }
}
