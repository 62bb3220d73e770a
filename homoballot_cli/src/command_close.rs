use crate::command_keygen::load_authority;
use crate::{expand, fail, read_input, write_output};
use homoballot::{Election, MemStore, StoredBallot};

pub fn command_close(matches: &clap::ArgMatches, config: &homoballot::Config) {
    let election_file = expand(matches.value_of("ELECTION").unwrap_or_default());
    let authority_file = expand(matches.value_of("AUTHORITY").unwrap_or_default());
    let ballots_file = expand(matches.value_of("BALLOTS").unwrap_or_default());

    let mut election: Election = read_input("close", &election_file);
    let authority = load_authority("close", &authority_file);
    let ballots: Vec<StoredBallot> = read_input("close", &ballots_file);

    for stored in &ballots {
        if !stored.ballot.is_well_encrypted(&election.public_key) {
            fail(
                "close",
                format!("ballot {} is not a valid encryption", stored.receipt.short()),
            );
        }
    }

    let store = MemStore::from((election.id, ballots));
    let record = election
        .close(&authority, &store, config)
        .unwrap_or_else(|e| fail("close", e))
        .clone();

    write_output("close", &election_file, &election);
    tracing::info!(election = %election.id, file = %election_file, "published tally");

    println!("> Election closed, {} ballots counted", record.ballots_counted);
    for (candidate, votes) in record.candidates.iter().zip(record.decrypted_total.iter()) {
        println!("  {} got {} votes", candidate, votes);
    }
}
