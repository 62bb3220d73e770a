use clap::{App, AppSettings, Arg, SubCommand};
use num_enum::TryFromPrimitive;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::convert::TryFrom;
use tracing_subscriber::EnvFilter;

mod command_cast;
mod command_close;
mod command_e2e;
mod command_keygen;
mod command_receipt;
mod command_results;
mod command_verify;
mod config;

#[derive(TryFromPrimitive, PartialEq, Copy, Clone, Debug)]
#[repr(u8)]
pub enum Verbosity {
    Silent = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl Verbosity {
    fn filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

fn main() {
    let matches = App::new("homoballot")
        .version("0.1")
        .author("Patrick Hayes <patrick.d.hayes@gmail.com>")
        .about("Encrypts ballots, tallies them homomorphically and verifies published results")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Silence all logging"),
        )
        .arg(
            Arg::with_name("bits")
                .long("bits")
                .takes_value(true)
                .help("Modulus size for new keys - can also be set with HOMOBALLOT_KEY_BITS"),
        )
        .arg(
            Arg::with_name("shards")
                .long("shards")
                .takes_value(true)
                .help("Worker shards used to fold ballots - can also be set with HOMOBALLOT_SHARDS"),
        )
        .subcommand(
            SubCommand::with_name("keygen")
                .about("Create an election: generate its key pair and freeze the candidates")
                .arg(
                    Arg::with_name("election")
                        .long("election")
                        .takes_value(true)
                        .default_value("election.json")
                        .help("Where to write the public election file"),
                )
                .arg(
                    Arg::with_name("authority")
                        .long("authority")
                        .takes_value(true)
                        .default_value("authority.json")
                        .help("Where to write the authority's key file. Keep it secret."),
                )
                .arg(
                    Arg::with_name("CANDIDATES")
                        .index(1)
                        .multiple(true)
                        .required(true)
                        .help("Candidate identifiers"),
                ),
        )
        .subcommand(
            SubCommand::with_name("cast")
                .about("Encrypt a vote and append it to the ballot file")
                .arg(
                    Arg::with_name("ELECTION")
                        .index(1)
                        .required(true)
                        .help("Election file in JSON or CBOR format"),
                )
                .arg(
                    Arg::with_name("BALLOTS")
                        .index(2)
                        .required(true)
                        .help("Ballot file, created if missing"),
                )
                .arg(
                    Arg::with_name("CANDIDATE")
                        .index(3)
                        .required(true)
                        .help("Candidate to vote for"),
                ),
        )
        .subcommand(
            SubCommand::with_name("close")
                .about("Close an election: tally the ballots, decrypt and publish the result")
                .arg(Arg::with_name("ELECTION").index(1).required(true))
                .arg(
                    Arg::with_name("AUTHORITY")
                        .index(2)
                        .required(true)
                        .help("Authority key file"),
                )
                .arg(Arg::with_name("BALLOTS").index(3).required(true)),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Verify the published tally of a closed election")
                .arg(Arg::with_name("ELECTION").index(1).required(true)),
        )
        .subcommand(
            SubCommand::with_name("receipt")
                .about("Check that a receipt matches a stored ballot")
                .arg(Arg::with_name("BALLOTS").index(1).required(true))
                .arg(Arg::with_name("RECEIPT").index(2).required(true)),
        )
        .subcommand(
            SubCommand::with_name("results")
                .about("Print the ranked results of a closed election")
                .arg(Arg::with_name("ELECTION").index(1).required(true)),
        )
        .subcommand(
            SubCommand::with_name("e2e")
                .about("Run a simulated election end to end")
                .arg(
                    Arg::with_name("candidates")
                        .long("candidates")
                        .takes_value(true)
                        .default_value("3"),
                )
                .arg(
                    Arg::with_name("voters")
                        .long("voters")
                        .takes_value(true)
                        .default_value("25"),
                )
                .arg(
                    Arg::with_name("print-tally")
                        .long("print-tally")
                        .help("Print the tally record"),
                )
                .arg(
                    Arg::with_name("print-results")
                        .long("print-results")
                        .help("Print ranked results"),
                ),
        )
        .get_matches();

    let verbosity = if matches.is_present("quiet") {
        Verbosity::Silent
    } else {
        let level = 2 + matches.occurrences_of("v").min(2) as u8;
        Verbosity::try_from(level).unwrap_or(Verbosity::Debug)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::from_env().engine(&matches);

    // Subcommands
    match matches.subcommand() {
        ("keygen", Some(matches)) => command_keygen::command_keygen(matches, &config),
        ("cast", Some(matches)) => command_cast::command_cast(matches, &config),
        ("close", Some(matches)) => command_close::command_close(matches, &config),
        ("verify", Some(matches)) => command_verify::command_verify(matches),
        ("receipt", Some(matches)) => command_receipt::command_receipt(matches),
        ("results", Some(matches)) => command_results::command_results(matches),
        ("e2e", Some(matches)) => command_e2e::command_e2e(matches, &config),
        _ => {}
    }
}

/// Expand `~` and environment variables in a path argument
pub fn expand(input: &str) -> String {
    shellexpand::full(input)
        .map(|expanded| expanded.into_owned())
        .unwrap_or_else(|_| input.to_owned())
}

/// Print an error for `command` and exit with status 1
pub fn fail(command: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("homoballot {}: {}", command, message);
    std::process::exit(1);
}

/// Read a JSON or CBOR file
pub fn read_input<T: DeserializeOwned>(command: &str, filename: &str) -> T {
    use content_inspector::ContentType;

    let file_bytes = std::fs::read(filename)
        .unwrap_or_else(|e| fail(command, format!("unable to read {}: {}", filename, e)));

    match content_inspector::inspect(&file_bytes) {
        ContentType::UTF_8 => serde_json::from_slice(&file_bytes)
            .unwrap_or_else(|e| fail(command, format!("unable to read {}: {}", filename, e))),
        ContentType::BINARY => serde_cbor::from_slice(&file_bytes)
            .unwrap_or_else(|e| fail(command, format!("unable to read {}: {}", filename, e))),
        _ => fail(command, format!("invalid file format for {}", filename)),
    }
}

/// Write `value` as pretty JSON
pub fn write_output<T: Serialize>(command: &str, filename: &str, value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| fail(command, format!("unable to serialize {}: {}", filename, e)));

    std::fs::write(filename, json)
        .unwrap_or_else(|e| fail(command, format!("unable to write {}: {}", filename, e)));
}

/// Parse a numeric argument
pub fn parse_arg<T: std::str::FromStr>(command: &str, name: &str, value: &str) -> T {
    value
        .parse()
        .unwrap_or_else(|_| fail(command, format!("invalid {}: {}", name, value)))
}
