#[macro_use]
extern crate serde;

mod arith;
mod ballot;
mod config;
mod decryption;
mod election;
mod error;
mod keygen;
mod paillier;
mod receipt;
mod store;
mod tally;
mod verification;

pub mod serde_decimal;

pub use arith::*;
pub use ballot::*;
pub use config::*;
pub use decryption::*;
pub use election::*;
pub use error::*;
pub use keygen::*;
pub use paillier::*;
pub use receipt::*;
pub use store::*;
pub use tally::*;
pub use verification::*;
