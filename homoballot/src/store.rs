use crate::*;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A ballot as kept by the storage layer, together with the receipt handed to the voter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredBallot {
    pub receipt: Receipt,
    pub ballot: Ballot,
}

/// A ballot store
///
/// Persistence lives outside the engine; the engine only needs to read back every
/// ballot of an election, in submission order, when the election closes.
pub trait Store {
    /// Get all ballots cast in an election, in submission order
    fn get_ballots(&self, election: Uuid) -> Vec<Ballot>;

    /// Get the receipts of all ballots cast in an election, in submission order
    fn get_receipts(&self, election: Uuid) -> Vec<Receipt>;

    /// Check whether a voter's receipt matches a stored ballot
    fn contains_receipt(&self, election: Uuid, receipt: &Receipt) -> bool {
        self.get_receipts(election).iter().any(|r| r == receipt)
    }
}

/// A simple store that uses an in-memory BTreeMap
///
/// Only public ballots are kept. Randomness is stripped on insert.
#[derive(Default, Clone, Debug)]
pub struct MemStore {
    inner: BTreeMap<Uuid, Vec<StoredBallot>>,
}

impl MemStore {
    /// Append a ballot to an election and return its receipt
    pub fn add_ballot(&mut self, election: Uuid, ballot: &Ballot) -> Result<Receipt, Error> {
        let receipt = receipt_for(ballot)?;
        self.inner.entry(election).or_default().push(StoredBallot {
            receipt: receipt.clone(),
            ballot: ballot.public(),
        });
        Ok(receipt)
    }

    pub fn ballot_count(&self, election: Uuid) -> usize {
        self.inner.get(&election).map(Vec::len).unwrap_or(0)
    }

    /// Stored ballots of an election, in submission order
    pub fn stored(&self, election: Uuid) -> &[StoredBallot] {
        self.inner
            .get(&election)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Store for MemStore {
    fn get_ballots(&self, election: Uuid) -> Vec<Ballot> {
        self.stored(election)
            .iter()
            .map(|stored| stored.ballot.clone())
            .collect()
    }

    fn get_receipts(&self, election: Uuid) -> Vec<Receipt> {
        self.stored(election)
            .iter()
            .map(|stored| stored.receipt.clone())
            .collect()
    }
}

impl From<(Uuid, Vec<StoredBallot>)> for MemStore {
    fn from((election, ballots): (Uuid, Vec<StoredBallot>)) -> Self {
        let mut memstore = MemStore::default();
        memstore.inner.insert(election, ballots);
        memstore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{cast_ballots, test_keypair};

    #[test]
    fn keeps_ballots_in_order() {
        let (public, _) = test_keypair();
        let ballots = cast_ballots(&public, &[1, 2], &[1, 2, 2], 40);
        let election = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut store = MemStore::default();
        let receipts: Vec<Receipt> = ballots
            .iter()
            .map(|b| store.add_ballot(election, b).unwrap())
            .collect();

        assert_eq!(store.ballot_count(election), 3);
        assert_eq!(store.ballot_count(other), 0);
        assert!(store.get_ballots(other).is_empty());

        let stored = store.get_ballots(election);
        for (stored, cast) in stored.iter().zip(ballots.iter()) {
            assert_eq!(stored, &cast.public());
        }
        assert_eq!(store.get_receipts(election), receipts);
    }

    #[test]
    fn receipt_lookup() {
        let (public, _) = test_keypair();
        let ballots = cast_ballots(&public, &[1, 2], &[1, 2], 41);
        let election = Uuid::new_v4();

        let mut store = MemStore::default();
        let receipt = store.add_ballot(election, &ballots[0]).unwrap();

        assert!(store.contains_receipt(election, &receipt));
        assert!(!store.contains_receipt(Uuid::new_v4(), &receipt));
        assert!(!store.contains_receipt(election, &receipt_for(&ballots[1]).unwrap()));
    }

    #[test]
    fn from_stored_ballots() {
        let (public, _) = test_keypair();
        let ballots = cast_ballots(&public, &[1, 2], &[2], 42);
        let election = Uuid::new_v4();
        let stored = vec![StoredBallot {
            receipt: receipt_for(&ballots[0]).unwrap(),
            ballot: ballots[0].public(),
        }];

        let store = MemStore::from((election, stored.clone()));
        assert_eq!(store.stored(election), stored.as_slice());
    }
}
