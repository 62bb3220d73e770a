use crate::*;
use indexmap::IndexMap;
use rand_core::{CryptoRng, RngCore};
use tracing::instrument;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    Open,
    Closed,
}

/// An election: its public key, frozen candidate ordering, and, once closed,
/// the published tally record.
///
/// The private key is not part of the election. It is held by the `Authority`
/// returned from `Election::new` and is only needed again at close.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "UncheckedElection")]
pub struct Election {
    pub id: Uuid,

    /// Election public key
    ///
    /// Voters encrypt their ballots with it and anyone can verify the tally with it.
    pub public_key: PublicKey,

    /// Candidate identifiers in ascending order. Ballot slot `i` is candidate `i`.
    pub candidates: Vec<CandidateId>,

    pub status: ElectionStatus,

    /// Published once the election is closed, never mutated afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<TallyRecord>,
}

impl Election {
    /// Create a new election with a fresh key pair
    ///
    /// The returned Authority holds the private key and must be kept by the election operator.
    pub fn new<R: RngCore + CryptoRng>(
        candidates: Vec<CandidateId>,
        rng: &mut R,
        config: &Config,
    ) -> Result<(Self, Authority), Error> {
        let candidates = freeze_candidates(candidates)?;
        let authority = Authority::generate(rng, config)?;
        let election = Election::with_public_key(authority.public_key().clone(), candidates)?;

        tracing::info!(election = %election.id, candidates = election.candidates.len(), "created election");
        Ok((election, authority))
    }

    /// Create an open election for an existing public key
    pub fn with_public_key(public_key: PublicKey, candidates: Vec<CandidateId>) -> Result<Self, Error> {
        public_key.validate()?;
        Ok(Election {
            id: Uuid::new_v4(),
            public_key,
            candidates: freeze_candidates(candidates)?,
            status: ElectionStatus::Open,
            tally: None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.status == ElectionStatus::Closed
    }

    /// Encrypt a vote for `chosen`, returning the ballot and the voter's receipt
    pub fn cast<R: RngCore + CryptoRng>(
        &self,
        chosen: CandidateId,
        rng: &mut R,
        config: &Config,
    ) -> Result<(Ballot, Receipt), Error> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed);
        }

        let ballot = encode_and_encrypt(&self.public_key, &self.candidates, chosen, rng, config)?;
        let receipt = receipt_for(&ballot)?;
        Ok((ballot, receipt))
    }

    /// Close the election: fold every stored ballot, decrypt and publish the tally
    ///
    /// Runs exactly once. A second call fails with `Error::AlreadyClosed` and leaves
    /// the published record untouched.
    #[instrument(level = "info", skip_all, fields(election = %self.id))]
    pub fn close<S: Store>(
        &mut self,
        authority: &Authority,
        store: &S,
        config: &Config,
    ) -> Result<&TallyRecord, Error> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed);
        }
        if authority.public_key() != &self.public_key {
            return Err(Error::KeyMismatch);
        }

        let ballots = store.get_ballots(self.id);
        let slots = self.candidates.len();
        let positive_total = fold_parallel(&self.public_key, slots, &ballots, config.shards)?;
        let tally = authority.decrypt_and_publish(&self.candidates, positive_total, ballots.len() as u64)?;

        tracing::info!(ballots = ballots.len(), "closed election");
        self.status = ElectionStatus::Closed;
        Ok(&*self.tally.insert(tally.record()))
    }

    /// Verify the published tally. Inconclusive while the election is open.
    pub fn verify(&self) -> Verification {
        let record = match (&self.status, &self.tally) {
            (ElectionStatus::Closed, Some(record)) => record,
            _ => return Verification::Inconclusive,
        };

        // The record must be aligned to the frozen ordering
        if !record.candidates.is_empty() && record.candidates != self.candidates {
            let slot = record
                .candidates
                .iter()
                .zip(self.candidates.iter())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| record.candidates.len().min(self.candidates.len()));
            tracing::warn!(slot, "tally record candidate ordering differs from the election");
            return Verification::Failed { slot };
        }

        verify_tally(&self.public_key, record)
    }

    /// Ranked results of a closed election
    pub fn results(&self) -> Result<ElectionResults, Error> {
        match (&self.status, &self.tally) {
            (ElectionStatus::Closed, Some(record)) => ElectionResults::from_record(record),
            _ => Err(Error::NotClosed),
        }
    }
}

/// Wire form of an `Election`, checked before use
#[derive(Deserialize)]
struct UncheckedElection {
    id: Uuid,
    public_key: PublicKey,
    candidates: Vec<CandidateId>,
    status: ElectionStatus,
    #[serde(default)]
    tally: Option<TallyRecord>,
}

impl std::convert::TryFrom<UncheckedElection> for Election {
    type Error = Error;

    /// Loaded elections must already carry a frozen ordering; it is never re-sorted.
    fn try_from(unchecked: UncheckedElection) -> Result<Self, Error> {
        unchecked.public_key.validate()?;
        if freeze_candidates(unchecked.candidates.clone())? != unchecked.candidates {
            return Err(Error::InvalidElection("candidates are not in ascending order"));
        }
        if unchecked.status == ElectionStatus::Open && unchecked.tally.is_some() {
            return Err(Error::InvalidElection("an open election has no tally"));
        }

        Ok(Election {
            id: unchecked.id,
            public_key: unchecked.public_key,
            candidates: unchecked.candidates,
            status: unchecked.status,
            tally: unchecked.tally,
        })
    }
}

/// Sort candidates ascending and reject empty or duplicated lists
fn freeze_candidates(mut candidates: Vec<CandidateId>) -> Result<Vec<CandidateId>, Error> {
    if candidates.is_empty() {
        return Err(Error::InvalidElection("an election needs at least one candidate"));
    }

    candidates.sort_unstable();
    if candidates.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(Error::InvalidElection("duplicate candidate"));
    }
    Ok(candidates)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub candidate: CandidateId,
    pub votes: u64,

    /// Share of all counted votes, in percent
    pub percentage: f64,
}

/// Decrypted totals of a closed election, ranked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElectionResults {
    pub ballots_counted: u64,

    /// Votes per candidate, in candidate order
    pub totals: IndexMap<CandidateId, u64>,

    /// Candidates by descending votes. Ties keep candidate order.
    pub ranking: Vec<CandidateResult>,

    /// First ranked candidate, or none if nobody received a vote
    pub winner: Option<CandidateId>,
}

impl ElectionResults {
    pub fn from_record(record: &TallyRecord) -> Result<Self, Error> {
        if record.decrypted_total.is_empty() {
            return Err(Error::NotClosed);
        }
        if record.candidates.len() != record.decrypted_total.len() {
            return Err(Error::BallotShape {
                expected: record.candidates.len(),
                found: record.decrypted_total.len(),
            });
        }

        let mut totals = IndexMap::with_capacity(record.candidates.len());
        for (slot, (candidate, value)) in record
            .candidates
            .iter()
            .zip(record.decrypted_total.iter())
            .enumerate()
        {
            if *value < 0 {
                return Err(Error::TallyOutOfRange {
                    slot,
                    value: *value,
                    max: record.ballots_counted,
                });
            }
            totals.insert(*candidate, *value as u64);
        }

        let counted: u64 = totals.values().sum();
        let mut ranking: Vec<CandidateResult> = totals
            .iter()
            .map(|(candidate, votes)| CandidateResult {
                candidate: *candidate,
                votes: *votes,
                percentage: if counted == 0 {
                    0.0
                } else {
                    *votes as f64 * 100.0 / counted as f64
                },
            })
            .collect();

        // Stable sort keeps candidate order among ties
        ranking.sort_by(|a, b| b.votes.cmp(&a.votes));

        let winner = ranking
            .first()
            .filter(|first| first.votes > 0)
            .map(|first| first.candidate);

        Ok(ElectionResults {
            ballots_counted: record.ballots_counted,
            totals,
            ranking,
            winner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{test_authority, test_rng};

    fn open_election(candidates: Vec<CandidateId>) -> (Election, Authority) {
        let authority = test_authority();
        let election = Election::with_public_key(authority.public_key().clone(), candidates).unwrap();
        (election, authority)
    }

    #[test]
    fn freezes_candidate_ordering() {
        let (election, _) = open_election(vec![30, 10, 20]);
        assert_eq!(election.candidates, vec![10, 20, 30]);
        assert_eq!(election.status, ElectionStatus::Open);

        let public = test_authority().public_key().clone();
        assert!(matches!(
            Election::with_public_key(public.clone(), vec![]),
            Err(Error::InvalidElection(_))
        ));
        assert!(matches!(
            Election::with_public_key(public, vec![1, 2, 1]),
            Err(Error::InvalidElection(_))
        ));
    }

    #[test]
    fn new_generates_keys() {
        let mut rng = test_rng(50);
        let config = Config::default().with_key_bits(256);
        let (election, authority) = Election::new(vec![2, 1], &mut rng, &config).unwrap();
        assert_eq!(&election.public_key, authority.public_key());
        assert_eq!(election.candidates, vec![1, 2]);

        assert!(Election::new(vec![], &mut rng, &config).is_err());
    }

    #[test]
    fn cast_close_verify() {
        let (mut election, authority) = open_election(vec![1, 2, 3]);
        let mut rng = test_rng(51);
        let config = Config::default().with_shards(2);
        let mut store = MemStore::default();

        assert_eq!(election.verify(), Verification::Inconclusive);
        assert!(matches!(election.results(), Err(Error::NotClosed)));

        for chosen in &[1, 2, 1, 3] {
            let (ballot, receipt) = election.cast(*chosen, &mut rng, &config).unwrap();
            assert_eq!(store.add_ballot(election.id, &ballot).unwrap(), receipt);
        }

        let record = election.close(&authority, &store, &config).unwrap().clone();
        assert_eq!(record.decrypted_total, vec![2, 1, 1]);
        assert_eq!(record.ballots_counted, 4);
        assert_eq!(record.candidates, vec![1, 2, 3]);
        assert!(election.is_closed());
        assert_eq!(election.verify(), Verification::Verified);

        // No second decryption, no more ballots
        assert!(matches!(
            election.close(&authority, &store, &config),
            Err(Error::AlreadyClosed)
        ));
        assert_eq!(election.tally.as_ref(), Some(&record));
        assert!(matches!(
            election.cast(1, &mut rng, &config),
            Err(Error::AlreadyClosed)
        ));
    }

    #[test]
    fn close_rejects_foreign_authority() {
        let (mut election, _) = open_election(vec![1, 2]);
        let mut rng = test_rng(52);
        let other = Authority::generate(&mut rng, &Config::default().with_key_bits(256)).unwrap();

        assert!(matches!(
            election.close(&other, &MemStore::default(), &Config::default()),
            Err(Error::KeyMismatch)
        ));
        assert!(!election.is_closed());
    }

    #[test]
    fn close_with_no_ballots() {
        let (mut election, authority) = open_election(vec![1, 2]);
        election
            .close(&authority, &MemStore::default(), &Config::default())
            .unwrap();
        assert_eq!(election.verify(), Verification::Verified);

        let results = election.results().unwrap();
        assert_eq!(results.winner, None);
        assert!(results.ranking.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn verify_detects_reordered_candidates() {
        let (mut election, authority) = open_election(vec![1, 2]);
        election
            .close(&authority, &MemStore::default(), &Config::default())
            .unwrap();

        if let Some(record) = election.tally.as_mut() {
            record.candidates = vec![2, 1];
        }
        assert_eq!(election.verify(), Verification::Failed { slot: 0 });
    }

    #[test]
    fn ranked_results() {
        let record = TallyRecord {
            candidates: vec![1, 2, 3, 4],
            ballots_counted: 8,
            decrypted_total: vec![2, 3, 3, 0],
            ..TallyRecord::default()
        };
        let results = ElectionResults::from_record(&record).unwrap();

        let order: Vec<CandidateId> = results.ranking.iter().map(|r| r.candidate).collect();
        assert_eq!(order, vec![2, 3, 1, 4]);
        assert_eq!(results.winner, Some(2));
        assert_eq!(results.totals.get(&3), Some(&3));
        assert_eq!(results.totals.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!((results.ranking[0].percentage - 37.5).abs() < 1e-9);
        assert!((results.ranking[2].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn results_reject_malformed_records() {
        let misaligned = TallyRecord {
            candidates: vec![1, 2],
            decrypted_total: vec![1],
            ..TallyRecord::default()
        };
        assert!(matches!(
            ElectionResults::from_record(&misaligned),
            Err(Error::BallotShape { .. })
        ));

        let negative = TallyRecord {
            candidates: vec![1],
            decrypted_total: vec![-1],
            ..TallyRecord::default()
        };
        assert!(matches!(
            ElectionResults::from_record(&negative),
            Err(Error::TallyOutOfRange { .. })
        ));
    }

    #[test]
    fn election_serialization() {
        let (election, _) = open_election(vec![1, 2]);
        let json = serde_json::to_value(&election).unwrap();
        assert_eq!(json["status"], "open");
        assert!(json.get("tally").is_none());

        let back: Election = serde_json::from_value(json).unwrap();
        assert_eq!(back, election);
    }

    #[test]
    fn loading_checks_the_election() {
        let (election, _) = open_election(vec![1, 2, 3]);
        let json = serde_json::to_value(&election).unwrap();

        let mut unsorted = json.clone();
        unsorted["candidates"] = serde_json::json!([3, 1, 2]);
        assert!(serde_json::from_value::<Election>(unsorted).is_err());

        let mut duplicated = json.clone();
        duplicated["candidates"] = serde_json::json!([1, 1, 2]);
        assert!(serde_json::from_value::<Election>(duplicated).is_err());

        let mut empty = json.clone();
        empty["candidates"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Election>(empty).is_err());

        let mut bad_key = json.clone();
        bad_key["public_key"]["g"] = serde_json::json!("2");
        assert!(serde_json::from_value::<Election>(bad_key).is_err());

        let mut open_with_tally = json;
        open_with_tally["tally"] = serde_json::json!({"candidates": [1, 2, 3]});
        assert!(serde_json::from_value::<Election>(open_with_tally).is_err());
    }
}
