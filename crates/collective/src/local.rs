//! In-process process group
//!
//! Members run on separate threads and meet in a shared rendezvous. Each
//! collective call is one generation: every member deposits its value, the
//! last arrival publishes the rank-ordered values and advances the generation,
//! and the others wake and read them.
//!
//! # Failure reporting
//!
//! A real process group hangs when a member stops participating. Here a
//! member that is dropped marks the group as departed, and anyone waiting (or
//! arriving later) gets [`CollectiveError::MemberDeparted`] instead. Members
//! entering different collectives in the same generation get
//! [`CollectiveError::Diverged`]. There are no timeouts.

use parking_lot::{Condvar, Mutex};
use snapstage_core::{CollectiveError, CollectiveKind, Communicator, Rank};
use std::sync::Arc;
use tracing::warn;

struct Round {
    generation: u64,
    kind: Option<CollectiveKind>,
    contributions: Vec<Option<u64>>,
    arrived: usize,
    /// Rank-ordered values of the last completed generation
    completed: Vec<u64>,
    departed: Option<Rank>,
}

struct Rendezvous {
    size: usize,
    round: Mutex<Round>,
    cond: Condvar,
}

/// Factory for in-process groups
pub struct LocalGroup;

impl LocalGroup {
    /// Create a group of `size` members, one handle per rank in rank order.
    pub fn new(size: usize) -> Vec<LocalMember> {
        let shared = Arc::new(Rendezvous {
            size,
            round: Mutex::new(Round {
                generation: 0,
                kind: None,
                contributions: vec![None; size],
                arrived: 0,
                completed: Vec::new(),
                departed: None,
            }),
            cond: Condvar::new(),
        });
        (0..size)
            .map(|rank| LocalMember {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

/// One member of a [`LocalGroup`]
///
/// Dropping a member removes it from the group for good.
pub struct LocalMember {
    rank: Rank,
    shared: Arc<Rendezvous>,
}

impl LocalMember {
    /// Deposit `value` and return every member's value for this generation.
    fn exchange(&self, kind: CollectiveKind, value: u64) -> Result<Vec<u64>, CollectiveError> {
        let mut round = self.shared.round.lock();
        if let Some(rank) = round.departed {
            return Err(CollectiveError::MemberDeparted {
                rank,
                generation: round.generation,
            });
        }
        let current = round.kind;
        match current {
            None => round.kind = Some(kind),
            Some(expected) if expected != kind => {
                return Err(CollectiveError::Diverged {
                    generation: round.generation,
                    rank: self.rank,
                    expected,
                    found: kind,
                });
            }
            Some(_) => {}
        }

        round.contributions[self.rank] = Some(value);
        round.arrived += 1;

        if round.arrived == self.shared.size {
            let values: Vec<u64> = round
                .contributions
                .iter_mut()
                .map(|c| c.take().unwrap_or(0))
                .collect();
            round.completed = values.clone();
            round.arrived = 0;
            round.kind = None;
            round.generation += 1;
            self.shared.cond.notify_all();
            return Ok(values);
        }

        let generation = round.generation;
        while round.generation == generation {
            if let Some(rank) = round.departed {
                return Err(CollectiveError::MemberDeparted { rank, generation });
            }
            self.shared.cond.wait(&mut round);
        }
        Ok(round.completed.clone())
    }
}

impl Communicator for LocalMember {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn all_reduce_sum(&self, value: u64) -> Result<u64, CollectiveError> {
        let values = self.exchange(CollectiveKind::AllReduceSum, value)?;
        checked_sum(&values, CollectiveKind::AllReduceSum)
    }

    fn scan_sum(&self, value: u64) -> Result<u64, CollectiveError> {
        let values = self.exchange(CollectiveKind::ScanSum, value)?;
        checked_sum(&values[..=self.rank], CollectiveKind::ScanSum)
    }

    fn barrier(&self) -> Result<(), CollectiveError> {
        self.exchange(CollectiveKind::Barrier, 0).map(|_| ())
    }
}

impl Drop for LocalMember {
    fn drop(&mut self) {
        let mut round = self.shared.round.lock();
        if round.departed.is_none() {
            round.departed = Some(self.rank);
            if round.arrived > 0 {
                warn!(target: "snapstage::collective", rank = self.rank, generation = round.generation, "Member left with collective in progress");
            }
        }
        self.shared.cond.notify_all();
    }
}

fn checked_sum(values: &[u64], kind: CollectiveKind) -> Result<u64, CollectiveError> {
    values
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .ok_or(CollectiveError::Overflow { kind })
}

/// Run `f` once per rank of a fresh [`LocalGroup`], each on its own thread.
///
/// Results are returned in rank order. A panic on any rank is propagated.
pub fn spawn_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    F: Fn(LocalMember) -> T + Sync,
    T: Send,
{
    let members = LocalGroup::new(size);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = members
            .into_iter()
            .map(|member| s.spawn(move || f(member)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(v) => v,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
