//! Leader selection
//!
//! One-time metadata is written by a single designated member. The leader is
//! the lowest rank unless configured otherwise.

use snapstage_core::{Communicator, Rank, StageError, StageResult};

/// Default leader: the lowest rank in the group.
pub const DEFAULT_LEADER_RANK: Rank = 0;

/// This process's role within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    rank: Rank,
    leader: Rank,
}

impl Role {
    /// Role of `rank` when `leader` is the designated leader.
    pub fn new(rank: Rank, leader: Rank) -> Self {
        Self { rank, leader }
    }

    /// Resolve the role of the calling member of `comm`.
    ///
    /// Fails when `leader` is not a member of the group.
    pub fn resolve<G: Communicator + ?Sized>(comm: &G, leader: Rank) -> StageResult<Self> {
        if leader >= comm.size() {
            return Err(StageError::config(format!(
                "leader rank {} is outside a group of {}",
                leader,
                comm.size()
            )));
        }
        Ok(Self::new(comm.rank(), leader))
    }

    /// True for the designated leader.
    pub fn is_leader(&self) -> bool {
        self.rank == self.leader
    }

    /// Rank of the calling member.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Rank of the leader.
    pub fn leader(&self) -> Rank {
        self.leader
    }
}
