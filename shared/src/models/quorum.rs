use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quorum {
    #[default]
    Majority,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Proposed,
    Approved,
    Rejected,
    Cancelled,
}

impl VoteStatus {
    pub fn is_terminal(self) -> bool {
        self != VoteStatus::Proposed
    }
}

/// Status after a vote.
///
/// `All` settles once everyone has voted and approves only if every vote
/// was yes. `Majority` approves once `yes > total / 2` and rejects once
/// `no >= ceil(total / 2)`, since approval is then out of reach.
pub fn tally(quorum: Quorum, yes: u32, no: u32, total: u32) -> VoteStatus {
    match quorum {
        Quorum::All => {
            if yes + no < total {
                VoteStatus::Proposed
            } else if yes == total {
                VoteStatus::Approved
            } else {
                VoteStatus::Rejected
            }
        }
        Quorum::Majority => {
            if yes > total / 2 {
                VoteStatus::Approved
            } else if no >= total.div_ceil(2) {
                VoteStatus::Rejected
            } else {
                VoteStatus::Proposed
            }
        }
    }
}
