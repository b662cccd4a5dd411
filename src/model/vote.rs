use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// A vote on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteRequest {
    pub question_id: QuestionId,
    pub is_first_choice: bool,
    pub user_id: String,
}

/// The service's response to a counted (or rejected duplicate) vote.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoteReceipt {
    pub question_id: QuestionId,
    #[serde(default)]
    pub total_participants: u32,
    #[serde(default)]
    pub first_choice_count: u32,
    #[serde(default)]
    pub second_choice_count: u32,
    /// Milestone questions whose thresholds this vote crossed, per the
    /// service's own bookkeeping.
    #[serde(default)]
    pub newly_revealed_ids: Vec<QuestionId>,
    #[serde(default)]
    pub already_voted: bool,
}

impl VoteReceipt {
    pub fn into_outcome(self) -> VoteOutcome {
        if self.already_voted {
            VoteOutcome::AlreadyVoted
        } else {
            VoteOutcome::Counted(self)
        }
    }
}

/// What became of a cast vote. A duplicate vote is an outcome callers branch
/// on, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was counted; the receipt carries the updated tallies.
    Counted(VoteReceipt),
    /// This user had already voted on the question; nothing changed.
    AlreadyVoted,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn receipt(already_voted: bool) -> VoteReceipt {
        serde_json::from_value(json!({
            "question_id": "q1",
            "total_participants": 101,
            "first_choice_count": 70,
            "second_choice_count": 31,
            "newly_revealed_ids": ["m1"],
            "already_voted": already_voted,
        }))
        .unwrap()
    }

    #[test]
    fn counted_vote_keeps_the_receipt() {
        match receipt(false).into_outcome() {
            VoteOutcome::Counted(receipt) => {
                assert_eq!(101, receipt.total_participants);
                assert_eq!(vec![QuestionId::from("m1")], receipt.newly_revealed_ids);
            }
            VoteOutcome::AlreadyVoted => panic!("vote should have counted"),
        }
    }

    #[test]
    fn duplicate_vote_is_its_own_outcome() {
        assert_eq!(VoteOutcome::AlreadyVoted, receipt(true).into_outcome());
    }
}
