use serde::{Deserialize, Serialize};

use crate::model::{
    id::empty_as_none,
    GroupId, MilestoneSchedule, QuestionId,
};

/// A binary-choice question as held in the service's daily cache.
///
/// The vote counts are a snapshot: `first_choice_count + second_choice_count`
/// equals `total_participants` and all three only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: QuestionId,
    /// Id of the author, as reported by the service.
    #[serde(default)]
    pub user_id: String,
    pub text: String,
    pub first_choice: String,
    pub second_choice: String,
    #[serde(default)]
    pub total_participants: u32,
    #[serde(default)]
    pub first_choice_count: u32,
    #[serde(default)]
    pub second_choice_count: u32,
    /// The milestone schedule, non-empty only on a main question that owns a
    /// chain.
    #[serde(default)]
    pub milestones: MilestoneSchedule,
    /// On a main question, the lowest-threshold milestone; on a milestone
    /// question, the next-lower milestone in its chain.
    #[serde(default, with = "empty_as_none")]
    pub follow_ups: Option<QuestionId>,
    #[serde(default, with = "empty_as_none")]
    pub group_id: Option<GroupId>,
}

/// How a question participates in a milestone chain. Derived from the three
/// chain fields, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// A plain question with no chain attached.
    Standalone,
    /// A question owning a milestone schedule.
    Main,
    /// A question revealed by some main question's chain.
    Milestone { group: Option<GroupId> },
}

impl Question {
    /// Classify this question. Recomputed on every call; the chain fields
    /// come from the service and may differ between fetches.
    pub fn kind(&self) -> QuestionKind {
        if !self.milestones.is_empty() {
            QuestionKind::Main
        } else if self.follow_ups.is_none() && self.group_id.is_none() {
            QuestionKind::Standalone
        } else {
            QuestionKind::Milestone {
                group: self.group_id.clone(),
            }
        }
    }

    /// Main questions are the ones presented directly to voters; milestone
    /// questions stay hidden until revealed.
    pub fn is_main(&self) -> bool {
        matches!(self.kind(), QuestionKind::Standalone | QuestionKind::Main)
    }
}

/// Payload for creating a question in today's cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuestion {
    pub text: String,
    pub first_choice: String,
    pub second_choice: String,
    pub milestones: MilestoneSchedule,
    #[serde(with = "empty_as_none")]
    pub follow_ups: Option<QuestionId>,
    #[serde(with = "empty_as_none")]
    pub group_id: Option<GroupId>,
}
