use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// A question snapshot from the archive, as returned by `/question/last`.
/// Archived questions carry their final tallies and authorship metadata
/// instead of chain fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedQuestion {
    pub question_id: QuestionId,
    pub archive_date: NaiveDate,
    pub question_text: String,
    pub first_choice: String,
    pub second_choice: String,
    #[serde(default)]
    pub total_participants: u32,
    #[serde(default)]
    pub first_choice_count: u32,
    #[serde(default)]
    pub second_choice_count: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
