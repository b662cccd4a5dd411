use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    ArchivedQuestion, NewQuestion, Question, QuestionId, VoteOutcome, VoteReceipt, VoteRequest,
};

use super::ApiClient;

/// The slice of the external service that chain creation and milestone
/// resolution depend on. A seam for tests; [`ApiClient`] is the real thing.
#[async_trait]
pub trait QuestionService: Sync {
    /// Create a question record, returning the id the service assigned.
    async fn create_question(&self, question: &NewQuestion) -> Result<QuestionId>;

    /// Fetch a single question from today's cache.
    async fn question(&self, id: &QuestionId) -> Result<Question>;
}

#[async_trait]
impl QuestionService for ApiClient {
    async fn create_question(&self, question: &NewQuestion) -> Result<QuestionId> {
        #[derive(Deserialize)]
        struct Created {
            question_id: QuestionId,
        }
        let created: Created = self.post("/question/cache", question).await?;
        Ok(created.question_id)
    }

    async fn question(&self, id: &QuestionId) -> Result<Question> {
        self.get(&format!("/question/cache/{id}")).await
    }
}

impl ApiClient {
    /// All of today's cached questions, milestone questions included.
    pub async fn today(&self) -> Result<Vec<Question>> {
        #[derive(Deserialize)]
        struct Today {
            #[serde(default)]
            questions: Vec<Question>,
        }
        let today: Today = self.get("/question/cache/today").await?;
        Ok(today.questions)
    }

    /// Today's main questions only. Milestone questions stay hidden until
    /// their main question reveals them.
    pub async fn main_questions_today(&self) -> Result<Vec<Question>> {
        Ok(self
            .today()
            .await?
            .into_iter()
            .filter(Question::is_main)
            .collect())
    }

    /// Cast a vote. A duplicate vote comes back as
    /// [`VoteOutcome::AlreadyVoted`], not as an error.
    pub async fn vote(&self, request: &VoteRequest) -> Result<VoteOutcome> {
        let receipt: VoteReceipt = self.post("/question/vote", request).await?;
        Ok(receipt.into_outcome())
    }

    /// The most recently archived question.
    pub async fn last_archived(&self) -> Result<ArchivedQuestion> {
        self.get("/question/last").await
    }
}
