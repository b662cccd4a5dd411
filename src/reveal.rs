//! Milestone reveal resolution.

use log::debug;

use crate::api::QuestionService;
use crate::error::Result;
use crate::model::Question;

/// Decide which milestone (if any) a main question should surface for its
/// current participant count, and fetch it.
///
/// Selection is pure: for a fixed snapshot of `main` the same milestone id
/// is chosen every time. Only the fetched record's live vote counts can
/// differ between calls.
pub async fn reveal_milestone<S>(service: &S, main: &Question) -> Result<Option<Question>>
where
    S: QuestionService + ?Sized,
{
    let reached = match main.milestones.reveal_at(main.total_participants) {
        Some(reached) => reached,
        None => return Ok(None),
    };
    debug!(
        "question {} reached milestone threshold {}",
        main.question_id, reached.threshold
    );
    let milestone = service.question(&reached.question).await?;
    Ok(Some(milestone))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::error::Error;
    use crate::model::{NewQuestion, QuestionId};

    use super::*;

    struct FakeService {
        questions: HashMap<QuestionId, Question>,
    }

    impl FakeService {
        fn with(questions: Vec<Question>) -> Self {
            Self {
                questions: questions
                    .into_iter()
                    .map(|q| (q.question_id.clone(), q))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl QuestionService for FakeService {
        async fn create_question(&self, _question: &NewQuestion) -> Result<QuestionId> {
            unreachable!("resolution never creates")
        }

        async fn question(&self, id: &QuestionId) -> Result<Question> {
            self.questions
                .get(id)
                .cloned()
                .ok_or_else(|| Error::RequestFailed {
                    status: StatusCode::NOT_FOUND,
                    message: format!("no cached question {id}"),
                })
        }
    }

    fn cache_question(id: &str, milestones: &str, participants: u32) -> Question {
        serde_json::from_value(json!({
            "question_id": id,
            "user_id": "u1",
            "text": format!("Question {id}"),
            "first_choice": "Yes",
            "second_choice": "No",
            "total_participants": participants,
            "first_choice_count": participants,
            "second_choice_count": 0,
            "milestones": milestones,
            "follow_ups": "",
            "group_id": "",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_the_largest_reached_milestone() {
        let service = FakeService::with(vec![
            cache_question("a", "", 3),
            cache_question("b", "", 7),
        ]);
        let main = cache_question("main", "100:a,200:b", 150);

        let milestone = reveal_milestone(&service, &main).await.unwrap().unwrap();
        assert_eq!(QuestionId::from("a"), milestone.question_id);
    }

    #[tokio::test]
    async fn below_every_threshold_reveals_nothing() {
        let service = FakeService::with(Vec::new());
        let main = cache_question("main", "100:a,200:b", 99);

        assert_eq!(None, reveal_milestone(&service, &main).await.unwrap());
    }

    #[tokio::test]
    async fn no_schedule_reveals_nothing() {
        let service = FakeService::with(Vec::new());
        let main = cache_question("main", "", 1_000);

        assert_eq!(None, reveal_milestone(&service, &main).await.unwrap());
    }

    #[tokio::test]
    async fn unparsable_schedule_reveals_nothing() {
        let service = FakeService::with(Vec::new());
        let main = cache_question("main", "garbage", 1_000);

        assert_eq!(None, reveal_milestone(&service, &main).await.unwrap());
    }

    #[tokio::test]
    async fn resolution_is_idempotent_for_a_fixed_snapshot() {
        let service = FakeService::with(vec![
            cache_question("a", "", 3),
            cache_question("b", "", 7),
        ]);
        let main = cache_question("main", "100:a,200:b", 205);

        let first = reveal_milestone(&service, &main).await.unwrap().unwrap();
        let second = reveal_milestone(&service, &main).await.unwrap().unwrap();
        assert_eq!(first.question_id, second.question_id);
        assert_eq!(QuestionId::from("b"), first.question_id);
    }

    #[tokio::test]
    async fn missing_milestone_record_propagates_the_fetch_error() {
        let service = FakeService::with(Vec::new());
        let main = cache_question("main", "100:gone", 150);

        let result = reveal_milestone(&service, &main).await;
        assert!(matches!(result, Err(Error::RequestFailed { .. })));
    }
}
