//! Creation of milestone chains.
//!
//! A main question may own a set of milestone questions, each revealed once
//! the main question's participant count reaches its threshold. The service
//! stores the chain as one record per question: every milestone points at
//! the next-lower one through its follow-up field, the main record points at
//! the lowest, and the main record's milestone schedule maps thresholds to
//! the created ids.

use std::collections::HashSet;

use log::info;

use crate::api::QuestionService;
use crate::error::{Error, Result};
use crate::model::{GroupId, MilestoneRef, MilestoneSchedule, NewQuestion, QuestionId};

/// Author-supplied fields for the main question.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub text: String,
    pub first_choice: String,
    pub second_choice: String,
}

/// Author-supplied fields for one milestone question.
#[derive(Debug, Clone)]
pub struct MilestoneDraft {
    /// Participant count at which this milestone is revealed.
    pub threshold: u32,
    pub text: String,
    pub first_choice: String,
    pub second_choice: String,
}

/// Everything a successful chain build created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedChain {
    pub main: QuestionId,
    /// Thresholds and created ids, ascending; stored on the main record.
    pub schedule: MilestoneSchedule,
    /// The lowest-threshold milestone, entry point of the chain.
    pub follow_up: Option<QuestionId>,
    pub group: Option<GroupId>,
}

/// Create a main question and its milestone chain.
///
/// Milestones are created from the highest threshold down so that each
/// record can name the one below it as its follow-up; the main record is
/// created last, once every id it references exists. The walk is inherently
/// sequential: each creation needs the id returned by the previous one.
///
/// A creation failure part-way through aborts the walk and leaves the
/// records created so far in place; there is no rollback.
pub async fn build_chain<S>(
    service: &S,
    main: QuestionDraft,
    mut milestones: Vec<MilestoneDraft>,
) -> Result<CreatedChain>
where
    S: QuestionService + ?Sized,
{
    validate(&main, &milestones)?;

    if milestones.is_empty() {
        let id = service
            .create_question(&NewQuestion {
                text: main.text,
                first_choice: main.first_choice,
                second_choice: main.second_choice,
                milestones: MilestoneSchedule::default(),
                follow_ups: None,
                group_id: None,
            })
            .await?;
        info!("created standalone question {id}");
        return Ok(CreatedChain {
            main: id,
            schedule: MilestoneSchedule::default(),
            follow_up: None,
            group: None,
        });
    }

    milestones.sort_by_key(|draft| draft.threshold);
    let group = GroupId::random();

    // Highest threshold first; each new record points at the one created
    // just before it.
    let mut next: Option<QuestionId> = None;
    let mut created = Vec::with_capacity(milestones.len());
    for draft in milestones.iter().rev() {
        let id = service
            .create_question(&NewQuestion {
                text: draft.text.clone(),
                first_choice: draft.first_choice.clone(),
                second_choice: draft.second_choice.clone(),
                milestones: MilestoneSchedule::default(),
                follow_ups: next.clone(),
                group_id: Some(group.clone()),
            })
            .await?;
        next = Some(id.clone());
        created.push(id);
    }
    // Back to ascending threshold order, matching `milestones`.
    created.reverse();

    let schedule = MilestoneSchedule::new(
        milestones
            .iter()
            .zip(&created)
            .map(|(draft, id)| MilestoneRef {
                threshold: draft.threshold,
                question: id.clone(),
            })
            .collect(),
    );

    // `next` now holds the lowest-threshold milestone.
    let follow_up = next;
    let main_id = service
        .create_question(&NewQuestion {
            text: main.text,
            first_choice: main.first_choice,
            second_choice: main.second_choice,
            milestones: schedule.clone(),
            follow_ups: follow_up.clone(),
            group_id: Some(group.clone()),
        })
        .await?;

    info!(
        "created question {main_id} with {} chained milestone(s)",
        created.len()
    );
    Ok(CreatedChain {
        main: main_id,
        schedule,
        follow_up,
        group: Some(group),
    })
}

/// Reject incomplete or ambiguous drafts before any record is created, so a
/// validation failure can never leave a partial chain behind.
fn validate(main: &QuestionDraft, milestones: &[MilestoneDraft]) -> Result<()> {
    if main.text.trim().is_empty()
        || main.first_choice.trim().is_empty()
        || main.second_choice.trim().is_empty()
    {
        return Err(Error::Validation(
            "the main question needs text and both choice labels".to_string(),
        ));
    }
    let mut thresholds = HashSet::new();
    for draft in milestones {
        if draft.threshold == 0 {
            return Err(Error::Validation(
                "every milestone needs a threshold of at least 1".to_string(),
            ));
        }
        if draft.text.trim().is_empty()
            || draft.first_choice.trim().is_empty()
            || draft.second_choice.trim().is_empty()
        {
            return Err(Error::Validation(
                "a milestone question is missing its text or choice labels".to_string(),
            ));
        }
        if !thresholds.insert(draft.threshold) {
            return Err(Error::Validation(format!(
                "duplicate milestone threshold {}",
                draft.threshold
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::model::Question;

    use super::*;

    /// In-memory stand-in for the service, recording every creation in
    /// order and assigning sequential ids.
    #[derive(Default)]
    struct FakeService {
        created: Mutex<Vec<NewQuestion>>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl QuestionService for FakeService {
        async fn create_question(&self, question: &NewQuestion) -> Result<QuestionId> {
            let mut created = self.created.lock().unwrap();
            if let Some(limit) = self.fail_after {
                if created.len() >= limit {
                    return Err(Error::RequestFailed {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: "cache write failed".to_string(),
                    });
                }
            }
            created.push(question.clone());
            Ok(QuestionId::from(format!("q{}", created.len())))
        }

        async fn question(&self, _id: &QuestionId) -> Result<Question> {
            unreachable!("chain creation never fetches")
        }
    }

    fn main_draft() -> QuestionDraft {
        QuestionDraft {
            text: "Cats or Dogs?".to_string(),
            first_choice: "Cats".to_string(),
            second_choice: "Dogs".to_string(),
        }
    }

    fn milestone_draft(threshold: u32) -> MilestoneDraft {
        MilestoneDraft {
            threshold,
            text: format!("Milestone at {threshold}?"),
            first_choice: "Yes".to_string(),
            second_choice: "No".to_string(),
        }
    }

    #[tokio::test]
    async fn chains_milestones_descending_and_main_last() {
        let service = FakeService::default();
        let drafts = vec![
            milestone_draft(100),
            milestone_draft(50),
            milestone_draft(150),
        ];

        let chain = build_chain(&service, main_draft(), drafts).await.unwrap();
        let created = service.created.lock().unwrap();

        // Three milestones plus the main record.
        assert_eq!(4, created.len());

        // Creation order is 150, 100, 50; each record points at the one
        // created before it.
        assert_eq!("Milestone at 150?", created[0].text);
        assert_eq!(None, created[0].follow_ups);
        assert_eq!("Milestone at 100?", created[1].text);
        assert_eq!(Some(QuestionId::from("q1")), created[1].follow_ups);
        assert_eq!("Milestone at 50?", created[2].text);
        assert_eq!(Some(QuestionId::from("q2")), created[2].follow_ups);

        // The main record carries the ascending schedule and enters the
        // chain at the lowest milestone.
        assert_eq!("Cats or Dogs?", created[3].text);
        assert_eq!("50:q3,100:q2,150:q1", created[3].milestones.to_string());
        assert_eq!(Some(QuestionId::from("q3")), created[3].follow_ups);

        // One shared group id across every record.
        let group = created[0].group_id.clone().unwrap();
        assert!(created.iter().all(|q| q.group_id.as_ref() == Some(&group)));

        assert_eq!(QuestionId::from("q4"), chain.main);
        assert_eq!(Some(QuestionId::from("q3")), chain.follow_up);
        assert_eq!(Some(group), chain.group);
        assert_eq!("50:q3,100:q2,150:q1", chain.schedule.to_string());
    }

    #[tokio::test]
    async fn no_milestones_is_a_single_creation() {
        let service = FakeService::default();

        let chain = build_chain(&service, main_draft(), Vec::new())
            .await
            .unwrap();
        let created = service.created.lock().unwrap();

        assert_eq!(1, created.len());
        assert!(created[0].milestones.is_empty());
        assert_eq!(None, created[0].follow_ups);
        assert_eq!(None, created[0].group_id);

        assert_eq!(QuestionId::from("q1"), chain.main);
        assert!(chain.schedule.is_empty());
        assert_eq!(None, chain.follow_up);
        assert_eq!(None, chain.group);
    }

    #[tokio::test]
    async fn incomplete_draft_aborts_before_any_creation() {
        let service = FakeService::default();
        let mut incomplete = milestone_draft(100);
        incomplete.first_choice.clear();

        let result = build_chain(&service, main_draft(), vec![incomplete]).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_threshold_is_rejected() {
        let service = FakeService::default();

        let result = build_chain(&service, main_draft(), vec![milestone_draft(0)]).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_thresholds_are_rejected() {
        let service = FakeService::default();
        let drafts = vec![milestone_draft(100), milestone_draft(100)];

        let result = build_chain(&service, main_draft(), drafts).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn creation_failure_aborts_without_rollback() {
        let service = FakeService {
            fail_after: Some(1),
            ..FakeService::default()
        };
        let drafts = vec![milestone_draft(50), milestone_draft(100)];

        let result = build_chain(&service, main_draft(), drafts).await;

        assert!(matches!(result, Err(Error::RequestFailed { .. })));
        // The highest-threshold milestone was already created and stays.
        let created = service.created.lock().unwrap();
        assert_eq!(1, created.len());
        assert_eq!("Milestone at 100?", created[0].text);
    }
}
