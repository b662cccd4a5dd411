use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::warn;
use serde::{
    de::{Deserializer, Visitor},
    Deserialize, Serialize, Serializer,
};
use thiserror::Error;

use crate::model::QuestionId;

/// One entry in a main question's milestone schedule: the question to reveal
/// once the participant count reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneRef {
    pub threshold: u32,
    pub question: QuestionId,
}

/// The milestone schedule of a main question, ascending by threshold.
///
/// The service stores this as a `"threshold:id"` comma list; the string form
/// only exists at the wire boundary. [`FromStr`] parses strictly and
/// [`Display`] re-serializes, so a schedule round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneSchedule(Vec<MilestoneRef>);

impl MilestoneSchedule {
    pub fn new(entries: Vec<MilestoneRef>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MilestoneRef> {
        self.0.iter()
    }

    /// The single milestone to surface for the given participant count: the
    /// one with the largest threshold not exceeding it. Equal thresholds are
    /// not produced by chain creation, but if present the first in schedule
    /// order wins.
    pub fn reveal_at(&self, participants: u32) -> Option<&MilestoneRef> {
        let mut best: Option<&MilestoneRef> = None;
        for entry in &self.0 {
            if entry.threshold <= participants
                && best.map_or(true, |found| entry.threshold > found.threshold)
            {
                best = Some(entry);
            }
        }
        best
    }
}

impl Display for MilestoneSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .0
            .iter()
            .map(|entry| format!("{}:{}", entry.threshold, entry.question))
            .collect::<Vec<_>>();
        write!(f, "{}", entries.join(","))
    }
}

impl FromStr for MilestoneSchedule {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let trimmed = string.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut entries = Vec::new();
        for part in trimmed.split(',') {
            let (threshold, id) = part
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedEntry(part.to_string()))?;
            let threshold = threshold
                .trim()
                .parse::<u32>()
                .map_err(|_| ParseError::InvalidThreshold(threshold.trim().to_string()))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(ParseError::EmptyQuestionId(part.to_string()));
            }
            entries.push(MilestoneRef {
                threshold,
                question: QuestionId::from(id),
            });
        }
        Ok(Self(entries))
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("milestone entry {0:?} is not of the form \"threshold:id\"")]
    MalformedEntry(String),
    #[error("milestone threshold {0:?} is not a non-negative integer")]
    InvalidThreshold(String),
    #[error("milestone entry {0:?} has an empty question id")]
    EmptyQuestionId(String),
}

impl Serialize for MilestoneSchedule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct ScheduleVisitor;

impl<'de> Visitor<'de> for ScheduleVisitor {
    type Value = MilestoneSchedule;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "a comma-separated list of threshold:id pairs")
    }

    /// A schedule the service hands us that fails to parse degrades to the
    /// empty schedule rather than failing the whole fetch; the question then
    /// simply never reveals a milestone.
    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match value.parse() {
            Ok(schedule) => Ok(schedule),
            Err(err) => {
                warn!("discarding unparsable milestone list {value:?}: {err}");
                Ok(MilestoneSchedule::default())
            }
        }
    }
}

impl<'de> Deserialize<'de> for MilestoneSchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ScheduleVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(raw: &str) -> MilestoneSchedule {
        raw.parse().unwrap()
    }

    #[test]
    fn round_trip_preserves_order() {
        let parsed = schedule("50:x,100:y,150:z");
        assert_eq!(3, parsed.len());
        assert_eq!("50:x,100:y,150:z", parsed.to_string());

        let reparsed: MilestoneSchedule = parsed.to_string().parse().unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn empty_string_is_empty_schedule() {
        assert!(schedule("").is_empty());
        assert!(schedule("   ").is_empty());
        assert_eq!("", MilestoneSchedule::default().to_string());
    }

    #[test]
    fn strict_parse_rejects_malformed_entries() {
        assert!(matches!(
            "100".parse::<MilestoneSchedule>(),
            Err(ParseError::MalformedEntry(_))
        ));
        assert!(matches!(
            "abc:q1".parse::<MilestoneSchedule>(),
            Err(ParseError::InvalidThreshold(_))
        ));
        assert!(matches!(
            "100:".parse::<MilestoneSchedule>(),
            Err(ParseError::EmptyQuestionId(_))
        ));
    }

    #[test]
    fn reveal_picks_largest_reached_threshold() {
        let parsed = schedule("100:a,200:b");
        assert_eq!(None, parsed.reveal_at(99));
        assert_eq!("a", parsed.reveal_at(100).unwrap().question.as_str());
        assert_eq!("a", parsed.reveal_at(150).unwrap().question.as_str());
        assert_eq!("b", parsed.reveal_at(200).unwrap().question.as_str());
        assert_eq!("b", parsed.reveal_at(100_000).unwrap().question.as_str());
    }

    #[test]
    fn reveal_on_empty_schedule_is_none() {
        assert_eq!(None, MilestoneSchedule::default().reveal_at(1_000));
    }

    #[test]
    fn reveal_tie_break_is_first_in_schedule_order() {
        let parsed = schedule("100:first,100:second");
        assert_eq!("first", parsed.reveal_at(250).unwrap().question.as_str());
    }

    #[test]
    fn lenient_deserialize_degrades_to_empty() {
        let parsed: MilestoneSchedule = serde_json::from_str("\"not-a-schedule\"").unwrap();
        assert!(parsed.is_empty());

        let parsed: MilestoneSchedule = serde_json::from_str("\"100:a,200:b\"").unwrap();
        assert_eq!(2, parsed.len());
    }
}
