//! Wire-facing data types.
//!
//! Everything here mirrors the service's JSON shapes, with the string-coded
//! fields (the milestone list, optional ids) lifted into proper types at the
//! boundary so the rest of the crate never handles raw delimited strings.

pub use archive::ArchivedQuestion;
pub use auth::{Credentials, Profile, RegisteredUser, TokenResponse};
pub use id::{GroupId, QuestionId};
pub use milestone::{MilestoneRef, MilestoneSchedule, ParseError};
pub use question::{NewQuestion, Question, QuestionKind};
pub use vote::{VoteOutcome, VoteReceipt, VoteRequest};

mod archive;
mod auth;
mod id;
mod milestone;
mod question;
mod vote;
