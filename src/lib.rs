//! Client library for the Poll Voting service.
//!
//! The service keeps binary-choice questions in a daily cache. A question
//! may own a chain of milestone questions that unlock as its participant
//! count crosses their thresholds. This crate speaks the service's JSON API,
//! keeps the session's bearer token fresh across requests, builds milestone
//! chains, and resolves which milestone a question should currently surface.

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod model;
pub mod reveal;

pub use api::{ApiClient, QuestionService, Session};
pub use chain::{build_chain, CreatedChain, MilestoneDraft, QuestionDraft};
pub use config::Config;
pub use error::{Error, Result};
pub use reveal::reveal_milestone;
