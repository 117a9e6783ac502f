#![forbid(unsafe_code)]

//! Core domain model and business logic for Math Quest.
//!
//! This crate provides:
//! - Domain types (topics, problems, sessions, progress records)
//! - Topic catalog
//! - Problem generators and answer validators
//! - The session state machine
//! - Persistence (key-value store, progress store, profile, export/import)
//! - Progress aggregation (best scores, streak indicator)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod clock;
pub mod random;
pub mod fraction;
pub mod generator;
pub mod validator;
pub mod session;
pub mod storage;
pub mod progress;
pub mod history;
pub mod profile;
pub mod transfer;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{find_topic, get_default_catalog, topics_for_level};
pub use config::Config;
pub use clock::{Clock, FixedClock, SystemClock};
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use generator::{generate, generate_for};
pub use validator::validate;
pub use session::{NextStep, Session, SessionSink, SessionState, SubmitOutcome};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use progress::ProgressStore;
pub use history::{best_scores_by_topic, streak_indicator, TopicKey, TopicStats};
pub use profile::Profile;
pub use transfer::{ExportDocument, ImportOutcome};
pub use engine::PracticeEngine;
