//! Core domain types for Math Quest.
//!
//! This module defines the fundamental types used throughout the system:
//! - Difficulty levels and answer domains
//! - Topic definitions and the catalog
//! - Problems and attempts
//! - Persisted session summaries and the progress record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Levels and Domains
// ============================================================================

/// Difficulty tier. Scales the numeric ranges used by generators.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[serde(alias = "middle")]
    Introductory,
    #[serde(alias = "high")]
    Advanced,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::Introductory, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Introductory => "introductory",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "introductory" | "intro" | "middle" => Ok(Level::Introductory),
            "advanced" | "adv" | "high" => Ok(Level::Advanced),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown level '{}'",
                other
            ))),
        }
    }
}

/// How answers to a topic are compared against the canonical answer
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnswerDomain {
    Numeric,
    Fraction,
}

/// Which problem generator backs a topic
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Signed integer arithmetic with exact division
    Integer,
    /// Fraction arithmetic with reduced results
    Fraction,
    /// One-step linear equations `ax + b = c`
    Linear,
}

impl GeneratorKind {
    /// Answer domain produced by this generator
    pub fn answer_domain(&self) -> AnswerDomain {
        match self {
            GeneratorKind::Fraction => AnswerDomain::Fraction,
            GeneratorKind::Integer | GeneratorKind::Linear => AnswerDomain::Numeric,
        }
    }
}

/// Operand bound per level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelScaling {
    pub introductory: i64,
    pub advanced: i64,
}

impl LevelScaling {
    pub fn bound(&self, level: Level) -> i64 {
        match level {
            Level::Introductory => self.introductory,
            Level::Advanced => self.advanced,
        }
    }
}

// ============================================================================
// Topics
// ============================================================================

/// A practice topic, defined once at configuration time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopicDefinition {
    pub id: String,
    pub title: String,
    /// Tier the topic is listed under
    pub level: Level,
    pub answer_domain: AnswerDomain,
    pub generator: GeneratorKind,
    pub level_scaling: LevelScaling,
}

/// The complete set of practice topics
#[derive(Clone, Debug)]
pub struct Catalog {
    pub topics: Vec<TopicDefinition>,
}

// ============================================================================
// Problems and Attempts
// ============================================================================

/// One generated question
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    pub statement: String,
    /// Integer string ("12") or reduced fraction string ("5/6")
    pub canonical_answer: String,
    pub answer_domain: AnswerDomain,
}

/// One answered problem
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attempt {
    pub statement: String,
    pub canonical_answer: String,
    pub submitted: String,
    pub was_correct: bool,
}

// ============================================================================
// Persisted Records
// ============================================================================

/// Category tag stamped on every summary this engine produces
pub const ADVANCED_CATEGORY: &str = "advanced";

/// Read-only projection of a finished session, as persisted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub mode: String,
    /// Topic title; records written without one use `mode` instead
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: Option<Level>,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub score_pct: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
}

impl SessionSummary {
    /// Whether this summary belongs to the advanced practice log
    pub fn is_advanced(&self) -> bool {
        self.category.starts_with(ADVANCED_CATEGORY) || self.level.is_some()
    }
}

/// Unknown level tags in stored records read as "no level" instead of failing
/// the whole record.
fn lenient_level<'de, D>(deserializer: D) -> std::result::Result<Option<Level>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Read the session list one entry at a time
///
/// An entry that still cannot be read (no timestamp, wrong types) is logged
/// and skipped so the rest of the history survives.
fn lenient_sessions<'de, D>(deserializer: D) -> std::result::Result<Vec<SessionSummary>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!("Ignoring session list that is not an array: {}", other);
            return Ok(Vec::new());
        }
    };

    let sessions = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<SessionSummary>(entry) {
            Ok(mut summary) => {
                if summary.topic.is_empty() {
                    summary.topic = summary.mode.clone();
                }
                Some(summary)
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable session entry {}: {}", i, e);
                None
            }
        })
        .collect();
    Ok(sessions)
}

/// Full persisted history plus the last practice date
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default, deserialize_with = "lenient_sessions")]
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub last_practice_date: Option<NaiveDate>,
}
