//! Session state machine.
//!
//! A session moves `Idle -> InProgress -> Completed` and never back. Each
//! transition returns what the caller needs to show next, so a display
//! adapter only translates user input into `start` / `submit` calls and
//! renders the result.
//!
//! Misuse (submitting to a finished session, starting twice) is a
//! caller-contract violation and surfaces as [`Error::InvalidTransition`].

use crate::generator::generate_for;
use crate::random::RandomSource;
use crate::types::{
    Attempt, Level, Problem, SessionSummary, TopicDefinition, ADVANCED_CATEGORY,
};
use crate::validator::validate;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Receives the summary of each finished session
pub trait SessionSink {
    fn append(&mut self, summary: &SessionSummary) -> Result<()>;
}

impl<S: SessionSink + ?Sized> SessionSink for &mut S {
    fn append(&mut self, summary: &SessionSummary) -> Result<()> {
        (**self).append(summary)
    }
}

/// Lifecycle of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::InProgress => "in progress",
            SessionState::Completed => "completed",
        })
    }
}

/// What comes after an answer
#[derive(Clone, Debug, PartialEq)]
pub enum NextStep {
    /// The next question to show
    Problem(Problem),
    /// The session is over and this summary was recorded
    Completed(SessionSummary),
}

/// Result of one `submit`
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitOutcome {
    pub was_correct: bool,
    /// Canonical answer of the problem just answered
    pub expected: String,
    pub next: NextStep,
}

/// `round(correct / total * 100)`, rounding halves up
pub fn score_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    // floor(x + 0.5) in integer arithmetic
    ((correct * 200 + total) / (2 * total)) as u8
}

/// One run of N problems for a single topic and level
#[derive(Clone, Debug)]
pub struct Session {
    id: Uuid,
    topic: Option<TopicDefinition>,
    level: Level,
    total_count: u32,
    current_index: u32,
    correct_count: u32,
    attempts: Vec<Attempt>,
    current_problem: Option<Problem>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    score_percent: Option<u8>,
    state: SessionState,
    recorded: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session in the `Idle` state
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: None,
            level: Level::Introductory,
            total_count: 0,
            current_index: 0,
            correct_count: 0,
            attempts: Vec::new(),
            current_problem: None,
            started_at: None,
            ended_at: None,
            score_percent: None,
            state: SessionState::Idle,
            recorded: false,
        }
    }

    /// Begin the session and generate the first problem
    ///
    /// Valid only from `Idle`. `total_count` must be positive.
    pub fn start(
        &mut self,
        topic: &TopicDefinition,
        level: Level,
        total_count: u32,
        rng: &mut impl RandomSource,
        now: DateTime<Utc>,
    ) -> Result<&Problem> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        if total_count == 0 {
            return Err(Error::InvalidArgument(
                "a session needs at least one question".into(),
            ));
        }

        let problem = generate_for(topic, level, rng);
        self.topic = Some(topic.clone());
        self.level = level;
        self.total_count = total_count;
        self.current_index = 1;
        self.started_at = Some(now);
        self.state = SessionState::InProgress;

        tracing::debug!(
            "Started session {} on '{}' ({}, {} questions)",
            self.id,
            topic.id,
            level,
            total_count
        );

        Ok(&*self.current_problem.insert(problem))
    }

    /// Answer the current problem
    ///
    /// Records an attempt, then either generates the next problem or, on the
    /// last question, completes the session and hands its summary to `sink`.
    pub fn submit(
        &mut self,
        raw_answer: &str,
        rng: &mut impl RandomSource,
        sink: &mut impl SessionSink,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        if self.state != SessionState::InProgress {
            return Err(Error::InvalidTransition {
                action: "submit to",
                state: self.state,
            });
        }
        let (problem, topic) = match (self.current_problem.take(), self.topic.as_ref()) {
            (Some(problem), Some(topic)) => (problem, topic),
            _ => {
                return Err(Error::Other(
                    "session in progress without a current problem".into(),
                ))
            }
        };

        let was_correct = validate(problem.answer_domain, raw_answer, &problem.canonical_answer);
        if was_correct {
            self.correct_count += 1;
        }
        let expected = problem.canonical_answer.clone();
        self.attempts.push(Attempt {
            statement: problem.statement,
            canonical_answer: problem.canonical_answer,
            submitted: raw_answer.trim().to_string(),
            was_correct,
        });

        let next = if self.current_index >= self.total_count {
            self.state = SessionState::Completed;
            NextStep::Completed(self.record(sink, now)?)
        } else {
            let next_problem = generate_for(topic, self.level, rng);
            self.current_index += 1;
            self.current_problem = Some(next_problem.clone());
            NextStep::Problem(next_problem)
        };

        Ok(SubmitOutcome {
            was_correct,
            expected,
            next,
        })
    }

    /// Record the finished session with `sink`
    ///
    /// Valid only once the session is `Completed`. Returns `None` when the
    /// summary was already recorded, so calling this twice never appends
    /// twice. If the sink fails the session stays unrecorded and `finish` can
    /// be retried.
    pub fn finish(
        &mut self,
        sink: &mut impl SessionSink,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionSummary>> {
        if self.state != SessionState::Completed {
            return Err(Error::InvalidTransition {
                action: "finish",
                state: self.state,
            });
        }
        if self.recorded {
            tracing::debug!("Session {} already recorded", self.id);
            return Ok(None);
        }
        self.record(sink, now).map(Some)
    }

    fn record(
        &mut self,
        sink: &mut impl SessionSink,
        now: DateTime<Utc>,
    ) -> Result<SessionSummary> {
        let ended_at = *self.ended_at.get_or_insert(now);
        let (correct, total) = (self.correct_count, self.total_count);
        let score = *self
            .score_percent
            .get_or_insert_with(|| score_percent(correct, total));
        let topic = self
            .topic
            .as_ref()
            .ok_or_else(|| Error::Other("completed session has no topic".into()))?;

        let summary = SessionSummary {
            id: self.id,
            mode: format!("Advanced - {}", topic.title),
            topic: topic.title.clone(),
            topic_id: Some(topic.id.clone()),
            level: Some(self.level),
            correct,
            total,
            score_pct: score,
            timestamp: ended_at,
            category: ADVANCED_CATEGORY.into(),
        };

        sink.append(&summary)?;
        self.recorded = true;

        tracing::info!(
            "Recorded session {}: {}/{} ({}%) on '{}'",
            self.id,
            correct,
            total,
            score,
            topic.id
        );
        Ok(summary)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topic(&self) -> Option<&TopicDefinition> {
        self.topic.as_ref()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// 1-based index of the question being shown
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.current_problem.as_ref()
    }

    /// Answered problems in order, for the end-of-session review
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Set once the session completes
    pub fn score_percent(&self) -> Option<u8> {
        self.score_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_topic;
    use crate::random::{RngSource, ScriptedSource};
    use chrono::TimeZone;

    #[derive(Default)]
    struct RecordingSink {
        summaries: Vec<SessionSummary>,
    }

    impl SessionSink for RecordingSink {
        fn append(&mut self, summary: &SessionSummary) -> Result<()> {
            self.summaries.push(summary.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl SessionSink for FailingSink {
        fn append(&mut self, _summary: &SessionSummary) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    /// Draws for `1/2 + 1/3`, repeated per question
    fn half_plus_third(questions: usize) -> ScriptedSource {
        ScriptedSource::new([1, 2, 0, 1, 3].repeat(questions))
    }

    #[test]
    fn test_score_percent_rounding() {
        assert_eq!(score_percent(0, 10), 0);
        assert_eq!(score_percent(10, 10), 100);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(score_percent(1, 200), 1); // 0.5 rounds up
        assert_eq!(score_percent(0, 0), 0);
    }

    #[test]
    fn test_fraction_session_end_to_end() {
        let topic = find_topic("fractions").unwrap();
        let mut rng = half_plus_third(3);
        let mut sink = RecordingSink::default();
        let mut session = Session::new();

        let first = session
            .start(topic, Level::Introductory, 3, &mut rng, at(9))
            .unwrap();
        assert_eq!(first.statement, "1/2 + 1/3 = ?");
        assert_eq!(first.canonical_answer, "5/6");
        assert_eq!(session.current_index(), 1);

        let outcome = session.submit("5/6", &mut rng, &mut sink, at(9)).unwrap();
        assert!(outcome.was_correct);
        assert!(matches!(outcome.next, NextStep::Problem(_)));

        let outcome = session.submit("10/12", &mut rng, &mut sink, at(9)).unwrap();
        assert!(outcome.was_correct);
        assert_eq!(session.current_index(), 3);

        let outcome = session.submit("1/2", &mut rng, &mut sink, at(10)).unwrap();
        assert!(!outcome.was_correct);
        assert_eq!(outcome.expected, "5/6");

        let summary = match outcome.next {
            NextStep::Completed(summary) => summary,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.score_pct, 67);
        assert_eq!(summary.timestamp, at(10));
        assert_eq!(summary.level, Some(Level::Introductory));
        assert_eq!(summary.category, "advanced");
        assert_eq!(sink.summaries, vec![summary]);

        let review = session.attempts();
        assert_eq!(review.len(), 3);
        assert_eq!(review[1].submitted, "10/12");
        assert!(!review[2].was_correct);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let topic = find_topic("fractions").unwrap();
        let mut rng = half_plus_third(1);
        let mut sink = RecordingSink::default();
        let mut session = Session::new();

        session.start(topic, Level::Introductory, 1, &mut rng, at(9)).unwrap();
        session.submit("5/6", &mut rng, &mut sink, at(9)).unwrap();
        assert_eq!(sink.summaries.len(), 1);

        assert!(session.finish(&mut sink, at(11)).unwrap().is_none());
        assert!(session.finish(&mut sink, at(12)).unwrap().is_none());
        assert_eq!(sink.summaries.len(), 1);
        assert_eq!(session.ended_at(), Some(at(9)));
    }

    #[test]
    fn test_failed_append_can_be_retried() {
        let topic = find_topic("integers").unwrap();
        let mut rng = RngSource::seeded(3);
        let mut session = Session::new();

        session.start(topic, Level::Advanced, 1, &mut rng, at(9)).unwrap();
        let result = session.submit("nope", &mut rng, &mut FailingSink, at(9));
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.score_percent(), Some(0));

        let mut sink = RecordingSink::default();
        let summary = session.finish(&mut sink, at(10)).unwrap().unwrap();
        assert_eq!(summary.score_pct, 0);
        // endedAt was stamped on the first attempt and is not moved
        assert_eq!(summary.timestamp, at(9));
        assert_eq!(sink.summaries.len(), 1);
    }

    #[test]
    fn test_submit_requires_active_session() {
        let mut rng = RngSource::seeded(1);
        let mut sink = RecordingSink::default();

        let mut idle = Session::new();
        let err = idle.submit("1", &mut rng, &mut sink, at(9)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                state: SessionState::Idle,
                ..
            }
        ));

        let topic = find_topic("algebra").unwrap();
        let mut done = Session::new();
        done.start(topic, Level::Advanced, 1, &mut rng, at(9)).unwrap();
        done.submit("0", &mut rng, &mut sink, at(9)).unwrap();
        let err = done.submit("0", &mut rng, &mut sink, at(9)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                state: SessionState::Completed,
                ..
            }
        ));
        assert_eq!(sink.summaries.len(), 1);
    }

    #[test]
    fn test_start_contract() {
        let topic = find_topic("integers").unwrap();
        let mut rng = RngSource::seeded(1);

        let mut session = Session::new();
        assert!(matches!(
            session.start(topic, Level::Introductory, 0, &mut rng, at(9)),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(session.state(), SessionState::Idle);

        session.start(topic, Level::Introductory, 5, &mut rng, at(9)).unwrap();
        assert!(matches!(
            session.start(topic, Level::Introductory, 5, &mut rng, at(9)),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_finish_before_completion_is_rejected() {
        let topic = find_topic("integers").unwrap();
        let mut rng = RngSource::seeded(1);
        let mut sink = RecordingSink::default();
        let mut session = Session::new();
        session.start(topic, Level::Introductory, 2, &mut rng, at(9)).unwrap();

        assert!(matches!(
            session.finish(&mut sink, at(9)),
            Err(Error::InvalidTransition {
                state: SessionState::InProgress,
                ..
            })
        ));
        assert!(sink.summaries.is_empty());
    }

    #[test]
    fn test_score_matches_counts_for_random_sessions() {
        let topic = find_topic("integers").unwrap();
        let mut rng = RngSource::seeded(2024);
        let mut sink = RecordingSink::default();

        for total in [1u32, 3, 7, 10] {
            let mut session = Session::new();
            let mut problem = session
                .start(topic, Level::Introductory, total, &mut rng, at(9))
                .unwrap()
                .clone();
            for i in 0..total {
                // Answer every other question correctly
                let answer = if i % 2 == 0 {
                    problem.canonical_answer.clone()
                } else {
                    "wrong".to_string()
                };
                let outcome = session.submit(&answer, &mut rng, &mut sink, at(9)).unwrap();
                assert!(session.correct_count() <= session.current_index());
                assert!(session.current_index() <= session.total_count());
                if let NextStep::Problem(next) = outcome.next {
                    problem = next;
                }
            }
            let summary = sink.summaries.last().unwrap();
            assert!(summary.score_pct <= 100);
            assert_eq!(summary.score_pct, score_percent(summary.correct, summary.total));
            assert_eq!(summary.correct, (total + 1) / 2);
        }
        assert_eq!(sink.summaries.len(), 4);
    }
}
