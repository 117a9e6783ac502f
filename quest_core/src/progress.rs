//! Progress store: the append-only log of finished sessions.
//!
//! The whole [`ProgressRecord`] lives under a single key and every append is a
//! full read-modify-write of it. The last writer wins.

use crate::clock::{Clock, SystemClock};
use crate::history::{self, TopicKey, TopicStats};
use crate::session::SessionSink;
use crate::storage::KeyValueStore;
use crate::types::{ProgressRecord, SessionSummary};
use crate::Result;
use std::collections::BTreeMap;

/// Store key holding the serialized progress record
pub const PROGRESS_KEY: &str = "progress";

/// Session history backed by a key-value store
pub struct ProgressStore<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> ProgressStore<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Load the record
    ///
    /// A missing record is empty. An unparsable record is logged and treated
    /// as empty; it is overwritten by the next append.
    pub fn load(&self) -> ProgressRecord {
        let Some(raw) = self.store.get(PROGRESS_KEY) else {
            tracing::debug!("No progress record found, using empty record");
            return ProgressRecord::default();
        };

        match serde_json::from_str::<ProgressRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to parse progress record: {}. Using empty record.", e);
                ProgressRecord::default()
            }
        }
    }

    /// Replace the whole record
    pub fn replace(&mut self, record: &ProgressRecord) -> Result<()> {
        // Use compact JSON, the record is rewritten on every append
        let contents = serde_json::to_string(record)?;
        self.store.set(PROGRESS_KEY, &contents)?;
        tracing::debug!("Saved progress record ({} sessions)", record.sessions.len());
        Ok(())
    }

    /// Load the record, modify it, and save it back
    pub fn update<F>(&mut self, f: F) -> Result<ProgressRecord>
    where
        F: FnOnce(&mut ProgressRecord),
    {
        let mut record = self.load();
        f(&mut record);
        self.replace(&record)?;
        Ok(record)
    }

    /// Append a finished session and mark today as practiced
    pub fn append(&mut self, summary: &SessionSummary) -> Result<()> {
        let today = self.clock.today();
        let record = self.update(|record| {
            record.sessions.push(summary.clone());
            record.last_practice_date = Some(today);
        })?;
        tracing::info!(
            "Appended session {} to progress ({} total)",
            summary.id,
            record.sessions.len()
        );
        Ok(())
    }

    /// All sessions in the order they were appended
    pub fn list(&self) -> Vec<SessionSummary> {
        self.load().sessions
    }

    /// Most recent session matching `predicate`
    pub fn last_of_category<P>(&self, predicate: P) -> Option<SessionSummary>
    where
        P: Fn(&SessionSummary) -> bool,
    {
        self.load().sessions.into_iter().rev().find(|s| predicate(s))
    }

    /// Most recent session from the advanced practice log
    pub fn last_advanced_session(&self) -> Option<SessionSummary> {
        self.last_of_category(SessionSummary::is_advanced)
    }

    /// Best score per `(level, topic)` as of the clock's today
    pub fn best_scores_by_topic(&self) -> BTreeMap<TopicKey, TopicStats> {
        let record = self.load();
        history::best_scores_by_topic(
            &record.sessions,
            record.last_practice_date,
            self.clock.today(),
        )
    }

    /// Two-state "practiced today or yesterday" flag
    pub fn streak(&self) -> u8 {
        history::streak_indicator(self.load().last_practice_date, self.clock.today())
    }

    /// Forget all progress
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(PROGRESS_KEY)?;
        tracing::info!("Progress reset");
        Ok(())
    }
}

impl<S: KeyValueStore, C: Clock> SessionSink for ProgressStore<S, C> {
    fn append(&mut self, summary: &SessionSummary) -> Result<()> {
        ProgressStore::append(self, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{FileStore, MemoryStore};
    use crate::types::{Level, ADVANCED_CATEGORY};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn summary(topic: &str, level: Option<Level>, score: u8, at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            mode: format!("Advanced - {}", topic),
            topic: topic.into(),
            topic_id: None,
            level,
            correct: u32::from(score) / 10,
            total: 10,
            score_pct: score,
            timestamp: at,
            category: ADVANCED_CATEGORY.into(),
        }
    }

    #[test]
    fn test_load_empty_store() {
        let progress = ProgressStore::new(MemoryStore::new());
        let record = progress.load();
        assert!(record.sessions.is_empty());
        assert_eq!(record.last_practice_date, None);
    }

    #[test]
    fn test_append_sets_last_practice_date() {
        let clock = FixedClock::at(noon(2024, 5, 1));
        let mut progress = ProgressStore::with_clock(MemoryStore::new(), clock);

        progress
            .append(&summary("Fractions", Some(Level::Introductory), 80, noon(2024, 5, 1)))
            .unwrap();
        progress
            .append(&summary("Algebra", Some(Level::Advanced), 60, noon(2024, 5, 1)))
            .unwrap();

        let record = progress.load();
        assert_eq!(record.sessions.len(), 2);
        assert_eq!(record.sessions[1].topic, "Algebra");
        assert_eq!(
            record.last_practice_date,
            Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert_eq!(progress.streak(), 1);
    }

    #[test]
    fn test_corrupted_record_recovers_to_empty() {
        crate::logging::init_test();
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, "{ invalid json }").unwrap();

        let mut progress = ProgressStore::with_clock(store, FixedClock::at(noon(2024, 5, 1)));
        assert!(progress.list().is_empty());

        // The next append replaces the corrupt record
        progress
            .append(&summary("Integers", None, 50, noon(2024, 5, 1)))
            .unwrap();
        assert_eq!(progress.list().len(), 1);
    }

    #[test]
    fn test_last_of_category_returns_most_recent() {
        let mut progress = ProgressStore::with_clock(MemoryStore::new(), FixedClock::at(noon(2024, 5, 3)));
        let first = summary("Fractions", Some(Level::Introductory), 40, noon(2024, 5, 1));
        let mut other = summary("Warmup", None, 90, noon(2024, 5, 2));
        other.category = "daily".into();
        let last = summary("Fractions", Some(Level::Introductory), 70, noon(2024, 5, 3));

        for s in [&first, &other, &last] {
            progress.append(s).unwrap();
        }

        let found = progress.last_of_category(|s| s.topic == "Fractions").unwrap();
        assert_eq!(found.id, last.id);
        assert_eq!(progress.last_advanced_session().unwrap().id, last.id);
        assert!(progress.last_of_category(|s| s.topic == "Geometry").is_none());
    }

    #[test]
    fn test_reset_clears_history() {
        let mut progress = ProgressStore::new(MemoryStore::new());
        progress
            .append(&summary("Integers", None, 50, Utc::now()))
            .unwrap();
        progress.reset().unwrap();
        assert_eq!(progress.load(), ProgressRecord::default());
    }

    #[test]
    fn test_streak_lapses_after_two_days() {
        let mut store = MemoryStore::new();
        ProgressStore::with_clock(&mut store, FixedClock::at(noon(2024, 5, 1)))
            .append(&summary("Integers", None, 50, noon(2024, 5, 1)))
            .unwrap();

        let later = noon(2024, 5, 1) + Duration::days(3);
        let progress = ProgressStore::with_clock(&mut store, FixedClock::at(later));
        assert_eq!(progress.streak(), 0);
    }

    #[test]
    fn test_file_backed_progress_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(noon(2024, 6, 1));

        {
            let mut progress = ProgressStore::with_clock(FileStore::new(temp_dir.path()), clock);
            progress
                .append(&summary("Algebra", Some(Level::Advanced), 90, noon(2024, 6, 1)))
                .unwrap();
        }

        let progress = ProgressStore::with_clock(FileStore::new(temp_dir.path()), clock);
        let sessions = progress.list();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].score_pct, 90);
        assert_eq!(sessions[0].level, Some(Level::Advanced));
    }

    #[test]
    fn test_reads_legacy_record_shape() {
        let mut store = MemoryStore::new();
        store
            .set(
                PROGRESS_KEY,
                r#"{"sessions":[{"mode":"Advanced - Integers","topic":"Integers","level":"middle",
                    "correct":7,"total":10,"scorePct":70,"timestamp":"2024-04-01T10:00:00.000Z",
                    "category":"advanced"},
                   {"topic":"Speed round","level":"elementary","correct":3,"total":10,
                    "scorePct":30,"timestamp":"2024-04-02T10:00:00Z"}],
                   "lastPracticeDate":"2024-04-02"}"#,
            )
            .unwrap();

        let record = ProgressStore::new(store).load();
        assert_eq!(record.sessions.len(), 2);
        assert_eq!(record.sessions[0].level, Some(Level::Introductory));
        assert_eq!(record.sessions[1].level, None);
        assert!(!record.sessions[1].is_advanced());
        assert_eq!(
            record.last_practice_date,
            Some(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
        );
    }

    #[test]
    fn test_foreign_session_entries_do_not_discard_history() {
        crate::logging::init_test();
        let mut store = MemoryStore::new();
        store
            .set(
                PROGRESS_KEY,
                r#"{"sessions":[{"topic":"Integers","level":"advanced","correct":8,"total":10,
                    "scorePct":80,"timestamp":"2024-04-01T10:00:00Z","category":"advanced"},
                   {"mode":"Daily Mix","timestamp":"2024-04-02T10:00:00Z","category":"advanced"},
                   {"mode":"No timestamp","scorePct":50},
                   42],
                   "lastPracticeDate":"2024-04-02"}"#,
            )
            .unwrap();

        let mut progress = ProgressStore::with_clock(store, FixedClock::at(noon(2024, 4, 3)));
        let sessions = progress.list();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].topic, "Daily Mix");
        assert_eq!(sessions[1].score_pct, 0);
        assert_eq!(sessions[1].total, 0);

        let best = progress.best_scores_by_topic();
        assert!(best.contains_key(&TopicKey {
            level: Level::Advanced,
            topic: "Daily Mix".into(),
        }));

        // Appending keeps the readable entries
        progress
            .append(&summary("Algebra", Some(Level::Advanced), 70, noon(2024, 4, 3)))
            .unwrap();
        let topics: Vec<String> = progress.list().into_iter().map(|s| s.topic).collect();
        assert_eq!(topics, vec!["Integers", "Daily Mix", "Algebra"]);
    }

    #[test]
    fn test_non_array_session_list_reads_empty() {
        let mut store = MemoryStore::new();
        store
            .set(PROGRESS_KEY, r#"{"sessions":"nope","lastPracticeDate":"2024-04-02"}"#)
            .unwrap();

        let record = ProgressStore::new(store).load();
        assert!(record.sessions.is_empty());
        assert_eq!(
            record.last_practice_date,
            Some(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
        );
    }
}
