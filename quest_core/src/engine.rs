//! Practice engine: one service object owning the store, random source and
//! clock, so callers never reach for globals.

use crate::catalog::{fallback_topic, find_topic};
use crate::clock::{Clock, SystemClock};
use crate::history::{TopicKey, TopicStats};
use crate::profile::Profile;
use crate::progress::ProgressStore;
use crate::random::{RandomSource, RngSource};
use crate::session::{Session, SubmitOutcome};
use crate::storage::KeyValueStore;
use crate::transfer::{ExportDocument, ImportOutcome};
use crate::types::{Level, SessionSummary};
use crate::Result;
use std::collections::BTreeMap;

pub struct PracticeEngine<S, R = RngSource, C = SystemClock> {
    store: S,
    rng: R,
    clock: C,
}

impl<S: KeyValueStore> PracticeEngine<S> {
    /// Engine with an entropy-seeded random source and the wall clock
    pub fn new(store: S) -> Self {
        Self::with_parts(store, RngSource::from_entropy(), SystemClock)
    }
}

impl<S: KeyValueStore, R: RandomSource, C: Clock> PracticeEngine<S, R, C> {
    pub fn with_parts(store: S, rng: R, clock: C) -> Self {
        Self { store, rng, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Progress view over the engine's store
    pub fn progress(&mut self) -> ProgressStore<&mut S, &C> {
        ProgressStore::with_clock(&mut self.store, &self.clock)
    }

    /// Profile view over the engine's store
    pub fn profile(&mut self) -> Profile<&mut S> {
        Profile::new(&mut self.store)
    }

    /// Start a session on `topic_id`
    ///
    /// Unknown ids are served by the integer generator. Without an explicit
    /// `count` the profile's question count is used.
    pub fn start(&mut self, topic_id: &str, level: Level, count: Option<u32>) -> Result<Session> {
        let topic = match find_topic(topic_id) {
            Some(topic) => topic.clone(),
            None => {
                tracing::debug!("Unknown topic '{}', using integer problems", topic_id);
                fallback_topic(topic_id)
            }
        };
        let count = match count {
            Some(n) => n,
            None => self.profile().question_count(),
        };

        let mut session = Session::new();
        session.start(&topic, level, count, &mut self.rng, self.clock.now())?;
        Ok(session)
    }

    /// Answer the current problem of `session`
    ///
    /// Completing the last question records the session in the progress store.
    pub fn submit(&mut self, session: &mut Session, raw_answer: &str) -> Result<SubmitOutcome> {
        let now = self.clock.now();
        let mut progress = ProgressStore::with_clock(&mut self.store, &self.clock);
        session.submit(raw_answer, &mut self.rng, &mut progress, now)
    }

    /// Record a completed session that has not been recorded yet
    pub fn finish(&mut self, session: &mut Session) -> Result<Option<SessionSummary>> {
        let now = self.clock.now();
        let mut progress = ProgressStore::with_clock(&mut self.store, &self.clock);
        session.finish(&mut progress, now)
    }

    pub fn stats(&mut self) -> BTreeMap<TopicKey, TopicStats> {
        self.progress().best_scores_by_topic()
    }

    pub fn export(&mut self) -> ExportDocument {
        let code = self.profile().display_code();
        self.progress().export(&code)
    }

    pub fn import(&mut self, text: &str) -> Result<ImportOutcome> {
        self.progress().import(text)
    }
}
