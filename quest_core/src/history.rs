//! Progress aggregation: best scores per topic and the streak indicator.
//!
//! The streak indicator is a two-state flag, not a day counter: it reports
//! `1` when the last practice was today or yesterday and `0` otherwise. A
//! learner who practiced every day for a month and one who practiced once
//! yesterday both read as `1`.

use crate::types::{Level, SessionSummary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregation key: one entry per level and topic
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TopicKey {
    pub level: Level,
    pub topic: String,
}

/// Aggregated results for one `(level, topic)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub topic: String,
    pub level: Level,
    /// Highest score seen, in percent
    pub best: u8,
    /// Number of sessions played
    pub count: u32,
    pub last_played: Option<DateTime<Utc>>,
    /// Global streak indicator, repeated on every entry
    pub streak: u8,
}

/// `1` if `last_practice_date` is today or yesterday, else `0`
///
/// No practice date, or one in the future, reads as `0`.
pub fn streak_indicator(last_practice_date: Option<NaiveDate>, today: NaiveDate) -> u8 {
    let Some(last) = last_practice_date else {
        return 0;
    };
    match (today - last).num_days() {
        0 | 1 => 1,
        _ => 0,
    }
}

/// Best score, play count and last play time per `(level, topic)`
///
/// Only summaries from the advanced practice log are considered (category
/// starting with "advanced", or carrying a known level). Summaries without a
/// level are filed under [`Level::Advanced`].
pub fn best_scores_by_topic(
    sessions: &[SessionSummary],
    last_practice_date: Option<NaiveDate>,
    today: NaiveDate,
) -> BTreeMap<TopicKey, TopicStats> {
    let streak = streak_indicator(last_practice_date, today);
    let mut map: BTreeMap<TopicKey, TopicStats> = BTreeMap::new();

    for s in sessions.iter().filter(|s| s.is_advanced()) {
        let level = s.level.unwrap_or(Level::Advanced);
        let key = TopicKey {
            level,
            topic: s.topic.clone(),
        };
        let entry = map.entry(key).or_insert_with(|| TopicStats {
            topic: s.topic.clone(),
            level,
            best: 0,
            count: 0,
            last_played: None,
            streak,
        });
        entry.best = entry.best.max(s.score_pct);
        entry.count += 1;
        entry.last_played = entry.last_played.max(Some(s.timestamp));
    }

    tracing::debug!("Aggregated {} topics from {} sessions", map.len(), sessions.len());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ADVANCED_CATEGORY;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_session(
        topic: &str,
        level: Option<Level>,
        category: &str,
        score: u8,
        days_ago: i64,
    ) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            mode: format!("Advanced - {}", topic),
            topic: topic.into(),
            topic_id: None,
            level,
            correct: u32::from(score) / 10,
            total: 10,
            score_pct: score,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
                - Duration::days(days_ago),
            category: category.into(),
        }
    }

    #[test]
    fn test_streak_indicator() {
        let today = date(2024, 5, 10);
        assert_eq!(streak_indicator(Some(today), today), 1);
        assert_eq!(streak_indicator(Some(date(2024, 5, 9)), today), 1);
        assert_eq!(streak_indicator(Some(date(2024, 5, 8)), today), 0);
        assert_eq!(streak_indicator(Some(date(2024, 5, 7)), today), 0);
        assert_eq!(streak_indicator(None, today), 0);
    }

    #[test]
    fn test_streak_crosses_month_boundary() {
        assert_eq!(streak_indicator(Some(date(2024, 2, 29)), date(2024, 3, 1)), 1);
    }

    #[test]
    fn test_streak_future_date_is_inactive() {
        assert_eq!(streak_indicator(Some(date(2024, 5, 11)), date(2024, 5, 10)), 0);
    }

    #[test]
    fn test_best_scores_keep_maximum_and_count() {
        let sessions = vec![
            create_test_session("Fractions", Some(Level::Introductory), ADVANCED_CATEGORY, 60, 3),
            create_test_session("Fractions", Some(Level::Introductory), ADVANCED_CATEGORY, 90, 2),
            create_test_session("Fractions", Some(Level::Introductory), ADVANCED_CATEGORY, 70, 1),
            create_test_session("Fractions", Some(Level::Advanced), ADVANCED_CATEGORY, 40, 1),
        ];

        let map = best_scores_by_topic(&sessions, Some(date(2024, 5, 10)), date(2024, 5, 10));
        assert_eq!(map.len(), 2);

        let intro = &map[&TopicKey {
            level: Level::Introductory,
            topic: "Fractions".into(),
        }];
        assert_eq!(intro.best, 90);
        assert_eq!(intro.count, 3);
        assert_eq!(intro.last_played, Some(sessions[2].timestamp));
        assert_eq!(intro.streak, 1);

        let adv = &map[&TopicKey {
            level: Level::Advanced,
            topic: "Fractions".into(),
        }];
        assert_eq!(adv.best, 40);
        assert_eq!(adv.count, 1);
    }

    #[test]
    fn test_last_played_is_most_recent_not_last_seen() {
        let sessions = vec![
            create_test_session("Algebra", Some(Level::Advanced), ADVANCED_CATEGORY, 50, 1),
            create_test_session("Algebra", Some(Level::Advanced), ADVANCED_CATEGORY, 30, 5),
        ];
        let map = best_scores_by_topic(&sessions, None, date(2024, 5, 10));
        let stats = map.values().next().unwrap();
        assert_eq!(stats.last_played, Some(sessions[0].timestamp));
        assert_eq!(stats.streak, 0);
    }

    #[test]
    fn test_filters_non_advanced_sessions() {
        let sessions = vec![
            create_test_session("Speed round", None, "daily", 100, 1),
            create_test_session("Integers", None, "advanced-legacy", 80, 1),
        ];
        let map = best_scores_by_topic(&sessions, None, date(2024, 5, 10));
        assert_eq!(map.len(), 1);
        let stats = map.values().next().unwrap();
        assert_eq!(stats.topic, "Integers");
        assert_eq!(stats.level, Level::Advanced);
    }

    #[test]
    fn test_empty_history() {
        assert!(best_scores_by_topic(&[], Some(date(2024, 5, 10)), date(2024, 5, 10)).is_empty());
    }
}
