//! Default catalog of practice topics.
//!
//! Topics without a dedicated generator are served by the integer generator.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

const INTEGER_SCALING: LevelScaling = LevelScaling {
    introductory: 10,
    advanced: 50,
};

const FRACTION_SCALING: LevelScaling = LevelScaling {
    introductory: 12,
    advanced: 20,
};

const LINEAR_SCALING: LevelScaling = LevelScaling {
    introductory: 10,
    advanced: 20,
};

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Look up a topic by id in the default catalog
pub fn find_topic(id: &str) -> Option<&'static TopicDefinition> {
    get_default_catalog().find(id)
}

/// Topics listed under a level, in display order
pub fn topics_for_level(level: Level) -> impl Iterator<Item = &'static TopicDefinition> {
    get_default_catalog()
        .topics
        .iter()
        .filter(move |t| t.level == level)
}

/// Topic used when a caller asks for an id the catalog does not know
pub fn fallback_topic(id: &str) -> TopicDefinition {
    topic(id, id, Level::Introductory, GeneratorKind::Integer)
}

fn scaling_for(generator: GeneratorKind) -> LevelScaling {
    match generator {
        GeneratorKind::Integer => INTEGER_SCALING,
        GeneratorKind::Fraction => FRACTION_SCALING,
        GeneratorKind::Linear => LINEAR_SCALING,
    }
}

fn topic(id: &str, title: &str, level: Level, generator: GeneratorKind) -> TopicDefinition {
    TopicDefinition {
        id: id.into(),
        title: title.into(),
        level,
        answer_domain: generator.answer_domain(),
        generator,
        level_scaling: scaling_for(generator),
    }
}

/// Builds the default catalog with the built-in topics
pub fn build_default_catalog() -> Catalog {
    use GeneratorKind::*;
    use Level::*;

    let topics = vec![
        // Introductory tier
        topic("integers", "Integers (± add/sub/mul/div)", Introductory, Integer),
        topic("fractions", "Fractions (simplify, add/sub, mul/div)", Introductory, Fraction),
        topic("decimals", "Decimals & Percents", Introductory, Integer),
        topic("ratios", "Ratios & Proportions", Introductory, Integer),
        topic("geometry", "Basic Geometry (area/perimeter/volume)", Introductory, Integer),
        // Advanced tier
        topic("algebra", "Algebra (linear equations)", Advanced, Linear),
        topic("exponents", "Exponents & Radicals", Advanced, Integer),
        topic("functions", "Functions (evaluate)", Advanced, Integer),
        topic("coord", "Coordinate Geometry (slope, distance)", Advanced, Integer),
        topic("prob", "Intro Probability & Stats", Advanced, Integer),
    ];

    Catalog { topics }
}

impl Catalog {
    /// Find a topic by id
    pub fn find(&self, id: &str) -> Option<&TopicDefinition> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Validate catalog integrity
    ///
    /// Returns a list of validation errors, empty if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (idx, t) in self.topics.iter().enumerate() {
            if self.topics[..idx].iter().any(|other| other.id == t.id) {
                errors.push(format!("Topic '{}' is defined more than once", t.id));
            }
            if t.answer_domain != t.generator.answer_domain() {
                errors.push(format!(
                    "Topic '{}': answer domain {:?} does not match generator {:?}",
                    t.id, t.answer_domain, t.generator
                ));
            }
            for level in Level::ALL {
                if t.level_scaling.bound(level) < 1 {
                    errors.push(format!(
                        "Topic '{}': {} bound must be at least 1",
                        t.id, level
                    ));
                }
            }
        }

        for level in Level::ALL {
            if !self.topics.iter().any(|t| t.level == level) {
                errors.push(format!("Catalog has no {} topics", level));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.topics.len(), 10);
        assert_eq!(topics_for_level(Level::Introductory).count(), 5);
        assert_eq!(topics_for_level(Level::Advanced).count(), 5);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_fraction_topic_uses_fraction_domain() {
        let fractions = find_topic("fractions").unwrap();
        assert_eq!(fractions.answer_domain, AnswerDomain::Fraction);
        assert_eq!(fractions.level_scaling.bound(Level::Introductory), 12);
        assert_eq!(fractions.level_scaling.bound(Level::Advanced), 20);
    }

    #[test]
    fn test_unknown_topic_falls_back_to_integers() {
        assert!(find_topic("calculus").is_none());
        let fallback = fallback_topic("calculus");
        assert_eq!(fallback.generator, GeneratorKind::Integer);
        assert_eq!(fallback.answer_domain, AnswerDomain::Numeric);
        assert_eq!(fallback.level_scaling.bound(Level::Advanced), 50);
    }

    #[test]
    fn test_duplicate_ids_are_reported() {
        let mut catalog = build_default_catalog();
        let dup = catalog.topics[0].clone();
        catalog.topics.push(dup);
        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("more than once"));
    }
}
