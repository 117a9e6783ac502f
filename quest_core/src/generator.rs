//! Problem generators.
//!
//! Every generator is a pure function of the topic, the level and the draws it
//! takes from the [`RandomSource`]. Draw order is part of the contract: a
//! scripted source replays the same problem every time.
//!
//! Zero divisors and zero denominators cannot occur. Integer division builds
//! the dividend from a quotient and a non-zero divisor; fraction operands are
//! drawn from `1..=max`.

use crate::catalog::{fallback_topic, find_topic};
use crate::fraction::Fraction;
use crate::random::RandomSource;
use crate::types::{AnswerDomain, GeneratorKind, Level, Problem, TopicDefinition};

/// The four arithmetic operations, drawn uniformly by index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Op {
    fn draw(rng: &mut impl RandomSource) -> Op {
        match rng.int_in(0, 3) {
            0 => Op::Add,
            1 => Op::Subtract,
            2 => Op::Multiply,
            _ => Op::Divide,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Subtract => "-",
            Op::Multiply => "×",
            Op::Divide => "÷",
        }
    }
}

/// Generate a problem for a topic id
///
/// Unknown ids fall back to the integer generator, so this never fails.
pub fn generate(topic_id: &str, level: Level, rng: &mut impl RandomSource) -> Problem {
    match find_topic(topic_id) {
        Some(topic) => generate_for(topic, level, rng),
        None => {
            tracing::debug!("Unknown topic '{}', using integer generator", topic_id);
            generate_for(&fallback_topic(topic_id), level, rng)
        }
    }
}

/// Generate a problem for a known topic definition
pub fn generate_for(topic: &TopicDefinition, level: Level, rng: &mut impl RandomSource) -> Problem {
    let bound = topic.level_scaling.bound(level).max(1);
    match topic.generator {
        GeneratorKind::Integer => integer_problem(bound, rng),
        GeneratorKind::Fraction => fraction_problem(bound, rng),
        GeneratorKind::Linear => linear_problem(bound, rng),
    }
}

fn numeric(statement: String, answer: i64) -> Problem {
    Problem {
        statement,
        canonical_answer: answer.to_string(),
        answer_domain: AnswerDomain::Numeric,
    }
}

/// Signed integer arithmetic on operands in `-bound..=bound`
pub fn integer_problem(bound: i64, rng: &mut impl RandomSource) -> Problem {
    let a = rng.int_in(-bound, bound);
    let b = rng.int_in(-bound, bound);
    let op = Op::draw(rng);

    let answer = match op {
        Op::Add => a + b,
        Op::Subtract => a - b,
        Op::Multiply => a * b,
        Op::Divide => {
            let divisor = if b == 0 { rng.int_in(1, bound) } else { b };
            let dividend = a * divisor;
            return numeric(format!("{} ÷ {} = ?", dividend, divisor), a);
        }
    };

    numeric(format!("{} {} {} = ?", a, op.symbol(), b), answer)
}

/// Fraction arithmetic on `a/b op c/d` with parts in `1..=max`
pub fn fraction_problem(max: i64, rng: &mut impl RandomSource) -> Problem {
    let a = rng.int_in(1, max);
    let b = rng.int_in(1, max);
    let op = Op::draw(rng);
    let c = rng.int_in(1, max);
    let d = rng.int_in(1, max);

    let (numer, denom) = match op {
        Op::Add => (a * d + c * b, b * d),
        Op::Subtract => (a * d - c * b, b * d),
        Op::Multiply => (a * c, b * d),
        Op::Divide => (a * d, b * c),
    };

    // Parts are drawn from 1..=max, so b*d and b*c are never zero.
    let canonical_answer = match Fraction::new(numer, denom) {
        Ok(f) => f.to_string(),
        Err(e) => {
            tracing::warn!("Fraction {}/{} could not be reduced: {}", numer, denom, e);
            format!("{}/{}", numer, denom)
        }
    };

    Problem {
        statement: format!("{}/{} {} {}/{} = ?", a, b, op.symbol(), c, d),
        canonical_answer,
        answer_domain: AnswerDomain::Fraction,
    }
}

/// One-step linear equation `ax + b = c`, solved for `x`
///
/// `x` is drawn before `c` is computed, so the solution is always an integer.
pub fn linear_problem(bound: i64, rng: &mut impl RandomSource) -> Problem {
    let a = rng.int_in(1, 6);
    let x = rng.int_in(-bound, bound);
    let b = rng.int_in(-10, 10);
    let c = a * x + b;
    let sign = if b >= 0 { '+' } else { '-' };

    numeric(
        format!("{}x {} {} = {}. Solve for x.", a, sign, b.abs(), c),
        x,
    )
}
