//! Speed, accuracy and score arithmetic plus the evaluation tier table.
//!
//! Everything here is a pure function of session counters and elapsed time so the
//! numbers can be checked without driving a session.

use std::time::Duration;

/// Standard typing convention: five characters make one word.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Elapsed time never counts as less than this, so the first tick cannot divide by zero.
pub const MIN_ELAPSED: Duration = Duration::from_millis(100);

fn elapsed_minutes(elapsed: Duration) -> f64 {
    elapsed.max(MIN_ELAPSED).as_secs_f64() / 60.0
}

/// Words per minute based on accepted characters.
pub fn wpm(correct_chars: usize, elapsed: Duration) -> f64 {
    (correct_chars as f64 / CHARS_PER_WORD) / elapsed_minutes(elapsed)
}

/// Characters per minute based on fully completed sentences.
pub fn cpm(completed_chars: usize, elapsed: Duration) -> f64 {
    completed_chars as f64 / elapsed_minutes(elapsed)
}

/// Accepted characters over completed-sentence characters; zero before any completion.
///
/// Characters accepted in an unfinished sentence count in the numerator only, so this
/// can exceed 1.0 when a session ends mid-sentence.
pub fn accuracy_rate(correct_chars: usize, completed_chars: usize) -> f64 {
    if completed_chars == 0 {
        0.0
    } else {
        correct_chars as f64 / completed_chars as f64
    }
}

/// Share of keystrokes that were accepted; 1.0 before the first keystroke.
pub fn keystroke_accuracy(correct_chars: usize, mistakes: usize) -> f64 {
    let attempts = correct_chars + mistakes;
    if attempts == 0 {
        1.0
    } else {
        correct_chars as f64 / attempts as f64
    }
}

/// `floor(accuracy_rate * wpm)`: slow-but-perfect and fast-but-sloppy both score low.
pub fn score(correct_chars: usize, completed_chars: usize, elapsed: Duration) -> u32 {
    let raw = accuracy_rate(correct_chars, completed_chars) * wpm(correct_chars, elapsed);
    // float-to-int casts saturate, and raw is never negative
    raw.floor() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Tier {
    Hero,
    Specialty,
    Professional,
    Associate,
    Foundational,
}

/// Highest threshold first; the first one a score meets wins.
const TIER_THRESHOLDS: [(u32, Tier); 5] = [
    (80, Tier::Hero),
    (60, Tier::Specialty),
    (45, Tier::Professional),
    (30, Tier::Associate),
    (0, Tier::Foundational),
];

impl Tier {
    pub fn for_score(score: u32) -> Self {
        TIER_THRESHOLDS
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|&(_, tier)| tier)
            .unwrap_or(Tier::Foundational)
    }

    pub fn threshold(self) -> u32 {
        TIER_THRESHOLDS
            .iter()
            .find(|(_, tier)| *tier == self)
            .map(|&(threshold, _)| threshold)
            .unwrap_or(0)
    }

    /// The tier directly above this one, if any.
    pub fn next(self) -> Option<Self> {
        let idx = TIER_THRESHOLDS.iter().position(|(_, tier)| *tier == self)?;
        idx.checked_sub(1).map(|above| TIER_THRESHOLDS[above].1)
    }

    /// Next tier up and the points still missing to reach it.
    pub fn next_threshold(score: u32) -> Option<(Self, u32)> {
        let next = Self::for_score(score).next()?;
        Some((next, next.threshold() - score))
    }

    pub fn all() -> impl Iterator<Item = Tier> {
        TIER_THRESHOLDS.iter().map(|&(_, tier)| tier)
    }
}
