// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate scoring and best-transcription selection.

use chitravachaka_core::{AttemptOutcome, ScoredCandidate};
use tracing::debug;

/// Characters of text beyond which length earns no extra score.
pub const LENGTH_BONUS_CAP: usize = 300;
/// Score awarded for a transcription at or beyond the cap.
pub const LENGTH_BONUS_WEIGHT: f64 = 5.0;

/// `max(confidence, 0) + min(chars, 300) / 300 * 5`, over the trimmed text.
///
/// A failed attempt (confidence -1) and a genuine zero-confidence read score
/// the same.
pub fn score(confidence: f64, text: &str) -> f64 {
    let chars = text.trim().chars().count().min(LENGTH_BONUS_CAP);
    confidence.max(0.0) + chars as f64 / LENGTH_BONUS_CAP as f64 * LENGTH_BONUS_WEIGHT
}

/// Score one attempt.
pub fn score_outcome(outcome: &AttemptOutcome) -> ScoredCandidate {
    ScoredCandidate {
        score: score(outcome.confidence(), outcome.text()),
        text: outcome.text().trim().to_string(),
    }
}

/// Keep the highest-scoring attempt with non-empty text.
///
/// Replacement needs a strictly greater score, so among equal scores the
/// earliest attempt wins. Returns [`ScoredCandidate::floor`] when nothing had
/// text.
pub fn select_best<'a, I>(outcomes: I) -> ScoredCandidate
where
    I: IntoIterator<Item = &'a AttemptOutcome>,
{
    let mut best = ScoredCandidate::floor();
    for (position, outcome) in outcomes.into_iter().enumerate() {
        let candidate = score_outcome(outcome);
        if candidate.score > best.score && !candidate.text.is_empty() {
            debug!(position, score = candidate.score, "New best candidate");
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(confidence: f64, text: &str) -> AttemptOutcome {
        AttemptOutcome::Recognized {
            confidence,
            text: text.to_string(),
        }
    }

    #[test]
    fn length_bonus_is_capped() {
        let long = "ಕ".repeat(1000);
        let capped = "ಕ".repeat(300);
        assert_eq!(score(60.0, &long), score(60.0, &capped));
        assert_eq!(score(60.0, &capped), 65.0);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 150 Kannada characters, 450 bytes in UTF-8.
        let text = "ಕ".repeat(150);
        assert_eq!(score(0.0, &text), 2.5);
    }

    #[test]
    fn negative_confidence_counts_as_zero() {
        assert_eq!(score(-1.0, "abc"), score(0.0, "abc"));
    }

    #[test]
    fn whitespace_does_not_earn_length() {
        assert_eq!(score(10.0, "   ab   "), score(10.0, "ab"));
    }

    #[test]
    fn long_low_confidence_beats_short_high_confidence() {
        let long = "x".repeat(300);
        assert!(score(58.0, &long) > score(62.0, "x"));
    }

    #[test]
    fn all_empty_yields_empty_text() {
        let outcomes = vec![
            read(95.0, ""),
            read(-1.0, "   "),
            AttemptOutcome::Failed {
                reason: "boom".into(),
            },
        ];
        let best = select_best(&outcomes);
        assert_eq!(best.text, "");
        assert_eq!(best.score, f64::NEG_INFINITY);
    }

    #[test]
    fn empty_high_confidence_does_not_win() {
        let outcomes = vec![read(99.0, ""), read(10.0, "ಪಠ್ಯ")];
        assert_eq!(select_best(&outcomes).text, "ಪಠ್ಯ");
    }

    #[test]
    fn earliest_tie_wins() {
        let mut outcomes: Vec<AttemptOutcome> = (0..32).map(|_| read(20.0, "")).collect();
        outcomes[5] = read(80.0, "first");
        outcomes[9] = read(80.0, "later");
        assert_eq!(score_outcome(&outcomes[5]).score, score_outcome(&outcomes[9]).score);

        let best = select_best(&outcomes);
        assert_eq!(best.text, "first");
        // Re-running gives the same answer.
        assert_eq!(select_best(&outcomes), best);
    }

    #[test]
    fn failure_does_not_disturb_selection() {
        let outcomes = vec![
            read(40.0, "ok"),
            AttemptOutcome::Failed {
                reason: "crash".into(),
            },
            read(70.0, "better"),
        ];
        assert_eq!(select_best(&outcomes).text, "better");
    }

    #[test]
    fn selected_text_is_trimmed() {
        let outcomes = vec![read(50.0, "  ಕನ್ನಡ  ")];
        assert_eq!(select_best(&outcomes).text, "ಕನ್ನಡ");
    }
}
