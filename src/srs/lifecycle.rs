//! Lifecycle state machine for a (learner, word) pair. All transitions are
//! total: every (state, event) combination yields exactly one next state.

use crate::srs::sm2::{is_pass, Sm2State};
use crate::store::operations::progress::WordStatus;

/// Status after a review with the given quality, where `new_interval_days`
/// is the interval the scheduler just produced.
///
/// Failed recall always lands in Learning, from anywhere. A pass keeps
/// Mastered words Mastered, promotes anything whose interval has grown past
/// the mastery threshold, and otherwise consolidates in Review. Learning
/// promotes to Review on the first success, so two consecutive successes
/// always end in Review.
pub fn after_review(
    prior: WordStatus,
    quality: u8,
    new_interval_days: u32,
    mastery_threshold_days: u32,
) -> WordStatus {
    if !is_pass(quality) {
        return WordStatus::Learning;
    }
    match prior {
        WordStatus::Mastered => WordStatus::Mastered,
        _ if new_interval_days >= mastery_threshold_days => WordStatus::Mastered,
        WordStatus::New | WordStatus::Learning | WordStatus::Review => WordStatus::Review,
    }
}

/// Triage ("do you know this word?") classification. Known words skip the
/// queue entirely and are seeded with a mastery-sized interval; unknown
/// words enter acquisition with a one-day interval. The easiness factor is
/// carried through untouched: only review answers move it.
pub fn triage_state(
    is_known: bool,
    easiness_factor: f64,
    mastery_seed_days: u32,
) -> (WordStatus, Sm2State) {
    if is_known {
        (
            WordStatus::Mastered,
            Sm2State {
                repetition_number: 1,
                easiness_factor,
                interval_days: mastery_seed_days,
            },
        )
    } else {
        (
            WordStatus::Learning,
            Sm2State {
                repetition_number: 0,
                easiness_factor,
                interval_days: 1,
            },
        )
    }
}
