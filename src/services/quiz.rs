use rand::seq::SliceRandom;

use crate::clock::Deadline;
use crate::constants::{
    DEFAULT_DISTRACTOR_COUNT, DISTRACTOR_BAND_STEP, MAX_DIFFICULTY_RANK, MIN_DIFFICULTY_RANK,
};
use crate::error::CoreError;
use crate::services::{validate_id, Core};
use crate::store::operations::words::Word;

impl Core {
    /// Wrong options for a quiz question about `word_id`. Candidates never
    /// share the correct answer's display form; the difficulty band starts
    /// at ±DISTRACTOR_BAND_STEP around the correct word and widens until
    /// enough candidates exist or the spectrum is covered. The returned set
    /// is shuffled; the caller positions the correct option.
    pub async fn distractors(
        &self,
        word_id: &str,
        n: Option<usize>,
        deadline: Deadline,
    ) -> Result<Vec<Word>, CoreError> {
        deadline.check(self.clock())?;
        validate_id("word", word_id)?;
        let n = n.unwrap_or(DEFAULT_DISTRACTOR_COUNT);
        if n == 0 {
            return Err(CoreError::invalid_argument("distractor count must be >= 1"));
        }

        let correct = self
            .store()
            .get_word(word_id)?
            .ok_or_else(|| CoreError::not_found("word", word_id))?;

        let mut half_band = DISTRACTOR_BAND_STEP;
        let mut candidates;
        loop {
            let lo = correct
                .difficulty_rank
                .saturating_sub(half_band)
                .max(MIN_DIFFICULTY_RANK);
            let hi = correct
                .difficulty_rank
                .saturating_add(half_band)
                .min(MAX_DIFFICULTY_RANK);
            candidates = self.store().distractor_candidates(&correct, lo, hi)?;
            if candidates.len() >= n
                || (lo == MIN_DIFFICULTY_RANK && hi == MAX_DIFFICULTY_RANK)
            {
                break;
            }
            half_band = half_band.saturating_add(DISTRACTOR_BAND_STEP);
        }

        if candidates.is_empty() {
            return Err(CoreError::Exhausted(format!(
                "no distractor candidates for word {word_id}"
            )));
        }

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(n);
        Ok(candidates)
    }
}
