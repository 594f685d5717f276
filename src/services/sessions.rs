use std::collections::HashMap;

use crate::clock::Deadline;
use crate::error::CoreError;
use crate::services::{validate_id, validate_unit, Core, SessionCard};
use crate::store::operations::progress::{ProgressEntry, WordStatus};

impl Core {
    /// Words of a unit the learner has not classified yet: everything that
    /// is absent, New, or still Learning. Feeds the triage UI, ordered by
    /// difficulty rank then word id.
    pub async fn unit_filter(
        &self,
        learner_id: &str,
        unit: u32,
        deadline: Deadline,
    ) -> Result<Vec<SessionCard>, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        validate_unit(unit)?;

        let by_word = self.progress_by_word(learner_id)?;
        let mut cards: Vec<SessionCard> = self
            .store()
            .words_in_unit(unit)?
            .into_iter()
            .filter_map(|word| {
                let entry = by_word.get(&word.id);
                let status = entry.map(|e| e.status).unwrap_or(WordStatus::New);
                match status {
                    WordStatus::New | WordStatus::Learning => Some(SessionCard {
                        status,
                        next_review_at: entry.and_then(|e| e.next_review_at),
                        word,
                    }),
                    WordStatus::Review | WordStatus::Mastered => None,
                }
            })
            .collect();
        cards.sort_by(|a, b| {
            a.word
                .difficulty_rank
                .cmp(&b.word.difficulty_rank)
                .then_with(|| a.word.id.cmp(&b.word.id))
        });
        Ok(cards)
    }

    /// Learned pool of a unit (Review or Mastered), the seed set for quiz
    /// questions. Ordered by word id.
    pub async fn unit_learned(
        &self,
        learner_id: &str,
        unit: u32,
        deadline: Deadline,
    ) -> Result<Vec<SessionCard>, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        validate_unit(unit)?;

        let by_word = self.progress_by_word(learner_id)?;
        let mut cards: Vec<SessionCard> = self
            .store()
            .words_in_unit(unit)?
            .into_iter()
            .filter_map(|word| {
                let entry = by_word.get(&word.id)?;
                match entry.status {
                    WordStatus::Review | WordStatus::Mastered => Some(SessionCard {
                        status: entry.status,
                        next_review_at: entry.next_review_at,
                        word,
                    }),
                    WordStatus::New | WordStatus::Learning => None,
                }
            })
            .collect();
        cards.sort_by(|a, b| a.word.id.cmp(&b.word.id));
        Ok(cards)
    }

    fn progress_by_word(
        &self,
        learner_id: &str,
    ) -> Result<HashMap<String, ProgressEntry>, CoreError> {
        Ok(self
            .store()
            .progress_for_learner(learner_id)?
            .into_iter()
            .map(|entry| (entry.word_id.clone(), entry))
            .collect())
    }
}
