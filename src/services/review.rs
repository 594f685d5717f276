use chrono::Duration;
use serde::Serialize;

use crate::clock::{round_to_day_boundary, Deadline};
use crate::constants::INITIAL_EASINESS_FACTOR;
use crate::error::CoreError;
use crate::services::{validate_id, validate_unit, Core, SessionCard};
use crate::srs::sm2::{self, Sm2State, MAX_QUALITY};
use crate::srs::lifecycle;
use crate::store::operations::progress::{ProgressEntry, WordStatus};

/// Result of a submitted review: the new schedule plus the activity
/// counters the client displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub entry: ProgressEntry,
    pub goal_reached: bool,
    pub daily_count: u32,
    pub current_streak: u32,
}

impl ProgressEntry {
    fn sm2_state(&self) -> Sm2State {
        Sm2State {
            repetition_number: self.repetition_number,
            easiness_factor: self.easiness_factor,
            interval_days: self.interval_days,
        }
    }
}

impl Core {
    /// Triage classification: "I know this" sends the word straight to
    /// Mastered with a mastery-sized interval, "I don't" queues it for
    /// acquisition. Repeating the same answer is idempotent.
    pub async fn triage(
        &self,
        learner_id: &str,
        word_id: &str,
        is_known: bool,
        deadline: Deadline,
    ) -> Result<ProgressEntry, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        validate_id("word", word_id)?;
        if self.store().get_word(word_id)?.is_none() {
            return Err(CoreError::not_found("word", word_id));
        }

        let now = self.now();
        let offset = self.config().activity.utc_offset;
        let seed_days = self.config().scheduler.mastery_seed_days;
        let learner = learner_id.to_string();
        let word = word_id.to_string();

        deadline.check(self.clock())?;
        let entry = self.store().update_progress_with(learner_id, word_id, |prior| {
            let easiness_factor = prior
                .as_ref()
                .map(|p| p.easiness_factor)
                .unwrap_or(INITIAL_EASINESS_FACTOR);
            let (status, sm2) = lifecycle::triage_state(is_known, easiness_factor, seed_days);
            let next_review_at = round_to_day_boundary(
                now + Duration::days(i64::from(sm2.interval_days)),
                offset,
            );
            Ok(ProgressEntry {
                learner_id: learner.clone(),
                word_id: word.clone(),
                status,
                repetition_number: sm2.repetition_number,
                easiness_factor: sm2.easiness_factor,
                interval_days: sm2.interval_days,
                next_review_at: Some(next_review_at),
                // 分类不算回忆证据，last_reviewed_at 只由复习写入
                last_reviewed_at: prior.as_ref().and_then(|p| p.last_reviewed_at),
                updated_at: now,
            })
        })?;

        tracing::debug!(learner_id, word_id, is_known, status = ?entry.status, "Triage applied");
        Ok(entry)
    }

    /// Submit one recall with quality 0-5. Runs the SM-2 scheduler and the
    /// lifecycle machine, then feeds the activity tracker.
    pub async fn review_submit(
        &self,
        learner_id: &str,
        word_id: &str,
        quality: u8,
        deadline: Deadline,
    ) -> Result<ReviewOutcome, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        validate_id("word", word_id)?;
        if quality > MAX_QUALITY {
            return Err(CoreError::invalid_argument(format!(
                "quality {quality} outside 0-{MAX_QUALITY}"
            )));
        }
        if self.store().get_word(word_id)?.is_none() {
            return Err(CoreError::not_found("word", word_id));
        }

        let now = self.now();
        let offset = self.config().activity.utc_offset;
        let params = self.sm2_params();
        let threshold = self.config().scheduler.mastery_threshold_days;
        let learner = learner_id.to_string();
        let word = word_id.to_string();

        // 截止检查到此为止：两条记录的写入一旦开始就全部完成
        deadline.check(self.clock())?;
        let entry = self.store().update_progress_with(learner_id, word_id, |prior| {
            let base = prior.unwrap_or_else(|| ProgressEntry::never_seen(&learner, &word, now));
            let sm2 = sm2::next_state(base.sm2_state(), quality, params);
            let status = lifecycle::after_review(base.status, quality, sm2.interval_days, threshold);
            let next_review_at = round_to_day_boundary(
                now + Duration::days(i64::from(sm2.interval_days)),
                offset,
            );
            Ok(ProgressEntry {
                learner_id: learner.clone(),
                word_id: word.clone(),
                status,
                repetition_number: sm2.repetition_number,
                easiness_factor: sm2.easiness_factor,
                interval_days: sm2.interval_days,
                next_review_at: Some(next_review_at),
                last_reviewed_at: Some(now),
                updated_at: now,
            })
        })?;

        let snapshot = self.record_review_event(learner_id, now)?;
        tracing::debug!(
            learner_id,
            word_id,
            quality,
            status = ?entry.status,
            interval_days = entry.interval_days,
            "Review submitted"
        );

        Ok(ReviewOutcome {
            entry,
            goal_reached: snapshot.goal_reached,
            daily_count: snapshot.today_count,
            current_streak: snapshot.streak,
        })
    }

    /// Binary front-ends map Known/Unknown to quality 4 / 1 before the
    /// scheduler sees the answer.
    pub async fn review_submit_binary(
        &self,
        learner_id: &str,
        word_id: &str,
        is_known: bool,
        deadline: Deadline,
    ) -> Result<ReviewOutcome, CoreError> {
        self.review_submit(
            learner_id,
            word_id,
            sm2::quality_from_binary(is_known),
            deadline,
        )
        .await
    }

    /// Assemble the default review batch: due Learning and Review words,
    /// Learning first, earliest due first.
    pub async fn review_session(
        &self,
        learner_id: &str,
        limit: Option<usize>,
        deadline: Deadline,
    ) -> Result<Vec<SessionCard>, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        let limit = limit
            .unwrap_or(self.config().session.default_limit)
            .clamp(1, self.config().session.max_limit);

        let due = self.store().due_progress(
            learner_id,
            self.now(),
            limit,
            &[WordStatus::Learning, WordStatus::Review],
        )?;

        let mut cards = Vec::with_capacity(due.len());
        for entry in due {
            match self.store().get_word(&entry.word_id)? {
                Some(word) => cards.push(SessionCard {
                    word,
                    status: entry.status,
                    next_review_at: entry.next_review_at,
                }),
                None => {
                    tracing::warn!(
                        learner_id,
                        word_id = %entry.word_id,
                        "Progress entry references a word missing from the catalog"
                    );
                }
            }
        }
        Ok(cards)
    }

    /// Drop every progress entry of a unit, returning the words to New.
    pub async fn reset_unit(
        &self,
        learner_id: &str,
        unit: u32,
        deadline: Deadline,
    ) -> Result<u64, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        validate_unit(unit)?;

        let mut removed = 0;
        for word in self.store().words_in_unit(unit)? {
            if self.store().remove_progress(learner_id, &word.id)? {
                removed += 1;
            }
        }
        tracing::info!(learner_id, unit, removed, "Unit progress reset");
        Ok(removed)
    }
}
