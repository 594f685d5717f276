use serde::Serialize;

use crate::clock::Deadline;
use crate::constants::{MAX_DIFFICULTY_RANK, MIN_DIFFICULTY_RANK, PROBE_SAMPLE_WINDOW};
use crate::error::CoreError;
use crate::placement::engine::{self, Range};
use crate::services::{validate_id, Core};
use crate::store::operations::placement::{PendingQuestion, PlacementAnswer, PlacementSession};
use crate::store::operations::words::Word;

/// One round of the placement dialogue: the session snapshot plus either
/// the next question or the completion verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRound {
    pub session: PlacementSession,
    pub word: Option<Word>,
    pub is_regression_probe: bool,
    pub is_complete: bool,
    pub final_level: Option<u8>,
}

impl PlacementRound {
    fn in_progress(session: PlacementSession, word: Word, is_probe: bool) -> Self {
        Self {
            session,
            word: Some(word),
            is_regression_probe: is_probe,
            is_complete: false,
            final_level: None,
        }
    }

    fn completed(session: PlacementSession) -> Self {
        let final_level = session.final_level;
        Self {
            session,
            word: None,
            is_regression_probe: false,
            is_complete: true,
            final_level,
        }
    }
}

impl Core {
    /// Start (or resume) the placement test. Idempotent: an existing active
    /// session is returned with its pending question, never replaced.
    pub async fn placement_start(
        &self,
        learner_id: &str,
        deadline: Deadline,
    ) -> Result<PlacementRound, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;

        if let Some(existing) = self.store().get_active_placement(learner_id)? {
            return self.resume_or_advance(existing, deadline).await;
        }

        let session = self
            .store()
            .create_placement_if_absent(&PlacementSession::new(learner_id, self.now()))?;
        tracing::info!(learner_id, session_id = %session.id, "Placement session started");
        self.resume_or_advance(session, deadline).await
    }

    /// Apply one answer to the pending question, then either select the
    /// next question or finalize. The write is a single-shot CAS, so a
    /// concurrent answer on the same session surfaces as Conflict.
    pub async fn placement_answer(
        &self,
        learner_id: &str,
        is_known: bool,
        deadline: Deadline,
    ) -> Result<PlacementRound, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;

        let prior = self
            .store()
            .get_active_placement(learner_id)?
            .ok_or_else(|| CoreError::not_found("placement_session", learner_id))?;
        let pending = prior.pending.clone().ok_or_else(|| {
            CoreError::internal("active placement session has no pending question")
        })?;

        let mut next = prior.clone();
        next.log.push(PlacementAnswer {
            word_id: pending.word_id.clone(),
            was_regression_probe: pending.is_regression_probe,
            was_known: is_known,
        });
        let range = engine::apply_answer(
            Range {
                min: prior.current_min,
                max: prior.current_max,
            },
            pending.target_rank,
            pending.is_regression_probe,
            is_known,
            &self.config().placement,
        );
        next.current_min = range.min;
        next.current_max = range.max;
        next.question_count += 1;
        next.pending = None;
        next.updated_at = self.now();

        let mut selected = None;
        if engine::should_stop(range, next.question_count, &self.config().placement) {
            finalize(&mut next, range);
        } else {
            match self.select_question(&next)? {
                Some((word, target_rank, is_probe)) => {
                    next.pending = Some(PendingQuestion {
                        word_id: word.id.clone(),
                        target_rank,
                        is_regression_probe: is_probe,
                    });
                    selected = Some((word, is_probe));
                }
                None => {
                    // 词表耗尽属于终止条件：按当前中点定级，不再循环
                    tracing::info!(
                        learner_id,
                        session_id = %next.id,
                        "Placement candidates exhausted, finalizing"
                    );
                    finalize(&mut next, range);
                }
            }
        }

        deadline.check(self.clock())?;
        self.store().cas_update_placement(&prior, &next)?;

        if next.is_active {
            let (word, is_probe) = selected
                .ok_or_else(|| CoreError::internal("active placement round without question"))?;
            Ok(PlacementRound::in_progress(next, word, is_probe))
        } else {
            tracing::info!(
                learner_id,
                session_id = %next.id,
                final_level = ?next.final_level,
                questions = next.question_count,
                "Placement session complete"
            );
            Ok(PlacementRound::completed(next))
        }
    }

    pub async fn placement_current(
        &self,
        learner_id: &str,
        deadline: Deadline,
    ) -> Result<Option<PlacementSession>, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;
        Ok(self.store().get_active_placement(learner_id)?)
    }

    /// Serve the pending question if one exists, otherwise select and
    /// persist one (fresh session, or recovery after a crash between
    /// answer and selection).
    async fn resume_or_advance(
        &self,
        session: PlacementSession,
        deadline: Deadline,
    ) -> Result<PlacementRound, CoreError> {
        if let Some(pending) = &session.pending {
            let word = self
                .store()
                .get_word(&pending.word_id)?
                .ok_or_else(|| CoreError::internal("pending placement word missing from catalog"))?;
            let is_probe = pending.is_regression_probe;
            return Ok(PlacementRound::in_progress(session, word, is_probe));
        }

        let mut next = session.clone();
        let round = match self.select_question(&next)? {
            Some((word, target_rank, is_probe)) => {
                next.pending = Some(PendingQuestion {
                    word_id: word.id.clone(),
                    target_rank,
                    is_regression_probe: is_probe,
                });
                next.updated_at = self.now();
                PlacementRound::in_progress(next.clone(), word, is_probe)
            }
            None => {
                let range = Range {
                    min: next.current_min,
                    max: next.current_max,
                };
                finalize(&mut next, range);
                next.updated_at = self.now();
                PlacementRound::completed(next.clone())
            }
        };

        deadline.check(self.clock())?;
        self.store().cas_update_placement(&session, &next)?;
        Ok(round)
    }

    /// Pick the next question word. Probes sample near the regression
    /// target inside a ±PROBE_SAMPLE_WINDOW band; normal questions sample
    /// the midpoint inside the active range. Either window is widened to
    /// the whole spectrum before giving up, so the probe cadence never
    /// bends for a thin catalog.
    fn select_question(
        &self,
        session: &PlacementSession,
    ) -> Result<Option<(Word, u8, bool)>, CoreError> {
        let config = &self.config().placement;
        let seen = session.seen_word_ids();
        let range = Range {
            min: session.current_min,
            max: session.current_max,
        };

        if engine::is_probe_position(session.question_count, config) {
            let target = engine::probe_target(session.current_min, config);
            let lo = target.saturating_sub(PROBE_SAMPLE_WINDOW).max(MIN_DIFFICULTY_RANK);
            let hi = target
                .saturating_add(PROBE_SAMPLE_WINDOW)
                .min(MAX_DIFFICULTY_RANK);
            if let Some(word) = self.store().sample_near_rank(target, Some((lo, hi)), &seen)? {
                return Ok(Some((word, target, true)));
            }
            if let Some(word) = self.store().sample_near_rank(target, None, &seen)? {
                return Ok(Some((word, target, true)));
            }
            return Ok(None);
        }

        let target = engine::midpoint(range);
        if let Some(word) =
            self.store()
                .sample_near_rank(target, Some((range.min, range.max)), &seen)?
        {
            return Ok(Some((word, target, false)));
        }
        if let Some(word) = self.store().sample_near_rank(target, None, &seen)? {
            return Ok(Some((word, target, false)));
        }
        Ok(None)
    }
}

fn finalize(session: &mut PlacementSession, range: Range) {
    session.is_active = false;
    session.final_level = Some(engine::final_level(range));
    session.pending = None;
}
