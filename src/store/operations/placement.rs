use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DIFFICULTY_RANK, MIN_DIFFICULTY_RANK};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Adaptive placement ("sorting hat") session. `pending` is the question
/// currently in front of the learner; `log` is the full answer trail kept
/// for auditability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSession {
    pub id: String,
    pub learner_id: String,
    pub current_min: u8,
    pub current_max: u8,
    pub question_count: u32,
    pub is_active: bool,
    pub final_level: Option<u8>,
    pub pending: Option<PendingQuestion>,
    pub log: Vec<PlacementAnswer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The question that was actually asked: the answer is applied against the
/// same target rank the selection used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
    pub word_id: String,
    pub target_rank: u8,
    pub is_regression_probe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAnswer {
    pub word_id: String,
    pub was_regression_probe: bool,
    pub was_known: bool,
}

impl PlacementSession {
    pub fn new(learner_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            current_min: MIN_DIFFICULTY_RANK,
            current_max: MAX_DIFFICULTY_RANK,
            question_count: 0,
            is_active: true,
            final_level: None,
            pending: None,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Word ids this session must never show again.
    pub fn seen_word_ids(&self) -> HashSet<String> {
        let mut seen: HashSet<String> =
            self.log.iter().map(|answer| answer.word_id.clone()).collect();
        if let Some(pending) = &self.pending {
            seen.insert(pending.word_id.clone());
        }
        seen
    }
}

impl Store {
    pub fn get_placement_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PlacementSession>, StoreError> {
        let key = keys::placement_session_key(session_id);
        match self.placement_sessions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Active session for a learner, via the uniqueness index. A stale
    /// index entry (completed or missing session) is cleaned up lazily.
    pub fn get_active_placement(
        &self,
        learner_id: &str,
    ) -> Result<Option<PlacementSession>, StoreError> {
        let index_key = keys::placement_active_key(learner_id);
        let Some(session_id_raw) = self.placement_active.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let session_id = match String::from_utf8(session_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in placement active index");
                return Ok(None);
            }
        };
        match self.get_placement_session(&session_id)? {
            Some(session) if session.is_active => Ok(Some(session)),
            _ => {
                let _ = self.placement_active.compare_and_swap(
                    index_key.as_bytes(),
                    Some(session_id.as_bytes()),
                    None::<&[u8]>,
                )?;
                Ok(None)
            }
        }
    }

    /// Atomic claim of the one-active-session-per-learner slot. The loser
    /// of a concurrent race gets the winner's session back, never a second
    /// active session.
    pub fn create_placement_if_absent(
        &self,
        session: &PlacementSession,
    ) -> Result<PlacementSession, StoreError> {
        let index_key = keys::placement_active_key(&session.learner_id);
        let cas_result = self.placement_active.compare_and_swap(
            index_key.as_bytes(),
            None::<&[u8]>,
            Some(session.id.as_bytes().to_vec()),
        )?;

        if cas_result.is_err() {
            // Slot already claimed: return the existing active session.
            if let Some(existing) = self.get_active_placement(&session.learner_id)? {
                return Ok(existing);
            }
            // The claim we lost to was stale and just got cleaned; retry once.
            return match self.placement_active.compare_and_swap(
                index_key.as_bytes(),
                None::<&[u8]>,
                Some(session.id.as_bytes().to_vec()),
            )? {
                Ok(()) => {
                    self.insert_placement_record(session, &index_key)?;
                    Ok(session.clone())
                }
                Err(_) => Err(StoreError::Conflict {
                    entity: "placement_session".to_string(),
                    key: session.learner_id.clone(),
                }),
            };
        }

        self.insert_placement_record(session, &index_key)?;
        Ok(session.clone())
    }

    fn insert_placement_record(
        &self,
        session: &PlacementSession,
        index_key: &str,
    ) -> Result<(), StoreError> {
        let key = keys::placement_session_key(&session.id);
        let bytes = Self::serialize(session)?;
        if let Err(e) = self.placement_sessions.insert(key.as_bytes(), bytes) {
            let _ = self.placement_active.remove(index_key.as_bytes());
            return Err(StoreError::Sled(e));
        }
        Ok(())
    }

    /// Single-shot CAS against the state the caller read. Concurrent answer
    /// submissions on the same session resolve to one winner and one
    /// retriable Conflict; they are never coalesced.
    pub fn cas_update_placement(
        &self,
        prior: &PlacementSession,
        next: &PlacementSession,
    ) -> Result<(), StoreError> {
        let key = keys::placement_session_key(&next.id);
        let old_bytes = Self::serialize(prior)?;
        let new_bytes = Self::serialize(next)?;
        match self.placement_sessions.compare_and_swap(
            key.as_bytes(),
            Some(old_bytes.as_slice()),
            Some(new_bytes.as_slice()),
        )? {
            Ok(()) => {}
            Err(_) => {
                return Err(StoreError::Conflict {
                    entity: "placement_session".to_string(),
                    key: next.id.clone(),
                })
            }
        }

        if !next.is_active {
            let index_key = keys::placement_active_key(&next.learner_id);
            let _ = self.placement_active.compare_and_swap(
                index_key.as_bytes(),
                Some(next.id.as_bytes()),
                None::<&[u8]>,
            )?;
        }
        Ok(())
    }
}
