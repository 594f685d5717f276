use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{INITIAL_EASINESS_FACTOR, MAX_CAS_RETRIES};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Lifecycle status of a (learner, word) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WordStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl WordStatus {
    /// Queue priority for session assembly: Learning > Review > New > Mastered.
    pub fn queue_rank(self) -> u8 {
        match self {
            WordStatus::Learning => 0,
            WordStatus::Review => 1,
            WordStatus::New => 2,
            WordStatus::Mastered => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub learner_id: String,
    pub word_id: String,
    pub status: WordStatus,
    pub repetition_number: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressEntry {
    /// Synthetic zero-state for a pair that has never been touched.
    pub fn never_seen(learner_id: &str, word_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            word_id: word_id.to_string(),
            status: WordStatus::New,
            repetition_number: 0,
            easiness_factor: INITIAL_EASINESS_FACTOR,
            interval_days: 0,
            next_review_at: None,
            last_reviewed_at: None,
            updated_at: now,
        }
    }

    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        match (self.status, self.next_review_at) {
            (WordStatus::New, _) => true,
            (_, Some(next)) => next <= at,
            (_, None) => false,
        }
    }
}

impl Store {
    pub fn get_progress(
        &self,
        learner_id: &str,
        word_id: &str,
    ) -> Result<Option<ProgressEntry>, StoreError> {
        let key = keys::progress_key(learner_id, word_id);
        match self.progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Atomic insert-if-absent. The loser of a concurrent race gets the
    /// winner's entry back unchanged, so creation is idempotent.
    pub fn get_or_create_progress(
        &self,
        entry: &ProgressEntry,
    ) -> Result<ProgressEntry, StoreError> {
        let key = keys::progress_key(&entry.learner_id, &entry.word_id);
        let bytes = Self::serialize(entry)?;
        match self
            .progress
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(bytes))?
        {
            Ok(()) => Ok(entry.clone()),
            Err(cas) => match cas.current {
                Some(existing) => Self::deserialize(&existing),
                None => Err(StoreError::Conflict {
                    entity: "progress".to_string(),
                    key,
                }),
            },
        }
    }

    /// Total replacement of an existing entry. Single-shot CAS against the
    /// caller's read; a concurrent writer surfaces as Conflict.
    pub fn put_progress(
        &self,
        prior: &ProgressEntry,
        entry: &ProgressEntry,
    ) -> Result<(), StoreError> {
        let key = keys::progress_key(&entry.learner_id, &entry.word_id);
        let old_bytes = Self::serialize(prior)?;
        let new_bytes = Self::serialize(entry)?;
        if self.progress.get(key.as_bytes())?.is_none() {
            return Err(StoreError::NotFound {
                entity: "progress".to_string(),
                key,
            });
        }
        match self.progress.compare_and_swap(
            key.as_bytes(),
            Some(old_bytes.as_slice()),
            Some(new_bytes.as_slice()),
        )? {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::Conflict {
                entity: "progress".to_string(),
                key,
            }),
        }
    }

    /// CAS 循环更新：每次重试都重新读取并重新应用 `f`，保证并发更新
    /// 串行化（盲写 last-writer-wins 会丢失对方的重复计数）。
    pub fn update_progress_with<F>(
        &self,
        learner_id: &str,
        word_id: &str,
        f: F,
    ) -> Result<ProgressEntry, StoreError>
    where
        F: Fn(Option<ProgressEntry>) -> Result<ProgressEntry, StoreError>,
    {
        let key = keys::progress_key(learner_id, word_id);
        for _ in 0..MAX_CAS_RETRIES {
            let old_raw = self.progress.get(key.as_bytes())?;
            let prior = match &old_raw {
                Some(raw) => Some(Self::deserialize::<ProgressEntry>(raw)?),
                None => None,
            };
            let next = f(prior)?;
            let new_bytes = Self::serialize(&next)?;
            match self.progress.compare_and_swap(
                key.as_bytes(),
                old_raw.as_ref().map(|r| r.as_ref()),
                Some(new_bytes.as_slice()),
            )? {
                Ok(()) => return Ok(next),
                Err(_) => continue,
            }
        }
        Err(StoreError::CasRetryExhausted {
            entity: "progress".to_string(),
            key,
            attempts: MAX_CAS_RETRIES,
        })
    }

    /// Entries due at `at`, restricted to `filter` statuses. Order: status
    /// priority, then next_review_at ascending (absent last), then word id.
    pub fn due_progress(
        &self,
        learner_id: &str,
        at: DateTime<Utc>,
        limit: usize,
        filter: &[WordStatus],
    ) -> Result<Vec<ProgressEntry>, StoreError> {
        let prefix = keys::progress_prefix(learner_id);
        let mut due = Vec::new();
        for item in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, v) = item?;
            let entry: ProgressEntry = Self::deserialize(&v)?;
            if filter.contains(&entry.status) && entry.is_due(at) {
                due.push(entry);
            }
        }
        due.sort_by(|a, b| {
            a.status
                .queue_rank()
                .cmp(&b.status.queue_rank())
                .then_with(|| {
                    let a_next = a.next_review_at.unwrap_or(DateTime::<Utc>::MAX_UTC);
                    let b_next = b.next_review_at.unwrap_or(DateTime::<Utc>::MAX_UTC);
                    a_next.cmp(&b_next)
                })
                .then_with(|| a.word_id.cmp(&b.word_id))
        });
        due.truncate(limit);
        Ok(due)
    }

    pub fn progress_for_learner(
        &self,
        learner_id: &str,
    ) -> Result<Vec<ProgressEntry>, StoreError> {
        let prefix = keys::progress_prefix(learner_id);
        let mut entries = Vec::new();
        for item in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, v) = item?;
            entries.push(Self::deserialize::<ProgressEntry>(&v)?);
        }
        Ok(entries)
    }

    pub fn remove_progress(&self, learner_id: &str, word_id: &str) -> Result<bool, StoreError> {
        let key = keys::progress_key(learner_id, word_id);
        Ok(self.progress.remove(key.as_bytes())?.is_some())
    }

    /// Learner deletion support: drop every entry under the learner prefix.
    pub fn remove_progress_for_learner(&self, learner_id: &str) -> Result<u64, StoreError> {
        let prefix = keys::progress_prefix(learner_id);
        let mut removed = 0;
        let keys_to_remove: Vec<_> = self
            .progress
            .scan_prefix(prefix.as_bytes())
            .keys()
            .collect::<Result<Vec<_>, _>>()?;
        for key in keys_to_remove {
            if self.progress.remove(&key)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
