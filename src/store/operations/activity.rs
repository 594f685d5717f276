use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_CAS_RETRIES;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Per-learner streak and daily-goal counters, owned by the activity
/// tracker. Day fields are calendar days in the learner's offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub learner_id: String,
    pub streak: u32,
    pub last_active_day: Option<NaiveDate>,
    pub today_day: Option<NaiveDate>,
    pub today_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl DailyActivity {
    pub fn empty(learner_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            streak: 0,
            last_active_day: None,
            today_day: None,
            today_count: 0,
            updated_at: now,
        }
    }
}

impl Store {
    pub fn get_activity(&self, learner_id: &str) -> Result<Option<DailyActivity>, StoreError> {
        let key = keys::activity_key(learner_id);
        match (self.daily_activity.get(key.as_bytes()))? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 与 progress 相同的 CAS 循环：并发复习事件各自重算，计数不丢失。
    pub fn update_activity_with<F>(
        &self,
        learner_id: &str,
        f: F,
    ) -> Result<DailyActivity, StoreError>
    where
        F: Fn(Option<DailyActivity>) -> Result<DailyActivity, StoreError>,
    {
        let key = keys::activity_key(learner_id);
        for _ in 0..MAX_CAS_RETRIES {
            let old_raw = self.daily_activity.get(key.as_bytes())?;
            let prior = match &old_raw {
                Some(raw) => Some(Self::deserialize::<DailyActivity>(raw)?),
                None => None,
            };
            let next = f(prior)?;
            let new_bytes = Self::serialize(&next)?;
            match self.daily_activity.compare_and_swap(
                key.as_bytes(),
                old_raw.as_ref().map(|r| r.as_ref()),
                Some(new_bytes.as_slice()),
            )? {
                Ok(()) => return Ok(next),
                Err(_) => continue,
            }
        }
        Err(StoreError::CasRetryExhausted {
            entity: "daily_activity".to_string(),
            key,
            attempts: MAX_CAS_RETRIES,
        })
    }
}
