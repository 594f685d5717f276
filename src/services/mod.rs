pub mod activity;
pub mod placement;
pub mod quiz;
pub mod review;
pub mod sessions;
pub mod stats;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::srs::sm2::Sm2Params;
use crate::store::operations::progress::WordStatus;
use crate::store::operations::words::Word;
use crate::store::Store;

/// Central handle over the injected collaborators. Operation groups are
/// implemented as `impl Core` blocks in the sibling service modules.
#[derive(Clone)]
pub struct Core {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    config: Arc<CoreConfig>,
}

impl Core {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, config: CoreConfig) -> Self {
        Self {
            store,
            clock,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn sm2_params(&self) -> Sm2Params {
        (&self.config.scheduler).into()
    }
}

/// One row of an assembled session: the word plus its lifecycle status.
/// SM-2 internals stay behind the boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCard {
    pub word: Word,
    pub status: WordStatus,
    pub next_review_at: Option<DateTime<Utc>>,
}

/// Opaque ids double as storage key segments, so the separator byte is
/// rejected at the boundary.
pub(crate) fn validate_id(kind: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::invalid_argument(format!(
            "{kind} id must not be empty"
        )));
    }
    if value.contains(':') {
        return Err(CoreError::invalid_argument(format!(
            "{kind} id must not contain ':'"
        )));
    }
    Ok(())
}

pub(crate) fn validate_unit(unit: u32) -> Result<(), CoreError> {
    if unit < 1 {
        return Err(CoreError::invalid_argument("unit must be >= 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_with_separator_are_rejected() {
        assert!(validate_id("learner", "l1").is_ok());
        assert!(validate_id("learner", "").is_err());
        assert!(validate_id("learner", "a:b").is_err());
    }

    #[test]
    fn unit_zero_is_rejected() {
        assert!(validate_unit(0).is_err());
        assert!(validate_unit(1).is_ok());
    }
}
