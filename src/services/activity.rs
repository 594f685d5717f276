use chrono::{DateTime, Utc};

use crate::clock::local_day;
use crate::error::CoreError;
use crate::services::Core;
use crate::store::operations::activity::DailyActivity;

/// Counters returned to the review flow after one observed event.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActivitySnapshot {
    pub streak: u32,
    pub today_count: u32,
    pub goal_reached: bool,
}

impl Core {
    /// Observe one review event (triage and placement answers do not come
    /// through here). The first review of a calendar day moves the streak:
    /// +1 when the previous active day was exactly yesterday, reset to 1
    /// otherwise. `goal_reached` fires exactly once, on the review that
    /// lands on the daily goal.
    pub(crate) fn record_review_event(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ActivitySnapshot, CoreError> {
        let offset = self.config().activity.utc_offset;
        let goal = self.config().activity.daily_goal;
        let today = local_day(now, offset);

        let updated = self.store().update_activity_with(learner_id, |prior| {
            let mut activity =
                prior.unwrap_or_else(|| DailyActivity::empty(learner_id, now));
            if activity.today_day == Some(today) {
                activity.today_count += 1;
            } else {
                let yesterday = today.pred_opt();
                activity.streak = if activity.last_active_day.is_some()
                    && activity.last_active_day == yesterday
                {
                    activity.streak + 1
                } else {
                    1
                };
                activity.today_day = Some(today);
                activity.last_active_day = Some(today);
                activity.today_count = 1;
            }
            activity.updated_at = now;
            Ok(activity)
        })?;

        let goal_reached = updated.today_count == goal;
        if goal_reached {
            tracing::info!(learner_id, goal, "Daily goal reached");
        }

        Ok(ActivitySnapshot {
            streak: updated.streak,
            today_count: updated.today_count,
            goal_reached,
        })
    }
}
