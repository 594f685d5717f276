use std::collections::BTreeMap;

use serde::Serialize;

use crate::clock::{local_day, Deadline};
use crate::error::CoreError;
use crate::services::{validate_id, Core};
use crate::store::operations::progress::WordStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStat {
    pub unit: u32,
    pub learned_count: u64,
    pub total_count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatsSummary {
    pub units: Vec<UnitStat>,
    pub total_learned: u64,
    pub total_words: u64,
    pub overall_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub current_streak: u32,
    pub daily_count: u32,
    pub daily_goal: u32,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(learned: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(learned as f64 / total as f64 * 100.0)
    }
}

impl Core {
    /// Per-unit learned counts (Review or Mastered) against the catalog
    /// totals, plus the overall aggregate.
    pub async fn stats_by_unit(
        &self,
        learner_id: &str,
        deadline: Deadline,
    ) -> Result<UnitStatsSummary, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;

        let totals = self.store().count_words_by_unit()?;
        let unit_by_word = self.store().word_units()?;

        let mut learned_by_unit: BTreeMap<u32, u64> = BTreeMap::new();
        for entry in self.store().progress_for_learner(learner_id)? {
            if matches!(entry.status, WordStatus::Review | WordStatus::Mastered) {
                if let Some(unit) = unit_by_word.get(&entry.word_id) {
                    *learned_by_unit.entry(*unit).or_insert(0) += 1;
                }
            }
        }

        let mut units = Vec::with_capacity(totals.len());
        let mut total_learned = 0;
        let mut total_words = 0;
        for (unit, total) in totals {
            let learned = learned_by_unit.get(&unit).copied().unwrap_or(0);
            total_learned += learned;
            total_words += total;
            units.push(UnitStat {
                unit,
                learned_count: learned,
                total_count: total,
                percent: percent(learned, total),
            });
        }

        Ok(UnitStatsSummary {
            units,
            total_learned,
            total_words,
            overall_percent: percent(total_learned, total_words),
        })
    }

    /// Streak and daily counters for the dashboard. A stored day that is no
    /// longer today reads as zero reviews; the streak itself only moves on
    /// review events.
    pub async fn stats_user(
        &self,
        learner_id: &str,
        deadline: Deadline,
    ) -> Result<UserStats, CoreError> {
        deadline.check(self.clock())?;
        validate_id("learner", learner_id)?;

        let goal = self.config().activity.daily_goal;
        let today = local_day(self.now(), self.config().activity.utc_offset);

        let stats = match self.store().get_activity(learner_id)? {
            Some(activity) => UserStats {
                current_streak: activity.streak,
                daily_count: if activity.today_day == Some(today) {
                    activity.today_count
                } else {
                    0
                },
                daily_goal: goal,
            },
            None => UserStats {
                current_streak: 0,
                daily_count: 0,
                daily_goal: goal,
            },
        };
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert!((percent(1, 3) - 33.3).abs() < 1e-9);
        assert!((percent(0, 0)).abs() < 1e-9);
        assert!((percent(2, 2) - 100.0).abs() < 1e-9);
    }
}
