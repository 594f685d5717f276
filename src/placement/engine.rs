//! "Sorting hat" placement logic: a bounded binary search over the
//! difficulty spectrum with periodic regression probes. Pure functions;
//! persistence and word sampling live in the service layer.

use crate::config::PlacementConfig;
use crate::constants::{MAX_DIFFICULTY_RANK, MIN_DIFFICULTY_RANK};

/// Closed difficulty interval the search is narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub min: u8,
    pub max: u8,
}

impl Range {
    pub fn full() -> Self {
        Self {
            min: MIN_DIFFICULTY_RANK,
            max: MAX_DIFFICULTY_RANK,
        }
    }

    pub fn span(self) -> u8 {
        self.max - self.min
    }
}

pub fn midpoint(range: Range) -> u8 {
    ((u16::from(range.min) + u16::from(range.max)) / 2) as u8
}

/// The question about to be asked (question_count answered so far) is a
/// regression probe at every REGRESSION_INTERVAL-th position.
pub fn is_probe_position(question_count: u32, config: &PlacementConfig) -> bool {
    config.regression_interval > 0 && (question_count + 1) % config.regression_interval == 0
}

/// Probe target: a rank below the established lower bound, to catch
/// false-positive "known" answers.
pub fn probe_target(current_min: u8, config: &PlacementConfig) -> u8 {
    let scaled = (f64::from(current_min) * config.regression_factor).floor() as u8;
    scaled.max(MIN_DIFFICULTY_RANK)
}

/// Bounds update for one answer, evaluated against the target rank the
/// question was selected with. A confirmed probe leaves the range alone; a
/// failed probe pulls the lower bound down into the probe region.
pub fn apply_answer(
    range: Range,
    target: u8,
    was_probe: bool,
    was_known: bool,
    config: &PlacementConfig,
) -> Range {
    if was_probe {
        if was_known {
            range
        } else {
            Range {
                min: probe_target(range.min, config),
                max: range.max,
            }
        }
    } else if was_known {
        Range {
            // min 永不越过 max，保证区间不变式成立
            min: target.saturating_add(1).min(range.max),
            max: range.max,
        }
    } else {
        Range {
            min: range.min,
            max: target.max(range.min),
        }
    }
}

pub fn should_stop(range: Range, question_count: u32, config: &PlacementConfig) -> bool {
    range.span() < config.min_range || question_count >= config.max_questions
}

pub fn final_level(range: Range) -> u8 {
    midpoint(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlacementConfig {
        PlacementConfig::default()
    }

    #[test]
    fn probe_positions_are_every_fifth() {
        let cfg = config();
        let probes: Vec<u32> = (0..20)
            .filter(|count| is_probe_position(*count, &cfg))
            .map(|count| count + 1)
            .collect();
        assert_eq!(probes, vec![5, 10, 15, 20]);
    }

    #[test]
    fn probe_target_floors_and_clamps() {
        let cfg = config();
        assert_eq!(probe_target(58, &cfg), 46);
        assert_eq!(probe_target(1, &cfg), 1);
    }

    #[test]
    fn converges_around_level_61() {
        // Binary search trace for a learner whose true level is ~60.
        let cfg = config();
        let mut range = Range::full();
        let mut count = 0;

        let mut answer = |range: &mut Range, count: &mut u32, known: bool| {
            let probe = is_probe_position(*count, &cfg);
            let target = if probe {
                probe_target(range.min, &cfg)
            } else {
                midpoint(*range)
            };
            *range = apply_answer(*range, target, probe, known, &cfg);
            *count += 1;
            (target, probe)
        };

        assert_eq!(answer(&mut range, &mut count, true), (50, false));
        assert_eq!(range, Range { min: 51, max: 100 });
        assert_eq!(answer(&mut range, &mut count, false), (75, false));
        assert_eq!(range, Range { min: 51, max: 75 });
        assert_eq!(answer(&mut range, &mut count, false), (63, false));
        assert_eq!(range, Range { min: 51, max: 63 });
        assert_eq!(answer(&mut range, &mut count, true), (57, false));
        assert_eq!(range, Range { min: 58, max: 63 });
        // 第 5 题是回归探测，确认后区间不变
        assert_eq!(answer(&mut range, &mut count, true), (46, true));
        assert_eq!(range, Range { min: 58, max: 63 });
        assert_eq!(answer(&mut range, &mut count, true), (60, false));
        assert_eq!(range, Range { min: 61, max: 63 });
        assert!(!should_stop(range, count, &cfg));
        assert_eq!(answer(&mut range, &mut count, false), (62, false));
        assert_eq!(range, Range { min: 61, max: 62 });
        assert!(should_stop(range, count, &cfg));
        assert_eq!(final_level(range), 61);
    }

    #[test]
    fn failed_probe_pulls_min_down() {
        let cfg = config();
        let range = Range { min: 60, max: 80 };
        let next = apply_answer(range, 48, true, false, &cfg);
        assert_eq!(next, Range { min: 48, max: 80 });
    }

    #[test]
    fn bounds_stay_ordered_at_the_edges() {
        let cfg = config();
        let narrow = Range { min: 99, max: 100 };
        let after_known = apply_answer(narrow, midpoint(narrow), false, true, &cfg);
        assert!(after_known.min <= after_known.max);
        let after_unknown = apply_answer(narrow, midpoint(narrow), false, false, &cfg);
        assert!(after_unknown.min <= after_unknown.max);
    }

    #[test]
    fn question_budget_stops_the_search() {
        let cfg = config();
        let wide = Range { min: 1, max: 100 };
        assert!(!should_stop(wide, 19, &cfg));
        assert!(should_stop(wide, 20, &cfg));
    }
}
