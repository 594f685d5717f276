//! SM-2 间隔重复调度：纯函数，不做 I/O，不读时钟。

use crate::config::SchedulerConfig;
use crate::constants::MAX_INTERVAL_DAYS;

/// Quality below this counts as a failed recall.
pub const MIN_QUALITY_PASS: u8 = 3;

/// Highest quality on the canonical 0-5 scale.
pub const MAX_QUALITY: u8 = 5;

/// The SM-2 triple carried by each progress entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2State {
    pub repetition_number: u32,
    pub easiness_factor: f64,
    pub interval_days: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Sm2Params {
    pub ef_min: f64,
    pub ef_max: f64,
}

impl From<&SchedulerConfig> for Sm2Params {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            ef_min: config.ef_min,
            ef_max: config.ef_max,
        }
    }
}

impl Default for Sm2Params {
    fn default() -> Self {
        (&SchedulerConfig::default()).into()
    }
}

/// Binary answers enter the scheduler as quality 4 (known) / 1 (unknown).
pub fn quality_from_binary(is_known: bool) -> u8 {
    if is_known {
        4
    } else {
        1
    }
}

pub fn is_pass(quality: u8) -> bool {
    quality >= MIN_QUALITY_PASS
}

/// One SM-2 step. Callers validate quality <= 5 at the boundary; this
/// function is total and clamps rather than failing.
pub fn next_state(prior: Sm2State, quality: u8, params: Sm2Params) -> Sm2State {
    let q = f64::from(quality.min(MAX_QUALITY));
    let easiness_factor = (prior.easiness_factor
        + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02)))
        .clamp(params.ef_min, params.ef_max);

    if !is_pass(quality) {
        return Sm2State {
            repetition_number: 0,
            easiness_factor,
            interval_days: 1,
        };
    }

    let interval_days = match prior.repetition_number {
        0 => 1,
        1 => 6,
        // 四舍五入（half-up）到整天
        _ => (f64::from(prior.interval_days) * easiness_factor).round() as u32,
    };

    Sm2State {
        repetition_number: prior.repetition_number + 1,
        easiness_factor,
        // 通过的复习从不缩短间隔（如分类播种的 21 天、低重复数状态）
        interval_days: interval_days.max(prior.interval_days).clamp(1, MAX_INTERVAL_DAYS),
    }
}
