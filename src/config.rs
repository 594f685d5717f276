use std::env;
use std::str::FromStr;

use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub sled_path: String,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub placement: PlacementConfig,
    pub scheduler: SchedulerConfig,
    pub activity: ActivityConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct PlacementConfig {
    pub max_questions: u32,
    pub min_range: u8,
    pub regression_interval: u32,
    pub regression_factor: f64,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub ef_min: f64,
    pub ef_max: f64,
    pub mastery_threshold_days: u32,
    pub mastery_seed_days: u32,
}

#[derive(Debug, Clone)]
pub struct ActivityConfig {
    pub daily_goal: u32,
    /// 学习者日界偏移（相对 UTC），未知时区时保持 UTC
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_questions: 20,
            min_range: 5,
            regression_interval: 5,
            regression_factor: 0.80,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ef_min: 1.3,
            ef_max: 2.5,
            mastery_threshold_days: 21,
            mastery_seed_days: 21,
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            daily_goal: 15,
            utc_offset: utc_offset_from_minutes(0),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            sled_path: "./data/vocab.sled".to_string(),
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
            placement: PlacementConfig::default(),
            scheduler: SchedulerConfig::default(),
            activity: ActivityConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// MASTERY_THRESHOLD 的允许下限（天）
const MIN_MASTERY_THRESHOLD_DAYS: u32 = 14;

impl CoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut scheduler = SchedulerConfig {
            ef_min: env_or_parse("EF_MIN", defaults.scheduler.ef_min),
            ef_max: env_or_parse("EF_MAX", defaults.scheduler.ef_max),
            mastery_threshold_days: env_or_parse(
                "MASTERY_THRESHOLD_DAYS",
                defaults.scheduler.mastery_threshold_days,
            ),
            mastery_seed_days: env_or_parse(
                "MASTERY_SEED_DAYS",
                defaults.scheduler.mastery_seed_days,
            ),
        };
        if scheduler.mastery_threshold_days < MIN_MASTERY_THRESHOLD_DAYS {
            tracing::warn!(
                configured = scheduler.mastery_threshold_days,
                minimum = MIN_MASTERY_THRESHOLD_DAYS,
                "MASTERY_THRESHOLD_DAYS below minimum, clamping"
            );
            scheduler.mastery_threshold_days = MIN_MASTERY_THRESHOLD_DAYS;
        }
        if scheduler.ef_min >= scheduler.ef_max {
            tracing::warn!(
                ef_min = scheduler.ef_min,
                ef_max = scheduler.ef_max,
                "EF bounds inverted, falling back to defaults"
            );
            scheduler.ef_min = defaults.scheduler.ef_min;
            scheduler.ef_max = defaults.scheduler.ef_max;
        }

        Self {
            sled_path: env_or("SLED_PATH", &defaults.sled_path),
            log_level: env_or("RUST_LOG", &defaults.log_level),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", defaults.enable_file_logs),
            log_dir: env_or("LOG_DIR", &defaults.log_dir),
            placement: PlacementConfig {
                max_questions: env_or_parse("MAX_QUESTIONS", defaults.placement.max_questions),
                min_range: env_or_parse("MIN_RANGE", defaults.placement.min_range),
                regression_interval: env_or_parse(
                    "REGRESSION_INTERVAL",
                    defaults.placement.regression_interval,
                ),
                regression_factor: env_or_parse(
                    "REGRESSION_FACTOR",
                    defaults.placement.regression_factor,
                ),
            },
            scheduler,
            activity: ActivityConfig {
                daily_goal: env_or_parse("DAILY_GOAL", defaults.activity.daily_goal),
                utc_offset: utc_offset_from_minutes(env_or_parse(
                    "LEARNER_UTC_OFFSET_MINUTES",
                    0_i32,
                )),
            },
            session: SessionConfig {
                default_limit: env_or_parse("SESSION_LIMIT", defaults.session.default_limit),
                max_limit: env_or_parse("SESSION_MAX_LIMIT", defaults.session.max_limit),
            },
        }
    }
}

/// 将分钟偏移转换为 FixedOffset，越界时回退 UTC
pub fn utc_offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.clamp(-14 * 60, 14 * 60) * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is always valid"))
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
