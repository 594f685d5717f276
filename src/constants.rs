/// CAS（Compare-And-Swap）操作最大重试次数
pub const MAX_CAS_RETRIES: u32 = 20;

/// SM-2 初始易记因子
pub const INITIAL_EASINESS_FACTOR: f64 = 2.5;

/// SM-2 复习间隔上限（天）
pub const MAX_INTERVAL_DAYS: u32 = 365;

/// 难度谱下界
pub const MIN_DIFFICULTY_RANK: u8 = 1;

/// 难度谱上界
pub const MAX_DIFFICULTY_RANK: u8 = 100;

/// 回归探测采样窗口（目标排名 ±5）
pub const PROBE_SAMPLE_WINDOW: u8 = 5;

/// 默认干扰项数量
pub const DEFAULT_DISTRACTOR_COUNT: usize = 3;

/// 干扰项难度带宽（目标排名 ±10，不足时按此步长扩大）
pub const DISTRACTOR_BAND_STEP: u8 = 10;
