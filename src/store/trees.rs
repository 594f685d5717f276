//! Sled tree 名称常量。
//!
//! 修改 tree 名称会导致数据不可访问，请勿随意更改。

pub const WORDS: &str = "words";
pub const PROGRESS: &str = "progress";
pub const PLACEMENT_SESSIONS: &str = "placement_sessions";
/// learner_id -> 活跃测评会话 id 的唯一索引
pub const PLACEMENT_ACTIVE: &str = "idx_placement_active";
pub const DAILY_ACTIVITY: &str = "daily_activity";
pub const META: &str = "meta";
