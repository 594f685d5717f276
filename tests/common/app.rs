use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use vocab_core::clock::ManualClock;
use vocab_core::config::CoreConfig;
use vocab_core::logging::{init_tracing, LogConfig};
use vocab_core::services::Core;
use vocab_core::store::Store;

pub struct TestCore {
    pub core: Core,
    pub clock: Arc<ManualClock>,
    _temp_dir: TempDir,
}

/// 所有测试将时钟钉在本地午夜，使日界取整后的调度时间可以精确断言。
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

pub fn spawn_core() -> TestCore {
    spawn_core_with(CoreConfig::default())
}

pub fn spawn_core_with(mut config: CoreConfig) -> TestCore {
    init_tracing(&LogConfig::from(&config));

    let temp_dir = tempfile::tempdir().expect("tempdir");
    config.sled_path = temp_dir
        .path()
        .join("vocab-test.sled")
        .to_string_lossy()
        .to_string();

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let clock = Arc::new(ManualClock::new(test_epoch()));
    let core = Core::new(store, clock.clone(), config);

    TestCore {
        core,
        clock,
        _temp_dir: temp_dir,
    }
}
