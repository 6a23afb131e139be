#![cfg(feature = "logging")]

use logdash::config::{Config, LoggingConfig};
use logdash::logging::init_logging;
use logdash::{init, DashError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_init_fails_when_logger_already_set() {
    // Pre-initialize logger
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("cfg.toml");
    let mut cfg = Config::default();
    cfg.store.url = dir.path().join("logs.db").to_string_lossy().into_owned();
    fs::write(&config_path, cfg.to_toml_string().unwrap()).unwrap();

    let result = init(Some(config_path.to_str().unwrap()));
    assert!(matches!(result, Err(DashError::InvalidInput(_))));
    assert!(matches!(
        init_logging(&LoggingConfig::default()),
        Err(DashError::InvalidInput(_))
    ));
}
