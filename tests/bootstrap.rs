// tests/bootstrap.rs
//
// 全局 tracing subscriber 只能安装一次，因此单独成一个测试二进制

use std::fs;
use stemserve::commands::cli;
use tempfile::tempdir;

#[test]
fn malformed_config_warning_reaches_the_log_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let log_dir = dir.path().join("logs");
    fs::write(&config_path, "{ bad").unwrap();

    let (config, guard) = cli::init(&config_path, Some(log_dir.clone())).unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.log_dir, log_dir);

    // 释放 guard 以刷新异步写入
    drop(guard);

    let contents: String = fs::read_dir(&log_dir)
        .unwrap()
        .flatten()
        .filter(|e| e.path().is_file())
        .map(|e| fs::read_to_string(e.path()).unwrap_or_default())
        .collect();

    assert!(
        contents.contains("配置文件 JSON 解析失败"),
        "config parse warning missing from log: {:?}",
        contents
    );
    assert!(contents.contains("WARN"));
    assert!(contents.contains("[CONFIG] 配置已加载"));
}
