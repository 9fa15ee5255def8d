// 日志管理模块
// 文件日志按天轮转并异步写入，控制台日志输出到 stderr

use crate::config::{default_log_dir, LogLevel};
use crate::storage::{sweep_expired_matching, SweepReport};
use std::fs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志保留天数
const LOG_RETENTION_DAYS: u64 = 7;

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "stemserve.log";

/// 日志相关配置项，在完整加载配置前单独读取
#[derive(Debug, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: default_log_dir(),
        }
    }
}

/// 从配置文件读取日志级别和目录，文件缺失或无法解析时使用默认值
pub fn read_log_settings(config_path: &Path) -> LogSettings {
    fs::read_to_string(config_path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// 初始化日志系统
///
/// 返回 WorkerGuard，必须在 main 函数中保持存活，否则异步日志线程会提前退出
pub fn init_logging(log_dir: &Path, log_level: &LogLevel) -> WorkerGuard {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("创建日志目录失败: {}", e);
    }

    cleanup_old_logs(log_dir, SystemTime::now());

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // hyper/tower 只记录 warn，减少 HTTP 库噪音
    let filter_string = format!("{},hyper=warn,tower_http=warn", log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_string));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true);

    // stdout 留给 `separate` 子命令输出结果路径
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

/// 删除日志目录中超过保留期限的 stemserve.log* 文件
fn cleanup_old_logs(log_dir: &Path, now: SystemTime) -> SweepReport {
    let retention = Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);
    sweep_expired_matching(log_dir, retention, now, |path| {
        path.parent() == Some(log_dir)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |name| name.starts_with(LOG_FILE_PREFIX))
    })
}
