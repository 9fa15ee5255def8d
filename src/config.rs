// 配置管理模块

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 日志级别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    /// 转换为 tracing 过滤器字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 输出目录定位策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    /// 解析分离工具的标准输出
    Log,
    /// 扫描输出目录中本次运行产生的子目录
    Scan,
}

impl Default for LocatorKind {
    fn default() -> Self {
        Self::Log
    }
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传大小上限 (MB)，为空表示不限制
    pub max_upload_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_mb: None,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 上传文件目录
    pub uploads_dir: PathBuf,
    /// 文件保留时长 (小时)，为空表示永不清理
    pub retention_hours: Option<u64>,
    /// 清理任务间隔 (分钟)
    pub sweep_interval_minutes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            retention_hours: None,
            sweep_interval_minutes: 60,
        }
    }
}

/// 分离工具配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// 程序及其前置参数，例如 ["python3", "-m", "demucs"]
    pub command: Vec<String>,
    /// 分离结果根目录
    pub output_dir: PathBuf,
    /// 无法从输出中识别模型时使用的模型名
    pub default_model: String,
    pub locator: LocatorKind,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            command: vec!["demucs".to_string()],
            output_dir: PathBuf::from("separated_output"),
            default_model: "htdemucs".to_string(),
            locator: LocatorKind::default(),
        }
    }
}

impl SeparationConfig {
    /// 工具名称（命令的第一个元素）
    pub fn tool_name(&self) -> AppResult<&str> {
        self.command
            .first()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Config("separation.command must not be empty".to_string()))
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub separation: SeparationConfig,
    /// 日志级别
    #[serde(default)]
    pub log_level: LogLevel,
    /// 日志目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

pub(crate) fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// 读取配置文件，不存在时写入默认配置
pub fn load_config(config_path: &Path) -> AppResult<AppConfig> {
    let config = if config_path.exists() {
        let content = fs::read_to_string(config_path)?;
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("配置文件 JSON 解析失败: {}，使用默认配置", e);
            AppConfig::default()
        })
    } else {
        let config = AppConfig::default();
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&config)?;
        fs::write(config_path, content)?;
        config
    };

    info!("[CONFIG] 配置已加载: {}", config_path.display());

    config.separation.tool_name()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.separation.command, vec!["demucs".to_string()]);
        assert_eq!(config.separation.default_model, "htdemucs");
        assert_eq!(config.storage.uploads_dir, PathBuf::from("uploads"));
        assert!(config.storage.retention_hours.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"server": {"port": 9001}, "separation": {"locator": "scan"}, "log_level": "debug"}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.separation.locator, LocatorKind::Scan);
        assert_eq!(config.separation.output_dir, PathBuf::from("separated_output"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn empty_command_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"separation": {"command": []}}"#).unwrap();

        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
    }
}
