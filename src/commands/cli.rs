// 命令行入口共用逻辑

use crate::audio::separator::{SeparationOutput, Separator};
use crate::config::{self, AppConfig, SeparationConfig};
use crate::error::{AppError, AppResult};
use crate::logging;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;

/// 先按配置文件中的日志项初始化日志，再完整加载配置
///
/// 这样加载配置时的告警（如 JSON 解析失败）能写入日志。
/// 返回的 WorkerGuard 必须保持存活。
pub fn init(config_path: &Path, log_dir: Option<PathBuf>) -> AppResult<(AppConfig, WorkerGuard)> {
    let settings = logging::read_log_settings(config_path);
    let log_dir = log_dir.unwrap_or(settings.log_dir);
    let guard = logging::init_logging(&log_dir, &settings.log_level);

    let mut app_config = config::load_config(config_path)?;
    app_config.log_dir = log_dir;
    Ok((app_config, guard))
}

/// 直接分离单个本地文件，不经过 HTTP
///
/// 输入无效时返回 `AppError::SeparationFailed`
pub fn separate_file(separation: SeparationConfig, file: &Path) -> AppResult<SeparationOutput> {
    fs::create_dir_all(&separation.output_dir)?;
    let separator = Separator::new(separation)?;

    let output = separator
        .separate(file)?
        .ok_or(AppError::SeparationFailed)?;

    if !output.exact {
        warn!("未找到预期的分离结果目录，返回输出根目录: {}", output.path.display());
    }
    Ok(output)
}
