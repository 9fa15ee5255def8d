// 存储模块：上传文件落盘、目录初始化、过期文件清理

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::utils::calculate_dir_size;
use axum::extract::multipart::Field;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// 创建上传目录和分离输出目录
pub fn ensure_dirs(config: &AppConfig) -> AppResult<()> {
    fs::create_dir_all(&config.storage.uploads_dir)?;
    fs::create_dir_all(&config.separation.output_dir)?;
    info!(
        "上传目录: {} ({} 字节), 输出目录: {} ({} 字节)",
        config.storage.uploads_dir.display(),
        calculate_dir_size(&config.storage.uploads_dir),
        config.separation.output_dir.display(),
        calculate_dir_size(&config.separation.output_dir)
    );
    Ok(())
}

/// 由客户端文件名得到落盘路径
///
/// 只保留最后一个路径分量，同名文件直接覆盖
pub fn upload_path(uploads_dir: &Path, filename: &str) -> AppResult<PathBuf> {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::InvalidArgument(format!("Invalid filename: {:?}", filename)));
    }

    Ok(uploads_dir.join(name))
}

/// 把 multipart 字段流式写入文件，已存在时截断覆盖
pub async fn save_upload(mut field: Field<'_>, dest: &Path) -> AppResult<u64> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    let mut written = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| AppError::Upload(e.to_string()))?;
    Ok(written)
}

/// 清理结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    pub files_removed: u64,
    pub bytes_freed: u64,
    pub dirs_removed: u64,
}

/// 删除 root 下修改时间早于 max_age 的文件，再删除因此变空的子目录
///
/// root 本身保留
pub fn sweep_expired(root: &Path, max_age: Duration, now: SystemTime) -> SweepReport {
    sweep_expired_matching(root, max_age, now, |_| true)
}

/// 同 `sweep_expired`，但只删除 `matches` 返回 true 的文件
pub fn sweep_expired_matching<F>(root: &Path, max_age: Duration, now: SystemTime, matches: F) -> SweepReport
where
    F: Fn(&Path) -> bool,
{
    let mut report = SweepReport::default();
    if !root.exists() {
        return report;
    }

    // contents_first 保证先处理文件再处理其所在目录
    for entry in walkdir::WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .flatten()
    {
        let path = entry.path();

        if entry.file_type().is_dir() {
            let is_empty = fs::read_dir(path).map(|mut it| it.next().is_none()).unwrap_or(false);
            if is_empty && fs::remove_dir(path).is_ok() {
                report.dirs_removed += 1;
            }
            continue;
        }

        if !matches(path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let expired = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .map(|age| age > max_age)
            .unwrap_or(false);

        if !expired {
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                report.files_removed += 1;
                report.bytes_freed += metadata.len();
            }
            Err(e) => warn!("删除过期文件失败 {:?}: {}", path, e),
        }
    }

    report
}

/// 启动后台清理任务；未配置保留时长时不启动
pub fn spawn_retention_task(config: &AppConfig) -> Option<tokio::task::JoinHandle<()>> {
    let hours = config.storage.retention_hours?;
    let max_age = Duration::from_secs(hours * 60 * 60);
    let interval = Duration::from_secs(config.storage.sweep_interval_minutes.max(1) * 60);
    let roots = vec![
        config.storage.uploads_dir.clone(),
        config.separation.output_dir.clone(),
    ];

    info!("[STORAGE] 启用过期清理: 保留 {} 小时, 间隔 {:?}", hours, interval);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let roots = roots.clone();
            let result = tokio::task::spawn_blocking(move || {
                let now = SystemTime::now();
                roots
                    .iter()
                    .map(|root| (root.clone(), sweep_expired(root, max_age, now)))
                    .collect::<Vec<_>>()
            })
            .await;

            match result {
                Ok(reports) => {
                    for (root, report) in reports {
                        if report.files_removed > 0 || report.dirs_removed > 0 {
                            info!(
                                "[STORAGE] 清理 {}: 删除 {} 个文件, {} 个目录, 释放 {} 字节",
                                root.display(),
                                report.files_removed,
                                report.dirs_removed,
                                report.bytes_freed
                            );
                        }
                    }
                }
                Err(e) => warn!("[STORAGE] 清理任务异常: {}", e),
            }
        }
    }))
}
