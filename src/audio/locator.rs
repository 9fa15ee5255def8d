// 输出目录定位
//
// 分离工具按自己选择的模型命名输出子目录：<output_dir>/<model>/<input_stem>/
// 该模型名无法在调用前可靠得知，只能事后推断。这里的两种策略都只给出候选路径，
// 是否存在由调用方确认。

use crate::config::LocatorKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// 文件系统时间戳精度有限，比较修改时间时放宽的余量
const MTIME_SLACK: Duration = Duration::from_secs(2);

/// 标准输出中声明模型的行
static MODEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Selected model|default model").expect("模型行正则无效")
});

/// 单次分离的定位上下文
pub struct LocateContext<'a> {
    pub output_dir: &'a Path,
    pub input_stem: &'a str,
    pub stdout: &'a str,
    pub default_model: &'a str,
    /// 子进程启动时间
    pub started_at: SystemTime,
}

pub trait OutputLocator: Send + Sync {
    fn name(&self) -> &'static str;

    /// 返回候选输出目录
    fn locate(&self, ctx: &LocateContext<'_>) -> PathBuf;
}

/// 根据配置创建定位器
pub fn locator_for(kind: LocatorKind) -> Box<dyn OutputLocator> {
    match kind {
        LocatorKind::Log => Box::new(LogLocator),
        LocatorKind::Scan => Box::new(ScanLocator),
    }
}

/// 从分离工具的标准输出中推断模型名
///
/// 取第一行包含 "Selected model" 或 "default model" 的最后一个词，
/// 去掉两端的引号和句点。找不到时返回 `default_model`。
pub fn infer_model_name(stdout: &str, default_model: &str) -> String {
    let line = match stdout.lines().find(|line| MODEL_LINE.is_match(line)) {
        Some(line) => line,
        None => return default_model.to_string(),
    };

    let model = line
        .split_whitespace()
        .last()
        .map(|token| token.trim_matches(|c| c == '\'' || c == '"' || c == '.'))
        .unwrap_or_default();

    if model.is_empty() {
        default_model.to_string()
    } else {
        model.to_string()
    }
}

/// 解析日志文本
pub struct LogLocator;

impl OutputLocator for LogLocator {
    fn name(&self) -> &'static str {
        "log"
    }

    fn locate(&self, ctx: &LocateContext<'_>) -> PathBuf {
        let model = infer_model_name(ctx.stdout, ctx.default_model);
        debug!("从输出推断模型: {}", model);
        ctx.output_dir.join(model).join(ctx.input_stem)
    }
}

/// 扫描 <output_dir>/*/<input_stem>，取本次运行后修改过的最新目录
pub struct ScanLocator;

impl OutputLocator for ScanLocator {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn locate(&self, ctx: &LocateContext<'_>) -> PathBuf {
        let threshold = ctx.started_at.checked_sub(MTIME_SLACK).unwrap_or(ctx.started_at);
        let newest = walkdir::WalkDir::new(ctx.output_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_dir() && e.file_name().to_str() == Some(ctx.input_stem))
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                (modified >= threshold).then(|| (modified, e.into_path()))
            })
            .max_by_key(|(modified, _)| *modified);

        match newest {
            Some((_, path)) => {
                debug!("扫描到输出目录: {}", path.display());
                path
            }
            None => {
                debug!("扫描未找到本次输出，退回日志解析");
                LogLocator.locate(ctx)
            }
        }
    }
}
