// 音源分离模块 - 调用外部分离工具 (默认 demucs)

use crate::audio::locator::{locator_for, LocateContext, OutputLocator};
use crate::config::SeparationConfig;
use crate::error::{AppError, AppResult};
use crate::utils::tool_command;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info, warn};

/// 一次成功分离的结果
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationOutput {
    /// 分离结果所在目录
    pub path: PathBuf,
    /// 推断出的模型名
    pub model: String,
    /// false 表示候选目录不存在，path 已退回为输出根目录
    pub exact: bool,
}

pub struct Separator {
    config: SeparationConfig,
    locator: Box<dyn OutputLocator>,
}

impl Separator {
    pub fn new(config: SeparationConfig) -> AppResult<Self> {
        config.tool_name()?;
        let locator = locator_for(config.locator);
        Ok(Self { config, locator })
    }

    pub fn with_locator(config: SeparationConfig, locator: Box<dyn OutputLocator>) -> AppResult<Self> {
        config.tool_name()?;
        Ok(Self { config, locator })
    }

    pub fn tool_name(&self) -> &str {
        self.config.command.first().map(|s| s.as_str()).unwrap_or_default()
    }

    /// 对输入文件执行分离
    ///
    /// 输入无效时返回 `Ok(None)`，不会启动子进程。工具退出码非零时返回
    /// `AppError::ToolFailed`，其中带有完整的 stdout/stderr。
    pub fn separate(&self, input_path: &Path) -> AppResult<Option<SeparationOutput>> {
        if !input_path.exists() {
            error!("输入文件不存在: {}", input_path.display());
            return Ok(None);
        }
        if !input_path.is_file() {
            error!("输入路径不是文件: {}", input_path.display());
            return Ok(None);
        }

        let output_dir = &self.config.output_dir;
        let input_stem = input_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let tool = self.tool_name().to_string();
        let (_, mut cmd) = tool_command(&self.config.command);
        cmd.arg("-o").arg(output_dir).arg(input_path);

        info!("开始分离: {}", input_path.display());
        info!(
            "分离命令: {} -o {} {}",
            self.config.command.join(" "),
            output_dir.display(),
            input_path.display()
        );

        let started_at = SystemTime::now();
        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!("未找到分离工具 '{}'，请确认已安装并在 PATH 中", tool);
                return Err(AppError::ToolMissing(tool));
            }
            Err(e) => {
                error!("启动分离工具失败: {}", e);
                return Err(AppError::Io(e));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            error!("分离工具处理失败，退出码: {:?}", output.status.code());
            error!("--- STDOUT ---\n{}", stdout);
            error!("--- STDERR ---\n{}", stderr);
            return Err(AppError::ToolFailed {
                tool,
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        info!("分离工具处理成功");

        let ctx = LocateContext {
            output_dir,
            input_stem: &input_stem,
            stdout: &stdout,
            default_model: &self.config.default_model,
            started_at,
        };
        let candidate = self.locator.locate(&ctx);
        let model = candidate
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.config.default_model.clone());

        if !candidate.exists() {
            warn!(
                "未找到预期的输出目录 '{}' (定位方式: {})，返回输出根目录",
                candidate.display(),
                self.locator.name()
            );
            return Ok(Some(SeparationOutput {
                path: output_dir.clone(),
                model,
                exact: false,
            }));
        }

        info!("分离结果目录: {}", candidate.display());
        Ok(Some(SeparationOutput {
            path: candidate,
            model,
            exact: true,
        }))
    }
}
