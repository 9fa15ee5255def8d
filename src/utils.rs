// 工具模块

use crate::audio::separator::Separator;
use crate::config::AppConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

/// 构建调用外部工具的 Command
///
/// `command` 为程序名加前置参数，程序名经 `resolve_tool_path` 解析。stdin 置空，
/// Windows 下不弹出控制台窗口。返回解析后的程序路径和 Command。
pub fn tool_command(command: &[String]) -> (String, Command) {
    let (program, leading_args) = match command.split_first() {
        Some((program, rest)) => (resolve_tool_path(program), rest),
        None => (String::new(), &[][..]),
    };

    let mut cmd = Command::new(&program);
    cmd.args(leading_args).stdin(Stdio::null());

    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

    (program, cmd)
}

/// 应用状态，由所有请求共享
pub struct AppState {
    pub config: AppConfig,
    pub separator: Separator,
}

/// 简单消息响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 分离完成响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationResponse {
    pub message: String,
    pub output_path: String,
}

/// 依赖检查结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyCheck {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<String>,
    pub message: String,
}

/// 生成 UUID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 获取可执行文件所在目录
pub fn get_exe_dir() -> Option<PathBuf> {
    std::env::current_exe().ok()?.parent().map(|p| p.to_path_buf())
}

/// 解析程序路径
/// 优先使用与可执行文件一同打包的版本，否则使用系统 PATH 中的版本
pub fn resolve_tool_path(tool_name: &str) -> String {
    // 已经是路径的不做处理
    if tool_name.contains('/') || tool_name.contains('\\') {
        return tool_name.to_string();
    }

    let file_name = if cfg!(target_os = "windows") {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    };

    if let Some(exe_dir) = get_exe_dir() {
        // 打包版本：exe目录/<tool>/<tool>
        let bundled_path = exe_dir.join(tool_name).join(&file_name);
        if bundled_path.is_file() {
            return bundled_path.to_string_lossy().to_string();
        }

        let sibling_path = exe_dir.join(&file_name);
        if sibling_path.is_file() {
            return sibling_path.to_string_lossy().to_string();
        }
    }

    tool_name.to_string()
}

/// 计算目录大小
pub fn calculate_dir_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| fs::metadata(e.path()).map(|m| m.len()).unwrap_or(0))
        .sum()
}
