// 系统接口

use crate::config::SeparationConfig;
use crate::utils::{tool_command, DependencyCheck, MessageResponse};
use axum::Json;

/// GET /
pub async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the AI Music Separator API!".to_string(),
    })
}

/// 检查分离工具依赖
pub fn check_separation_tool(config: &SeparationConfig) -> DependencyCheck {
    let tool = config.command.first().cloned().unwrap_or_default();
    let (tool_path, mut cmd) = tool_command(&config.command);
    let output = cmd.arg("--help").output();

    if let Ok(output) = output {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(|s| s.to_string());
            return DependencyCheck {
                name: tool,
                available: true,
                version,
                path: Some(tool_path),
                message: "分离工具已安装".to_string(),
            };
        }
    }

    DependencyCheck {
        message: format!("分离工具 {} 未安装或无法运行，请安装后添加到 PATH", tool),
        name: tool,
        available: false,
        version: None,
        path: None,
    }
}

/// 在阻塞线程池中执行依赖检查，`--help` 可能要加载模型框架，耗时较长
pub async fn check_separation_tool_async(config: SeparationConfig) -> DependencyCheck {
    let tool = config.command.first().cloned().unwrap_or_default();
    match tokio::task::spawn_blocking(move || check_separation_tool(&config)).await {
        Ok(check) => check,
        Err(e) => DependencyCheck {
            message: format!("检查分离工具 {} 时出错: {}", tool, e),
            name: tool,
            available: false,
            version: None,
            path: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_returns_welcome_message() {
        let Json(body) = read_root().await;
        assert_eq!(body.message, "Welcome to the AI Music Separator API!");
    }

    #[test]
    fn missing_tool_is_reported_unavailable() {
        let config = SeparationConfig {
            command: vec!["definitely-not-a-separator-xyz".to_string()],
            ..SeparationConfig::default()
        };
        let check = check_separation_tool(&config);
        assert!(!check.available);
        assert!(check.path.is_none());
        assert_eq!(check.name, "definitely-not-a-separator-xyz");
    }

    #[tokio::test]
    async fn async_check_reports_missing_tool_from_worker_thread() {
        let config = SeparationConfig {
            command: vec!["definitely-not-a-separator-xyz".to_string()],
            ..SeparationConfig::default()
        };
        let check = check_separation_tool_async(config).await;
        assert!(!check.available);
        assert_eq!(check.name, "definitely-not-a-separator-xyz");
    }

    #[cfg(unix)]
    #[test]
    fn working_tool_is_reported_available() {
        let config = SeparationConfig {
            command: vec!["sh".to_string(), "-c".to_string(), "echo 'usage: stub'".to_string()],
            ..SeparationConfig::default()
        };
        let check = check_separation_tool(&config);
        assert!(check.available);
        assert_eq!(check.version.as_deref(), Some("usage: stub"));
    }
}
