// 错误处理模块

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to save file: {0}")]
    Upload(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// 输入文件无效等情况，详细原因只写日志
    #[error("Separation failed. Check server logs.")]
    SeparationFailed,

    #[error("Separation tool not found: {0}")]
    ToolMissing(String),

    #[error("{tool} process failed")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 响应体中的 `detail` 字段
    pub fn detail(&self) -> Value {
        match self {
            AppError::ToolFailed { stdout, stderr, .. } => json!({
                "error": self.to_string(),
                "stdout": stdout,
                "stderr": stderr,
            }),
            AppError::Io(_) | AppError::Json(_) | AppError::Config(_) => {
                Value::String(format!("An unexpected error occurred: {}", self))
            }
            _ => Value::String(self.to_string()),
        }
    }
}

// 通过 HTTP 返回错误
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_detail_carries_streams_verbatim() {
        let err = AppError::ToolFailed {
            tool: "demucs".to_string(),
            code: Some(2),
            stdout: "loading model\n".to_string(),
            stderr: "CUDA out of memory\n".to_string(),
        };

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.detail(),
            json!({
                "error": "demucs process failed",
                "stdout": "loading model\n",
                "stderr": "CUDA out of memory\n",
            })
        );
    }

    #[test]
    fn plain_errors_render_as_strings() {
        assert_eq!(
            AppError::SeparationFailed.detail(),
            json!("Separation failed. Check server logs.")
        );
        assert_eq!(
            AppError::ToolMissing("demucs".into()).detail(),
            json!("Separation tool not found: demucs")
        );
        assert_eq!(
            AppError::Upload("disk full".into()).detail(),
            json!("Failed to save file: disk full")
        );
    }

    #[test]
    fn io_errors_fall_into_the_unexpected_bucket() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.detail(), json!("An unexpected error occurred: IO error: boom"));

        let err = AppError::Config("separation.command must not be empty".into());
        assert_eq!(
            err.detail(),
            json!("An unexpected error occurred: Configuration error: separation.command must not be empty")
        );
    }

    #[test]
    fn invalid_argument_maps_to_422() {
        let err = AppError::InvalidArgument("Missing multipart field 'file'".into());
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
