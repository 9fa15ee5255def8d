// 上传与分离接口

use crate::error::{AppError, AppResult};
use crate::storage::{save_upload, upload_path};
use crate::utils::{generate_id, AppState, SeparationResponse};
use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// 表单中文件字段名
const FILE_FIELD: &str = "file";

/// POST /separate/
///
/// 保存上传文件后同步执行分离，请求在子进程结束前不会返回
pub async fn separate_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<SeparationResponse>> {
    let request_id = generate_id();
    let span = tracing::info_span!("separate", request_id = %request_id);
    handle_upload(state, multipart).instrument(span).await
}

async fn handle_upload(
    state: Arc<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<SeparationResponse>> {
    let mut saved = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let path = upload_path(&state.config.storage.uploads_dir, &filename)?;
        let size = save_upload(field, &path).await.map_err(|e| {
            error!("保存上传文件失败: {}", e);
            e
        })?;

        info!("文件已保存: {} ({} 字节)", path.display(), size);
        saved = Some(path);
        break;
    }

    let input_path = saved
        .ok_or_else(|| AppError::InvalidArgument(format!("Missing multipart field '{}'", FILE_FIELD)))?;

    // 子进程等待放在阻塞线程池中执行；客户端断开不会终止子进程
    let separator_state = state.clone();
    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        separator_state.separator.separate(&input_path)
    })
    .await
    .map_err(|e| AppError::Unexpected(e.to_string()))?;

    let output = match result {
        Ok(Some(output)) => output,
        Ok(None) => return Err(AppError::SeparationFailed),
        Err(e @ (AppError::ToolFailed { .. } | AppError::ToolMissing(_))) => return Err(e),
        Err(e) => return Err(AppError::Unexpected(e.to_string())),
    };

    info!("分离完成，结果目录: {}", output.path.display());

    Ok(Json(SeparationResponse {
        message: "Separation complete!".to_string(),
        output_path: output.path.display().to_string(),
    }))
}
