// stemserve - 音源分离 HTTP 服务
//
// 接收上传的音频文件，调用外部分离工具，返回分离结果所在目录

pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod utils;

pub use audio::separator::{SeparationOutput, Separator};
pub use commands::router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use utils::AppState;
