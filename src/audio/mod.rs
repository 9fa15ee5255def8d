// 音频处理模块
//
// 子模块：
// - separator: 音源分离（调用外部命令行工具，默认 demucs）
// - locator: 推断分离结果所在目录

pub mod locator;
pub mod separator;
