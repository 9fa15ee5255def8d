// 测试公共工具：用 shell 脚本模拟分离工具

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use stemserve::config::{AppConfig, SeparationConfig};

/// 成功：声明模型 mymodel 并创建 <out>/mymodel/<stem>/vocals.wav
pub const SUCCESS_STUB: &str = r#"
out="$2"
name=$(basename "$3")
stem="${name%.*}"
echo "Loading audio"
echo "Selected model is 'mymodel'."
mkdir -p "$out/mymodel/$stem"
cp "$3" "$out/mymodel/$stem/vocals.wav"
"#;

/// 失败：写出 stdout/stderr 后以 3 退出
pub const FAILING_STUB: &str = r#"
echo "Separating track 1/1"
echo "RuntimeError: could not decode audio" >&2
exit 3
"#;

/// 成功退出但不创建输出目录
pub const NO_OUTPUT_STUB: &str = r#"
echo "Selected model is 'ghost'."
exit 0
"#;

/// 写入桩脚本，返回其路径
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    path
}

/// 每次被调用时向 marker 追加一行
pub fn counting_stub(dir: &Path, marker: &Path) -> PathBuf {
    write_stub(
        dir,
        "counting.sh",
        &format!("echo called >> '{}'\nexit 0\n", marker.display()),
    )
}

pub fn separation_config(script: &Path, output_dir: &Path) -> SeparationConfig {
    SeparationConfig {
        command: vec!["sh".to_string(), script.display().to_string()],
        output_dir: output_dir.to_path_buf(),
        ..SeparationConfig::default()
    }
}

pub fn app_config(root: &Path, separation: SeparationConfig) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.uploads_dir = root.join("uploads");
    config.separation = separation;
    config.log_dir = root.join("logs");
    config
}
