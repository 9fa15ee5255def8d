// stemserve - 主入口文件

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stemserve::commands::cli;
use stemserve::commands::system::check_separation_tool_async;
use stemserve::{config, storage, AppError, AppState, Separator};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "stemserve",
    version,
    about = "HTTP service that separates uploaded audio into stems with an external tool"
)]
struct Cli {
    /// Path to the JSON config file (created with defaults if missing)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for log files, overrides log_dir
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind, overrides server.host
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Separate a single local file and print the output directory
    Separate {
        /// Audio file to separate
        file: PathBuf,
    },
    /// Check that the separation tool can be launched
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // guard 必须保持存活，否则异步日志线程会退出
    let (mut app_config, _log_guard) = cli::init(&args.config, args.log_dir)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;

    match args.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                app_config.server.host = host;
            }
            if let Some(port) = port {
                app_config.server.port = port;
            }
            serve(app_config).await
        }
        Commands::Separate { file } => separate_once(app_config, file).await,
        Commands::Check => {
            let check = check_separation_tool_async(app_config.separation).await;
            println!("{}", serde_json::to_string_pretty(&check)?);
            if !check.available {
                anyhow::bail!("{}", check.message);
            }
            Ok(())
        }
    }
}

async fn serve(app_config: config::AppConfig) -> Result<()> {
    info!("stemserve 启动中...");

    storage::ensure_dirs(&app_config).context("创建存储目录失败")?;

    let check = check_separation_tool_async(app_config.separation.clone()).await;
    if !check.available {
        warn!("{}", check.message);
    }

    let _retention = storage::spawn_retention_task(&app_config);

    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let separator = Separator::new(app_config.separation.clone())?;
    let state = Arc::new(AppState {
        config: app_config,
        separator,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;
    info!("HTTP 服务已启动: http://{}", addr);

    axum::serve(listener, stemserve::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("收到退出信号，正在关闭");
        })
        .await
        .context("HTTP 服务异常退出")
}

async fn separate_once(app_config: config::AppConfig, file: PathBuf) -> Result<()> {
    let result =
        tokio::task::spawn_blocking(move || cli::separate_file(app_config.separation, &file)).await?;

    match result {
        Ok(output) => {
            if !output.exact {
                eprintln!("Warning: expected stem directory not found, returning base output directory");
            }
            println!("{}", output.path.display());
            Ok(())
        }
        Err(AppError::ToolFailed { tool, code, stdout, stderr }) => {
            eprintln!("--- STDOUT ---\n{}", stdout);
            eprintln!("--- STDERR ---\n{}", stderr);
            anyhow::bail!("{} exited with status {:?}", tool, code)
        }
        Err(e) => Err(e.into()),
    }
}
