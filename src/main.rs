use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use docs_pdf_fetcher::{logger, App, ChromiumLauncher, Config};
use tracing::error;

/// 全部成功
const EXIT_OK: u8 = 0;
/// 初始化失败（配置、启动浏览器、扫描列表页）
const EXIT_SETUP_FAILED: u8 = 1;
/// 至少一本书失败
const EXIT_BOOKS_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::from(EXIT_SETUP_FAILED)
        }
    }
}

async fn run() -> Result<u8> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init_with(config.as_ref().map(|c| c.verbose_logging).unwrap_or(false));

    let config = config.context("加载配置失败")?;
    let launcher = ChromiumLauncher::new(config.chrome_executable.as_ref().map(PathBuf::from));

    // 初始化并运行应用
    let mut app = App::initialize(config, launcher).context("初始化失败")?;
    let report = app.run().await?;

    Ok(if report.all_succeeded() {
        EXIT_OK
    } else {
        EXIT_BOOKS_FAILED
    })
}
