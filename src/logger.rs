//! 日志初始化
//!
//! 默认 `info` 级别；`RUST_LOG` 优先，其次是 `verbose` 开关。

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全局日志
pub fn init() {
    init_with(false);
}

/// 按需打开 debug 级别
pub fn init_with(verbose: bool) {
    let default_level = if verbose {
        "docs_pdf_fetcher=debug,info"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）直接忽略
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
