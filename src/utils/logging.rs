/// 日志工具模块
///
/// 提供控制台横幅与统计输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::LedgerSummary;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 产品文档 PDF 下载");
    info!(
        "📦 产品: {} {}",
        config.product_name, config.product_version
    );
    info!("🧭 解析方式: {}", config.extraction_mode);
    info!("🖥️ 无头模式: {}", config.headless);
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 记录书籍扫描结果
pub fn log_books_found(total: usize, listing_url: &str) {
    info!("✓ 在 {} 找到 {} 本书", listing_url, total);
    info!("📋 将逐本顺序处理\n");
}

/// 记录单本书开始处理
pub fn log_book_start(index: usize, total: usize, title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("[书籍 {}/{}] 开始处理: {}", index, total, truncate_text(title, 80));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &LedgerSummary, results_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📚 总计: {}", summary.total);
    info!("✅ 成功: {}/{}", summary.successful, summary.total);
    info!("❌ 失败: {}", summary.failed);
    info!("💥 会话级错误: {}", summary.critical);
    info!("{}", "=".repeat(60));
    if let Some(path) = results_path {
        info!("\n结果已保存至: {}", path);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
