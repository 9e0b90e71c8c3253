//! 结果汇总 - 业务能力层
//!
//! 把整次运行的结果账本写成 JSON，并在控制台打印统计

use std::path::PathBuf;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{ProductTarget, ResultLedger};
use crate::utils::logging::print_final_stats;

/// 结果汇总器
#[derive(Debug, Clone)]
pub struct ResultReporter {
    results_dir: PathBuf,
}

impl ResultReporter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// 写出 `{产品}-{版本}-download-results.json`，按处理顺序排列
    pub fn write(&self, ledger: &ResultLedger, product: &ProductTarget) -> AppResult<PathBuf> {
        std::fs::create_dir_all(&self.results_dir)
            .map_err(|e| AppError::io(&self.results_dir, e))?;

        let path = self.results_dir.join(product.results_file_name());
        let json = serde_json::to_string_pretty(ledger)?;
        std::fs::write(&path, json).map_err(|e| AppError::io(&path, e))?;

        info!("📝 结果已写入 {}", path.display());
        Ok(path)
    }

    /// 写出结果并打印统计
    pub fn report(&self, ledger: &ResultLedger, product: &ProductTarget) -> AppResult<PathBuf> {
        let written = self.write(ledger, product);
        let shown = written.as_ref().ok().map(|p| p.display().to_string());
        print_final_stats(&ledger.summary(), shown.as_deref());
        written
    }
}
