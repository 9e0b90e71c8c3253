use serde::Serialize;

use super::book::BookResult;

/// 按处理顺序追加的结果账本
///
/// 只允许追加，已写入的结果不可修改。
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct ResultLedger {
    results: Vec<BookResult>,
}

/// 结果统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub critical: usize,
}

impl ResultLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: BookResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[BookResult] {
        &self.results
    }

    pub fn summary(&self) -> LedgerSummary {
        let successful = self.results.iter().filter(|r| r.is_success()).count();
        LedgerSummary {
            total: self.results.len(),
            successful,
            failed: self.results.len() - successful,
            critical: self.results.iter().filter(|r| r.is_critical()).count(),
        }
    }
}
