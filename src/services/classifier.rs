//! 会话级错误判定
//!
//! 根据错误消息中的特征片段判断浏览器会话是否已经损坏。
//! 片段列表来自配置，默认值见 [`crate::config::DEFAULT_CRITICAL_ERROR_PATTERNS`]。

use crate::config::DEFAULT_CRITICAL_ERROR_PATTERNS;
use crate::error::AppError;

/// 会话级错误判定器
#[derive(Debug, Clone)]
pub struct CriticalErrorClassifier {
    patterns: Vec<String>,
}

impl Default for CriticalErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_ERROR_PATTERNS.iter().copied())
    }
}

impl CriticalErrorClassifier {
    /// 片段按不区分大小写的子串匹配，空片段被忽略
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// 消息中是否包含任一特征片段
    pub fn matches(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }

    /// 错误是否意味着会话已不可用
    pub fn is_critical(&self, error: &AppError) -> bool {
        error.is_session_unavailable() || self.matches(&error.to_string())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
