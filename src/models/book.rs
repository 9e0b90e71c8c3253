use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 列表页上的一本书
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEntry {
    pub title: String,
    pub detail_url: String,
}

impl BookEntry {
    pub fn new(title: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail_url: detail_url.into(),
        }
    }
}

/// PDF 地址的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// 直接在页面源码里匹配 PDF 地址
    #[default]
    DirectPattern,
    /// 模拟选择 pdf 格式，跟随新打开的标签页
    UiInteraction,
}

impl ExtractionMode {
    /// 是否需要模拟界面操作
    pub fn is_interactive(&self) -> bool {
        matches!(self, ExtractionMode::UiInteraction)
    }
}

impl FromStr for ExtractionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "direct_pattern" | "pattern" => Ok(ExtractionMode::DirectPattern),
            "ui" | "ui_interaction" | "interactive" => Ok(ExtractionMode::UiInteraction),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "EXTRACTION_MODE",
                value: s.to_string(),
                expected_type: "direct | ui",
            }),
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::DirectPattern => f.write_str("直接匹配"),
            ExtractionMode::UiInteraction => f.write_str("界面交互"),
        }
    }
}

/// 单本书的处理结果
///
/// 只能通过 `succeeded` / `failed` 构造：
/// 成功时 `pdf_url` 与 `download_path` 必然存在，失败时 `download_path` 必然为空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResult {
    title: String,
    detail_url: String,
    pdf_url: Option<String>,
    download_path: Option<String>,
    success: bool,
    error: Option<String>,
    critical_error: bool,
}

impl BookResult {
    pub fn succeeded(entry: &BookEntry, pdf_url: impl Into<String>, download_path: &Path) -> Self {
        Self {
            title: entry.title.clone(),
            detail_url: entry.detail_url.clone(),
            pdf_url: Some(pdf_url.into()),
            download_path: Some(download_path.to_string_lossy().to_string()),
            success: true,
            error: None,
            critical_error: false,
        }
    }

    /// `pdf_url` 为定位阶段已得到的地址（下载失败时仍保留）
    pub fn failed(
        entry: &BookEntry,
        pdf_url: Option<String>,
        error: impl Into<String>,
        critical_error: bool,
    ) -> Self {
        Self {
            title: entry.title.clone(),
            detail_url: entry.detail_url.clone(),
            pdf_url,
            download_path: None,
            success: false,
            error: Some(error.into()),
            critical_error,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail_url(&self) -> &str {
        &self.detail_url
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf_url.as_deref()
    }

    pub fn download_path(&self) -> Option<&str> {
        self.download_path.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 失败是否由会话损坏引起
    pub fn is_critical(&self) -> bool {
        self.critical_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extraction_mode_from_str() {
        assert_eq!(
            "direct".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::DirectPattern
        );
        assert_eq!(
            " UI ".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::UiInteraction
        );
        assert!("browser".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn test_failed_result_has_no_download_path() {
        let entry = BookEntry::new("Installing", "https://docs.example.com/book");
        let result = BookResult::failed(
            &entry,
            Some("https://docs.example.com/a.pdf".to_string()),
            "HTTP 状态码 404",
            false,
        );

        assert!(!result.is_success());
        assert!(result.download_path().is_none());
        assert_eq!(result.pdf_url(), Some("https://docs.example.com/a.pdf"));
        assert_eq!(result.error(), Some("HTTP 状态码 404"));
    }

    #[test]
    fn test_succeeded_result_carries_url_and_path() {
        let entry = BookEntry::new("Installing", "https://docs.example.com/book");
        let result = BookResult::succeeded(
            &entry,
            "https://docs.example.com/a.pdf",
            &PathBuf::from("downloads/a.pdf"),
        );

        assert!(result.is_success());
        assert!(!result.is_critical());
        assert_eq!(result.title(), "Installing");
        assert_eq!(result.detail_url(), "https://docs.example.com/book");
        assert_eq!(result.pdf_url(), Some("https://docs.example.com/a.pdf"));
        assert_eq!(result.download_path(), Some("downloads/a.pdf"));
        assert!(result.error().is_none());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let entry = BookEntry::new("Installing", "https://docs.example.com/book");
        let result = BookResult::succeeded(
            &entry,
            "https://docs.example.com/a.pdf",
            &PathBuf::from("downloads/a.pdf"),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["detailUrl"], "https://docs.example.com/book");
        assert_eq!(json["downloadPath"], "downloads/a.pdf");
        assert_eq!(json["criticalError"], false);
        assert!(json["error"].is_null());
    }
}
