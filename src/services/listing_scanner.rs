//! 列表页扫描 - 业务能力层
//!
//! 只负责"从列表页拿到书单"，不关心后续下载

use tracing::{info, warn};

use crate::browser::{BrowserPage, ExtractedRow, FieldSpec};
use crate::config::{Selectors, Timeouts};
use crate::error::AppResult;
use crate::models::BookEntry;

const TITLE_FIELD: &str = "title";
const URL_FIELD: &str = "url";

/// 列表页扫描器
pub struct ListingScanner {
    selectors: Selectors,
    timeouts: Timeouts,
}

impl ListingScanner {
    pub fn new(selectors: Selectors, timeouts: Timeouts) -> Self {
        Self {
            selectors,
            timeouts,
        }
    }

    /// 扫描列表页，返回所有书籍条目
    ///
    /// 标题或链接为空的条目同样保留，由后续流程负责拒绝。
    pub async fn scan<P>(&self, page: &P, url: &str) -> AppResult<Vec<BookEntry>>
    where
        P: BrowserPage + ?Sized,
    {
        info!("📖 正在加载列表页: {}", url);
        page.goto(url, self.timeouts.navigation()).await?;

        page.wait_for_visible(&self.selectors.listing_tile, self.timeouts.listing())
            .await?;

        let rows = page
            .extract_all(&self.selectors.listing_tile, &self.fields())
            .await?;

        let entries: Vec<BookEntry> = rows.iter().map(entry_from_row).collect();

        let incomplete = entries
            .iter()
            .filter(|e| e.title.is_empty() || e.detail_url.is_empty())
            .count();
        if incomplete > 0 {
            warn!("⚠️ 有 {} 个条目缺少标题或链接", incomplete);
        }

        Ok(entries)
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::text(TITLE_FIELD, self.selectors.tile_title.as_str()),
            FieldSpec::attribute(URL_FIELD, self.selectors.tile_link.as_str(), "href"),
        ]
    }
}

fn entry_from_row(row: &ExtractedRow) -> BookEntry {
    let title = row
        .get(TITLE_FIELD)
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let url = row
        .get(URL_FIELD)
        .map(|u| u.trim().to_string())
        .unwrap_or_default();
    BookEntry::new(title, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_row_normalizes_whitespace() {
        let row: ExtractedRow = [
            ("title".to_string(), "  Installing\n   the  Platform ".to_string()),
            ("url".to_string(), " https://docs.example.com/book ".to_string()),
        ]
        .into_iter()
        .collect();

        let entry = entry_from_row(&row);
        assert_eq!(entry.title, "Installing the Platform");
        assert_eq!(entry.detail_url, "https://docs.example.com/book");
    }

    #[test]
    fn test_entry_from_row_keeps_missing_fields_empty() {
        let row = ExtractedRow::new();

        let entry = entry_from_row(&row);
        assert!(entry.title.is_empty());
        assert!(entry.detail_url.is_empty());
    }
}
