//! 书籍处理流程 - 流程层
//!
//! 核心职责：定义"一本书"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开详情页（可重试）
//! 2. 定位 PDF 地址
//! 3. 下载 PDF（可重试）
//! 4. 无论成败都关闭本书打开的页面，生成一条结果
//!
//! 会话级错误只做判定，重启会话由编排层负责。

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::browser::{BrowserLauncher, BrowserPage, PageOf, SessionManager};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{BookResult, ExtractionMode, ProductTarget};
use crate::services::{CriticalErrorClassifier, Downloader, PdfLocator, RetryExecutor};
use crate::workflow::book_ctx::BookCtx;

/// 单本书的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStage {
    Start,
    Navigated,
    LocatorDone,
    Downloaded,
    /// 导航失败
    NavigationFailed,
    LocatorFailed,
    DownloadFailed,
    /// 结果已生成（终态）
    Recorded,
}

impl BookStage {
    /// 在当前阶段出错后进入的失败阶段
    pub fn on_failure(self) -> Self {
        match self {
            BookStage::Start => BookStage::NavigationFailed,
            BookStage::Navigated => BookStage::LocatorFailed,
            BookStage::LocatorDone => BookStage::DownloadFailed,
            other => other,
        }
    }
}

/// 处理过程中逐步积累的信息
struct Progress {
    stage: BookStage,
    pdf_url: Option<String>,
}

impl Progress {
    fn advance(&mut self, ctx: &BookCtx, stage: BookStage) {
        debug!("{} {:?} → {:?}", ctx, self.stage, stage);
        self.stage = stage;
    }
}

/// 书籍处理流程
///
/// - 编排单本书的导航、定位、下载
/// - 不持有会话，只借用 SessionManager 打开页面
/// - 任何错误都转换为一条失败结果，不向上传播
pub struct BookFlow {
    locator: PdfLocator,
    downloader: Downloader,
    classifier: CriticalErrorClassifier,
    retry: RetryExecutor,
    mode: ExtractionMode,
    product: ProductTarget,
    navigation_timeout: Duration,
    navigation_retries: usize,
    download_retries: usize,
}

impl BookFlow {
    /// 创建新的书籍处理流程
    pub fn new(config: &Config) -> AppResult<Self> {
        let locator = PdfLocator::new(
            config.doc_host()?,
            config.selectors.clone(),
            config.timeouts.clone(),
            config.retry.locator_retries,
        );
        let downloader = Downloader::new(
            &config.output_dir,
            &config.user_agent,
            config.timeouts.download(),
        )?;

        let classifier = CriticalErrorClassifier::new(&config.critical_error_patterns);
        debug!("会话级错误特征 {} 条: {:?}", classifier.patterns().len(), classifier.patterns());

        Ok(Self {
            locator,
            downloader,
            classifier,
            retry: RetryExecutor::from_config(&config.retry),
            mode: config.extraction_mode,
            product: config.product(),
            navigation_timeout: config.timeouts.navigation(),
            navigation_retries: config.retry.navigation_retries,
            download_retries: config.retry.download_retries,
        })
    }

    /// 处理一本书，总是返回一条结果
    pub async fn run<L: BrowserLauncher>(
        &self,
        sessions: &SessionManager<L>,
        ctx: &BookCtx,
    ) -> BookResult {
        let mut progress = Progress {
            stage: BookStage::Start,
            pdf_url: None,
        };

        let outcome = self.process(sessions, ctx, &mut progress).await;

        let result = match outcome {
            Ok(path) => {
                info!("{} ✅ 下载完成: {}", ctx, path.display());
                BookResult::succeeded(
                    &ctx.entry,
                    progress.pdf_url.clone().unwrap_or_default(),
                    &path,
                )
            }
            Err(e) => {
                let failed_at = progress.stage.on_failure();
                progress.advance(ctx, failed_at);

                let critical = self.classifier.is_critical(&e);
                if critical {
                    error!("{} 💥 会话级错误 ({:?}): {}", ctx, failed_at, e);
                } else {
                    error!("{} ❌ 处理失败 ({:?}): {}", ctx, failed_at, e);
                }
                BookResult::failed(&ctx.entry, progress.pdf_url.take(), e.to_string(), critical)
            }
        };

        progress.advance(ctx, BookStage::Recorded);
        result
    }

    async fn process<L: BrowserLauncher>(
        &self,
        sessions: &SessionManager<L>,
        ctx: &BookCtx,
        progress: &mut Progress,
    ) -> AppResult<PathBuf> {
        let entry = &ctx.entry;
        if entry.title.trim().is_empty() || entry.detail_url.trim().is_empty() {
            return Err(AppError::InvalidEntry(format!(
                "标题或链接为空 (title='{}', url='{}')",
                entry.title, entry.detail_url
            )));
        }

        let session = sessions.session()?;
        let page = sessions.new_page().await?;
        let mut viewer: Option<PageOf<L>> = None;

        let outcome = self
            .drive::<L>(session, &page, ctx, progress, &mut viewer)
            .await;

        // 清理：新打开的 PDF 页面与详情页
        if let Some(viewer) = viewer {
            close_quietly(&viewer, ctx, "PDF 页面").await;
        }
        close_quietly(&page, ctx, "详情页").await;

        outcome
    }

    async fn drive<L: BrowserLauncher>(
        &self,
        session: &L::Session,
        page: &PageOf<L>,
        ctx: &BookCtx,
        progress: &mut Progress,
        viewer: &mut Option<PageOf<L>>,
    ) -> AppResult<PathBuf> {
        let entry = &ctx.entry;

        info!("{} 🌐 打开详情页: {}", ctx, entry.detail_url);
        self.retry
            .run("打开详情页", self.navigation_retries, || {
                page.goto(&entry.detail_url, self.navigation_timeout)
            })
            .await?;
        progress.advance(ctx, BookStage::Navigated);

        info!("{} 🔍 定位 PDF 地址 ({})", ctx, self.mode);
        let location = self
            .locator
            .locate(session, page, self.mode, &self.product, &self.retry)
            .await?;
        *viewer = location.viewer_page;
        let pdf_url = location.url;
        progress.pdf_url = Some(pdf_url.clone());
        progress.advance(ctx, BookStage::LocatorDone);

        let file_name = self.product.pdf_file_name(&entry.title);
        info!("{} ⬇️ 下载 {}", ctx, file_name);
        let path = self
            .retry
            .run("下载 PDF", self.download_retries, || {
                self.downloader.download(&pdf_url, &file_name)
            })
            .await?;
        progress.advance(ctx, BookStage::Downloaded);

        Ok(path)
    }
}

async fn close_quietly<P: BrowserPage>(page: &P, ctx: &BookCtx, what: &str) {
    if let Err(e) = page.close().await {
        warn!("{} 关闭{}失败 (忽略): {}", ctx, what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_stage_follows_progress() {
        assert_eq!(BookStage::Start.on_failure(), BookStage::NavigationFailed);
        assert_eq!(BookStage::Navigated.on_failure(), BookStage::LocatorFailed);
        assert_eq!(BookStage::LocatorDone.on_failure(), BookStage::DownloadFailed);
        assert_eq!(BookStage::Downloaded.on_failure(), BookStage::Downloaded);
    }

    #[test]
    fn test_new_rejects_unparseable_base_url() {
        let mut config = Config::default();
        config.product_name = "Prod".to_string();
        config.product_version = "1.0".to_string();
        config.base_url = "not a url".to_string();

        assert!(BookFlow::new(&config).is_err());
    }

    #[test]
    fn test_new_classifies_with_configured_patterns() {
        let mut config = Config::default();
        config.product_name = "Prod".to_string();
        config.product_version = "1.0".to_string();
        config.critical_error_patterns = vec!["Browser Crashed".to_string()];

        let flow = BookFlow::new(&config).unwrap();
        assert_eq!(flow.classifier.patterns(), &["browser crashed".to_string()]);
        assert!(flow
            .classifier
            .is_critical(&AppError::InvalidEntry("browser crashed mid-run".to_string())));
    }
}
