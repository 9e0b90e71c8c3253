//! PDF 地址定位 - 业务能力层
//!
//! 两种方式：
//! - 直接匹配：在详情页源码中查找符合站点约定的 PDF 地址
//! - 界面交互：在格式选择控件中选 PDF，等待新标签页跳转到 PDF 地址
//!
//! 界面交互方式打开的新页面随结果一起交还给调用方，由调用方负责关闭。

use regex::Regex;
use tracing::{debug, info};

use crate::browser::{BrowserPage, BrowserSession};
use crate::config::{Selectors, Timeouts};
use crate::error::{AppError, AppResult, LocatorError, UiStage};
use crate::models::{ExtractionMode, ProductTarget};
use crate::services::RetryExecutor;

/// PDF 查看页地址的后缀规则
const PDF_URL_SUFFIX: &str = r"(?i)\.pdf($|[?#])";

/// 定位结果
#[derive(Debug)]
pub struct PdfLocation<P> {
    pub url: String,
    /// 界面交互方式打开的 PDF 页面
    pub viewer_page: Option<P>,
}

/// PDF 地址定位器
pub struct PdfLocator {
    doc_host: String,
    selectors: Selectors,
    timeouts: Timeouts,
    retries: usize,
}

impl PdfLocator {
    pub fn new(
        doc_host: impl Into<String>,
        selectors: Selectors,
        timeouts: Timeouts,
        retries: usize,
    ) -> Self {
        Self {
            doc_host: doc_host.into(),
            selectors,
            timeouts,
            retries,
        }
    }

    /// 在已经打开详情页的 `page` 上定位 PDF 地址
    pub async fn locate<S>(
        &self,
        session: &S,
        page: &S::Page,
        mode: ExtractionMode,
        product: &ProductTarget,
        retry: &RetryExecutor,
    ) -> AppResult<PdfLocation<S::Page>>
    where
        S: BrowserSession,
    {
        match mode {
            ExtractionMode::DirectPattern => {
                let url = retry
                    .run("在页面源码中查找 PDF 地址", self.retries, || async {
                        let markup = page.content().await?;
                        self.find_pdf_url(&markup, product)
                    })
                    .await?;
                info!("🔗 直接匹配得到 PDF 地址: {}", url);
                Ok(PdfLocation {
                    url,
                    viewer_page: None,
                })
            }
            ExtractionMode::UiInteraction => self.locate_via_ui(session, page, retry).await,
        }
    }

    /// 在页面源码中查找第一个符合约定的 PDF 地址
    pub fn find_pdf_url(&self, markup: &str, product: &ProductTarget) -> AppResult<String> {
        find_pdf_url(markup, &self.doc_host, &product.slug(), &product.version)
    }

    async fn locate_via_ui<S>(
        &self,
        session: &S,
        page: &S::Page,
        retry: &RetryExecutor,
    ) -> AppResult<PdfLocation<S::Page>>
    where
        S: BrowserSession,
    {
        let control = self.selectors.format_control.as_str();
        retry
            .run("等待格式选择控件", self.retries, || async {
                page.wait_for_visible(control, self.timeouts.format_control())
                    .await
                    .map_err(|e| AppError::ui_stage(UiStage::ControlWait, e))
            })
            .await?;

        // 选择操作会打开新标签页，重试时整组一起重来
        let (url, viewer) = retry
            .run("选择 PDF 格式并等待新页面", self.retries, || {
                self.open_pdf_viewer(session, page)
            })
            .await?;

        info!("🔗 界面交互得到 PDF 地址: {}", url);
        Ok(PdfLocation {
            url,
            viewer_page: Some(viewer),
        })
    }

    async fn open_pdf_viewer<S>(&self, session: &S, page: &S::Page) -> AppResult<(String, S::Page)>
    where
        S: BrowserSession,
    {
        // 上一次尝试超时后才打开的标签页不能留到这一次
        match session.close_pages_except(page).await {
            Ok(0) => {}
            Ok(n) => debug!("关闭了 {} 个遗留页面", n),
            Err(e) => debug!("清理遗留页面失败 (忽略): {}", e),
        }

        let listener = session
            .arm_new_page_listener()
            .await
            .map_err(|e| AppError::ui_stage(UiStage::NewPageWait, e))?;

        page.select_option(&self.selectors.format_control, &self.selectors.pdf_option)
            .await
            .map_err(|e| AppError::ui_stage(UiStage::Selection, e))?;

        let viewer = session
            .wait_for_new_page(listener, self.timeouts.new_page())
            .await
            .map_err(|e| AppError::ui_stage(UiStage::NewPageWait, e))?;

        match self.await_pdf(&viewer).await {
            Ok(url) => Ok((url, viewer)),
            Err(e) => {
                if let Err(close_err) = viewer.close().await {
                    debug!("关闭 PDF 页面失败 (忽略): {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn await_pdf<P: BrowserPage>(&self, viewer: &P) -> AppResult<String> {
        let suffix = Regex::new(PDF_URL_SUFFIX)?;

        viewer
            .wait_for_url(&suffix, self.timeouts.pdf_url())
            .await
            .map_err(|e| AppError::ui_stage(UiStage::UrlWait, e))?;

        viewer
            .wait_for_load(self.timeouts.pdf_load())
            .await
            .map_err(|e| AppError::ui_stage(UiStage::LoadWait, e))?;

        let url = viewer
            .current_url()
            .await
            .map_err(|e| AppError::ui_stage(UiStage::LoadWait, e))?;

        if !is_absolute_http(&url) {
            return Err(AppError::ui_stage(
                UiStage::UrlWait,
                LocatorError::NotAbsolute(url).into(),
            ));
        }
        Ok(url)
    }
}

/// 按站点约定在源码中查找 PDF 地址:
/// `https://{host}/en/documentation/{product}/{version}/pdf/....pdf`
///
/// 返回源码中出现的第一个匹配；没有匹配时返回 `PatternNotFound`。
pub fn find_pdf_url(
    markup: &str,
    host: &str,
    product_slug: &str,
    version: &str,
) -> AppResult<String> {
    let pattern = format!(
        r#"https://{}/en/documentation/{}/{}/pdf/[^"'\s<>]*?\.pdf"#,
        regex::escape(host),
        regex::escape(product_slug),
        regex::escape(version)
    );
    let re = Regex::new(&pattern)?;

    re.find(markup)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            LocatorError::PatternNotFound {
                product: product_slug.to_string(),
                version: version.to_string(),
            }
            .into()
        })
}

fn is_absolute_http(url: &str) -> bool {
    url::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
