//! # Docs PDF Fetcher
//!
//! 按产品与版本批量下载文档站点上所有书籍的 PDF
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure / Browser）
//! - `infrastructure/` - `JsExecutor`，持有 chromiumoxide 的 Page，只暴露 eval() 能力
//! - `browser/` - 页面与会话的能力抽象（`BrowserPage` / `BrowserSession` / `BrowserLauncher`）
//! - `SessionManager` - 唯一的会话持有者，负责启动、重启、关闭
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每次只处理一件事
//! - `ListingScanner` - 扫描列表页得到书单
//! - `PdfLocator` - 直接匹配或界面交互定位 PDF 地址
//! - `Downloader` - HTTP 下载 PDF
//! - `RetryExecutor` - 指数退避重试
//! - `CriticalErrorClassifier` - 判定会话级错误
//! - `ResultReporter` - 写出结果 JSON
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一本书"的完整处理流程
//! - `BookCtx` - 上下文封装（序号 + 书籍条目）
//! - `BookFlow` - 流程编排（导航 → 定位 → 下载 → 清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 管理会话生命周期，顺序处理所有书籍
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromiumLauncher, SessionManager};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{BookEntry, BookResult, ExtractionMode, ResultLedger};
pub use orchestrator::{App, RunReport};
pub use workflow::{BookCtx, BookFlow};
