//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次运行的生命周期和书籍调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (启动会话 → 扫描书单 → 逐本处理 → 汇总)
//!     ↓
//! workflow::BookFlow (处理单本书)
//!     ↓
//! services (能力层：scan / locate / download / retry / classify)
//!     ↓
//! browser + infrastructure (会话与页面)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 SessionManager，重启只发生在两本书之间
//! 2. **严格顺序**：一次只处理一本书，结果顺序与发现顺序一致
//! 3. **向下依赖**：编排层 → workflow → services → browser
//! 4. **无业务逻辑**：只做调度和统计

pub mod batch_processor;

pub use batch_processor::{App, RunReport};
