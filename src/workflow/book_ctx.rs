//! 书籍处理上下文
//!
//! 封装"我正在处理第几本书"这一信息

use std::fmt::Display;

use crate::models::BookEntry;

/// 书籍处理上下文
#[derive(Debug, Clone)]
pub struct BookCtx {
    /// 在本次运行中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行发现的书籍总数
    pub total: usize,

    pub entry: BookEntry,
}

impl BookCtx {
    pub fn new(index: usize, total: usize, entry: BookEntry) -> Self {
        Self {
            index,
            total,
            entry,
        }
    }
}

impl Display for BookCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[书籍 {}/{}]", self.index, self.total)
    }
}
