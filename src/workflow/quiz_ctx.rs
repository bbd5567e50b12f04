//! 批处理上下文
//!
//! 封装"我正在处理第几个文件、来自哪里"这一信息，只用于日志

use std::fmt::Display;

/// 单个文件的处理上下文
#[derive(Debug, Clone)]
pub struct QuizCtx {
    /// 文件索引（从1开始，仅用于日志显示）
    pub file_index: usize,

    /// 来源名称（原文文件名或答卷对应的主题）
    pub source_name: String,
}

impl QuizCtx {
    pub fn new(file_index: usize, source_name: impl Into<String>) -> Self {
        Self {
            file_index,
            source_name: source_name.into(),
        }
    }
}

impl Display for QuizCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {} 来源#{}]", self.file_index, self.source_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let ctx = QuizCtx::new(2, "biology");
        assert_eq!(ctx.to_string(), "[文件 2 来源#biology]");
    }
}
