//! 原文分块服务 - 业务能力层
//!
//! 把任意长度的原文切成有上限、首尾略有重叠的分块，尽量在自然边界处切开。
//!
//! 边界优先级（从窗口末尾向前查找）：
//! 1. 句末标点 `.` `!` `?` 后跟空白，位置需在窗口 70% 之后
//! 2. 空行，位置需在窗口 60% 之后
//! 3. 单个换行，位置需在窗口 60% 之后
//! 4. 任意空白，位置需在窗口 70% 之后
//!
//! 都找不到时直接在窗口末尾切开（可能切断单词）。

use crate::config::Config;
use crate::models::TextChunk;
use tracing::{debug, warn};

/// 默认最小分块长度，短于此值的非末尾分块会被丢弃
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 100;

const SENTENCE_RATIO: f64 = 0.7;
const PARAGRAPH_RATIO: f64 = 0.6;
const NEWLINE_RATIO: f64 = 0.6;
const WORD_RATIO: f64 = 0.7;

/// 原文分块器
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    max_chunk_size: usize,
    overlap_size: usize,
    min_chunk_size: usize,
}

impl TextSegmenter {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size,
            overlap_size,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_chunk_size: config.max_chunk_size,
            overlap_size: config.overlap_size,
            min_chunk_size: config.min_chunk_size,
        }
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    /// 切分原文
    ///
    /// 空文本或参数非法时返回空列表，调用方应视为"无可处理内容"
    pub fn segment(&self, text: &str) -> Vec<TextChunk> {
        if self.max_chunk_size == 0 {
            warn!("分块上限为 0，无法切分");
            return Vec::new();
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            warn!("原文为空，跳过分块");
            return Vec::new();
        }

        let chars: Vec<char> = trimmed.chars().collect();
        let total = chars.len();

        if total <= self.max_chunk_size {
            return vec![TextChunk::new(0, trimmed.to_string(), 0)];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let window_end = (start + self.max_chunk_size).min(total);
            let end = if window_end < total {
                self.find_boundary(&chars, start, window_end)
            } else {
                window_end
            };
            let is_final = end >= total;

            // 分块记录整个窗口，文本去除首尾空白
            let text: String = chars[start..end].iter().collect();
            let text = text.trim();
            let len = text.chars().count();

            if !text.is_empty() && (len >= self.min_chunk_size || is_final) {
                chunks.push(TextChunk::with_span(
                    chunks.len(),
                    text.to_string(),
                    start,
                    end - start,
                ));
            } else {
                debug!("丢弃过短分块: 起点 {}, 长度 {}", start, len);
            }

            if is_final {
                break;
            }

            start = (start + 1).max(end.saturating_sub(self.overlap_size));
        }

        debug!("原文 {} 字符切分为 {} 个分块", total, chunks.len());
        chunks
    }

    /// 在 `[start, window_end)` 内从后向前找最佳切点，返回切点（不含）
    fn find_boundary(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let qualifies = |pos: usize, ratio: f64| {
            (pos - start) as f64 >= self.max_chunk_size as f64 * ratio
        };

        // 句末标点后跟空白，切点在标点之后
        if let Some(i) = (start..window_end.saturating_sub(1))
            .rev()
            .find(|&i| matches!(chars[i], '.' | '!' | '?') && chars[i + 1].is_whitespace())
        {
            if qualifies(i + 1, SENTENCE_RATIO) {
                return i + 1;
            }
        }

        // 空行
        if let Some(i) = (start..window_end.saturating_sub(1))
            .rev()
            .find(|&i| chars[i] == '\n' && chars[i + 1] == '\n')
        {
            if qualifies(i, PARAGRAPH_RATIO) {
                return i;
            }
        }

        // 单个换行
        if let Some(i) = (start..window_end).rev().find(|&i| chars[i] == '\n') {
            if qualifies(i, NEWLINE_RATIO) {
                return i;
            }
        }

        // 单词边界
        if let Some(i) = (start..window_end).rev().find(|&i| chars[i].is_whitespace()) {
            if qualifies(i, WORD_RATIO) {
                return i;
            }
        }

        window_end
    }
}

/// 便捷函数：按给定上限和重叠切分，最小分块长度取默认值
pub fn segment(text: &str, max_chunk_size: usize, overlap_size: usize) -> Vec<TextChunk> {
    TextSegmenter::new(max_chunk_size, overlap_size).segment(text)
}

/// 分块失败时的兜底：整段原文截断为一个分块
pub fn fallback_chunk(text: &str, max_chars: usize) -> Option<TextChunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(max_chars).collect();
    Some(TextChunk::new(0, truncated, 0))
}
