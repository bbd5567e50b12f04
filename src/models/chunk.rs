use serde::Serialize;

/// 原文分块
///
/// `start` 和 `len` 以字符（Unicode 标量值）计，相对于去除首尾空白后的原文。
/// 二者描述切分窗口 `[start, start + len)`，`text` 是窗口内容去除首尾空白后的结果，
/// 因此相邻分块的窗口首尾相接或重叠，不会留下空隙。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub len: usize,
}

impl TextChunk {
    pub fn new(index: usize, text: String, start: usize) -> Self {
        let len = text.chars().count();
        Self {
            index,
            text,
            start,
            len,
        }
    }

    /// 以切分窗口构造分块，`text` 可以比窗口短（已去除首尾空白）
    pub fn with_span(index: usize, text: String, start: usize, len: usize) -> Self {
        Self {
            index,
            text,
            start,
            len,
        }
    }

    /// 文本字符数
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// 分块在原文中的结束位置（不含）
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// 单个分块的生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub chunk: TextChunk,
    pub target_count: usize,
}

impl GenerationRequest {
    /// 按分块数平摊总题量：`ceil(total / chunk_count)`，至少为 1
    pub fn per_chunk_target(total_requested: usize, chunk_count: usize) -> usize {
        if chunk_count == 0 {
            return total_requested.max(1);
        }
        total_requested.div_ceil(chunk_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_chunk_target_covers_total() {
        for chunks in 1..=7 {
            for total in 1..=40 {
                let target = GenerationRequest::per_chunk_target(total, chunks);
                assert!(target >= 1);
                assert!(chunks * target >= total);
                assert!(chunks * (target - 1) < total);
            }
        }
        assert_eq!(GenerationRequest::per_chunk_target(10, 3), 4);
    }

    #[test]
    fn test_chunk_len_counts_chars() {
        let chunk = TextChunk::new(0, "你好 world".to_string(), 5);
        assert_eq!(chunk.len, 8);
        assert_eq!(chunk.end(), 13);
    }

    #[test]
    fn test_span_may_exceed_trimmed_text() {
        let chunk = TextChunk::with_span(1, "bbb".to_string(), 280, 201);
        assert_eq!(chunk.end(), 481);
        assert_eq!(chunk.text_len(), 3);
    }
}
