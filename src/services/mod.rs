//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，不关心流程顺序：
//! - `segmenter` - 原文分块
//! - `llm_service` - 按单个分块生成候选题目
//! - `sanitizer` - 清洗单个分块的生成结果
//! - `aggregator` - 截断到请求题量
//! - `scoring` - 批改答卷

pub mod aggregator;
pub mod llm_service;
pub mod sanitizer;
pub mod scoring;
pub mod segmenter;

pub use llm_service::{LlmService, QuestionGenerator};
pub use sanitizer::{RejectReason, SanitizedChunk, Validation};
pub use segmenter::TextSegmenter;
