//! 结果汇总服务
//!
//! 把编排层合并好的题目截断到请求题量，不做重排、不做优选。

use crate::error::{AggregationError, AppResult};
use crate::models::{MergedGeneration, QuizDraft};
use tracing::{info, warn};

/// 汇总合并结果
///
/// 题目按到达顺序截断到最多 `requested_count` 道；截断后为空时报错。
/// 不修改输入，重复调用结果相同
pub fn aggregate(merged: &MergedGeneration, requested_count: usize) -> AppResult<QuizDraft> {
    let questions: Vec<_> = merged
        .questions
        .iter()
        .take(requested_count)
        .cloned()
        .collect();

    if questions.is_empty() {
        return Err(AggregationError::NoValidQuestions.into());
    }

    let draft = QuizDraft {
        topic: merged.topic.clone(),
        questions,
        requested_count,
    };

    if draft.shortfall() > 0 {
        warn!(
            "⚠️ 题量不足: 请求 {} 道，实际 {} 道",
            requested_count,
            draft.questions.len()
        );
    } else {
        info!("✓ 汇总完成: {} 道题目", draft.questions.len());
    }

    Ok(draft)
}
