//! 评分引擎
//!
//! 把用户答卷与题库中的标准答案逐题比对，生成批改报告。
//! 纯同步、单次遍历，只在调用期间持有一个 id → 题目 的查找表。

use crate::error::{AppError, AppResult};
use crate::models::{
    GradedEntry, GradedResult, Performance, StoredQuestion, SubmittedAnswer, NOT_ANSWERED,
};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// 校验答卷格式，在任何查询之前调用
///
/// 答卷不能为空，每一项都必须同时带有非空的题目 id 和答案。
/// 跳过的题不提交即可，会被记为 "Not Answered"
pub fn validate_submission(submitted: &[SubmittedAnswer]) -> AppResult<()> {
    if submitted.is_empty() {
        return Err(AppError::scoring_precondition("Answers array cannot be empty."));
    }

    for (idx, answer) in submitted.iter().enumerate() {
        let present = |field: &Option<String>| {
            field.as_deref().is_some_and(|value| !value.trim().is_empty())
        };
        if !present(&answer.question_id) || !present(&answer.user_answer) {
            return Err(AppError::scoring_precondition(format!(
                "Each answer must have questionId and userAnswer fields (entry {}).",
                idx + 1
            )));
        }
    }

    Ok(())
}

/// 批改答卷
///
/// 按题库顺序逐题比对；未作答的题记为错并标注 "Not Answered"。
/// 答案比较忽略大小写和首尾空白。题目 id 按 UUID 解析后查找，
/// 无法解析或题库中不存在的 id 只记日志
pub fn grade(stored: &[StoredQuestion], submitted: &[SubmittedAnswer]) -> AppResult<GradedResult> {
    validate_submission(submitted)?;

    if stored.is_empty() {
        warn!("⚠️ 没有可批改的题目");
        return Ok(GradedResult {
            score: 0,
            total_questions: 0,
            percentage: 0.0,
            performance: Performance::from_percentage(0.0),
            results: Vec::new(),
        });
    }

    let by_id: HashMap<Uuid, &StoredQuestion> = stored.iter().map(|q| (q.id, q)).collect();

    // 同一题多次提交时以第一次为准
    let mut answers: HashMap<Uuid, &str> = HashMap::with_capacity(submitted.len());
    for answer in submitted {
        let (Some(raw_id), Some(user_answer)) =
            (answer.question_id.as_deref(), answer.user_answer.as_deref())
        else {
            continue;
        };
        let raw_id = raw_id.trim();
        match Uuid::parse_str(raw_id) {
            Ok(id) if by_id.contains_key(&id) => {
                answers.entry(id).or_insert(user_answer);
            }
            _ => warn!("⚠️ 忽略未知题目的答案: {}", raw_id),
        }
    }

    let mut score = 0;
    let mut results = Vec::with_capacity(stored.len());

    for question in stored {
        let (user_answer, is_correct) = match answers.get(&question.id) {
            Some(user_answer) => {
                let correct = normalize(user_answer) == normalize(&question.question.answer);
                (user_answer.to_string(), correct)
            }
            None => (NOT_ANSWERED.to_string(), false),
        };

        if is_correct {
            score += 1;
        }

        results.push(GradedEntry {
            question_id: question.id,
            question_text: question.question.question_text.clone(),
            options: question.question.options.clone(),
            user_answer,
            correct_answer: question.question.answer.clone(),
            explanation: question.question.explanation.clone(),
            is_correct,
        });
    }

    let total = stored.len();
    let percentage = round2(score as f64 / total as f64 * 100.0);
    debug!("批改完成: {}/{} ({}%)", score, total, percentage);

    Ok(GradedResult {
        score,
        total_questions: total,
        percentage,
        performance: Performance::from_percentage(percentage),
        results,
    })
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
