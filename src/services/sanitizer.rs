//! 生成结果清洗服务 - 业务能力层
//!
//! 生成服务返回的内容不可信：可能被 markdown 代码块包裹、夹带说明文字、
//! 字段缺失或类型错误。本模块只负责把单个分块的原始返回解析、校验、
//! 归一化为合格的题目列表，不关心重试和汇总。

use crate::error::LlmError;
use crate::models::{Question, QuestionKind, Topic};
use crate::utils::logging::truncate_text;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// 缺少解析时的默认文案
pub const DEFAULT_EXPLANATION: &str = "No explanation was provided.";

/// 每题最多保留的选项数
pub const MAX_OPTIONS: usize = 4;
/// 每题最少需要的选项数
pub const MIN_OPTIONS: usize = 2;

/// 单题被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("候选题目不是 JSON 对象")]
    NotAnObject,
    #[error("题干缺失或为空")]
    MissingQuestionText,
    #[error("options 缺失或不是数组")]
    OptionsNotAList,
    #[error("第 {0} 个选项不是非空字符串")]
    InvalidOption(usize),
    #[error("选项重复: {0}")]
    DuplicateOption(String),
    #[error("选项数量不足: {0}")]
    TooFewOptions(usize),
    #[error("答案缺失或为空")]
    MissingAnswer,
    #[error("答案不在选项中: {0}")]
    AnswerNotInOptions(String),
}

/// 单题校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted(Question),
    Rejected(RejectReason),
}

/// 单个分块清洗后的结果
#[derive(Debug, Clone)]
pub struct SanitizedChunk {
    pub topic: Topic,
    pub questions: Vec<Question>,
    /// 被丢弃的候选及原因（按原顺序）
    pub rejected: Vec<(usize, RejectReason)>,
}

/// 清洗单个分块的原始返回
///
/// 无法解析出 JSON 对象，或没有任何题目通过校验时返回错误；
/// 错误只影响本分块
pub fn sanitize(raw: &str) -> Result<SanitizedChunk, LlmError> {
    let payload = parse_payload(raw).ok_or_else(|| LlmError::UnparseableResponse {
        preview: truncate_text(raw.trim(), 120),
    })?;

    let topic = sanitize_topic(payload.get("topic"));

    let candidates = payload
        .get("questions")
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut questions = Vec::new();
    let mut rejected = Vec::new();

    for (idx, candidate) in candidates.iter().enumerate() {
        match validate_question(candidate) {
            Validation::Accepted(question) => questions.push(question),
            Validation::Rejected(reason) => {
                debug!("丢弃第 {} 个候选题目: {}", idx + 1, reason);
                rejected.push((idx, reason));
            }
        }
    }

    if questions.is_empty() {
        return Err(LlmError::NoValidQuestions {
            candidates: candidates.len(),
        });
    }

    Ok(SanitizedChunk {
        topic,
        questions,
        rejected,
    })
}

/// 校验并归一化单个候选题目
pub fn validate_question(candidate: &JsonValue) -> Validation {
    match try_validate(candidate) {
        Ok(question) => Validation::Accepted(question),
        Err(reason) => Validation::Rejected(reason),
    }
}

fn try_validate(candidate: &JsonValue) -> Result<Question, RejectReason> {
    let obj = candidate.as_object().ok_or(RejectReason::NotAnObject)?;

    let question_text = non_empty_str(obj, "questionText").ok_or(RejectReason::MissingQuestionText)?;

    let raw_options = obj
        .get("options")
        .and_then(JsonValue::as_array)
        .ok_or(RejectReason::OptionsNotAList)?;

    let mut options = Vec::with_capacity(MAX_OPTIONS);
    let mut seen = HashSet::new();
    for (idx, option) in raw_options.iter().take(MAX_OPTIONS).enumerate() {
        let option = option
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(RejectReason::InvalidOption(idx + 1))?;
        if !seen.insert(option) {
            return Err(RejectReason::DuplicateOption(option.to_string()));
        }
        options.push(option.to_string());
    }
    if options.len() < MIN_OPTIONS {
        return Err(RejectReason::TooFewOptions(options.len()));
    }

    let answer = non_empty_str(obj, "answer").ok_or(RejectReason::MissingAnswer)?;
    // 选项和答案都已去除首尾空白；区分大小写，且只和保留下来的选项比较
    if !options.iter().any(|option| option == answer) {
        return Err(RejectReason::AnswerNotInOptions(answer.to_string()));
    }

    let explanation = non_empty_str(obj, "explanation").unwrap_or(DEFAULT_EXPLANATION);

    Ok(Question {
        kind: QuestionKind::Mcq,
        question_text: question_text.to_string(),
        options,
        answer: answer.to_string(),
        explanation: explanation.to_string(),
    })
}

/// 取字符串字段并去除首尾空白，缺失、非字符串或为空时返回 None
fn non_empty_str<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn sanitize_topic(value: Option<&JsonValue>) -> Topic {
    let Some(obj) = value.and_then(JsonValue::as_object) else {
        return Topic::default();
    };

    let title = non_empty_str(obj, "title").unwrap_or(Topic::DEFAULT_TITLE);
    let description = non_empty_str(obj, "description").unwrap_or(Topic::DEFAULT_DESCRIPTION);
    Topic::new(title, description)
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```$").expect("代码块正则无效")
    })
}

/// 解析原始返回为 JSON 对象
///
/// 依次尝试：去掉代码块包裹后直接解析 → 截取第一个 `{` 到最后一个 `}` 再解析
fn parse_payload(raw: &str) -> Option<Map<String, JsonValue>> {
    let trimmed = raw.trim();
    let unfenced = code_fence()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(unfenced) {
        return Some(map);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<JsonValue>(&unfenced[start..=end]) {
        Ok(JsonValue::Object(map)) => {
            debug!("从夹带文字的返回中截取到 JSON 对象");
            Some(map)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mcq(text: &str, options: &[&str], answer: &str) -> JsonValue {
        json!({
            "type": "mcq",
            "questionText": text,
            "options": options,
            "answer": answer,
            "explanation": "because",
        })
    }

    fn payload(questions: Vec<JsonValue>) -> String {
        json!({
            "topic": {"title": "Geography", "description": "Capitals"},
            "questions": questions,
        })
        .to_string()
    }

    #[test]
    fn test_well_formed_payload_is_accepted() {
        let raw = payload(vec![mcq("Capital of France?", &["Paris", "Rome", "Oslo", "Bern"], "Paris")]);
        let result = sanitize(&raw).unwrap();
        assert_eq!(result.topic.title, "Geography");
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].answer, "Paris");
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let raw = format!(
            "```json\n{}\n```",
            payload(vec![mcq("Q?", &["A", "B", "C", "D"], "A")])
        );
        assert_eq!(sanitize(&raw).unwrap().questions.len(), 1);
    }

    #[test]
    fn test_json_is_extracted_from_prose() {
        let raw = format!(
            "Sure! Here is your quiz:\n{}\nHope this helps.",
            payload(vec![mcq("Q?", &["A", "B", "C", "D"], "B")])
        );
        assert_eq!(sanitize(&raw).unwrap().questions[0].answer, "B");
    }

    #[test]
    fn test_unparseable_payload_is_chunk_error() {
        assert!(matches!(
            sanitize("I cannot help with that."),
            Err(LlmError::UnparseableResponse { .. })
        ));
        assert!(matches!(
            sanitize("[1, 2, 3]"),
            Err(LlmError::UnparseableResponse { .. })
        ));
    }

    #[test]
    fn test_answer_not_in_options_is_rejected() {
        let candidate = mcq("Q?", &["Paris", "Rome", "Oslo", "Bern"], "paris");
        assert_eq!(
            validate_question(&candidate),
            Validation::Rejected(RejectReason::AnswerNotInOptions("paris".into()))
        );
    }

    #[test]
    fn test_answer_is_trimmed_before_matching() {
        let candidate = mcq("  Q?  ", &["Paris", "Rome"], "  Paris ");
        let Validation::Accepted(question) = validate_question(&candidate) else {
            panic!("应当通过校验");
        };
        assert_eq!(question.answer, "Paris");
        assert_eq!(question.question_text, "Q?");
    }

    #[test]
    fn test_options_are_trimmed_before_checks() {
        let padded = mcq("Capital of France?", &[" Paris", "Rome ", "Oslo", "Bern"], "Paris");
        match validate_question(&padded) {
            Validation::Accepted(q) => {
                assert_eq!(q.options, vec!["Paris", "Rome", "Oslo", "Bern"]);
                assert_eq!(q.answer, "Paris");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let near_duplicate = mcq("Capital of France?", &["Paris", "Paris ", "Oslo", "Bern"], "Paris");
        assert_eq!(
            validate_question(&near_duplicate),
            Validation::Rejected(RejectReason::DuplicateOption("Paris".into()))
        );
    }

    #[test]
    fn test_options_are_truncated_to_four() {
        let candidate = mcq("Q?", &["A", "B", "C", "D", "E"], "D");
        let Validation::Accepted(question) = validate_question(&candidate) else {
            panic!("应当通过校验");
        };
        assert_eq!(question.options, vec!["A", "B", "C", "D"]);

        // 答案只出现在被截掉的选项里时拒绝，保证答案始终在选项中
        let dropped = mcq("Q?", &["A", "B", "C", "D", "E"], "E");
        assert!(matches!(
            validate_question(&dropped),
            Validation::Rejected(RejectReason::AnswerNotInOptions(_))
        ));
    }

    #[test]
    fn test_bad_options_are_rejected() {
        assert_eq!(
            validate_question(&mcq("Q?", &["A"], "A")),
            Validation::Rejected(RejectReason::TooFewOptions(1))
        );
        assert_eq!(
            validate_question(&mcq("Q?", &["A", "A", "B"], "A")),
            Validation::Rejected(RejectReason::DuplicateOption("A".into()))
        );
        assert_eq!(
            validate_question(&mcq("Q?", &["A", " ", "B"], "A")),
            Validation::Rejected(RejectReason::InvalidOption(2))
        );
        let no_options = json!({"questionText": "Q?", "answer": "A"});
        assert_eq!(
            validate_question(&no_options),
            Validation::Rejected(RejectReason::OptionsNotAList)
        );
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        assert_eq!(
            validate_question(&mcq("   ", &["A", "B"], "A")),
            Validation::Rejected(RejectReason::MissingQuestionText)
        );
        let no_answer = json!({"questionText": "Q?", "options": ["A", "B"]});
        assert_eq!(
            validate_question(&no_answer),
            Validation::Rejected(RejectReason::MissingAnswer)
        );
        assert_eq!(
            validate_question(&json!("just a string")),
            Validation::Rejected(RejectReason::NotAnObject)
        );
    }

    #[test]
    fn test_type_is_forced_and_explanation_defaulted() {
        let candidate = json!({
            "type": "short",
            "questionText": "Q?",
            "options": ["A", "B"],
            "answer": "B",
        });
        let Validation::Accepted(question) = validate_question(&candidate) else {
            panic!("应当通过校验");
        };
        assert_eq!(question.kind, QuestionKind::Mcq);
        assert_eq!(question.explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn test_topic_defaults() {
        let raw = json!({
            "topic": "not an object",
            "questions": [mcq("Q?", &["A", "B"], "A")],
        })
        .to_string();
        assert_eq!(sanitize(&raw).unwrap().topic, Topic::default());

        let raw = json!({
            "topic": {"title": 42, "description": "Desc"},
            "questions": [mcq("Q?", &["A", "B"], "A")],
        })
        .to_string();
        let topic = sanitize(&raw).unwrap().topic;
        assert_eq!(topic.title, Topic::DEFAULT_TITLE);
        assert_eq!(topic.description, "Desc");
    }

    #[test]
    fn test_partially_valid_chunk_keeps_good_items() {
        let raw = payload(vec![
            mcq("Good?", &["A", "B", "C", "D"], "A"),
            mcq("Bad?", &["A", "B", "C", "D"], "Z"),
            mcq("Also good?", &["W", "X", "Y", "Z"], "Z"),
        ]);
        let result = sanitize(&raw).unwrap();
        assert_eq!(result.questions.len(), 2);
        assert_eq!(result.questions[1].question_text, "Also good?");
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].0, 1);
    }

    #[test]
    fn test_zero_valid_questions_is_chunk_error() {
        let raw = payload(vec![mcq("Bad?", &["A", "B"], "C")]);
        assert!(matches!(
            sanitize(&raw),
            Err(LlmError::NoValidQuestions { candidates: 1 })
        ));
        let raw = json!({"topic": {"title": "T", "description": "D"}}).to_string();
        assert!(matches!(
            sanitize(&raw),
            Err(LlmError::NoValidQuestions { candidates: 0 })
        ));
    }
}
