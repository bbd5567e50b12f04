use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 题型
///
/// 目前只支持单选题，生成服务声明的其他题型一律归一为 `Mcq`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// 单选题
    #[default]
    Mcq,
}

impl QuestionKind {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
        }
    }
}

/// 通过校验的题目
///
/// 不变量：`answer` 与 `options` 中某一项完全相同，选项 2~4 个且互不相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    pub question_text: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

/// 主题（整套题的标题和描述）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub description: String,
}

impl Topic {
    pub const DEFAULT_TITLE: &'static str = "Generated Test";
    pub const DEFAULT_DESCRIPTION: &'static str = "Questions generated from the provided text";

    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl Default for Topic {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TITLE, Self::DEFAULT_DESCRIPTION)
    }
}

/// 已存储的主题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTopic {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// 已存储的题目（带标识符和所属主题）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQuestion {
    pub id: Uuid,
    pub topic_id: Uuid,
    #[serde(flatten)]
    pub question: Question,
    pub created_at: DateTime<Utc>,
}

/// 答题前展示用的题目视图，不含答案和解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&StoredQuestion> for QuestionView {
    fn from(stored: &StoredQuestion) -> Self {
        Self {
            id: stored.id,
            kind: stored.question.kind,
            question_text: stored.question.question_text.clone(),
            options: stored.question.options.clone(),
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 截断题干以便显示（最多80个字符）
        let preview = if self.question_text.chars().count() > 80 {
            self.question_text.chars().take(80).collect::<String>() + "..."
        } else {
            self.question_text.clone()
        };
        write!(f, "{} [选项: {}]", preview, self.options.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_uses_wire_field_names() {
        let question = Question {
            kind: QuestionKind::Mcq,
            question_text: "Capital of France?".into(),
            options: vec!["Paris".into(), "Rome".into()],
            answer: "Paris".into(),
            explanation: "It is.".into(),
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "mcq");
        assert_eq!(value["questionText"], "Capital of France?");
    }

    #[test]
    fn test_question_view_hides_answer() {
        let stored = StoredQuestion {
            id: Uuid::new_v4(),
            topic_id: Uuid::new_v4(),
            question: Question {
                kind: QuestionKind::Mcq,
                question_text: "Q".into(),
                options: vec!["A".into(), "B".into()],
                answer: "A".into(),
                explanation: "E".into(),
            },
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(QuestionView::from(&stored)).unwrap();
        assert!(value.get("answer").is_none());
        assert!(value.get("explanation").is_none());
        assert_eq!(value["options"][1], "B");
    }
}
