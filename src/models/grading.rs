use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 未作答时写入报告的占位答案
pub const NOT_ANSWERED: &str = "Not Answered";

/// 用户提交的单题答案
///
/// 两个字段都可能缺失，缺失由评分引擎统一拒绝
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl SubmittedAnswer {
    pub fn new(question_id: impl Into<String>, user_answer: impl Into<String>) -> Self {
        Self {
            question_id: Some(question_id.into()),
            user_answer: Some(user_answer.into()),
        }
    }
}

/// 成绩等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Fair")]
    Fair,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Performance {
    /// 按百分比划分等级：≥80 / ≥60 / ≥40 / 其他
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Performance::Excellent
        } else if percentage >= 60.0 {
            Performance::Good
        } else if percentage >= 40.0 {
            Performance::Fair
        } else {
            Performance::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::Fair => "Fair",
            Performance::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 单题批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedEntry {
    pub question_id: Uuid,
    pub question_text: String,
    pub options: Vec<String>,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    pub is_correct: bool,
}

/// 整份答卷的批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    pub score: usize,
    pub total_questions: usize,
    pub percentage: f64,
    pub performance: Performance,
    pub results: Vec<GradedEntry>,
}
