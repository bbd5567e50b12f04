use super::question::{Question, QuestionView, StoredQuestion, StoredTopic, Topic};
use super::grading::SubmittedAnswer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 编排层合并后的生成结果（已逐块清洗）
#[derive(Debug, Clone)]
pub struct MergedGeneration {
    pub topic: Topic,
    pub questions: Vec<Question>,
    /// 参与生成的分块数
    pub chunk_count: usize,
    /// 失败分块的索引
    pub failed_chunks: Vec<usize>,
}

/// 汇总后的题目草稿，尚未入库
#[derive(Debug, Clone)]
pub struct QuizDraft {
    pub topic: Topic,
    pub questions: Vec<Question>,
    pub requested_count: usize,
}

impl QuizDraft {
    /// 与请求题量相比的缺口，0 表示题量充足
    pub fn shortfall(&self) -> usize {
        self.requested_count.saturating_sub(self.questions.len())
    }
}

/// "从文本生成"接口的返回值
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub topic_id: Uuid,
    pub title: String,
    pub question_count: usize,
    pub requested_count: usize,
    pub shortfall: usize,
    pub chunk_count: usize,
    pub failed_chunks: Vec<usize>,
    pub elapsed_ms: u128,
}

/// 答题前的整套题视图
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub topic: StoredTopic,
    pub questions: Vec<QuestionView>,
}

/// 导出到 TOML 的整套题（含答案）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizExport {
    pub topic: StoredTopic,
    #[serde(default)]
    pub questions: Vec<StoredQuestion>,
    /// 导出来源文件（仅用于日志）
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

/// 从 TOML 加载的答卷
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFile {
    pub topic_id: String,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    #[serde(skip_deserializing)]
    pub file_path: Option<String>,
}
