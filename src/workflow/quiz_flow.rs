//! 出题 / 答题流程 - 流程层
//!
//! 核心职责：定义一次请求的完整处理流程
//!
//! 出题流程：
//! 1. 校验原文和题量
//! 2. 分块（分块失败时整段截断兜底）
//! 3. 并发生成 → 汇总截断
//! 4. 入库并返回报告
//!
//! 答题流程：校验答卷 → 查题 → 批改

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult, PersistenceError};
use crate::models::{
    GenerationReport, GradedResult, QuestionView, QuizExport, QuizView, SubmittedAnswer,
};
use crate::orchestrator::GenerationOrchestrator;
use crate::services::llm_service::QuestionGenerator;
use crate::services::segmenter::{self, TextSegmenter};
use crate::services::{aggregator, scoring};
use crate::store::QuizStore;

/// 出题 / 答题服务
///
/// - 持有共享的生成服务和存储，可被多个任务并发使用
/// - 输入校验在任何耗时操作之前完成
pub struct QuizService {
    segmenter: TextSegmenter,
    orchestrator: GenerationOrchestrator,
    store: Arc<dyn QuizStore>,
    default_question_count: usize,
    max_question_count: usize,
    max_text_chars: usize,
}

impl QuizService {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        store: Arc<dyn QuizStore>,
        config: &Config,
    ) -> Self {
        Self {
            segmenter: TextSegmenter::from_config(config),
            orchestrator: GenerationOrchestrator::from_config(generator, config),
            store,
            default_question_count: config.default_question_count,
            max_question_count: config.max_question_count,
            max_text_chars: config.max_text_chars,
        }
    }

    /// 替换编排器（测试中用于关闭重试延迟）
    pub fn with_orchestrator(mut self, orchestrator: GenerationOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// 从原文生成一套题并入库
    ///
    /// `desired_count` 为空时使用默认题量。返回的题量可能少于请求，
    /// 缺口记录在报告的 `shortfall` 中
    pub async fn generate_from_text(
        &self,
        text: &str,
        desired_count: Option<usize>,
    ) -> AppResult<GenerationReport> {
        let started = Instant::now();
        let requested_count = desired_count.unwrap_or(self.default_question_count);
        self.validate_generation_request(text, requested_count)?;

        let mut chunks = self.segmenter.segment(text);
        if chunks.is_empty() {
            warn!("⚠️ 分块结果为空，使用整段截断兜底");
            chunks.extend(segmenter::fallback_chunk(
                text,
                self.orchestrator.max_service_chars(),
            ));
        }
        if chunks.is_empty() {
            return Err(AppError::invalid_input("原文中没有可用于出题的内容"));
        }
        info!("✂️ 原文切分为 {} 个分块", chunks.len());

        let merged = self
            .orchestrator
            .generate_in_batches(chunks, requested_count)
            .await?;
        let draft = aggregator::aggregate(&merged, requested_count)?;

        let topic_id = self
            .store
            .create_topic(&draft.topic.title, &draft.topic.description)
            .await?;
        let stored = self
            .store
            .bulk_insert_questions(topic_id, draft.questions.clone())
            .await?;

        let report = GenerationReport {
            topic_id,
            title: draft.topic.title.clone(),
            question_count: stored.len(),
            requested_count,
            shortfall: draft.shortfall(),
            chunk_count: merged.chunk_count,
            failed_chunks: merged.failed_chunks,
            elapsed_ms: started.elapsed().as_millis(),
        };

        info!(
            "✅ 已生成主题 \"{}\" ({})：{}/{} 道题目，耗时 {}ms",
            report.title, topic_id, report.question_count, requested_count, report.elapsed_ms
        );
        Ok(report)
    }

    /// 获取答题视图（不含答案和解析）
    pub async fn fetch_questions(&self, topic_id: &str) -> AppResult<QuizView> {
        let topic_id = parse_topic_id(topic_id)?;
        let topic = self
            .store
            .find_topic(topic_id)
            .await?
            .ok_or_else(|| topic_not_found(topic_id))?;

        let questions = self.store.find_questions_by_topic(topic_id).await?;
        Ok(QuizView {
            topic,
            questions: questions.iter().map(QuestionView::from).collect(),
        })
    }

    /// 提交答卷并批改
    pub async fn submit_answers(
        &self,
        topic_id: &str,
        answers: &[SubmittedAnswer],
    ) -> AppResult<GradedResult> {
        scoring::validate_submission(answers)?;
        let topic_id = parse_topic_id(topic_id)?;

        let stored = self.store.find_questions_by_topic(topic_id).await?;
        if stored.is_empty() {
            return Err(match self.store.find_topic(topic_id).await? {
                Some(_) => PersistenceError::NoQuestions {
                    topic_id: topic_id.to_string(),
                }
                .into(),
                None => topic_not_found(topic_id),
            });
        }

        let result = scoring::grade(&stored, answers)?;
        info!(
            "📝 主题 {} 批改完成: {}/{} ({}%, {})",
            topic_id, result.score, result.total_questions, result.percentage, result.performance
        );
        Ok(result)
    }

    /// 导出整套题（含答案），供批处理写入 TOML
    pub async fn export_quiz(&self, topic_id: Uuid) -> AppResult<QuizExport> {
        let topic = self
            .store
            .find_topic(topic_id)
            .await?
            .ok_or_else(|| topic_not_found(topic_id))?;
        let questions = self.store.find_questions_by_topic(topic_id).await?;
        Ok(QuizExport {
            topic,
            questions,
            file_path: None,
        })
    }

    fn validate_generation_request(&self, text: &str, count: usize) -> AppResult<()> {
        if text.trim().is_empty() {
            return Err(AppError::invalid_input("原文不能为空"));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(AppError::invalid_input(format!(
                "原文过长: {} 字符，上限 {}",
                chars, self.max_text_chars
            )));
        }
        if !(1..=self.max_question_count).contains(&count) {
            return Err(AppError::invalid_input(format!(
                "题目数量必须在 1 到 {} 之间，实际为 {}",
                self.max_question_count, count
            )));
        }
        Ok(())
    }
}

fn parse_topic_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| PersistenceError::InvalidId(raw.to_string()).into())
}

fn topic_not_found(topic_id: Uuid) -> AppError {
    PersistenceError::TopicNotFound {
        topic_id: topic_id.to_string(),
    }
    .into()
}
