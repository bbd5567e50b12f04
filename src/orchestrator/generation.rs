//! 分块生成编排器
//!
//! ## 职责
//!
//! - 把总题量平摊到每个分块
//! - 每个分块一个 tokio 任务，并发调用生成服务
//! - 传输类错误按指数退避重试，清洗失败不重试
//! - 等所有任务结束后再按分块顺序合并结果
//!
//! 单个分块失败只记日志；只有全部分块失败才向上报错。

use crate::config::Config;
use crate::error::{AggregationError, AppError, AppResult};
use crate::models::{GenerationRequest, MergedGeneration, TextChunk};
use crate::services::llm_service::QuestionGenerator;
use crate::services::sanitizer::{self, SanitizedChunk};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 生成编排器
///
/// 只持有共享的生成服务和重试参数，每次调用之间没有可变状态
pub struct GenerationOrchestrator {
    generator: Arc<dyn QuestionGenerator>,
    max_retries: u32,
    retry_base_delay: Duration,
    max_service_chars: usize,
}

impl GenerationOrchestrator {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            generator,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            max_service_chars: 15_000,
        }
    }

    pub fn from_config(generator: Arc<dyn QuestionGenerator>, config: &Config) -> Self {
        Self {
            generator,
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_service_chars: config.max_service_chars,
        }
    }

    /// 覆盖重试参数（测试中常用零延迟）
    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn max_service_chars(&self) -> usize {
        self.max_service_chars
    }

    /// 并发生成并合并所有分块的结果
    ///
    /// 题目按分块顺序、块内顺序拼接；主题取第一个成功的分块。
    /// 全部分块失败时返回 [`AggregationError::AllChunksFailed`]
    pub async fn generate_in_batches(
        &self,
        chunks: Vec<TextChunk>,
        total_requested: usize,
    ) -> AppResult<MergedGeneration> {
        if chunks.is_empty() {
            return Err(AppError::invalid_input("没有可用于生成的分块"));
        }
        if total_requested < 1 {
            return Err(AppError::invalid_input("题目数量至少为 1"));
        }

        let chunk_count = chunks.len();
        let target_count = GenerationRequest::per_chunk_target(total_requested, chunk_count);
        info!(
            "📤 分发 {} 个分块，每块目标 {} 道题（共请求 {} 道）",
            chunk_count, target_count, total_requested
        );

        // 为每个分块创建并发任务，句柄按分发顺序保存
        let mut indices = Vec::with_capacity(chunk_count);
        let mut handles = Vec::with_capacity(chunk_count);
        for chunk in chunks {
            let index = chunk.index;
            let request = GenerationRequest {
                chunk: self.bound_chunk(chunk),
                target_count,
            };
            let generator = Arc::clone(&self.generator);
            let max_retries = self.max_retries;
            let base_delay = self.retry_base_delay;

            let handle = tokio::spawn(async move {
                process_chunk(generator.as_ref(), request, max_retries, base_delay).await
            });
            indices.push(index);
            handles.push(handle);
        }

        // 等待所有任务结束后再检查结果，join_all 保持分发顺序
        let outcomes: Vec<(usize, AppResult<SanitizedChunk>)> = indices
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(index, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    error!("[分块 {}] 任务执行失败: {}", index + 1, e);
                    Err(AppError::llm_api_failed(self.generator.name(), e))
                });
                (index, outcome)
            })
            .collect();

        merge_outcomes(outcomes, chunk_count)
    }

    fn bound_chunk(&self, mut chunk: TextChunk) -> TextChunk {
        let text_len = chunk.text_len();
        if text_len > self.max_service_chars {
            debug!(
                "[分块 {}] 长度 {} 超过上限 {}，截断后发送",
                chunk.index + 1,
                text_len,
                self.max_service_chars
            );
            chunk.text = chunk.text.chars().take(self.max_service_chars).collect();
        }
        chunk
    }
}

/// 处理单个分块：调用（含重试）+ 清洗
async fn process_chunk(
    generator: &dyn QuestionGenerator,
    request: GenerationRequest,
    max_retries: u32,
    base_delay: Duration,
) -> AppResult<SanitizedChunk> {
    let label = request.chunk.index + 1;
    let raw = call_with_retry(generator, &request, max_retries, base_delay).await?;

    let sanitized = sanitizer::sanitize(&raw)?;
    if !sanitized.rejected.is_empty() {
        warn!(
            "[分块 {}] ⚠️ 丢弃 {} 道不合格题目",
            label,
            sanitized.rejected.len()
        );
        for (idx, reason) in &sanitized.rejected {
            debug!("[分块 {}]   候选 {}: {}", label, idx + 1, reason);
        }
    }
    info!("[分块 {}] ✓ 得到 {} 道合格题目", label, sanitized.questions.len());

    Ok(sanitized)
}

/// 调用生成服务，传输类错误按 `base_delay * 2^attempt` 退避重试
///
/// 首次调用之外最多重试 `max_retries` 次，`max_retries = 0` 表示不重试
async fn call_with_retry(
    generator: &dyn QuestionGenerator,
    request: &GenerationRequest,
    max_retries: u32,
    base_delay: Duration,
) -> AppResult<String> {
    let label = request.chunk.index + 1;
    let attempts = max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        match generator
            .generate(&request.chunk.text, request.target_count)
            .await
        {
            Ok(raw) => return Ok(raw),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let delay = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                warn!(
                    "[分块 {}] ⚠️ 第 {}/{} 次调用失败，{:?} 后重试: {}",
                    label,
                    attempt + 1,
                    attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("[分块 {}] ❌ 调用失败（已尝试 {} 次）: {}", label, attempt + 1, e);
                return Err(e);
            }
        }
    }
}

fn merge_outcomes(
    outcomes: Vec<(usize, AppResult<SanitizedChunk>)>,
    chunk_count: usize,
) -> AppResult<MergedGeneration> {
    let mut topic = None;
    let mut questions = Vec::new();
    let mut failed_chunks = Vec::new();
    let mut last_cause = None;

    for (index, outcome) in outcomes {
        match outcome {
            Ok(chunk) => {
                topic.get_or_insert(chunk.topic);
                questions.extend(chunk.questions);
            }
            Err(e) => {
                warn!("[分块 {}] ❌ 生成失败: {}", index + 1, e);
                failed_chunks.push(index);
                last_cause = Some(e.to_string());
            }
        }
    }

    let Some(topic) = topic else {
        return Err(AggregationError::AllChunksFailed {
            chunk_count,
            last_cause: last_cause.unwrap_or_default(),
        }
        .into());
    };

    if failed_chunks.is_empty() {
        info!("✓ {} 个分块全部成功，共 {} 道题目", chunk_count, questions.len());
    } else {
        warn!(
            "⚠️ {}/{} 个分块失败 {:?}，其余分块共 {} 道题目",
            failed_chunks.len(),
            chunk_count,
            failed_chunks,
            questions.len()
        );
    }

    Ok(MergedGeneration {
        topic,
        questions,
        chunk_count,
        failed_chunks,
    })
}
