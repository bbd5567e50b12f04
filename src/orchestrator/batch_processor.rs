//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量文件的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建生成服务、题库和出题服务
//! 2. **批量加载**：按运行模式扫描原文目录或答卷目录
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将文件分批次处理，每批完成后再开始下一批
//! 5. **全局统计**：汇总所有文件的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文件的细节，委托 quiz_processor
//! - **资源所有者**：唯一持有生成服务和题库的模块
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发

use crate::config::{Config, RunMode};
use crate::models::{load_all_quiz_exports, load_all_source_documents, load_all_submissions};
use crate::orchestrator::quiz_processor;
use crate::services::llm_service::{LlmService, QuestionGenerator};
use crate::store::InMemoryQuizStore;
use crate::utils::logging;
use crate::workflow::{QuizCtx, QuizService};
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<InMemoryQuizStore>,
    service: Arc<QuizService>,
}

impl App {
    /// 初始化应用，使用配置中的 LLM 作为生成服务
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate(config.mode == RunMode::Generate)?;

        let mode = match config.mode {
            RunMode::Generate => "出题模式",
            RunMode::Grade => "批改模式",
        };
        logging::log_startup(mode, config.max_concurrent_files);

        let generator: Arc<dyn QuestionGenerator> = Arc::new(LlmService::new(&config));
        info!("🤖 生成服务: {}", generator.name());

        Ok(Self::with_generator(config, generator))
    }

    /// 使用指定的生成服务创建应用
    pub fn with_generator(config: Config, generator: Arc<dyn QuestionGenerator>) -> Self {
        let store = Arc::new(InMemoryQuizStore::new());
        let service = Arc::new(QuizService::new(generator, store.clone(), &config));
        Self {
            config,
            store,
            service,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let stats = match self.config.mode {
            RunMode::Generate => self.run_generate().await?,
            RunMode::Grade => self.run_grade().await?,
        };

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_folder,
        );
        Ok(())
    }

    /// 出题模式：原文 → 题目 → TOML
    async fn run_generate(&self) -> Result<ProcessingStats> {
        info!("\n📁 正在扫描待处理的原文...");
        let documents = load_all_source_documents(&self.config.source_folder).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的原文文件，程序结束");
            return Ok(ProcessingStats::default());
        }
        log_files_loaded(documents.len(), self.config.max_concurrent_files);

        let question_count = self.config.default_question_count;
        let output_folder = self.config.output_folder.clone();

        self.process_all(documents, |document, file_index, service| {
            let output_folder = output_folder.clone();
            async move {
                let ctx = QuizCtx::new(file_index, document.name.clone());
                quiz_processor::process_source_document(
                    &service,
                    document,
                    &ctx,
                    question_count,
                    &output_folder,
                )
                .await
            }
        })
        .await
    }

    /// 批改模式：导入已导出的题目，逐份批改答卷
    async fn run_grade(&self) -> Result<ProcessingStats> {
        info!("\n📁 正在导入已导出的题目...");
        let exports = load_all_quiz_exports(&self.config.output_folder).await?;
        let mut imported = 0;
        for export in exports {
            let source = export.file_path.clone().unwrap_or_default();
            match self.store.import(export).await {
                Ok(()) => imported += 1,
                Err(e) => error!("导入失败 {}: {}", source, e),
            }
        }
        info!("✓ 已导入 {} 套题目", imported);

        info!("\n📁 正在扫描待批改的答卷...");
        let submissions = load_all_submissions(&self.config.submissions_folder).await?;
        if submissions.is_empty() {
            warn!("⚠️ 没有找到待批改的答卷，程序结束");
            return Ok(ProcessingStats::default());
        }
        log_files_loaded(submissions.len(), self.config.max_concurrent_files);

        let output_folder = self.config.output_folder.clone();
        self.process_all(submissions, |submission, file_index, service| {
            let output_folder = output_folder.clone();
            async move {
                let ctx = QuizCtx::new(file_index, submission.topic_id.clone());
                quiz_processor::grade_submission(&service, submission, &ctx, &output_folder).await
            }
        })
        .await
    }

    /// 分批并发处理所有文件
    async fn process_all<T, F, Fut>(&self, items: Vec<T>, task: F) -> Result<ProcessingStats>
    where
        T: Send + 'static,
        F: Fn(T, usize, Arc<QuizService>) -> Fut,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let max_concurrent = self.config.max_concurrent_files.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let total = items.len();
        let total_batches = total.div_ceil(max_concurrent);
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        let mut remaining = items.into_iter().enumerate();
        for batch_num in 1..=total_batches {
            let batch: Vec<(usize, T)> = remaining.by_ref().take(max_concurrent).collect();
            let batch_start = (batch_num - 1) * max_concurrent;
            logging::log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            // 为本批创建并发任务
            let mut batch_handles = Vec::with_capacity(batch.len());
            for (idx, item) in batch {
                let file_index = idx + 1;
                let permit = semaphore.clone().acquire_owned().await?;
                let fut = task(item, file_index, self.service.clone());

                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    fut.await
                });
                batch_handles.push((file_index, handle));
            }

            // 等待本批所有任务完成
            let mut result = BatchResult::default();
            for (file_index, handle) in batch_handles {
                match handle.await {
                    Ok(Ok(true)) => result.success += 1,
                    Ok(Ok(false)) => result.failed += 1,
                    Ok(Err(e)) => {
                        error!("[文件 {}] ❌ 处理过程中发生错误: {:#}", file_index, e);
                        result.failed += 1;
                    }
                    Err(e) => {
                        error!("[文件 {}] 任务执行失败: {}", file_index, e);
                        result.failed += 1;
                    }
                }
            }

            stats.success += result.success;
            stats.failed += result.failed;
            logging::log_batch_complete(batch_num, result.success, result.success + result.failed);
        }

        Ok(stats)
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}

fn log_files_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待处理的文件", total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
    info!("💡 每批完成后再开始下一批\n");
}
