//! 单个文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个文件，是文件级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **出题**：原文 → `QuizService::generate_from_text` → 导出 TOML
//! 2. **批改**：答卷 → `QuizService::submit_answers` → 写入 JSON 报告
//! 3. **统计输出**：记录题量缺口、得分等信息

use crate::models::{save_quiz_export, ApiResponse, SourceDocument, SubmissionFile};
use crate::workflow::{QuizCtx, QuizService};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// 从单个原文生成题目并导出
///
/// # 参数
/// - `service`: 出题服务
/// - `document`: 原文
/// - `ctx`: 文件上下文（用于日志）
/// - `question_count`: 请求题量
/// - `output_folder`: 导出目录
///
/// # 返回
/// 返回是否成功生成并导出
pub async fn process_source_document(
    service: &QuizService,
    document: SourceDocument,
    ctx: &QuizCtx,
    question_count: usize,
    output_folder: &str,
) -> Result<bool> {
    log_document_start(ctx, &document);

    let report = match service
        .generate_from_text(&document.text, Some(question_count))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            error!("{} ❌ 出题失败 [{}]: {}", ctx, e.code(), e);
            return Ok(false);
        }
    };

    if report.shortfall > 0 {
        warn!(
            "{} ⚠️ 题量不足: 请求 {} 道，实际 {} 道",
            ctx, report.requested_count, report.question_count
        );
    }
    if !report.failed_chunks.is_empty() {
        warn!(
            "{} ⚠️ {}/{} 个分块生成失败",
            ctx,
            report.failed_chunks.len(),
            report.chunk_count
        );
    }

    let export = service
        .export_quiz(report.topic_id)
        .await
        .with_context(|| format!("{} 无法导出主题 {}", ctx, report.topic_id))?;
    let path = save_quiz_export(output_folder, &export).await?;

    info!(
        "{} ✓ 已导出 {} 道题目 → {}",
        ctx,
        report.question_count,
        path.display()
    );
    Ok(true)
}

/// 批改单份答卷并写入 JSON 报告
///
/// 无论成功失败都会写入统一的响应信封，返回是否批改成功
pub async fn grade_submission(
    service: &QuizService,
    submission: SubmissionFile,
    ctx: &QuizCtx,
    output_folder: &str,
) -> Result<bool> {
    info!(
        "{} 📝 批改答卷: 主题 {}，共 {} 个答案",
        ctx,
        submission.topic_id,
        submission.answers.len()
    );

    let result = service
        .submit_answers(&submission.topic_id, &submission.answers)
        .await;
    let graded = result.is_ok();

    match &result {
        Ok(graded) => info!(
            "{} ✓ 得分 {}/{} ({}%, {})",
            ctx, graded.score, graded.total_questions, graded.percentage, graded.performance
        ),
        Err(e) => error!("{} ❌ 批改失败 [{}]: {}", ctx, e.code(), e),
    }

    let envelope = match result {
        Ok(graded) => ApiResponse::success(graded, "Test submitted successfully"),
        Err(e) => ApiResponse::failure(&e),
    };

    let path = report_path(output_folder, &submission);
    write_json_report(&path, &envelope).await?;
    info!("{} 💾 报告已保存至: {}", ctx, path.display());

    Ok(graded)
}

fn report_path(output_folder: &str, submission: &SubmissionFile) -> PathBuf {
    let stem = submission
        .file_path
        .as_deref()
        .and_then(|p| Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| submission.topic_id.clone());
    Path::new(output_folder).join(format!("{}.result.json", stem))
}

async fn write_json_report<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建文件夹: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value).context("无法序列化批改报告")?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入报告: {}", path.display()))?;
    Ok(())
}

fn log_document_start(ctx: &QuizCtx, document: &SourceDocument) {
    info!("\n{}", "─".repeat(60));
    info!(
        "{} 📄 开始出题: {} ({} 字符)",
        ctx,
        document.file_path,
        document.text.chars().count()
    );
    info!("{}", "─".repeat(60));
}
