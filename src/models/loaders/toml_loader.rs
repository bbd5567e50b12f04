use crate::models::quiz::{QuizExport, SubmissionFile};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载导出的整套题
pub async fn load_quiz_export(toml_file_path: &Path) -> Result<QuizExport> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut export: QuizExport = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    // 设置文件路径
    export.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(export)
}

/// 将整套题写入 `<folder>/<topic_id>.toml`，返回写入路径
pub async fn save_quiz_export(folder_path: &str, export: &QuizExport) -> Result<PathBuf> {
    let folder = PathBuf::from(folder_path);
    fs::create_dir_all(&folder)
        .await
        .with_context(|| format!("无法创建文件夹: {}", folder_path))?;

    let content = toml::to_string_pretty(export).context("无法序列化题目为TOML")?;
    let path = folder.join(format!("{}.toml", export.topic.id));

    fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入TOML文件: {}", path.display()))?;

    Ok(path)
}

/// 从文件夹中加载所有导出的整套题
pub async fn load_all_quiz_exports(folder_path: &str) -> Result<Vec<QuizExport>> {
    let mut exports = Vec::new();

    for path in list_toml_files(folder_path).await? {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_quiz_export(&path).await {
            Ok(export) => {
                tracing::info!("成功加载 {} 个题目", export.questions.len());
                exports.push(export);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(exports)
}

/// 从 TOML 文件加载答卷
pub async fn load_submission(toml_file_path: &Path) -> Result<SubmissionFile> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取答卷文件: {}", toml_file_path.display()))?;

    let mut submission: SubmissionFile = toml::from_str(&content)
        .with_context(|| format!("无法解析答卷文件: {}", toml_file_path.display()))?;

    submission.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(submission)
}

/// 从文件夹中加载所有答卷
pub async fn load_all_submissions(folder_path: &str) -> Result<Vec<SubmissionFile>> {
    let mut submissions = Vec::new();

    for path in list_toml_files(folder_path).await? {
        match load_submission(&path).await {
            Ok(submission) => {
                tracing::info!(
                    "成功加载答卷 {} ({} 个答案)",
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    submission.answers.len()
                );
                submissions.push(submission);
            }
            Err(e) => {
                tracing::warn!("加载答卷失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(submissions)
}

async fn list_toml_files(folder_path: &str) -> Result<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }

    // 按文件名排序，保证批处理顺序稳定
    toml_files.sort();
    Ok(toml_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionKind, StoredQuestion, StoredTopic};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_export() -> QuizExport {
        let topic_id = Uuid::new_v4();
        QuizExport {
            topic: StoredTopic {
                id: topic_id,
                title: "Geography".into(),
                description: "Capitals".into(),
                created_at: Utc::now(),
            },
            questions: vec![StoredQuestion {
                id: Uuid::new_v4(),
                topic_id,
                question: Question {
                    kind: QuestionKind::Mcq,
                    question_text: "Capital of France?".into(),
                    options: vec!["Paris".into(), "Rome".into(), "Oslo".into(), "Bern".into()],
                    answer: "Paris".into(),
                    explanation: "Paris is the capital.".into(),
                },
                created_at: Utc::now(),
            }],
            file_path: None,
        }
    }

    #[tokio::test]
    async fn test_save_then_load_export() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().to_string_lossy().to_string();
        let export = sample_export();

        let path = save_quiz_export(&folder, &export).await.unwrap();
        let loaded = load_quiz_export(&path).await.unwrap();

        assert_eq!(loaded.topic, export.topic);
        assert_eq!(loaded.questions, export.questions);
        assert!(loaded.file_path.is_some());
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let result = load_all_submissions("definitely/not/here").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_broken_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.toml"), "topicId = ").unwrap();
        std::fs::write(
            dir.path().join("good.toml"),
            "topicId = \"abc\"\n[[answers]]\nquestionId = \"q\"\nuserAnswer = \"a\"\n",
        )
        .unwrap();

        let loaded = load_all_submissions(&dir.path().to_string_lossy())
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].topic_id, "abc");
    }
}
