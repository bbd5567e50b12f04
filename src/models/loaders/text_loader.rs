use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 待出题的原文
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// 文件名（不含扩展名），用于日志和导出
    pub name: String,
    pub text: String,
    pub file_path: String,
}

const SOURCE_EXTENSIONS: &[&str] = &["txt", "md"];

/// 读取单个原文文件
///
/// 只处理纯文本；二进制文档的文本提取不在本模块范围内
pub async fn load_source_document(path: &Path) -> Result<SourceDocument> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取原文文件: {}", path.display()))?;

    let text = String::from_utf8(bytes)
        .with_context(|| format!("原文不是有效的 UTF-8 文本: {}", path.display()))?;

    let name = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(SourceDocument {
        name,
        text,
        file_path: path.to_string_lossy().to_string(),
    })
}

/// 从文件夹中加载所有原文文件（.txt / .md）
pub async fn load_all_source_documents(folder_path: &str) -> Result<Vec<SourceDocument>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_source {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        match load_source_document(&path).await {
            Ok(doc) => {
                tracing::info!("成功加载原文 {} ({} 字符)", doc.name, doc.text.chars().count());
                documents.push(doc);
            }
            Err(e) => {
                tracing::warn!("加载原文失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}
