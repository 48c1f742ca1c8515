use crate::error::FileError;
use crate::models::item::CandidateItem;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 种子文件结构
///
/// ```toml
/// [[items]]
/// content = "..."
/// headline = "..."
/// cos_similarity = 0.83
/// status = 0
/// ```
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    items: Vec<CandidateItem>,
}

/// 从单个 TOML 种子文件加载候选条目
pub async fn load_seed_file(toml_file_path: &Path) -> Result<Vec<CandidateItem>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let seed: SeedFile = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    if let Some(bad) = seed.items.iter().find(|item| item.status < 0) {
        anyhow::bail!(
            "TOML文件 {} 中的条目 status 为负数: {}",
            toml_file_path.display(),
            bad.key()
        );
    }

    Ok(seed.items)
}

/// 从文件夹中加载所有 TOML 种子文件（按文件名排序）
///
/// 单个文件解析失败只记录警告，不影响其他文件
pub async fn load_all_seed_files(folder_path: &str) -> Result<Vec<CandidateItem>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
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
    toml_files.sort();

    if toml_files.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到 TOML 文件", folder_path);
    }

    let mut items = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_seed_file(&path).await {
            Ok(loaded) => {
                tracing::info!("成功加载 {} 个候选条目", loaded.len());
                items.extend(loaded);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
[[items]]
content = "Stocks fell sharply on Monday."
headline = "You won't believe what happened to stocks"
cos_similarity = 0.41

[[items]]
content = "Stocks fell sharply on Monday."
headline = "Stocks fall on Monday"
original = "Markets slide"
probability = 0.9
reward = 1
beta = 0.1
model = "ppo"
status = 3
"#;

    #[tokio::test]
    async fn test_load_seed_file_parses_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.toml");
        std::fs::write(&path, SEED).unwrap();

        let items = load_seed_file(&path).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].status, 0);
        assert_eq!(items[0].similarity, Some(0.41));
        assert_eq!(items[1].provenance.model.as_deref(), Some("ppo"));
        assert_eq!(items[1].provenance.reward, Some(1.0));
        assert_eq!(items[1].status, 3);
    }

    #[tokio::test]
    async fn test_load_all_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), SEED).unwrap();
        std::fs::write(dir.path().join("b.toml"), "[[items]]\ncontent = 1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let items = load_all_seed_files(dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let err = load_all_seed_files("/definitely/not/here").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FileError>(),
            Some(FileError::DirectoryNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_status_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neg.toml");
        std::fs::write(&path, "[[items]]\ncontent = \"c\"\nheadline = \"h\"\nstatus = -1\n").unwrap();
        assert!(load_seed_file(&path).await.is_err());
    }
}
