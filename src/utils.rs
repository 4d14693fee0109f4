use thiserror::Error;
use std::path::{Path, PathBuf};

/// 导入器错误类型
///
/// 由 [`crate::io::Importer`] 的实现返回，编辑层会将其包装为 [`EditorError::Importer`]。
#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported importer operation: {0}")]
    Unsupported(&'static str),

    #[error("Importer rejected the operation: {0}")]
    Rejected(String),
}

/// 编辑会话错误类型
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Importer error: {0}")]
    Importer(#[from] ImporterError),

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("File {0} could not be read when loaded, refusing to overwrite it")]
    UnreadableFile(String),

    #[error("Teardown left {0} debounce channel(s) alive")]
    TeardownIncomplete(usize),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
}

/// 在保持顺序的前提下追加元素（已存在则跳过）
///
/// # 返回
/// 实际追加时返回 true
pub fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<PathBuf, ImporterError> {
    if !file_path.exists() {
        return Err(ImporterError::NotFound(file_path.to_path_buf()));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path)?;

    Ok(backup_path)
}
