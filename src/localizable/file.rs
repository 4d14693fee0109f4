use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::datatypes::{FileFormat, FileId, Language};

/// 一个物理本地化文件
///
/// 标识在创建时分配（加载或添加语言时），与路径无关；
/// 除了在所属分组中重新排序外不会被原地修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    id: FileId,
    pub language: Language,
    pub format: FileFormat,
    pub path: PathBuf,
    /// 所属分组名称
    pub localizable_name: String,
}

impl File {
    pub fn new(
        language: Language,
        format: FileFormat,
        path: PathBuf,
        localizable_name: impl Into<String>,
    ) -> Self {
        Self {
            id: FileId::new(),
            language,
            format,
            path,
            localizable_name: localizable_name.into(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }
}

/// 导入器读写的一条记录
///
/// 加载时由导入器产出，保存时由会话生成（同时也作为脏检查的快照单位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

impl ValueRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            comment: String::new(),
            original_index: None,
            variable_name: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}
