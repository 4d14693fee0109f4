use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 语言标识（语言代码，如 "en"、"fr"、"zh-Hans"、"Base"）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Language(code.into())
    }

    /// Base 语言（界面定义文件的开发语言）
    pub fn base() -> Self {
        Language("Base".to_string())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == "Base"
    }

    /// 友好名称（未知语言代码直接返回代码本身）
    pub fn friendly_name(&self) -> &str {
        match self.0.as_str() {
            "Base" => "Base",
            "en" => "English",
            "fr" => "French",
            "de" => "German",
            "es" => "Spanish",
            "it" => "Italian",
            "ja" => "Japanese",
            "ko" => "Korean",
            "ru" => "Russian",
            "tr" => "Turkish",
            "ar" => "Arabic",
            "pt" => "Portuguese",
            "zh-Hans" => "Chinese (Simplified)",
            "zh-Hant" => "Chinese (Traditional)",
            other => other,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Language::new(code)
    }
}

/// 物理文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    /// 普通字符串表
    Strings,
    /// 结构化配置（plist 等）
    Config,
    /// 由界面定义文件派生的文本
    Interface,
    /// 其他
    Other,
}

impl FileFormat {
    /// 是否可以单独移除该语言文件
    ///
    /// 只有普通字符串表可以安全地单独删除，结构化 / 派生格式不行
    pub fn supports_removal(&self) -> bool {
        matches!(self, FileFormat::Strings)
    }
}

/// 本地化分组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocalizableKind {
    Strings,
    Config,
    Interface,
    Other,
}

/// 加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Ready,
    /// Ready 的瞬时子状态：正在写入某个文件
    Saving,
}

impl LoadStatus {
    /// Ready 或 Saving 都视为可编辑
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadStatus::Ready | LoadStatus::Saving)
    }
}

/// 物理文件标识（创建时分配，与路径无关）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        FileId(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ValueSet 的内部标识，与 key 无关，重命名 key 不影响撤销记录和选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValueSetId(Uuid);

impl ValueSetId {
    pub fn new() -> Self {
        ValueSetId(Uuid::new_v4())
    }
}

impl Default for ValueSetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValueSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 本地化分组在会话中的句柄（项目集合中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalizableId(pub usize);

impl fmt::Display for LocalizableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names() {
        assert_eq!(Language::new("fr").friendly_name(), "French");
        assert_eq!(Language::new("xx").friendly_name(), "xx");
        assert!(Language::base().is_base());
        assert_eq!(Language::from("en").to_string(), "en");
    }

    #[test]
    fn test_only_strings_are_removable() {
        assert!(FileFormat::Strings.supports_removal());
        assert!(!FileFormat::Config.supports_removal());
        assert!(!FileFormat::Interface.supports_removal());
        assert!(!FileFormat::Other.supports_removal());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(FileId::new(), FileId::new());
        assert_ne!(ValueSetId::new(), ValueSetId::new());
    }

    #[test]
    fn test_saving_counts_as_ready() {
        assert!(LoadStatus::Ready.is_ready());
        assert!(LoadStatus::Saving.is_ready());
        assert!(!LoadStatus::Loading.is_ready());
    }
}
