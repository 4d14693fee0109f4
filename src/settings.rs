/// 编辑器配置
///
/// 会话开始时读取一次；导入器选项以 `Arc` 快照的形式传给每一次保存，
/// 会话中途修改选项不会影响已经排队的保存。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::editor::history::DEFAULT_HISTORY_LIMIT;
use crate::search::SearchOptions;
use crate::utils::EditorError;

/// 导出顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportOrder {
    /// 与原文件相同
    #[default]
    SameAsOriginal,
    /// 按 key 字母序
    Alphabetical,
}

/// 注释风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStyle {
    #[default]
    Line,
    Block,
}

/// 空行位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyLines {
    None,
    #[default]
    BeforeComments,
    BetweenEntries,
}

/// 导入器格式选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterOptions {
    /// 导入配置文件中的所有 key
    pub import_all_plist_keys: bool,
    /// 已知的配置 key（修改配置类分组的 key 时自动登记）
    pub plist_keys: Vec<String>,
    pub ignore_empty_values: bool,
    pub ignore_whitespace_only_values: bool,
    pub ignore_unused_in_storyboards: bool,
    pub ignore_comments_in_storyboards: bool,
    /// 导入时忽略的值
    pub ignored_values: Vec<String>,
    pub export_order: ExportOrder,
    pub comment_style: CommentStyle,
    pub empty_lines: EmptyLines,
}

impl Default for ImporterOptions {
    fn default() -> Self {
        Self {
            import_all_plist_keys: false,
            plist_keys: vec![
                "CFBundleDisplayName".to_string(),
                "CFBundleName".to_string(),
                "NSCameraUsageDescription".to_string(),
                "NSPhotoLibraryUsageDescription".to_string(),
                "NSLocationWhenInUseUsageDescription".to_string(),
            ],
            ignore_empty_values: false,
            ignore_whitespace_only_values: false,
            ignore_unused_in_storyboards: true,
            ignore_comments_in_storyboards: false,
            ignored_values: Vec::new(),
            export_order: ExportOrder::SameAsOriginal,
            comment_style: CommentStyle::Line,
            empty_lines: EmptyLines::BeforeComments,
        }
    }
}

impl ImporterOptions {
    /// 导入时是否应忽略该值
    pub fn should_ignore(&self, value: &str) -> bool {
        (self.ignore_empty_values && value.is_empty())
            || (self.ignore_whitespace_only_values && !value.is_empty() && value.trim().is_empty())
            || self.ignored_values.iter().any(|v| v == value)
    }
}

/// 通用开关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// 后台自动保存
    pub autosave: bool,
    /// 打开项目时自动加载所有分组
    pub autoload: bool,
    /// 侧边栏显示未本地化的文件
    pub show_unlocalized_files: bool,
    /// 撤销历史深度
    pub history_limit: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            autosave: true,
            autoload: true,
            show_unlocalized_files: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// 编辑器配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub general: GeneralSettings,
    pub importer: ImporterOptions,
    pub search: SearchOptions,
}

impl EditorSettings {
    /// 从 JSON 文件加载配置（缺失字段使用默认值）
    pub fn load_from_file(path: &Path) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 保存配置到 JSON 文件
    pub fn save_to_file(&self, path: &Path) -> Result<(), EditorError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = EditorSettings::default();
        assert!(settings.general.autosave);
        assert!(settings.general.autoload);
        assert!(!settings.general.show_unlocalized_files);
        assert_eq!(settings.importer.export_order, ExportOrder::SameAsOriginal);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            EditorSettings::from_json(r#"{"general": {"autosave": false}, "importer": {"export_order": "alphabetical"}}"#)
                .unwrap();
        assert!(!settings.general.autosave);
        assert!(settings.general.autoload);
        assert_eq!(settings.importer.export_order, ExportOrder::Alphabetical);
        assert_eq!(settings.general.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EditorSettings::from_json("{not json"),
            Err(EditorError::Settings(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = EditorSettings::default();
        settings.general.show_unlocalized_files = true;
        settings.importer.ignored_values.push("TODO".to_string());
        settings.save_to_file(&path).unwrap();

        let loaded = EditorSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_should_ignore() {
        let options = ImporterOptions {
            ignore_empty_values: true,
            ignore_whitespace_only_values: true,
            ignored_values: vec!["TODO".to_string()],
            ..ImporterOptions::default()
        };
        assert!(options.should_ignore(""));
        assert!(options.should_ignore("   "));
        assert!(options.should_ignore("TODO"));
        assert!(!options.should_ignore("Hi"));
    }
}
