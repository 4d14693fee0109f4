use std::cmp::Ordering;
use std::path::PathBuf;

use crate::datatypes::{FileId, Language, LoadStatus, LocalizableKind, ValueSetId};

use super::file::{File, ValueRecord};
use super::value_set::ValueSet;

/// 本地化分组：共享同一套 key 的若干语言文件
///
/// # 不变量
/// - 只有在状态不是 Unloaded 时才持有 ValueSet
/// - `languages()` 恰好是拥有文件的语言集合（每种语言至多一个文件）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localizable {
    pub name: String,
    pub kind: LocalizableKind,
    /// 分组在项目中的位置（导入器使用）
    pub path: PathBuf,
    pub localized: bool,
    pub files: Vec<File>,
    pub value_sets: Vec<ValueSet>,
    pub status: LoadStatus,
}

impl Localizable {
    pub fn new(name: impl Into<String>, kind: LocalizableKind, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            kind,
            path,
            localized: true,
            files: Vec::new(),
            value_sets: Vec::new(),
            status: LoadStatus::Unloaded,
        }
    }

    pub fn with_file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    pub fn unlocalized(mut self) -> Self {
        self.localized = false;
        self
    }

    /// 当前拥有文件的语言（按文件顺序）
    pub fn languages(&self) -> Vec<Language> {
        self.files.iter().map(|f| f.language.clone()).collect()
    }

    pub fn has_language(&self, language: &Language) -> bool {
        self.files.iter().any(|f| &f.language == language)
    }

    pub fn file_for(&self, language: &Language) -> Option<&File> {
        self.files.iter().find(|f| &f.language == language)
    }

    pub fn file_index(&self, language: &Language) -> Option<usize> {
        self.files.iter().position(|f| &f.language == language)
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.iter().find(|f| f.id() == id)
    }

    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id()).collect()
    }

    pub fn value_set(&self, id: ValueSetId) -> Option<&ValueSet> {
        self.value_sets.iter().find(|vs| vs.id() == id)
    }

    pub fn value_set_mut(&mut self, id: ValueSetId) -> Option<&mut ValueSet> {
        self.value_sets.iter_mut().find(|vs| vs.id() == id)
    }

    pub fn value_set_position(&self, id: ValueSetId) -> Option<usize> {
        self.value_sets.iter().position(|vs| vs.id() == id)
    }

    /// 是否已存在该 key（供"添加字符串"界面校验使用，核心层不强制唯一）
    pub fn contains_key(&self, key: &str) -> bool {
        self.value_sets.iter().any(|vs| vs.key == key)
    }

    /// 某个语言文件的完整内存快照（按 ValueSet 顺序）
    pub fn values_for(&self, language: &Language) -> Vec<ValueRecord> {
        self.value_sets
            .iter()
            .filter_map(|vs| {
                let entry = vs.value(language)?;
                Some(ValueRecord {
                    key: vs.key.clone(),
                    value: entry.value.clone(),
                    comment: vs.comment.clone(),
                    original_index: entry.original_index,
                    variable_name: entry.variable_name.clone(),
                })
            })
            .collect()
    }

    /// 所有语言都有非空值
    pub fn is_translated(&self, value_set: &ValueSet) -> bool {
        self.files
            .iter()
            .all(|f| !value_set.text(&f.language).is_empty())
    }

    /// 用重新读取的记录替换某个语言的全部取值
    ///
    /// 替换后不再有任何取值、且原本持有该语言的 ValueSet 会被丢弃
    pub fn replace_language_values(&mut self, language: &Language, records: Vec<ValueRecord>) {
        let mut touched = Vec::new();
        for vs in &mut self.value_sets {
            if vs.remove_value(language).is_some() {
                touched.push(vs.id());
            }
        }

        fold_records(&mut self.value_sets, language, records);

        self.value_sets
            .retain(|vs| !touched.contains(&vs.id()) || vs.languages().next().is_some());
    }

    /// 展示顺序：已本地化的在前，其次按名称
    pub fn presentation_cmp(&self, other: &Localizable) -> Ordering {
        other
            .localized
            .cmp(&self.localized)
            .then_with(|| self.name.to_lowercase().cmp(&other.name.to_lowercase()))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// 将导入器读出的记录按 key + 语言合并进 ValueSet 列表
///
/// - key 首次出现时创建 ValueSet
/// - 其他语言的记录填充已有 ValueSet 的对应语言
/// - 注释取第一个非空值
pub fn fold_records(value_sets: &mut Vec<ValueSet>, language: &Language, records: Vec<ValueRecord>) {
    for record in records {
        let position = match value_sets.iter().position(|vs| vs.key == record.key) {
            Some(position) => position,
            None => {
                value_sets.push(ValueSet::new(record.key.clone()));
                value_sets.len() - 1
            }
        };

        let value_set = &mut value_sets[position];
        value_set.set_value(language.clone(), record.value);
        value_set.set_original_index(language, record.original_index);
        value_set.set_variable_name(language, record.variable_name);

        if value_set.comment.is_empty() {
            value_set.comment = record.comment;
        }
    }
}

/// 计算某个分组在同类分组中的展示位置
///
/// # 参数
/// * `include_unlocalized` - 是否显示未本地化的分组
///
/// # 返回
/// 分组被隐藏时返回 None
pub fn presentation_position(
    localizables: &[Localizable],
    index: usize,
    include_unlocalized: bool,
) -> Option<usize> {
    let target = localizables.get(index)?;
    if !target.localized && !include_unlocalized {
        return None;
    }

    let mut siblings: Vec<(usize, &Localizable)> = localizables
        .iter()
        .enumerate()
        .filter(|(_, l)| l.kind == target.kind && (l.localized || include_unlocalized))
        .collect();
    siblings.sort_by(|a, b| a.1.presentation_cmp(b.1));
    siblings.iter().position(|(i, _)| *i == index)
}
