/// 编辑命令
///
/// 每个逻辑编辑都对应一个命令；撤销历史中保存的是"逆命令"，
/// 撤销 / 重做时通过与正向调用相同的入口重新执行，
/// 从而保证脏标记与保存调度的副作用完全一致。

use crate::datatypes::{Language, LocalizableId, ValueSetId};
use crate::localizable::{LanguageValue, ValueSet, ValueSetField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// 追加（或按原位置插回）ValueSet
    AddValueSets {
        localizable: LocalizableId,
        value_sets: Vec<ValueSet>,
        /// 插回位置（升序），None 表示追加到末尾
        positions: Option<Vec<usize>>,
    },
    /// 按标识移除 ValueSet
    RemoveValueSets {
        localizable: LocalizableId,
        ids: Vec<ValueSetId>,
    },
    /// 修改 key / 注释 / 某个语言的值
    UpdateField {
        localizable: LocalizableId,
        value_set: ValueSetId,
        field: ValueSetField,
        value: String,
    },
    /// 恢复某个语言的完整记录（修改取值的逆命令，None 表示原本没有记录）
    RestoreValue {
        localizable: LocalizableId,
        value_set: ValueSetId,
        language: Language,
        entry: Option<LanguageValue>,
    },
    AddLanguage {
        localizable: LocalizableId,
        language: Language,
        file_index: usize,
        /// 新文件的初始内容（撤销删除语言时为删除前的文件内容）
        seed: Option<Vec<u8>>,
    },
    RemoveLanguage {
        localizable: LocalizableId,
        language: Language,
    },
    Localize {
        localizable: LocalizableId,
    },
    Unlocalize {
        localizable: LocalizableId,
    },
}

impl EditCommand {
    /// 撤销菜单上显示的动作名称
    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::AddValueSets { .. } => "Adding",
            EditCommand::RemoveValueSets { .. } => "Removing",
            EditCommand::UpdateField { .. } | EditCommand::RestoreValue { .. } => "Typing",
            EditCommand::AddLanguage { .. } => "Adding Language",
            EditCommand::RemoveLanguage { .. } => "Removing Language",
            EditCommand::Localize { .. } => "Localizing",
            EditCommand::Unlocalize { .. } => "Unlocalizing",
        }
    }

    pub fn localizable(&self) -> LocalizableId {
        match self {
            EditCommand::AddValueSets { localizable, .. }
            | EditCommand::RemoveValueSets { localizable, .. }
            | EditCommand::UpdateField { localizable, .. }
            | EditCommand::RestoreValue { localizable, .. }
            | EditCommand::AddLanguage { localizable, .. }
            | EditCommand::RemoveLanguage { localizable, .. }
            | EditCommand::Localize { localizable }
            | EditCommand::Unlocalize { localizable } => *localizable,
        }
    }
}

impl std::fmt::Display for EditCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditCommand::AddValueSets { localizable, value_sets, .. } => {
                write!(f, "add {} value set(s) to {}", value_sets.len(), localizable)
            }
            EditCommand::RemoveValueSets { localizable, ids } => {
                write!(f, "remove {} value set(s) from {}", ids.len(), localizable)
            }
            EditCommand::UpdateField { localizable, field, value, .. } => {
                let shown = if value.chars().count() > 30 {
                    format!("{}...", value.chars().take(30).collect::<String>())
                } else {
                    value.clone()
                };
                write!(f, "set {:?} = \"{}\" in {}", field, shown, localizable)
            }
            EditCommand::RestoreValue { localizable, language, entry, .. } => match entry {
                Some(entry) => write!(f, "restore [{}] = \"{}\" in {}", language, entry.value, localizable),
                None => write!(f, "clear [{}] in {}", language, localizable),
            },
            EditCommand::AddLanguage { localizable, language, .. } => {
                write!(f, "add language {} to {}", language, localizable)
            }
            EditCommand::RemoveLanguage { localizable, language } => {
                write!(f, "remove language {} from {}", language, localizable)
            }
            EditCommand::Localize { localizable } => write!(f, "localize {}", localizable),
            EditCommand::Unlocalize { localizable } => write!(f, "unlocalize {}", localizable),
        }
    }
}
