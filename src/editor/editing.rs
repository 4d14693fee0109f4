/// 编辑接口
///
/// 每个公开的编辑操作都构造一个 [`EditCommand`] 并交给 `execute`；
/// 撤销 / 重做执行历史中的逆命令时走的是同一个入口，
/// 因此脏标记与保存调度在正向编辑和撤销时完全一致。
///
/// 返回值约定：
/// - `Ok(true)` 编辑已应用
/// - `Ok(false)` 前置条件不满足（越界、重复语言、值未变化……），状态不变
/// - `Err(..)` 导入器失败，状态不变且不产生历史记录

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::commands::EditCommand;
use super::history::HistoryEntry;
use super::session::EditSession;
use crate::datatypes::{FileId, Language, LocalizableId, LocalizableKind, ValueSetId};
use crate::events::SessionEvent;
use crate::localizable::{LanguageValue, ValueSet, ValueSetField};
use crate::utils::{push_unique, EditorError};

impl EditSession {
    // ---- 公开编辑操作 ----

    /// 向分组追加 ValueSet（默认目标为当前选中的分组）
    ///
    /// 不检查 key 是否重复，需要唯一性的调用方可先用 `Localizable::contains_key` 校验。
    pub fn add_value_sets(
        &mut self,
        value_sets: Vec<ValueSet>,
        target: Option<LocalizableId>,
    ) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.execute(
            EditCommand::AddValueSets {
                localizable,
                value_sets,
                positions: None,
            },
            true,
        )
    }

    /// 按标识移除 ValueSet
    pub fn remove_value_sets(
        &mut self,
        ids: Vec<ValueSetId>,
        target: Option<LocalizableId>,
    ) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.execute(EditCommand::RemoveValueSets { localizable, ids }, true)
    }

    /// 修改 key / 注释 / 某个语言的值
    ///
    /// 新值与旧值完全相同时不产生任何脏标记、历史记录或保存触发。
    pub fn update_value_set_field(
        &mut self,
        target: Option<LocalizableId>,
        value_set: ValueSetId,
        field: ValueSetField,
        value: impl Into<String>,
    ) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.execute(
            EditCommand::UpdateField {
                localizable,
                value_set,
                field,
                value: value.into(),
            },
            true,
        )
    }

    /// 添加语言文件
    ///
    /// # 参数
    /// * `file_index` - 新文件在分组文件列表中的位置（越界时追加到末尾）
    /// * `seed` - 新文件的初始内容
    pub fn add_language(
        &mut self,
        language: Language,
        file_index: usize,
        seed: Option<Vec<u8>>,
        target: Option<LocalizableId>,
    ) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.select_localizable(localizable, false);
        self.execute(
            EditCommand::AddLanguage {
                localizable,
                language,
                file_index,
                seed,
            },
            true,
        )
    }

    /// 删除语言文件（只有纯字符串表格式可以删除）
    pub fn remove_language(
        &mut self,
        language: &Language,
        target: Option<LocalizableId>,
    ) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.select_localizable(localizable, false);
        self.execute(
            EditCommand::RemoveLanguage {
                localizable,
                language: language.clone(),
            },
            true,
        )
    }

    pub fn localize(&mut self, target: Option<LocalizableId>) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.execute(EditCommand::Localize { localizable }, true)
    }

    pub fn unlocalize(&mut self, target: Option<LocalizableId>) -> Result<bool, EditorError> {
        let Some(localizable) = target.or(self.selected) else {
            return Ok(false);
        };
        self.execute(EditCommand::Unlocalize { localizable }, true)
    }

    // ---- 撤销 / 重做 ----

    /// 撤销最近一次编辑
    ///
    /// 逆命令应用失败时记录放回撤销栈并返回错误；
    /// 逆命令已无法应用（目标已不存在）时丢弃该记录。
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if self.closed {
            return Ok(false);
        }
        let Some(entry) = self.history.pop_undo() else {
            return Ok(false);
        };

        match self.run_command(entry.command.clone()) {
            Ok(Some(inverse)) => {
                info!("撤销 {}", entry.label);
                self.history.push_redo(HistoryEntry::new(entry.label, inverse));
                Ok(true)
            }
            Ok(None) => {
                warn!("撤销记录已失效，丢弃: {}", entry.command);
                Ok(false)
            }
            Err(e) => {
                self.history.push_undo(entry);
                Err(e)
            }
        }
    }

    /// 重做最近一次撤销
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        if self.closed {
            return Ok(false);
        }
        let Some(entry) = self.history.pop_redo() else {
            return Ok(false);
        };

        match self.run_command(entry.command.clone()) {
            Ok(Some(inverse)) => {
                info!("重做 {}", entry.label);
                self.history.push_undo(HistoryEntry::new(entry.label, inverse));
                Ok(true)
            }
            Ok(None) => {
                warn!("重做记录已失效，丢弃: {}", entry.command);
                Ok(false)
            }
            Err(e) => {
                self.history.push_redo(entry);
                Err(e)
            }
        }
    }

    // ---- 统一入口 ----

    /// 执行命令
    ///
    /// # 参数
    /// * `record` - 是否把逆命令记入撤销历史
    pub fn execute(&mut self, command: EditCommand, record: bool) -> Result<bool, EditorError> {
        if self.closed {
            return Ok(false);
        }
        let label = command.label();
        match self.run_command(command)? {
            Some(inverse) => {
                if record {
                    self.history.record(label, inverse);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn run_command(&mut self, command: EditCommand) -> Result<Option<EditCommand>, EditorError> {
        debug!("执行: {}", command);
        let inverse = match command {
            EditCommand::AddValueSets {
                localizable,
                value_sets,
                positions,
            } => self.apply_add_value_sets(localizable, value_sets, positions),
            EditCommand::RemoveValueSets { localizable, ids } => {
                self.apply_remove_value_sets(localizable, ids)
            }
            EditCommand::UpdateField {
                localizable,
                value_set,
                field,
                value,
            } => self.apply_update_field(localizable, value_set, field, value),
            EditCommand::RestoreValue {
                localizable,
                value_set,
                language,
                entry,
            } => self.apply_restore_value(localizable, value_set, language, entry),
            EditCommand::AddLanguage {
                localizable,
                language,
                file_index,
                seed,
            } => self.apply_add_language(localizable, language, file_index, seed)?,
            EditCommand::RemoveLanguage {
                localizable,
                language,
            } => self.apply_remove_language(localizable, language)?,
            EditCommand::Localize { localizable } => self.apply_localize(localizable)?,
            EditCommand::Unlocalize { localizable } => self.apply_unlocalize(localizable)?,
        };

        if inverse.is_some() {
            self.refresh_search();
        }
        Ok(inverse)
    }

    // ---- ValueSet 编辑 ----

    /// 分组存在且已加载
    fn is_editable(&self, id: LocalizableId) -> bool {
        self.localizables
            .get(id.0)
            .map(|l| l.status.is_ready())
            .unwrap_or(false)
    }

    fn apply_add_value_sets(
        &mut self,
        id: LocalizableId,
        mut value_sets: Vec<ValueSet>,
        positions: Option<Vec<usize>>,
    ) -> Option<EditCommand> {
        if value_sets.is_empty() || !self.is_editable(id) {
            return None;
        }

        let languages = entry_languages(&value_sets);
        let files = self.capture_baselines(id, &languages);
        let ids: Vec<ValueSetId> = value_sets.iter().map(|vs| vs.id()).collect();

        {
            let target = &mut self.localizables[id.0].value_sets;
            match positions {
                Some(positions) if positions.len() == value_sets.len() => {
                    let mut pairs: Vec<(usize, ValueSet)> = positions.into_iter().zip(value_sets).collect();
                    pairs.sort_by_key(|(position, _)| *position);
                    for (position, value_set) in pairs {
                        let position = position.min(target.len());
                        target.insert(position, value_set);
                    }
                }
                _ => target.append(&mut value_sets),
            }
        }

        self.emit(SessionEvent::ReloadValueSets {
            localizable: id,
            value_sets: ids.clone(),
        });
        self.emit(SessionEvent::SelectValueSets {
            localizable: id,
            value_sets: ids.clone(),
        });
        if self.selected == Some(id) {
            self.selected_rows = ids.clone();
        }
        self.mark_dirty(id, &files);

        Some(EditCommand::RemoveValueSets { localizable: id, ids })
    }

    fn apply_remove_value_sets(&mut self, id: LocalizableId, ids: Vec<ValueSetId>) -> Option<EditCommand> {
        if !self.is_editable(id) {
            return None;
        }

        let positions: Vec<usize> = {
            let localizable = &self.localizables[id.0];
            let mut positions: Vec<usize> = ids
                .iter()
                .filter_map(|vs| localizable.value_set_position(*vs))
                .collect();
            positions.sort_unstable();
            positions.dedup();
            positions
        };
        if positions.is_empty() {
            return None;
        }

        let languages = {
            let value_sets = &self.localizables[id.0].value_sets;
            let removed: Vec<ValueSet> = positions.iter().map(|p| value_sets[*p].clone()).collect();
            entry_languages(&removed)
        };
        let files = self.capture_baselines(id, &languages);

        let mut removed = Vec::with_capacity(positions.len());
        {
            let value_sets = &mut self.localizables[id.0].value_sets;
            for position in positions.iter().rev() {
                removed.push(value_sets.remove(*position));
            }
        }
        removed.reverse();
        let removed_ids: Vec<ValueSetId> = removed.iter().map(|vs| vs.id()).collect();

        self.selected_rows.retain(|row| !removed_ids.contains(row));
        self.emit(SessionEvent::ReloadValueSets {
            localizable: id,
            value_sets: removed_ids,
        });
        self.mark_dirty(id, &files);

        Some(EditCommand::AddValueSets {
            localizable: id,
            value_sets: removed,
            positions: Some(positions),
        })
    }

    fn apply_update_field(
        &mut self,
        id: LocalizableId,
        value_set: ValueSetId,
        field: ValueSetField,
        value: String,
    ) -> Option<EditCommand> {
        if !self.is_editable(id) {
            return None;
        }
        let (old, previous_entry, languages) = {
            let current = self.localizables[id.0].value_set(value_set)?;
            let old = current.field(&field);
            if old == value {
                return None;
            }
            if field.is_shared_metadata() {
                // key / 注释会写进该 ValueSet 出现的每个语言文件
                (old, None, current.languages().cloned().collect())
            } else {
                let ValueSetField::Value(language) = &field else {
                    return None;
                };
                (old, current.value(language).cloned(), vec![language.clone()])
            }
        };

        let files = self.capture_baselines(id, &languages);
        if let Some(current) = self.localizables[id.0].value_set_mut(value_set) {
            current.set_field(&field, value.clone());
        }

        if field == ValueSetField::Key && self.localizables[id.0].kind == LocalizableKind::Config {
            self.register_config_key(&value);
        }

        self.emit(SessionEvent::ReloadValueSets {
            localizable: id,
            value_sets: vec![value_set],
        });
        self.mark_dirty(id, &files);

        // 取值的逆操作恢复整条记录，原本没有记录时撤销后也不会留下空记录
        match field {
            ValueSetField::Value(language) => Some(EditCommand::RestoreValue {
                localizable: id,
                value_set,
                language,
                entry: previous_entry,
            }),
            field => Some(EditCommand::UpdateField {
                localizable: id,
                value_set,
                field,
                value: old,
            }),
        }
    }

    fn apply_restore_value(
        &mut self,
        id: LocalizableId,
        value_set: ValueSetId,
        language: Language,
        entry: Option<LanguageValue>,
    ) -> Option<EditCommand> {
        if !self.is_editable(id) {
            return None;
        }
        if self.localizables[id.0].value_set(value_set)?.value(&language) == entry.as_ref() {
            return None;
        }

        let files = self.capture_baselines(id, std::slice::from_ref(&language));
        let previous = self.localizables[id.0]
            .value_set_mut(value_set)?
            .replace_entry(&language, entry);

        self.emit(SessionEvent::ReloadValueSets {
            localizable: id,
            value_sets: vec![value_set],
        });
        self.mark_dirty(id, &files);

        Some(EditCommand::RestoreValue {
            localizable: id,
            value_set,
            language,
            entry: previous,
        })
    }

    /// 把配置类分组的新 key 登记到已知 key 列表
    fn register_config_key(&mut self, key: &str) {
        let options = Arc::make_mut(&mut self.options);
        if push_unique(&mut options.plist_keys, key.to_string()) {
            debug!("登记配置 key: {}", key);
            self.settings.importer.plist_keys = options.plist_keys.clone();
        }
    }

    // ---- 语言与本地化状态 ----

    fn apply_add_language(
        &mut self,
        id: LocalizableId,
        language: Language,
        file_index: usize,
        seed: Option<Vec<u8>>,
    ) -> Result<Option<EditCommand>, EditorError> {
        let Some(localizable) = self.localizables.get(id.0) else {
            return Ok(None);
        };
        if localizable.has_language(&language) {
            return Ok(None);
        }

        let seed = seed.unwrap_or_default();
        let file = self
            .importer
            .add_language(&language, localizable, &seed, &self.project_path)?;
        let file_id = file.id();

        let loaded = localizable.status.is_ready();
        let records = if loaded {
            match self.importer.load(&file, &self.options) {
                Ok(records) => records,
                Err(e) => {
                    warn!("新语言文件 {} 读取失败: {}", file_id, e);
                    self.unreadable.insert(file_id);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        {
            let localizable = &mut self.localizables[id.0];
            let position = file_index.min(localizable.files.len());
            localizable.files.insert(position, file);
            if loaded {
                localizable.replace_language_values(&language, records);
            }
        }
        info!("添加语言 {} 到 {}", language, id);

        self.emit(SessionEvent::ReloadLocalizable(id));
        if self.selected == Some(id) {
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }
        self.start_watching(file_id);

        Ok(Some(EditCommand::RemoveLanguage {
            localizable: id,
            language,
        }))
    }

    fn apply_remove_language(
        &mut self,
        id: LocalizableId,
        language: Language,
    ) -> Result<Option<EditCommand>, EditorError> {
        let Some(localizable) = self.localizables.get(id.0) else {
            return Ok(None);
        };
        let Some(file_index) = localizable.file_index(&language) else {
            return Ok(None);
        };
        let file = localizable.files[file_index].clone();
        if !file.format.supports_removal() {
            debug!("{} 的格式 {:?} 不支持删除", file.id(), file.format);
            return Ok(None);
        }

        // 删除前写入未保存的修改，导入器返回的内容才是完整的
        if self.dirty.contains(file.id()) {
            self.save_file(file.id())?;
        }

        let data = self.importer.remove_language(&file, &self.project_path)?;

        self.localizables[id.0].files.remove(file_index);
        self.dirty.forget(file.id());
        self.unreadable.remove(&file.id());
        self.stop_watching(file.id());
        info!("删除语言 {} ({})", language, id);

        self.emit(SessionEvent::ReloadLocalizable(id));
        if self.selected == Some(id) {
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }
        self.sync_document_edited();

        Ok(Some(EditCommand::AddLanguage {
            localizable: id,
            language,
            file_index,
            seed: Some(data),
        }))
    }

    fn apply_localize(&mut self, id: LocalizableId) -> Result<Option<EditCommand>, EditorError> {
        let Some(localizable) = self.localizables.get(id.0) else {
            return Ok(None);
        };
        if localizable.localized {
            return Ok(None);
        }
        let was_loaded = localizable.status.is_ready();

        // 文件移动前写入并停止监听旧文件，导入器可能分配新的 File
        self.unload_one(id)?;

        let mut changed = self.localizables[id.0].clone();
        if let Err(e) = self.importer.localize(&mut changed, &self.project_path) {
            if was_loaded {
                self.load_localizables(&[id]);
            }
            return Err(e.into());
        }

        {
            let target = &mut self.localizables[id.0];
            target.files = changed.files;
            target.path = changed.path;
            target.localized = true;
        }
        self.reposition(id);
        self.load_localizables(&[id]);
        self.select_localizable(id, true);

        Ok(Some(EditCommand::Unlocalize { localizable: id }))
    }

    fn apply_unlocalize(&mut self, id: LocalizableId) -> Result<Option<EditCommand>, EditorError> {
        let Some(localizable) = self.localizables.get(id.0) else {
            return Ok(None);
        };
        if !localizable.localized {
            return Ok(None);
        }
        let was_loaded = localizable.status.is_ready();

        // 结构变化前停止监听
        self.unload_one(id)?;

        let mut changed = self.localizables[id.0].clone();
        if let Err(e) = self.importer.unlocalize(&mut changed, &self.project_path) {
            if was_loaded {
                self.load_localizables(&[id]);
            }
            return Err(e.into());
        }

        {
            let target = &mut self.localizables[id.0];
            target.files = changed.files;
            target.path = changed.path;
            target.localized = false;
        }
        self.reposition(id);
        self.select_localizable(id, true);
        if self.settings.general.autoload {
            self.load_localizables(&[id]);
        }

        Ok(Some(EditCommand::Localize { localizable: id }))
    }

    /// 通知分组在展示列表中的新位置
    fn reposition(&mut self, id: LocalizableId) {
        let position = self.presentation_position(id);
        self.emit(SessionEvent::LocalizableMoved {
            localizable: id,
            position,
        });
    }

    // ---- 脏标记 ----

    /// 在修改前为受影响语言的文件记录基线
    ///
    /// # 返回
    /// 受影响的文件（没有对应文件的语言被忽略）
    fn capture_baselines(&mut self, id: LocalizableId, languages: &[Language]) -> Vec<(FileId, Language)> {
        let localizable = &self.localizables[id.0];
        let files: Vec<(FileId, Language)> = languages
            .iter()
            .filter_map(|language| localizable.file_for(language).map(|f| (f.id(), language.clone())))
            .collect();

        for (file, language) in &files {
            self.dirty
                .capture_baseline(*file, || localizable.values_for(language));
        }
        files
    }

    /// 修改后刷新脏状态，并为变脏的文件触发自动保存
    fn mark_dirty(&mut self, id: LocalizableId, files: &[(FileId, Language)]) {
        for (file, language) in files {
            let current = self.localizables[id.0].values_for(language);
            if self.dirty.refresh(*file, &current) {
                self.request_autosave(*file);
            }
        }
        self.sync_document_edited();
    }
}

/// ValueSet 列表中出现过的语言（去重、有序）
///
/// 值为空的记录同样会写进语言文件，因此也计入受影响的语言。
fn entry_languages(value_sets: &[ValueSet]) -> Vec<Language> {
    let languages: BTreeSet<Language> = value_sets
        .iter()
        .flat_map(|vs| vs.languages().cloned())
        .collect();
    languages.into_iter().collect()
}
