/// 加载 / 卸载 / 保存
///
/// 加载状态机：Unloaded → Loading → Ready（保存期间短暂处于 Saving）。
/// 开始提取文件时即请求监听，提取完成后才进入 Ready。

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::session::{EditSession, SaveReport};
use crate::datatypes::{FileId, LoadStatus, LocalizableId};
use crate::events::SessionEvent;
use crate::project_loader::{LoadJob, LoadOutcome};
use crate::settings::ImporterOptions;
use crate::utils::{EditorError, ImporterError};

/// 批量加载的结果
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<LocalizableId>,
    /// 提取失败的文件（对应语言在内存中没有取值）
    pub failed: Vec<(FileId, ImporterError)>,
}

impl EditSession {
    /// 开始加载分组：状态置为 Loading 并请求监听其所有文件
    ///
    /// # 返回
    /// 需要在工作线程上执行的提取任务；分组不是 Unloaded 时返回 None
    pub fn begin_load(&mut self, id: LocalizableId) -> Option<LoadJob> {
        if self.closed || self.status(id) != Some(LoadStatus::Unloaded) {
            return None;
        }

        let files = {
            let localizable = &mut self.localizables[id.0];
            localizable.status = LoadStatus::Loading;
            localizable.files.clone()
        };
        self.emit(SessionEvent::ReloadLocalizable(id));
        if self.selected == Some(id) {
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }

        for file in &files {
            self.start_watching(file.id());
        }

        debug!("开始加载 {} ({} 个文件)", id, files.len());
        Some(LoadJob::new(id, files, self.importer.clone(), self.options.clone()))
    }

    /// 将提取结果合并回分组并进入 Ready
    ///
    /// 分组在提取期间被卸载时丢弃结果。
    /// 提取失败的文件记为不可读，在重新读取成功之前拒绝写回。
    ///
    /// # 返回
    /// 提取失败的文件
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Vec<(FileId, ImporterError)> {
        let id = outcome.localizable;
        if self.closed || self.status(id) != Some(LoadStatus::Loading) {
            debug!("丢弃过期的加载结果: {}", id);
            return Vec::new();
        }

        for extraction in &outcome.extractions {
            self.unreadable.remove(&extraction.file);
        }
        let (value_sets, errors) = outcome.fold();
        self.unreadable.extend(errors.iter().map(|(file, _)| *file));
        let count = value_sets.len();
        {
            let localizable = &mut self.localizables[id.0];
            localizable.value_sets.extend(value_sets);
            localizable.status = LoadStatus::Ready;
        }
        info!("加载完成 {}: {} 个条目", id, count);

        self.emit(SessionEvent::ReloadLocalizable(id));
        if self.selected == Some(id) {
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }
        self.refresh_search();
        errors
    }

    /// 同步加载一批分组（提取在 rayon 线程池上并行执行）
    pub fn load_localizables(&mut self, ids: &[LocalizableId]) -> LoadReport {
        let jobs: Vec<LoadJob> = ids.iter().filter_map(|id| self.begin_load(*id)).collect();

        let mut report = LoadReport::default();
        for outcome in LoadJob::run_batch(jobs) {
            let id = outcome.localizable;
            report.failed.extend(self.finish_load(outcome));
            report.loaded.push(id);
        }
        report
    }

    /// 卸载分组：先写入其脏文件，再停止监听并丢弃所有 ValueSet
    ///
    /// 已经是 Unloaded 的分组直接跳过；写入失败时该分组保持加载状态并返回错误。
    /// 加载时读取失败的文件不写回，其未保存的编辑随卸载丢弃。
    pub fn unload_localizables(&mut self, ids: &[LocalizableId]) -> Result<(), EditorError> {
        for id in ids {
            self.unload_one(*id)?;
        }
        Ok(())
    }

    pub(super) fn unload_one(&mut self, id: LocalizableId) -> Result<bool, EditorError> {
        if self.closed || !self.status(id).map(|s| s.is_ready()).unwrap_or(false) {
            return Ok(false);
        }

        let files = self.localizables[id.0].file_ids();
        for file in &files {
            if !self.dirty.contains(*file) {
                continue;
            }
            if self.unreadable.contains(file) {
                warn!("文件 {} 加载时读取失败，丢弃其未保存的编辑", file);
                continue;
            }
            self.save_file(*file)?;
        }

        for file in &files {
            self.stop_watching(*file);
            self.dirty.forget(*file);
            self.unreadable.remove(file);
        }
        {
            let localizable = &mut self.localizables[id.0];
            localizable.value_sets.clear();
            localizable.status = LoadStatus::Unloaded;
        }
        info!("卸载 {}", id);

        self.emit(SessionEvent::ReloadLocalizable(id));
        if self.selected == Some(id) {
            self.selected_rows.clear();
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }
        self.sync_document_edited();
        self.refresh_search();
        Ok(true)
    }

    /// 立即写入文件（使用当前导入器选项）
    ///
    /// # 返回
    /// 文件不在脏集合中时返回 Ok(false)
    pub fn save_file(&mut self, file: FileId) -> Result<bool, EditorError> {
        let options = self.options.clone();
        self.save_file_with(file, &options)
    }

    /// 写入所有脏文件（去重）
    ///
    /// 失败的文件保留在脏集合中，可以稍后重试。
    pub fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        if self.closed {
            return report;
        }

        let options = self.options.clone();
        for file in self.dirty.files() {
            let result = self.save_file_with(file, &options);
            report.record(file, result);
        }
        info!(
            "全部保存: 成功 {}, 失败 {}",
            report.saved.len(),
            report.failed.len()
        );
        report
    }

    /// 用指定的选项快照写入文件的完整内存内容
    pub(super) fn save_file_with(
        &mut self,
        file: FileId,
        options: &Arc<ImporterOptions>,
    ) -> Result<bool, EditorError> {
        if self.closed || !self.dirty.contains(file) {
            return Ok(false);
        }
        let Some((id, target)) = self.locate_file(file).map(|(id, f)| (id, f.clone())) else {
            warn!("脏集合中的文件已不存在: {}", file);
            self.dirty.forget(file);
            self.sync_document_edited();
            return Ok(false);
        };

        if self.unreadable.contains(&file) {
            warn!("文件 {} 加载时读取失败，拒绝覆盖", file);
            let error = EditorError::UnreadableFile(file.to_string());
            self.emit(SessionEvent::SaveFailed {
                file,
                error: error.to_string(),
            });
            return Err(error);
        }

        let values = self.localizables[id.0].values_for(&target.language);
        let previous = self.localizables[id.0].status;
        self.localizables[id.0].status = LoadStatus::Saving;
        let result = self.importer.save(&target, &values, options);
        self.localizables[id.0].status = previous;

        match result {
            Ok(()) => {
                debug!("已保存 {} ({} 条)", file, values.len());
                self.dirty.mark_saved(file);
                self.emit(SessionEvent::FileSaved(file));
                self.sync_document_edited();
                Ok(true)
            }
            Err(e) => {
                warn!("保存失败 {}: {}", file, e);
                self.emit(SessionEvent::SaveFailed {
                    file,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// 处理外部修改：干净的文件重新读取，脏文件保留内存版本
    pub(super) fn reload_external_change(&mut self, file: FileId) -> Result<(), EditorError> {
        let Some((id, target)) = self.locate_file(file).map(|(id, f)| (id, f.clone())) else {
            return Err(EditorError::UnknownFile(file.to_string()));
        };
        if self.status(id) != Some(LoadStatus::Ready) {
            return Ok(());
        }

        if self.dirty.contains(file) {
            warn!("文件 {} 被外部修改，但有未保存的编辑，保留内存版本", file);
            self.emit(SessionEvent::ExternalChangeConflict(file));
            return Ok(());
        }

        let records = self.importer.load(&target, &self.options)?;
        self.localizables[id.0].replace_language_values(&target.language, records);
        self.dirty.forget(file);
        self.unreadable.remove(&file);
        info!("重新读取外部修改的文件 {}", file);

        self.emit(SessionEvent::FileReloaded(file));
        self.emit(SessionEvent::ReloadValueSets {
            localizable: id,
            value_sets: Vec::new(),
        });
        self.refresh_search();
        Ok(())
    }
}
