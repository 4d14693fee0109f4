/// 内存导入器
///
/// 所有文件内容保存在内存中，记录每一次保存调用，并可按操作注入失败。
/// 用于测试和演示。

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::Importer;
use crate::datatypes::{FileFormat, FileId, Language};
use crate::localizable::{File, Localizable, ValueRecord};
use crate::settings::ImporterOptions;
use crate::utils::ImporterError;

/// 可注入失败的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImporterOp {
    Load,
    Save,
    AddLanguage,
    RemoveLanguage,
    Localize,
    Unlocalize,
}

/// 一次保存调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCall {
    pub file: FileId,
    pub language: Language,
    pub values: Vec<ValueRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryImporter {
    project: Mutex<Vec<Localizable>>,
    contents: Mutex<HashMap<PathBuf, Vec<ValueRecord>>>,
    saves: Mutex<Vec<SaveCall>>,
    failing: Mutex<HashSet<ImporterOp>>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个分组以及各文件的内容
    pub fn with_localizable(self, localizable: Localizable, contents: Vec<(Language, Vec<ValueRecord>)>) -> Self {
        {
            let mut stored = lock(&self.contents);
            for (language, records) in contents {
                if let Some(file) = localizable.file_for(&language) {
                    stored.insert(file.path.clone(), records);
                }
            }
        }
        lock(&self.project).push(localizable);
        self
    }

    /// 设置文件内容（模拟外部修改）
    pub fn set_contents(&self, path: &Path, records: Vec<ValueRecord>) {
        lock(&self.contents).insert(path.to_path_buf(), records);
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<ValueRecord>> {
        lock(&self.contents).get(path).cloned()
    }

    pub fn saves(&self) -> Vec<SaveCall> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    pub fn clear_saves(&self) {
        lock(&self.saves).clear();
    }

    /// 之后的该操作全部失败
    pub fn fail(&self, op: ImporterOp) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: ImporterOp) {
        lock(&self.failing).remove(&op);
    }

    fn check(&self, op: ImporterOp) -> Result<(), ImporterError> {
        if lock(&self.failing).contains(&op) {
            return Err(ImporterError::Rejected(format!("{:?} 被注入失败", op)));
        }
        Ok(())
    }
}

impl Importer for MemoryImporter {
    fn load_project(
        &self,
        _project_path: &Path,
        _options: &ImporterOptions,
    ) -> Result<Vec<Localizable>, ImporterError> {
        Ok(lock(&self.project).clone())
    }

    fn load(&self, file: &File, options: &ImporterOptions) -> Result<Vec<ValueRecord>, ImporterError> {
        self.check(ImporterOp::Load)?;
        let records = lock(&self.contents)
            .get(&file.path)
            .cloned()
            .ok_or_else(|| ImporterError::NotFound(file.path.clone()))?;
        Ok(records
            .into_iter()
            .filter(|r| !options.should_ignore(&r.value))
            .collect())
    }

    fn save(
        &self,
        file: &File,
        values: &[ValueRecord],
        _options: &ImporterOptions,
    ) -> Result<(), ImporterError> {
        self.check(ImporterOp::Save)?;
        lock(&self.contents).insert(file.path.clone(), values.to_vec());
        lock(&self.saves).push(SaveCall {
            file: file.id(),
            language: file.language.clone(),
            values: values.to_vec(),
        });
        Ok(())
    }

    fn add_language(
        &self,
        language: &Language,
        localizable: &Localizable,
        seed: &[u8],
        _project_path: &Path,
    ) -> Result<File, ImporterError> {
        self.check(ImporterOp::AddLanguage)?;
        let path = localizable
            .path
            .join(format!("{}.lproj", language))
            .join(&localizable.name);

        let records: Vec<ValueRecord> = if seed.is_empty() {
            Vec::new()
        } else {
            serde_json::from_slice(seed)?
        };
        lock(&self.contents).insert(path.clone(), records);

        Ok(File::new(language.clone(), FileFormat::Strings, path, localizable.name.clone()))
    }

    fn remove_language(&self, file: &File, _project_path: &Path) -> Result<Vec<u8>, ImporterError> {
        self.check(ImporterOp::RemoveLanguage)?;
        let records = lock(&self.contents)
            .remove(&file.path)
            .ok_or_else(|| ImporterError::NotFound(file.path.clone()))?;
        Ok(serde_json::to_vec(&records)?)
    }

    fn localize(&self, localizable: &mut Localizable, _project_path: &Path) -> Result<(), ImporterError> {
        self.check(ImporterOp::Localize)?;
        reopen_files(localizable);
        localizable.localized = true;
        Ok(())
    }

    fn unlocalize(&self, localizable: &mut Localizable, _project_path: &Path) -> Result<(), ImporterError> {
        self.check(ImporterOp::Unlocalize)?;
        reopen_files(localizable);
        localizable.localized = false;
        Ok(())
    }
}

/// 结构变化后的文件是新的 File（新标识，路径和内容不变）
fn reopen_files(localizable: &mut Localizable) {
    for file in &mut localizable.files {
        *file = File::new(
            file.language.clone(),
            file.format,
            file.path.clone(),
            file.localizable_name.clone(),
        );
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
