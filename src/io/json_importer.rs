/// JSON 导入器
///
/// 项目布局：
/// ```text
/// <root>/<分组名>/<语言>.json   已本地化分组，每种语言一个文件
/// <root>/<分组名>.json          未本地化分组（语言为 Base）
/// ```
/// 每个文件是一个 [`ValueRecord`] 数组。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::traits::Importer;
use crate::datatypes::{FileFormat, Language, LocalizableKind};
use crate::localizable::{File, Localizable, ValueRecord};
use crate::settings::{ExportOrder, ImporterOptions};
use crate::utils::{create_backup, ImporterError};

const EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    fn language_path(dir: &Path, language: &Language) -> PathBuf {
        dir.join(format!("{}.{}", language, EXTENSION))
    }

    fn unlocalized_path(project_path: &Path, name: &str) -> PathBuf {
        project_path.join(format!("{}.{}", name, EXTENSION))
    }

    fn read_records(path: &Path) -> Result<Vec<ValueRecord>, ImporterError> {
        if !path.exists() {
            return Err(ImporterError::NotFound(path.to_path_buf()));
        }
        let content = fs::read(path)?;
        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&content)?)
    }

    /// 扫描一个分组目录中的语言文件（按语言排序）
    fn scan_localized(dir: &Path, name: &str) -> Result<Vec<File>, ImporterError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !is_json(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push(File::new(Language::new(stem), FileFormat::Strings, path.clone(), name));
            }
        }
        files.sort_by(|a, b| a.language.cmp(&b.language));
        Ok(files)
    }
}

fn is_json(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(EXTENSION)
}

/// 按导出顺序排列记录
fn ordered(values: &[ValueRecord], order: ExportOrder) -> Vec<ValueRecord> {
    let mut records = values.to_vec();
    match order {
        // 新增条目（没有原始位置）排在最后，保持相对顺序
        ExportOrder::SameAsOriginal => {
            records.sort_by_key(|r| r.original_index.unwrap_or(usize::MAX));
        }
        ExportOrder::Alphabetical => records.sort_by(|a, b| a.key.cmp(&b.key)),
    }
    records
}

impl Importer for JsonImporter {
    fn load_project(
        &self,
        project_path: &Path,
        _options: &ImporterOptions,
    ) -> Result<Vec<Localizable>, ImporterError> {
        if !project_path.is_dir() {
            return Err(ImporterError::NotFound(project_path.to_path_buf()));
        }

        let mut localizables = Vec::new();
        for entry in fs::read_dir(project_path)? {
            let path = entry?.path();
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            if path.is_dir() {
                let mut localizable = Localizable::new(name.clone(), LocalizableKind::Strings, path.clone());
                localizable.files = Self::scan_localized(&path, &name)?;
                localizables.push(localizable);
            } else if is_json(&path) {
                let file = File::new(Language::base(), FileFormat::Strings, path.clone(), name.clone());
                localizables.push(
                    Localizable::new(name, LocalizableKind::Strings, path)
                        .with_file(file)
                        .unlocalized(),
                );
            }
        }

        localizables.sort_by(|a, b| a.presentation_cmp(b));
        info!("发现 {} 个分组: {:?}", localizables.len(), project_path);
        Ok(localizables)
    }

    fn load(&self, file: &File, options: &ImporterOptions) -> Result<Vec<ValueRecord>, ImporterError> {
        let records = Self::read_records(&file.path)?;
        let records: Vec<ValueRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(_, r)| !options.should_ignore(&r.value))
            .map(|(index, mut r)| {
                r.original_index.get_or_insert(index);
                r
            })
            .collect();
        debug!("读取 {} 条记录: {:?}", records.len(), file.path);
        Ok(records)
    }

    fn save(
        &self,
        file: &File,
        values: &[ValueRecord],
        options: &ImporterOptions,
    ) -> Result<(), ImporterError> {
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&ordered(values, options.export_order))?;
        fs::write(&file.path, content)?;
        debug!("写入 {} 条记录: {:?}", values.len(), file.path);
        Ok(())
    }

    fn add_language(
        &self,
        language: &Language,
        localizable: &Localizable,
        seed: &[u8],
        project_path: &Path,
    ) -> Result<File, ImporterError> {
        if !localizable.localized {
            return Err(ImporterError::Unsupported("add_language on an unlocalized group"));
        }

        let dir = project_path.join(&localizable.name);
        let path = Self::language_path(&dir, language);
        if path.exists() {
            return Err(ImporterError::Rejected(format!("{} already exists", path.display())));
        }

        fs::create_dir_all(&dir)?;
        if seed.is_empty() {
            fs::write(&path, "[]")?;
        } else {
            fs::write(&path, seed)?;
        }

        info!("添加语言 {} -> {:?}", language, path);
        Ok(File::new(language.clone(), FileFormat::Strings, path, localizable.name.clone()))
    }

    fn remove_language(&self, file: &File, _project_path: &Path) -> Result<Vec<u8>, ImporterError> {
        if !file.path.exists() {
            return Err(ImporterError::NotFound(file.path.clone()));
        }
        let content = fs::read(&file.path)?;
        let backup = create_backup(&file.path)?;
        fs::remove_file(&file.path)?;

        info!("删除语言 {} (备份: {:?})", file.language, backup);
        Ok(content)
    }

    fn localize(&self, localizable: &mut Localizable, project_path: &Path) -> Result<(), ImporterError> {
        if localizable.localized {
            return Err(ImporterError::Rejected(format!("{} is already localized", localizable.name)));
        }
        let source = Self::unlocalized_path(project_path, &localizable.name);
        if !source.exists() {
            return Err(ImporterError::NotFound(source));
        }

        let dir = project_path.join(&localizable.name);
        let language = localizable
            .files
            .first()
            .map(|f| f.language.clone())
            .unwrap_or_else(Language::base);
        let target = Self::language_path(&dir, &language);

        fs::create_dir_all(&dir)?;
        fs::rename(&source, &target)?;

        for file in &mut localizable.files {
            file.path = target.clone();
        }
        localizable.path = dir;
        localizable.localized = true;
        Ok(())
    }

    fn unlocalize(&self, localizable: &mut Localizable, project_path: &Path) -> Result<(), ImporterError> {
        if !localizable.localized {
            return Err(ImporterError::Rejected(format!("{} is not localized", localizable.name)));
        }
        let [file] = localizable.files.as_mut_slice() else {
            return Err(ImporterError::Unsupported("unlocalize requires exactly one language file"));
        };

        let target = Self::unlocalized_path(project_path, &localizable.name);
        if target.exists() {
            return Err(ImporterError::Rejected(format!("{} already exists", target.display())));
        }
        fs::rename(&file.path, &target)?;
        file.path = target.clone();

        let dir = project_path.join(&localizable.name);
        // 目录中只剩备份等文件时保留目录
        if dir.is_dir() && fs::read_dir(&dir)?.next().is_none() {
            fs::remove_dir(&dir)?;
        }

        localizable.path = target;
        localizable.localized = false;
        Ok(())
    }
}
