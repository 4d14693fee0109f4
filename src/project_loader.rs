/// 分组加载任务
///
/// 加载分两段：会话在交互上下文中把分组置为 Loading 并生成 [`LoadJob`]，
/// 任务在工作线程上并行调用导入器提取所有文件的记录，
/// 结果 [`LoadOutcome`] 再交回会话，在交互上下文中合并为 ValueSet。

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::datatypes::{FileId, Language, LocalizableId};
use crate::io::Importer;
use crate::localizable::{fold_records, File, ValueRecord, ValueSet};
use crate::settings::ImporterOptions;
use crate::utils::ImporterError;

/// 单个文件的提取结果
#[derive(Debug)]
pub struct FileExtraction {
    pub file: FileId,
    pub language: Language,
    pub records: Result<Vec<ValueRecord>, ImporterError>,
}

/// 一个分组的加载任务
#[derive(Clone)]
pub struct LoadJob {
    pub localizable: LocalizableId,
    files: Vec<File>,
    importer: Arc<dyn Importer>,
    options: Arc<ImporterOptions>,
}

impl LoadJob {
    pub fn new(
        localizable: LocalizableId,
        files: Vec<File>,
        importer: Arc<dyn Importer>,
        options: Arc<ImporterOptions>,
    ) -> Self {
        Self {
            localizable,
            files,
            importer,
            options,
        }
    }

    pub fn file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.id()).collect()
    }

    /// 并行提取所有文件（结果保持文件顺序）
    pub fn run(self) -> LoadOutcome {
        let extractions = self
            .files
            .par_iter()
            .map(|file| FileExtraction {
                file: file.id(),
                language: file.language.clone(),
                records: self.importer.load(file, &self.options),
            })
            .collect();

        LoadOutcome {
            localizable: self.localizable,
            extractions,
        }
    }

    /// 并行执行一批任务
    pub fn run_batch(jobs: Vec<LoadJob>) -> Vec<LoadOutcome> {
        jobs.into_par_iter().map(LoadJob::run).collect()
    }
}

impl std::fmt::Debug for LoadJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadJob")
            .field("localizable", &self.localizable)
            .field("files", &self.files.len())
            .finish()
    }
}

/// 加载任务的结果
#[derive(Debug)]
pub struct LoadOutcome {
    pub localizable: LocalizableId,
    pub extractions: Vec<FileExtraction>,
}

impl LoadOutcome {
    /// 按文件顺序合并为 ValueSet
    ///
    /// # 返回
    /// (ValueSet 列表, 提取失败的文件及错误)
    pub fn fold(self) -> (Vec<ValueSet>, Vec<(FileId, ImporterError)>) {
        let mut value_sets = Vec::new();
        let mut errors = Vec::new();

        for extraction in self.extractions {
            match extraction.records {
                Ok(records) => {
                    debug!("合并 {} 条记录 ({})", records.len(), extraction.language);
                    fold_records(&mut value_sets, &extraction.language, records);
                }
                Err(e) => {
                    warn!("文件 {} 提取失败: {}", extraction.file, e);
                    errors.push((extraction.file, e));
                }
            }
        }

        (value_sets, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{FileFormat, LocalizableKind};
    use crate::io::{ImporterOp, MemoryImporter};
    use crate::localizable::Localizable;
    use std::path::PathBuf;

    fn create_job(importer: Arc<MemoryImporter>, localizable: &Localizable) -> LoadJob {
        LoadJob::new(
            LocalizableId(0),
            localizable.files.clone(),
            importer,
            Arc::new(ImporterOptions::default()),
        )
    }

    fn create_localizable() -> Localizable {
        Localizable::new("Main", LocalizableKind::Strings, PathBuf::from("Main"))
            .with_file(File::new(Language::new("en"), FileFormat::Strings, PathBuf::from("en/Main"), "Main"))
            .with_file(File::new(Language::new("fr"), FileFormat::Strings, PathBuf::from("fr/Main"), "Main"))
    }

    #[test]
    fn test_run_folds_in_file_order() {
        let localizable = create_localizable();
        let importer = Arc::new(MemoryImporter::new().with_localizable(
            localizable.clone(),
            vec![
                (
                    Language::new("en"),
                    vec![
                        ValueRecord::new("a", "A"),
                        ValueRecord::new("b", "B").with_comment("en comment"),
                    ],
                ),
                (
                    Language::new("fr"),
                    vec![ValueRecord::new("b", "Bé").with_comment("fr comment"), ValueRecord::new("c", "Cé")],
                ),
            ],
        ));

        let outcome = create_job(importer, &localizable).run();
        let (value_sets, errors) = outcome.fold();

        assert!(errors.is_empty());
        let keys: Vec<&str> = value_sets.iter().map(|vs| vs.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(value_sets[1].comment, "en comment");
        assert_eq!(value_sets[1].text(&Language::new("fr")), "Bé");
    }

    #[test]
    fn test_failed_file_is_reported() {
        let localizable = create_localizable();
        let importer = Arc::new(MemoryImporter::new().with_localizable(
            localizable.clone(),
            vec![(Language::new("en"), vec![ValueRecord::new("a", "A")])],
        ));

        // fr 没有内容
        let (value_sets, errors) = create_job(importer.clone(), &localizable).run().fold();
        assert_eq!(value_sets.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, localizable.files[1].id());

        importer.fail(ImporterOp::Load);
        let outcomes = LoadJob::run_batch(vec![create_job(importer, &localizable)]);
        let (value_sets, errors) = outcomes.into_iter().next().unwrap().fold();
        assert!(value_sets.is_empty());
        assert_eq!(errors.len(), 2);
    }
}
