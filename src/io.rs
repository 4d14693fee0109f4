/// IO 抽象层模块
///
/// 编辑核心通过 [`Importer`] trait 读写具体格式的本地化文件，遵循依赖倒置原则。
/// 支持依赖注入、测试 mock 和替换导入器实现。
///
/// # 架构设计
///
/// - **traits**: 定义 Importer trait 接口
/// - **memory_importer**: 内存实现（记录保存调用，可注入失败）
/// - **json_importer**: 每个语言一个 JSON 记录数组的目录布局
///
/// # 使用示例
///
/// ```rust,ignore
/// use l10n_editor::io::{Importer, JsonImporter};
/// use l10n_editor::settings::ImporterOptions;
///
/// let importer = JsonImporter::new();
/// let localizables = importer.load_project(Path::new("project"), &ImporterOptions::default())?;
/// ```
pub mod traits;
pub mod memory_importer;
pub mod json_importer;

// === 导出 trait 定义 ===
pub use traits::Importer;

// === 导出实现 ===
pub use json_importer::JsonImporter;
pub use memory_importer::{ImporterOp, MemoryImporter, SaveCall};
