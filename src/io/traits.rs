/// IO 抽象层 - trait 定义
///
/// 编辑核心不解析任何具体文件格式（.strings、plist、storyboard），
/// 所有格式相关的读写与项目结构修改都通过 [`Importer`] 完成。
/// 遵循依赖倒置原则（DIP），面向接口编程。

use std::path::Path;

use crate::datatypes::Language;
use crate::localizable::{File, Localizable, ValueRecord};
use crate::settings::ImporterOptions;
use crate::utils::ImporterError;

/// 格式相关的导入器
///
/// # 职责
/// - 发现项目中的本地化分组
/// - 读取 / 写入单个文件的记录
/// - 添加 / 删除语言文件、切换分组的本地化状态
///
/// 对核心来说所有方法都是同步的；批量加载时核心会把 `load` 放到工作线程上执行，
/// 因此实现必须是 `Send + Sync`。同一文件的写入由调度器保证同一时刻至多一个。
pub trait Importer: Send + Sync {
    /// 发现项目中的所有本地化分组（状态为 Unloaded）
    fn load_project(
        &self,
        project_path: &Path,
        options: &ImporterOptions,
    ) -> Result<Vec<Localizable>, ImporterError>;

    /// 读取文件中的所有记录
    fn load(&self, file: &File, options: &ImporterOptions) -> Result<Vec<ValueRecord>, ImporterError>;

    /// 用完整的内存快照覆盖文件
    fn save(
        &self,
        file: &File,
        values: &[ValueRecord],
        options: &ImporterOptions,
    ) -> Result<(), ImporterError>;

    /// 为分组创建新的语言文件
    ///
    /// # 参数
    /// * `seed` - 初始文件内容（为空时创建空文件）
    fn add_language(
        &self,
        language: &Language,
        localizable: &Localizable,
        seed: &[u8],
        project_path: &Path,
    ) -> Result<File, ImporterError>;

    /// 删除语言文件
    ///
    /// # 返回
    /// 删除前的文件内容，用于撤销时完整恢复
    fn remove_language(&self, file: &File, project_path: &Path) -> Result<Vec<u8>, ImporterError>;

    /// 将分组转为已本地化（可能调整文件结构）
    ///
    /// 可以替换 `files` 中的 File（包括分配新的标识）；调用前会话已停止监听旧文件。
    fn localize(&self, localizable: &mut Localizable, project_path: &Path) -> Result<(), ImporterError>;

    /// 将分组转为未本地化
    fn unlocalize(&self, localizable: &mut Localizable, project_path: &Path) -> Result<(), ImporterError>;
}
