/// 脏文件追踪
///
/// 记录内存内容与磁盘内容不一致的文件。判断基于内容：
/// 每个文件在自上次加载 / 保存以来的第一次编辑之前记录一份基线快照，
/// 编辑后与基线比较，一致则视为干净。因此"编辑后撤销"会让文件回到干净状态。

use std::collections::HashMap;

use crate::datatypes::FileId;
use crate::localizable::ValueRecord;

#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    /// 脏文件（按首次变脏的顺序）
    dirty: Vec<FileId>,
    /// 磁盘内容基线（仅对编辑过的文件记录）
    baselines: HashMap<FileId, Vec<ValueRecord>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在修改前记录基线（已有基线时不覆盖）
    pub fn capture_baseline<F>(&mut self, file: FileId, snapshot: F)
    where
        F: FnOnce() -> Vec<ValueRecord>,
    {
        self.baselines.entry(file).or_insert_with(snapshot);
    }

    /// 用修改后的快照刷新脏状态
    ///
    /// # 返回
    /// 刷新后文件是否为脏
    pub fn refresh(&mut self, file: FileId, current: &[ValueRecord]) -> bool {
        let clean = self
            .baselines
            .get(&file)
            .map(|baseline| baseline.as_slice() == current)
            .unwrap_or(false);

        if clean {
            self.dirty.retain(|id| *id != file);
            false
        } else {
            crate::utils::push_unique(&mut self.dirty, file);
            true
        }
    }

    /// 文件已写入磁盘：移出脏集合，下次编辑时重新记录基线
    pub fn mark_saved(&mut self, file: FileId) {
        self.dirty.retain(|id| *id != file);
        self.baselines.remove(&file);
    }

    /// 文件已不属于活动集合（删除语言 / 卸载 / 丢弃修改）
    pub fn forget(&mut self, file: FileId) {
        self.mark_saved(file);
    }

    pub fn contains(&self, file: FileId) -> bool {
        self.dirty.contains(&file)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    /// 当前脏文件（已去重）
    pub fn files(&self) -> Vec<FileId> {
        self.dirty.clone()
    }

    pub fn clear(&mut self) {
        self.dirty.clear();
        self.baselines.clear();
    }
}
