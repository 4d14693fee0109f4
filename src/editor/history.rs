/// 撤销 / 重做历史
///
/// 单栈规则：撤销栈 + 重做栈，新的正向操作清空重做栈。
/// 每条记录保存"执行它即可撤销上一步"的命令和动作名称；
/// 撤销时执行命令得到的逆命令会被压入重做栈，反之亦然。

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use super::commands::EditCommand;

/// 默认历史深度
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// 历史记录条目
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// 动作名称（如 "Typing"）
    pub label: &'static str,
    /// 执行即可回到另一侧状态的命令
    pub command: EditCommand,
    /// 记录时间
    pub recorded_at: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(label: &'static str, command: EditCommand) -> Self {
        Self {
            label,
            command,
            recorded_at: Local::now(),
        }
    }
}

/// 撤销历史
///
/// 超出深度限制时从最旧的一端淘汰；被淘汰的命令所持有的数据
/// （例如已删除的 ValueSet）随之释放。
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    limit: usize,
}

impl UndoHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// 记录新的正向操作（清空重做栈）
    pub fn record(&mut self, label: &'static str, inverse: EditCommand) {
        self.redo_stack.clear();
        self.push_undo(HistoryEntry::new(label, inverse));
    }

    /// 取出最近一条可撤销记录
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo_stack.pop_back()
    }

    /// 取出最近一条可重做记录
    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo_stack.pop()
    }

    /// 压入撤销栈（不影响重做栈）
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo_stack.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// 下一次撤销的动作名称
    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo_stack.back().map(|e| e.label)
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|e| e.label)
    }

    /// 可撤销的步数
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// 按时间顺序遍历可撤销记录
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.undo_stack.iter()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// 生成历史摘要
    pub fn summary(&self) -> String {
        format!(
            "可撤销: {}, 可重做: {}, 下一步撤销: {}",
            self.undo_stack.len(),
            self.redo_stack.len(),
            self.undo_label().unwrap_or("-")
        )
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::LocalizableId;

    fn command(n: usize) -> EditCommand {
        EditCommand::Localize {
            localizable: LocalizableId(n),
        }
    }

    #[test]
    fn test_record_and_pop() {
        let mut history = UndoHistory::default();
        assert!(history.is_empty());

        history.record("Typing", command(1));
        history.record("Adding", command(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo_label(), Some("Adding"));

        let entry = history.pop_undo().unwrap();
        assert_eq!(entry.command, command(2));
        history.push_redo(entry);
        assert!(history.can_redo());
        assert_eq!(history.redo_label(), Some("Adding"));
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = UndoHistory::default();
        history.record("Typing", command(1));
        let entry = history.pop_undo().unwrap();
        history.push_redo(entry);

        history.record("Typing", command(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_undo_keeps_redo() {
        let mut history = UndoHistory::default();
        history.push_redo(HistoryEntry::new("Typing", command(1)));
        history.push_undo(HistoryEntry::new("Typing", command(2)));
        assert!(history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = UndoHistory::with_limit(3);
        for i in 0..10 {
            history.record("Typing", command(i));
        }
        assert_eq!(history.len(), 3);
        let oldest = history.iter().next().unwrap();
        assert_eq!(oldest.command, command(7));
    }

    #[test]
    fn test_pop_when_empty() {
        let mut history = UndoHistory::default();
        assert!(history.pop_undo().is_none());
        assert!(history.pop_redo().is_none());
    }

    #[test]
    fn test_summary() {
        let mut history = UndoHistory::default();
        history.record("Removing", command(1));
        let summary = history.summary();
        assert!(summary.contains("可撤销: 1"));
        assert!(summary.contains("Removing"));
    }
}
