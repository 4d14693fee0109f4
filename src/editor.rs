/// 编辑器层模块
///
/// 该模块提供有状态的编辑会话，把撤销历史、脏文件追踪和防抖保存统一在一个入口之下。
/// 所有修改先作用于内存模型，再由保存调度器按文件合并写回。
///
/// # 架构设计
///
/// - **commands**: 可逆的编辑命令
/// - **history**: 撤销 / 重做栈
/// - **dirty**: 基于内容的脏文件追踪
/// - **session**: 编辑会话（选择、搜索、调度、关闭）
/// - **editing**: 编辑接口与撤销 / 重做
/// - **lifecycle**: 加载、卸载与保存
///
/// # 使用示例
///
/// ```rust,ignore
/// use l10n_editor::{EditSession, ValueSetField};
///
/// let mut session = EditSession::open(path, importer, settings, clock)?;
/// session.update_value_set_field(None, id, ValueSetField::Comment, "Shown on launch")?;
/// session.undo()?;
///
/// let report = session.save_all();
/// println!("保存了 {} 个文件", report.saved.len());
/// ```
pub mod commands;
pub mod dirty;
pub mod history;
pub mod session;
mod editing;
mod lifecycle;

// === 导出公共接口 ===
pub use commands::EditCommand;
pub use dirty::DirtyTracker;
pub use history::{HistoryEntry, UndoHistory, DEFAULT_HISTORY_LIMIT};
pub use lifecycle::LoadReport;
pub use session::{Action, BridgeSignal, CloseDecision, EditSession, SaveReport};
