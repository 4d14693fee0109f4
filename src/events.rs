/// 会话事件
///
/// 替代字符串键的全局通知中心：事件是带类型的枚举，订阅者按
/// （事件类型，文件标识）过滤，订阅列表由会话持有，会话关闭时一并清空。
/// 事件在交互上下文中同步投递。

use crate::datatypes::{FileId, LocalizableId, ValueSetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 请求文件监听桥开始监听
    StartWatching(FileId),
    /// 请求文件监听桥停止监听
    StopWatching(FileId),
    /// 分组（状态 / 语言列）需要刷新
    ReloadLocalizable(LocalizableId),
    /// 指定的 ValueSet 需要刷新（为空表示整个分组的行）
    ReloadValueSets {
        localizable: LocalizableId,
        value_sets: Vec<ValueSetId>,
    },
    /// 选中指定的 ValueSet
    SelectValueSets {
        localizable: LocalizableId,
        value_sets: Vec<ValueSetId>,
    },
    /// 当前分组变化
    SelectionChanged(Option<LocalizableId>),
    /// 分组在展示列表中的新位置（隐藏时为 None）
    LocalizableMoved {
        localizable: LocalizableId,
        position: Option<usize>,
    },
    /// 文档是否有未保存修改
    DocumentEdited(bool),
    FileSaved(FileId),
    SaveFailed { file: FileId, error: String },
    /// 文件被外部修改，但内存中有未保存的编辑（保留内存版本）
    ExternalChangeConflict(FileId),
    /// 文件被外部修改后已重新读取
    FileReloaded(FileId),
}

/// 事件类型（用于订阅过滤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartWatching,
    StopWatching,
    ReloadLocalizable,
    ReloadValueSets,
    SelectValueSets,
    SelectionChanged,
    LocalizableMoved,
    DocumentEdited,
    FileSaved,
    SaveFailed,
    ExternalChangeConflict,
    FileReloaded,
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::StartWatching(_) => EventKind::StartWatching,
            SessionEvent::StopWatching(_) => EventKind::StopWatching,
            SessionEvent::ReloadLocalizable(_) => EventKind::ReloadLocalizable,
            SessionEvent::ReloadValueSets { .. } => EventKind::ReloadValueSets,
            SessionEvent::SelectValueSets { .. } => EventKind::SelectValueSets,
            SessionEvent::SelectionChanged(_) => EventKind::SelectionChanged,
            SessionEvent::LocalizableMoved { .. } => EventKind::LocalizableMoved,
            SessionEvent::DocumentEdited(_) => EventKind::DocumentEdited,
            SessionEvent::FileSaved(_) => EventKind::FileSaved,
            SessionEvent::SaveFailed { .. } => EventKind::SaveFailed,
            SessionEvent::ExternalChangeConflict(_) => EventKind::ExternalChangeConflict,
            SessionEvent::FileReloaded(_) => EventKind::FileReloaded,
        }
    }

    /// 事件关联的文件
    pub fn file(&self) -> Option<FileId> {
        match self {
            SessionEvent::StartWatching(file)
            | SessionEvent::StopWatching(file)
            | SessionEvent::FileSaved(file)
            | SessionEvent::SaveFailed { file, .. }
            | SessionEvent::ExternalChangeConflict(file)
            | SessionEvent::FileReloaded(file) => Some(*file),
            _ => None,
        }
    }
}

/// 订阅过滤条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    kind: Option<EventKind>,
    file: Option<FileId>,
}

impl EventFilter {
    /// 接收所有事件
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(kind: EventKind) -> Self {
        Self {
            kind: Some(kind),
            file: None,
        }
    }

    /// 只接收与某个文件相关的事件
    pub fn for_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }

    pub fn matches(&self, event: &SessionEvent) -> bool {
        if let Some(kind) = self.kind {
            if event.kind() != kind {
                return false;
            }
        }
        match self.file {
            Some(file) => event.file() == Some(file),
            None => true,
        }
    }
}

/// 订阅句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&SessionEvent) + Send>;

/// 订阅列表
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, EventFilter, Handler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, filter, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// 按订阅顺序同步投递
    pub fn publish(&mut self, event: &SessionEvent) {
        for (_, filter, handler) in self.subscribers.iter_mut() {
            if filter.matches(event) {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(bus: &mut EventBus, filter: EventFilter) -> (SubscriptionId, Arc<Mutex<Vec<SessionEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let id = bus.subscribe(filter, move |event| sink.lock().unwrap().push(event.clone()));
        (id, events)
    }

    #[test]
    fn test_filter_by_kind_and_file() {
        let mut bus = EventBus::new();
        let file = FileId::new();
        let other = FileId::new();
        let (_, saved) = recorder(&mut bus, EventFilter::kind(EventKind::FileSaved).for_file(file));
        let (_, all) = recorder(&mut bus, EventFilter::all());

        bus.publish(&SessionEvent::FileSaved(file));
        bus.publish(&SessionEvent::FileSaved(other));
        bus.publish(&SessionEvent::StartWatching(file));

        assert_eq!(*saved.lock().unwrap(), vec![SessionEvent::FileSaved(file)]);
        assert_eq!(all.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let (id, events) = recorder(&mut bus, EventFilter::all());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        bus.publish(&SessionEvent::DocumentEdited(true));
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_events_without_file_do_not_match_file_filter() {
        let filter = EventFilter::all().for_file(FileId::new());
        assert!(!filter.matches(&SessionEvent::DocumentEdited(true)));
    }
}
