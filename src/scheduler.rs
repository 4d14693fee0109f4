/// 保存调度器
///
/// 每个被监听的文件有两个独立的防抖通道：
/// - **手动保存通道**：50ms 窗口
/// - **自动保存通道**：300ms 窗口（是否真正写入由会话按 autosave 开关决定）
///
/// 每次触发都会重置该通道的定时器，只有窗口内不再有新触发时才会产出一次到期保存。
/// 开始监听信号本身也有 300ms 防抖（合并批量加载时的大量信号），
/// 停止监听信号为 0ms（在下一次调度时生效），停止时直接丢弃两个通道及其未决触发。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::datatypes::FileId;
use crate::settings::ImporterOptions;

/// 手动保存通道窗口
pub const MANUAL_SAVE_DEBOUNCE: Duration = Duration::from_millis(50);
/// 自动保存通道窗口
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(300);
/// 开始监听信号窗口
pub const WATCH_START_DEBOUNCE: Duration = Duration::from_millis(300);
/// 停止监听信号窗口
pub const WATCH_STOP_DEBOUNCE: Duration = Duration::from_millis(0);

/// 单通道防抖器
///
/// 触发时（重新）设置截止时间并替换载荷；到期后由 `poll` 取出载荷并清除未决状态。
#[derive(Debug, Clone)]
pub struct Debouncer<P> {
    window: Duration,
    deadline: Option<Instant>,
    payload: Option<P>,
}

impl<P> Debouncer<P> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            payload: None,
        }
    }

    /// 在 `at` 时刻触发（最后一次触发的载荷生效）
    pub fn trigger(&mut self, at: Instant, payload: P) {
        self.deadline = Some(at + self.window);
        self.payload = Some(payload);
    }

    /// 到期则取出载荷
    pub fn poll(&mut self, now: Instant) -> Option<P> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.payload.take()
            }
            _ => None,
        }
    }

    /// 取消未决触发
    ///
    /// # 返回
    /// 取消前是否有未决触发
    pub fn cancel(&mut self) -> bool {
        self.payload = None;
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// 保存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveChannel {
    Manual,
    Autosave,
}

impl SaveChannel {
    /// 通道的防抖窗口
    pub fn window(&self) -> Duration {
        match self {
            SaveChannel::Manual => MANUAL_SAVE_DEBOUNCE,
            SaveChannel::Autosave => AUTOSAVE_DEBOUNCE,
        }
    }
}

/// 到期的保存请求
#[derive(Debug, Clone)]
pub struct DueSave {
    pub file: FileId,
    pub channel: SaveChannel,
    /// 最后一次触发时的导入器选项快照
    pub options: Arc<ImporterOptions>,
}

#[derive(Debug)]
struct FileChannels {
    manual: Debouncer<Arc<ImporterOptions>>,
    autosave: Debouncer<Arc<ImporterOptions>>,
}

impl FileChannels {
    fn new() -> Self {
        Self {
            manual: Debouncer::new(SaveChannel::Manual.window()),
            autosave: Debouncer::new(SaveChannel::Autosave.window()),
        }
    }

    fn channel_mut(&mut self, channel: SaveChannel) -> &mut Debouncer<Arc<ImporterOptions>> {
        match channel {
            SaveChannel::Manual => &mut self.manual,
            SaveChannel::Autosave => &mut self.autosave,
        }
    }
}

/// 通道创建前到达的触发
#[derive(Debug, Clone)]
struct DeferredTrigger {
    channel: SaveChannel,
    options: Arc<ImporterOptions>,
    at: Instant,
}

/// 监听信号的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchChanges {
    pub started: Vec<FileId>,
    pub stopped: Vec<FileId>,
}

/// 每文件保存调度器
#[derive(Debug)]
pub struct SaveScheduler {
    channels: HashMap<FileId, FileChannels>,
    start_signal: Debouncer<()>,
    stop_signal: Debouncer<()>,
    /// 等待创建通道的文件及其延迟触发
    pending_start: BTreeMap<FileId, Vec<DeferredTrigger>>,
    pending_stop: BTreeSet<FileId>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            start_signal: Debouncer::new(WATCH_START_DEBOUNCE),
            stop_signal: Debouncer::new(WATCH_STOP_DEBOUNCE),
            pending_start: BTreeMap::new(),
            pending_stop: BTreeSet::new(),
        }
    }

    /// 请求开始监听（防抖合并，到期后创建通道）
    pub fn request_start(&mut self, file: FileId, now: Instant) {
        self.pending_stop.remove(&file);
        if !self.channels.contains_key(&file) {
            self.pending_start.entry(file).or_default();
        }
        self.start_signal.trigger(now, ());
    }

    /// 请求停止监听（下一次调度时丢弃通道）
    pub fn request_stop(&mut self, file: FileId, now: Instant) {
        self.pending_start.remove(&file);
        self.pending_stop.insert(file);
        self.stop_signal.trigger(now, ());
    }

    /// 触发某个文件的保存通道
    ///
    /// # 返回
    /// 触发被接收（已有通道或等待创建）时返回 true；文件未被监听时触发被丢弃
    pub fn trigger(
        &mut self,
        file: FileId,
        channel: SaveChannel,
        options: Arc<ImporterOptions>,
        now: Instant,
    ) -> bool {
        if let Some(channels) = self.channels.get_mut(&file) {
            channels.channel_mut(channel).trigger(now, options);
            return true;
        }

        if let Some(deferred) = self.pending_start.get_mut(&file) {
            deferred.retain(|d| d.channel != channel);
            deferred.push(DeferredTrigger {
                channel,
                options,
                at: now,
            });
            return true;
        }

        debug!("丢弃未监听文件的保存触发: {} ({:?})", file, channel);
        false
    }

    /// 处理到期的监听信号
    pub fn poll_watch(&mut self, now: Instant) -> WatchChanges {
        let mut changes = WatchChanges::default();

        if self.stop_signal.poll(now).is_some() {
            for file in std::mem::take(&mut self.pending_stop) {
                if self.channels.remove(&file).is_some() {
                    changes.stopped.push(file);
                }
            }
            debug!("unwatch - 通道数量: {}", self.channels.len());
        }

        if self.start_signal.poll(now).is_some() {
            for (file, deferred) in std::mem::take(&mut self.pending_start) {
                let channels = self.channels.entry(file).or_insert_with(FileChannels::new);
                for trigger in deferred {
                    channels
                        .channel_mut(trigger.channel)
                        .trigger(trigger.at, trigger.options);
                }
                changes.started.push(file);
            }
            debug!("watch - 通道数量: {}", self.channels.len());
        }

        changes
    }

    /// 取出所有到期的保存（按截止时间排序）
    pub fn poll_due(&mut self, now: Instant) -> Vec<DueSave> {
        let mut due: Vec<(Instant, DueSave)> = Vec::new();

        for (file, channels) in self.channels.iter_mut() {
            for channel in [SaveChannel::Manual, SaveChannel::Autosave] {
                let debouncer = channels.channel_mut(channel);
                let Some(deadline) = debouncer.deadline() else {
                    continue;
                };
                if let Some(options) = debouncer.poll(now) {
                    due.push((
                        deadline,
                        DueSave {
                            file: *file,
                            channel,
                            options,
                        },
                    ));
                }
            }
        }

        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, save)| save).collect()
    }

    /// 最近的截止时间（宿主可据此休眠）
    pub fn next_deadline(&self) -> Option<Instant> {
        let signals = [self.start_signal.deadline(), self.stop_signal.deadline()];
        let channels = self
            .channels
            .values()
            .flat_map(|c| [c.manual.deadline(), c.autosave.deadline()]);
        // 延迟触发在开始信号到期后才会装载，由开始信号的截止时间覆盖
        signals.into_iter().chain(channels).flatten().min()
    }

    pub fn is_watching(&self, file: FileId) -> bool {
        self.channels.contains_key(&file)
    }

    /// 是否在等待创建通道
    pub fn is_start_pending(&self, file: FileId) -> bool {
        self.pending_start.contains_key(&file)
    }

    pub fn is_pending(&self, file: FileId, channel: SaveChannel) -> bool {
        match self.channels.get(&file) {
            Some(channels) => match channel {
                SaveChannel::Manual => channels.manual.is_pending(),
                SaveChannel::Autosave => channels.autosave.is_pending(),
            },
            None => false,
        }
    }

    /// 当前存活的文件通道数
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 取消所有通道和信号
    ///
    /// # 返回
    /// 拆除后仍然存活的通道数（应为 0）
    pub fn teardown(&mut self) -> usize {
        self.start_signal.cancel();
        self.stop_signal.cancel();
        self.pending_start.clear();
        self.pending_stop.clear();

        for channels in self.channels.values_mut() {
            channels.manual.cancel();
            channels.autosave.cancel();
        }
        self.channels.clear();

        debug!("cancel - 通道数量: {}", self.channels.len());
        self.channels.len()
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}
