/// 编辑会话
///
/// 项目打开时创建、关闭时拆除的显式会话对象，持有：
/// 分组集合、撤销历史、脏文件集合、保存调度器、事件订阅列表和搜索状态。
/// 所有修改都在调用方的交互上下文中串行执行，会话本身不启动任何线程
/// （批量加载时的并行提取见 [`crate::project_loader`]）。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::dirty::DirtyTracker;
use super::history::UndoHistory;
use crate::clock::Clock;
use crate::datatypes::{FileId, LoadStatus, LocalizableId, LocalizableKind, ValueSetId};
use crate::events::{EventBus, EventFilter, SessionEvent, SubscriptionId};
use crate::io::Importer;
use crate::localizable::{presentation_position, File, Localizable};
use crate::scheduler::{SaveChannel, SaveScheduler};
use crate::search::{SearchDirection, SearchHit, SearchIndex, SearchOptions};
use crate::settings::{EditorSettings, ImporterOptions};
use crate::utils::{EditorError, ImporterError};

/// 需要校验可用性的用户动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddLanguage,
    AddString,
    RemoveString,
    Undo,
    Redo,
}

/// 关闭有未保存修改的文档时的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Save,
    Discard,
    Cancel,
}

/// 文件监听桥发来的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeSignal {
    /// 文件被外部修改
    FileChanged(FileId),
    /// 立即保存（手动保存通道）
    SaveNow(FileId),
    /// 自动保存（自动保存通道）
    AutosaveNow(FileId),
}

/// 一批保存的结果
#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<FileId>,
    /// 保存失败的文件（仍保留在脏集合中）
    pub failed: Vec<(FileId, ImporterError)>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, file: FileId, result: Result<bool, EditorError>) {
        match result {
            Ok(true) => self.saved.push(file),
            Ok(false) => {}
            Err(EditorError::Importer(e)) => self.failed.push((file, e)),
            Err(e) => self.failed.push((file, ImporterError::Rejected(e.to_string()))),
        }
    }
}

/// 编辑会话
///
/// # 使用示例
///
/// ```rust,ignore
/// use l10n_editor::{EditSession, EditorSettings, JsonImporter, SystemClock};
///
/// let mut session = EditSession::open(
///     Path::new("project"),
///     Arc::new(JsonImporter::new()),
///     EditorSettings::default(),
///     Arc::new(SystemClock),
/// )?;
///
/// session.update_value_set_field(None, id, ValueSetField::Value("fr".into()), "Salut")?;
///
/// // 宿主的交互循环
/// loop {
///     session.poll();
///     sleep_until(session.next_deadline());
/// }
/// ```
pub struct EditSession {
    pub(super) project_path: PathBuf,
    pub(super) localizables: Vec<Localizable>,
    pub(super) selected: Option<LocalizableId>,
    pub(super) selected_rows: Vec<ValueSetId>,
    pub(super) importer: Arc<dyn Importer>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: EditorSettings,
    /// 当前导入器选项快照（触发保存时捕获）
    pub(super) options: Arc<ImporterOptions>,
    pub(super) history: UndoHistory,
    pub(super) dirty: DirtyTracker,
    pub(super) scheduler: SaveScheduler,
    pub(super) events: EventBus,
    pub(super) search: SearchIndex,
    /// 加载时读取失败的文件（内存中没有其完整内容，不能写回）
    pub(super) unreadable: HashSet<FileId>,
    pub(super) document_edited: bool,
    pub(super) closed: bool,
}

impl EditSession {
    /// 打开项目
    ///
    /// 通过导入器发现所有分组；`autoload` 打开时按展示顺序加载全部分组。
    pub fn open(
        project_path: &Path,
        importer: Arc<dyn Importer>,
        settings: EditorSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EditorError> {
        let localizables = importer.load_project(project_path, &settings.importer)?;
        info!("打开项目 {:?}: {} 个分组", project_path, localizables.len());

        let mut session = Self::from_localizables(project_path, localizables, importer, settings, clock);

        if session.settings.general.autoload {
            let mut order: Vec<usize> = (0..session.localizables.len()).collect();
            order.sort_by(|a, b| session.localizables[*a].presentation_cmp(&session.localizables[*b]));
            let ids: Vec<LocalizableId> = order.into_iter().map(LocalizableId).collect();
            let report = session.load_localizables(&ids);
            if !report.failed.is_empty() {
                warn!("{} 个文件加载失败", report.failed.len());
            }
        }

        Ok(session)
    }

    /// 用已发现的分组创建会话（不加载）
    pub fn from_localizables(
        project_path: &Path,
        localizables: Vec<Localizable>,
        importer: Arc<dyn Importer>,
        settings: EditorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let options = Arc::new(settings.importer.clone());
        let history = UndoHistory::with_limit(settings.general.history_limit);
        let selected = if localizables.is_empty() {
            None
        } else {
            Some(LocalizableId(0))
        };

        Self {
            project_path: project_path.to_path_buf(),
            localizables,
            selected,
            selected_rows: Vec::new(),
            importer,
            clock,
            settings,
            options,
            history,
            dirty: DirtyTracker::new(),
            scheduler: SaveScheduler::new(),
            events: EventBus::new(),
            search: SearchIndex::new(),
            unreadable: HashSet::new(),
            document_edited: false,
            closed: false,
        }
    }

    // ---- 查询 ----

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn localizables(&self) -> &[Localizable] {
        &self.localizables
    }

    pub fn localizable(&self, id: LocalizableId) -> Option<&Localizable> {
        self.localizables.get(id.0)
    }

    /// 按名称和类型查找分组
    pub fn find_localizable(&self, name: &str, kind: LocalizableKind) -> Option<LocalizableId> {
        self.localizables
            .iter()
            .position(|l| l.name == name && l.kind == kind)
            .map(LocalizableId)
    }

    /// 查找文件所在的（分组，文件）位置
    pub fn locate_file(&self, file: FileId) -> Option<(LocalizableId, &File)> {
        self.localizables.iter().enumerate().find_map(|(index, localizable)| {
            localizable.file(file).map(|f| (LocalizableId(index), f))
        })
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn importer_options(&self) -> Arc<ImporterOptions> {
        self.options.clone()
    }

    /// 替换导入器选项（已排队的保存仍使用触发时的旧快照）
    pub fn set_importer_options(&mut self, options: ImporterOptions) {
        self.settings.importer = options.clone();
        self.options = Arc::new(options);
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.settings.general.autosave = enabled;
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 文档是否有未保存修改
    pub fn is_document_edited(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_dirty(&self, file: FileId) -> bool {
        self.dirty.contains(file)
    }

    pub fn dirty_files(&self) -> Vec<FileId> {
        self.dirty.files()
    }

    /// 文件在加载时读取失败（写回会覆盖磁盘上的内容，因此被拒绝）
    pub fn is_unreadable(&self, file: FileId) -> bool {
        self.unreadable.contains(&file)
    }

    pub fn is_watching(&self, file: FileId) -> bool {
        self.scheduler.is_watching(file)
    }

    pub fn is_save_pending(&self, file: FileId, channel: SaveChannel) -> bool {
        self.scheduler.is_pending(file, channel)
    }

    // ---- 事件 ----

    pub fn subscribe<F>(&mut self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.events.subscribe(filter, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(super) fn emit(&mut self, event: SessionEvent) {
        self.events.publish(&event);
    }

    /// 脏集合变化后同步"文档已编辑"状态
    pub(super) fn sync_document_edited(&mut self) {
        let edited = !self.dirty.is_empty();
        if edited != self.document_edited {
            self.document_edited = edited;
            self.emit(SessionEvent::DocumentEdited(edited));
        }
    }

    pub(super) fn now(&self) -> Instant {
        self.clock.now()
    }

    // ---- 选择 ----

    pub fn selected(&self) -> Option<LocalizableId> {
        self.selected
    }

    /// 选中分组
    ///
    /// # 参数
    /// * `reload` - 已选中时是否仍然通知刷新
    ///
    /// # 返回
    /// 发出了选择变化通知时返回 true
    pub fn select_localizable(&mut self, id: LocalizableId, reload: bool) -> bool {
        if self.closed || id.0 >= self.localizables.len() {
            return false;
        }
        if self.selected == Some(id) && !reload {
            return false;
        }

        self.selected = Some(id);
        self.selected_rows.clear();
        self.emit(SessionEvent::SelectionChanged(Some(id)));
        self.refresh_search();
        true
    }

    /// 更新当前分组中选中的行
    pub fn set_selected_rows(&mut self, rows: Vec<ValueSetId>) {
        self.selected_rows = rows;
    }

    pub fn selected_rows(&self) -> &[ValueSetId] {
        &self.selected_rows
    }

    /// 动作当前是否可用
    pub fn can_perform(&self, action: Action) -> bool {
        if self.closed {
            return false;
        }
        let current = self.selected.and_then(|id| self.localizables.get(id.0));
        let ready = current.map(|l| l.status.is_ready()).unwrap_or(false);

        match action {
            Action::AddLanguage => {
                ready && current.map(|l| l.kind != LocalizableKind::Config).unwrap_or(false)
            }
            Action::AddString => {
                ready
                    && current
                        .map(|l| matches!(l.kind, LocalizableKind::Strings | LocalizableKind::Config))
                        .unwrap_or(false)
            }
            Action::RemoveString => self.can_perform(Action::AddString) && !self.selected_rows.is_empty(),
            Action::Undo => self.history.can_undo(),
            Action::Redo => self.history.can_redo(),
        }
    }

    /// 分组在同类分组中的展示位置（隐藏时为 None）
    pub fn presentation_position(&self, id: LocalizableId) -> Option<usize> {
        presentation_position(&self.localizables, id.0, self.settings.general.show_unlocalized_files)
    }

    // ---- 搜索 ----

    /// 输入查询（空查询立即生效，其余等待防抖）
    pub fn set_search_query(&mut self, query: &str) {
        if self.closed {
            return;
        }
        let now = self.now();
        if self.search.set_query(query, now) {
            self.refresh_search();
        }
    }

    pub fn set_search_options(&mut self, options: SearchOptions) {
        self.settings.search = options;
        self.refresh_search();
    }

    pub fn search_results(&self) -> &[SearchHit] {
        self.search.results()
    }

    pub fn search_query(&self) -> &str {
        self.search.query()
    }

    /// 选中下一个 / 上一个搜索结果（首尾循环）
    pub fn select_search_result(&mut self, direction: SearchDirection) -> Option<SearchHit> {
        if self.closed {
            return None;
        }
        let hit = self.search.select(direction)?;

        if self.selected != Some(hit.localizable) {
            self.selected = Some(hit.localizable);
            self.emit(SessionEvent::SelectionChanged(Some(hit.localizable)));
        }
        self.selected_rows = vec![hit.value_set];
        self.emit(SessionEvent::SelectValueSets {
            localizable: hit.localizable,
            value_sets: vec![hit.value_set],
        });
        Some(hit)
    }

    /// 用当前查询重新计算搜索结果
    ///
    /// 没有生效的搜索时清空结果。
    pub(super) fn refresh_search(&mut self) {
        if let Err(e) = self.search.run(&self.localizables, self.selected, &self.settings.search) {
            warn!("搜索表达式无效: {}", e);
        }
    }

    // ---- 调度 ----

    /// 最近的定时器截止时间（宿主可据此休眠到下一次 `poll`）
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.scheduler.next_deadline(), self.search.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// 处理所有到期的定时器：监听信号、保存通道、搜索查询
    pub fn poll(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        if self.closed {
            return report;
        }
        let now = self.now();

        let changes = self.scheduler.poll_watch(now);
        for file in changes.stopped {
            self.emit(SessionEvent::StopWatching(file));
        }
        for file in changes.started {
            self.emit(SessionEvent::StartWatching(file));
        }

        for due in self.scheduler.poll_due(now) {
            if due.channel == SaveChannel::Autosave && !self.settings.general.autosave {
                debug!("自动保存已关闭，跳过 {}", due.file);
                continue;
            }
            let result = self.save_file_with(due.file, &due.options);
            report.record(due.file, result);
        }

        if self.search.poll(now).is_some() {
            self.refresh_search();
        }

        report
    }

    /// 处理文件监听桥的信号
    pub fn handle_bridge_signal(&mut self, signal: BridgeSignal) -> Result<(), EditorError> {
        if self.closed {
            return Ok(());
        }
        let now = self.now();
        match signal {
            BridgeSignal::FileChanged(file) => self.reload_external_change(file),
            BridgeSignal::SaveNow(file) => {
                self.scheduler.trigger(file, SaveChannel::Manual, self.options.clone(), now);
                Ok(())
            }
            BridgeSignal::AutosaveNow(file) => {
                self.scheduler.trigger(file, SaveChannel::Autosave, self.options.clone(), now);
                Ok(())
            }
        }
    }

    /// 请求（防抖后）保存文件
    pub fn request_save(&mut self, file: FileId) -> bool {
        if self.closed {
            return false;
        }
        let now = self.now();
        self.scheduler.trigger(file, SaveChannel::Manual, self.options.clone(), now)
    }

    pub(super) fn start_watching(&mut self, file: FileId) {
        let now = self.now();
        self.scheduler.request_start(file, now);
    }

    pub(super) fn stop_watching(&mut self, file: FileId) {
        let now = self.now();
        self.scheduler.request_stop(file, now);
    }

    /// 触发文件的自动保存通道
    pub(super) fn request_autosave(&mut self, file: FileId) {
        let now = self.now();
        self.scheduler.trigger(file, SaveChannel::Autosave, self.options.clone(), now);
    }

    // ---- 关闭 ----

    /// 关闭文档
    ///
    /// # 返回
    /// 会话已拆除时返回 true；选择取消时返回 false
    pub fn close(&mut self, decision: CloseDecision) -> Result<bool, EditorError> {
        if self.closed {
            return Ok(true);
        }

        if self.is_document_edited() {
            match decision {
                CloseDecision::Cancel => return Ok(false),
                CloseDecision::Save => {
                    let mut report = self.save_all();
                    if let Some((file, e)) = report.failed.pop() {
                        warn!("关闭前保存失败 {}: {}", file, e);
                        return Err(EditorError::Importer(e));
                    }
                }
                CloseDecision::Discard => {
                    info!("丢弃 {} 个文件的未保存修改", self.dirty.len());
                    self.dirty.clear();
                    self.sync_document_edited();
                }
            }
        }

        self.teardown()?;
        Ok(true)
    }

    /// 拆除会话：取消所有通道、清空订阅与历史
    ///
    /// 拆除后仍有存活通道时返回 [`EditorError::TeardownIncomplete`]。
    pub fn teardown(&mut self) -> Result<(), EditorError> {
        if self.closed {
            return Ok(());
        }

        let watched: Vec<FileId> = self
            .localizables
            .iter()
            .flat_map(|l| l.file_ids())
            .filter(|id| self.scheduler.is_watching(*id))
            .collect();
        for file in watched {
            self.emit(SessionEvent::StopWatching(file));
        }

        let remaining = self.scheduler.teardown();
        self.events.clear();
        self.search.clear();
        self.unreadable.clear();
        self.history.clear();
        self.selected_rows.clear();
        self.closed = true;
        info!("会话已关闭: {:?}", self.project_path);

        if remaining > 0 {
            return Err(EditorError::TeardownIncomplete(remaining));
        }
        Ok(())
    }

    pub(super) fn status(&self, id: LocalizableId) -> Option<LoadStatus> {
        self.localizables.get(id.0).map(|l| l.status)
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("project_path", &self.project_path)
            .field("localizables", &self.localizables.len())
            .field("selected", &self.selected)
            .field("dirty", &self.dirty.len())
            .field("history", &self.history.len())
            .field("closed", &self.closed)
            .finish()
    }
}
