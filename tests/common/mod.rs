//! 集成测试公共工具
//!
//! 用内存导入器 + 手动时钟搭建可控的编辑会话。

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use l10n_editor::{
    EditSession, EditorSettings, EventFilter, FileFormat, FileId, Language, Localizable, LocalizableId,
    LocalizableKind, ManualClock, MemoryImporter, SessionEvent, ValueRecord, ValueSetId, File,
};

pub struct Fixture {
    pub session: EditSession,
    pub importer: Arc<MemoryImporter>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<Mutex<Vec<SessionEvent>>>,
}

pub fn en() -> Language {
    Language::new("en")
}

pub fn fr() -> Language {
    Language::new("fr")
}

pub fn strings_file(name: &str, language: &Language) -> File {
    File::new(
        language.clone(),
        FileFormat::Strings,
        PathBuf::from(format!("{}/{}.lproj/{}.strings", name, language, name)),
        name,
    )
}

/// 一个英文文件的分组：greeting = "Hi"
pub fn greeting_localizable() -> (Localizable, Vec<(Language, Vec<ValueRecord>)>) {
    let localizable = Localizable::new("Main", LocalizableKind::Strings, PathBuf::from("Main"))
        .with_file(strings_file("Main", &en()));
    let contents = vec![(en(), vec![ValueRecord::new("greeting", "Hi")])];
    (localizable, contents)
}

/// 英文 + 法文的分组
pub fn bilingual_localizable() -> (Localizable, Vec<(Language, Vec<ValueRecord>)>) {
    let localizable = Localizable::new("Main", LocalizableKind::Strings, PathBuf::from("Main"))
        .with_file(strings_file("Main", &en()))
        .with_file(strings_file("Main", &fr()));
    let contents = vec![
        (
            en(),
            vec![
                ValueRecord::new("greeting", "Hi").with_comment("Shown on launch"),
                ValueRecord::new("farewell", "Bye"),
            ],
        ),
        (
            fr(),
            vec![
                ValueRecord::new("greeting", "Salut").with_comment("Shown on launch"),
                ValueRecord::new("farewell", "Au revoir"),
            ],
        ),
    ];
    (localizable, contents)
}

/// 打开项目（默认配置会自动加载所有分组），并订阅所有事件
pub fn open(groups: Vec<(Localizable, Vec<(Language, Vec<ValueRecord>)>)>) -> Fixture {
    open_with(groups, EditorSettings::default())
}

pub fn open_with(
    groups: Vec<(Localizable, Vec<(Language, Vec<ValueRecord>)>)>,
    settings: EditorSettings,
) -> Fixture {
    let mut importer = MemoryImporter::new();
    for (localizable, contents) in groups {
        importer = importer.with_localizable(localizable, contents);
    }
    let importer = Arc::new(importer);
    let clock = Arc::new(ManualClock::new());

    let mut session = EditSession::open(Path::new("project"), importer.clone(), settings, clock.clone())
        .expect("open project");

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    session.subscribe(EventFilter::all(), move |event| sink.lock().unwrap().push(event.clone()));

    Fixture {
        session,
        importer,
        clock,
        events,
    }
}

impl Fixture {
    pub fn file_id(&self, localizable: LocalizableId, language: &Language) -> FileId {
        self.session
            .localizable(localizable)
            .and_then(|l| l.file_for(language))
            .map(|f| f.id())
            .expect("file exists")
    }

    pub fn value_set_id(&self, localizable: LocalizableId, key: &str) -> ValueSetId {
        self.session
            .localizable(localizable)
            .and_then(|l| l.value_sets.iter().find(|vs| vs.key == key))
            .map(|vs| vs.id())
            .expect("value set exists")
    }

    /// 推进时间并处理到期的定时器
    pub fn advance(&mut self, millis: u64) -> l10n_editor::SaveReport {
        self.clock.advance_ms(millis);
        self.session.poll()
    }

    /// 推进到所有监听信号生效
    pub fn settle(&mut self) {
        self.advance(300);
        self.importer.clear_saves();
        self.events.lock().unwrap().clear();
    }

    pub fn take_events(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}
