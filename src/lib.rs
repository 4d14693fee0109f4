pub mod clock;
pub mod datatypes;
pub mod editor;
pub mod events;
pub mod io;
pub mod localizable;
pub mod project_loader;
pub mod scheduler;
pub mod search;
pub mod settings;
pub mod utils;

// 重新导出主要结构
pub use clock::{Clock, ManualClock, SystemClock};
pub use datatypes::{FileFormat, FileId, Language, LoadStatus, LocalizableId, LocalizableKind, ValueSetId};
pub use editor::{Action, BridgeSignal, CloseDecision, EditCommand, EditSession, LoadReport, SaveReport};
pub use events::{EventFilter, EventKind, SessionEvent, SubscriptionId};
pub use io::{Importer, JsonImporter, MemoryImporter};
pub use localizable::{File, Localizable, ValueRecord, ValueSet, ValueSetField};
pub use search::{SearchDirection, SearchHit, SearchOptions};
pub use settings::{EditorSettings, ImporterOptions};
pub use utils::{EditorError, ImporterError};

// 防抖窗口
pub use scheduler::{AUTOSAVE_DEBOUNCE, MANUAL_SAVE_DEBOUNCE, WATCH_START_DEBOUNCE, WATCH_STOP_DEBOUNCE};
pub use search::SEARCH_DEBOUNCE;
