/// 搜索与结果导航
///
/// 查询输入经过 200ms 防抖后才执行（空查询立即生效并清空结果），
/// 结果是（分组，ValueSet）对，可以向前 / 向后循环选择。

use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::datatypes::{LocalizableId, ValueSetId};
use crate::localizable::{Localizable, ValueSet};
use crate::scheduler::Debouncer;

/// 查询输入的防抖窗口
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// 搜索范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// 所有已加载的分组
    #[default]
    All,
    /// 仅当前选中的分组
    Current,
}

bitflags::bitflags! {
    /// 参与匹配的字段
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SearchFields: u8 {
        const KEY = 0b001;
        const COMMENT = 0b010;
        const VALUES = 0b100;
    }
}

impl Default for SearchFields {
    fn default() -> Self {
        SearchFields::all()
    }
}

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    RegularExpression,
}

/// 翻译状态过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    #[default]
    All,
    /// 至少有一种语言缺少非空值
    Untranslated,
    Translated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub scope: SearchScope,
    pub fields: SearchFields,
    pub mode: SearchMode,
    /// 区分大小写（正则模式下忽略）
    pub match_case: bool,
    /// 全词匹配（正则模式下忽略）
    pub match_words: bool,
    pub filter: SearchFilter,
}

/// 编译后的查询
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    /// 按选项编译查询
    ///
    /// # 返回
    /// 空查询返回 `Ok(None)`
    pub fn compile(query: &str, options: &SearchOptions) -> Result<Option<Self>, regex::Error> {
        if query.is_empty() {
            return Ok(None);
        }

        let regex = match options.mode {
            SearchMode::RegularExpression => Regex::new(query)?,
            mode => {
                let mut pattern = regex::escape(query);
                if options.match_words {
                    pattern = format!(r"\b{}\b", pattern);
                }
                pattern = match mode {
                    SearchMode::StartsWith => format!("^{}", pattern),
                    SearchMode::EndsWith => format!("{}$", pattern),
                    _ => pattern,
                };
                RegexBuilder::new(&pattern)
                    .case_insensitive(!options.match_case)
                    .build()?
            }
        };

        Ok(Some(Self { regex }))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// ValueSet 的任一选定字段是否匹配
    pub fn matches_value_set(&self, value_set: &ValueSet, fields: SearchFields) -> bool {
        (fields.contains(SearchFields::KEY) && self.is_match(&value_set.key))
            || (fields.contains(SearchFields::COMMENT) && self.is_match(&value_set.comment))
            || (fields.contains(SearchFields::VALUES)
                && value_set
                    .languages()
                    .any(|language| self.is_match(value_set.text(language))))
    }
}

fn passes_filter(localizable: &Localizable, value_set: &ValueSet, filter: SearchFilter) -> bool {
    match filter {
        SearchFilter::All => true,
        SearchFilter::Untranslated => !localizable.is_translated(value_set),
        SearchFilter::Translated => localizable.is_translated(value_set),
    }
}

/// 搜索命中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchHit {
    pub localizable: LocalizableId,
    pub value_set: ValueSetId,
}

/// 结果导航方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Next,
    Previous,
}

/// 搜索状态：当前查询、待生效的查询、结果与游标
#[derive(Debug)]
pub struct SearchIndex {
    query: String,
    pending: Debouncer<String>,
    results: Vec<SearchHit>,
    cursor: Option<usize>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            pending: Debouncer::new(SEARCH_DEBOUNCE),
            results: Vec::new(),
            cursor: None,
        }
    }

    /// 输入新的查询
    ///
    /// # 返回
    /// 查询立即生效（空查询）时返回 true，否则等待防抖
    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) -> bool {
        let query = query.into();
        if query.is_empty() {
            self.pending.cancel();
            self.query.clear();
            self.results.clear();
            self.cursor = None;
            return true;
        }
        self.pending.trigger(now, query);
        false
    }

    /// 取出到期的查询并使其成为当前查询
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let query = self.pending.poll(now)?;
        self.query = query;
        Some(&self.query)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// 是否有生效的搜索（非空查询或过滤）
    pub fn is_active(&self, options: &SearchOptions) -> bool {
        !self.query.is_empty() || options.filter != SearchFilter::All
    }

    /// 用当前查询重新计算结果
    ///
    /// 之前选中的命中若仍在结果中则保持选中。
    ///
    /// # 返回
    /// 结果数量
    pub fn run(
        &mut self,
        localizables: &[Localizable],
        selected: Option<LocalizableId>,
        options: &SearchOptions,
    ) -> Result<usize, regex::Error> {
        let previous = self.current();
        self.results.clear();
        self.cursor = None;

        if !self.is_active(options) {
            return Ok(0);
        }
        let pattern = SearchPattern::compile(&self.query, options)?;

        for (index, localizable) in localizables.iter().enumerate() {
            let id = LocalizableId(index);
            if options.scope == SearchScope::Current && selected != Some(id) {
                continue;
            }
            for value_set in &localizable.value_sets {
                let matched = pattern
                    .as_ref()
                    .map(|p| p.matches_value_set(value_set, options.fields))
                    .unwrap_or(true);
                if matched && passes_filter(localizable, value_set, options.filter) {
                    self.results.push(SearchHit {
                        localizable: id,
                        value_set: value_set.id(),
                    });
                }
            }
        }

        self.cursor = previous.and_then(|hit| self.results.iter().position(|r| *r == hit));
        Ok(self.results.len())
    }

    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    pub fn current(&self) -> Option<SearchHit> {
        self.cursor.and_then(|i| self.results.get(i).copied())
    }

    /// 移动游标（首尾循环）
    pub fn select(&mut self, direction: SearchDirection) -> Option<SearchHit> {
        if self.results.is_empty() {
            return None;
        }
        let last = self.results.len() - 1;
        let next = match (self.cursor, direction) {
            (None, SearchDirection::Next) => 0,
            (None, SearchDirection::Previous) => last,
            (Some(i), SearchDirection::Next) => if i >= last { 0 } else { i + 1 },
            (Some(i), SearchDirection::Previous) => if i == 0 { last } else { i - 1 },
        };
        self.cursor = Some(next);
        self.current()
    }

    pub fn clear(&mut self) {
        self.pending.cancel();
        self.query.clear();
        self.results.clear();
        self.cursor = None;
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}
