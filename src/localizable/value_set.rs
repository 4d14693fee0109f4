use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::datatypes::{Language, ValueSetId};

/// 单个语言的取值记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageValue {
    /// 文本内容
    pub value: String,
    /// 在原文件中的出现顺序
    pub original_index: Option<usize>,
    /// 变量名（配置文件中值所绑定的变量）
    pub variable_name: Option<String>,
}

impl LanguageValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            original_index: None,
            variable_name: None,
        }
    }
}

/// 可编辑字段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueSetField {
    Key,
    Comment,
    Value(Language),
}

impl ValueSetField {
    /// key / comment 是每个导出文件都会复制一份的共享元数据
    pub fn is_shared_metadata(&self) -> bool {
        matches!(self, ValueSetField::Key | ValueSetField::Comment)
    }
}

/// 一个逻辑 key：注释 + 每种语言一个取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    id: ValueSetId,
    /// 本地化 key（可修改）
    pub key: String,
    pub comment: String,
    values: BTreeMap<Language, LanguageValue>,
}

impl ValueSet {
    /// 创建空的 ValueSet（"添加字符串"）
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: ValueSetId::new(),
            key: key.into(),
            comment: String::new(),
            values: BTreeMap::new(),
        }
    }

    /// 链式设置某个语言的值
    pub fn with_value(mut self, language: Language, value: impl Into<String>) -> Self {
        self.set_value(language, value);
        self
    }

    /// 链式设置注释
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn id(&self) -> ValueSetId {
        self.id
    }

    pub fn value(&self, language: &Language) -> Option<&LanguageValue> {
        self.values.get(language)
    }

    /// 某个语言的文本，不存在时返回空字符串
    pub fn text(&self, language: &Language) -> &str {
        self.values
            .get(language)
            .map(|v| v.value.as_str())
            .unwrap_or("")
    }

    /// 设置或追加某个语言的值（保留原有的顺序和变量名信息）
    pub fn set_value(&mut self, language: Language, value: impl Into<String>) {
        self.values.entry(language).or_default().value = value.into();
    }

    /// 删除某个语言的值
    pub fn remove_value(&mut self, language: &Language) -> Option<LanguageValue> {
        self.values.remove(language)
    }

    /// 整体替换某个语言的记录（None 表示删除）
    ///
    /// # 返回
    /// 替换前的记录
    pub fn replace_entry(&mut self, language: &Language, entry: Option<LanguageValue>) -> Option<LanguageValue> {
        match entry {
            Some(entry) => self.values.insert(language.clone(), entry),
            None => self.values.remove(language),
        }
    }

    pub fn set_original_index(&mut self, language: &Language, index: Option<usize>) {
        if let Some(entry) = self.values.get_mut(language) {
            entry.original_index = index;
        }
    }

    pub fn set_variable_name(&mut self, language: &Language, name: Option<String>) {
        if let Some(entry) = self.values.get_mut(language) {
            entry.variable_name = name;
        }
    }

    /// 是否存在该语言的记录（值可以为空）
    pub fn has_entry(&self, language: &Language) -> bool {
        self.values.contains_key(language)
    }

    /// 读取字段当前值
    pub fn field(&self, field: &ValueSetField) -> String {
        match field {
            ValueSetField::Key => self.key.clone(),
            ValueSetField::Comment => self.comment.clone(),
            ValueSetField::Value(language) => self.text(language).to_string(),
        }
    }

    /// 写入字段
    pub fn set_field(&mut self, field: &ValueSetField, value: String) {
        match field {
            ValueSetField::Key => self.key = value,
            ValueSetField::Comment => self.comment = value,
            ValueSetField::Value(language) => self.set_value(language.clone(), value),
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_keeps_metadata() {
        let en = Language::new("en");
        let mut vs = ValueSet::new("greeting").with_value(en.clone(), "Hi");
        vs.set_original_index(&en, Some(3));
        vs.set_variable_name(&en, Some("GREETING".to_string()));

        vs.set_value(en.clone(), "Hello");

        let value = vs.value(&en).unwrap();
        assert_eq!(value.value, "Hello");
        assert_eq!(value.original_index, Some(3));
        assert_eq!(value.variable_name.as_deref(), Some("GREETING"));
    }

    #[test]
    fn test_empty_value_is_still_an_entry() {
        let vs = ValueSet::new("k")
            .with_value(Language::new("en"), "Hi")
            .with_value(Language::new("fr"), "");
        assert!(vs.has_entry(&Language::new("fr")));
        assert_eq!(vs.text(&Language::new("fr")), "");
        assert_eq!(vs.languages().count(), 2);
    }

    #[test]
    fn test_field_accessors() {
        let fr = Language::new("fr");
        let mut vs = ValueSet::new("k");
        vs.set_field(&ValueSetField::Value(fr.clone()), "Salut".to_string());
        vs.set_field(&ValueSetField::Comment, "note".to_string());
        assert_eq!(vs.field(&ValueSetField::Value(fr)), "Salut");
        assert_eq!(vs.field(&ValueSetField::Comment), "note");
        assert_eq!(vs.field(&ValueSetField::Key), "k");
    }
}
