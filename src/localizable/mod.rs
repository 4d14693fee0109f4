//! 本地化数据模型
//!
//! - **value_set**: 一个 key + 注释 + 每种语言一个值
//! - **file**: 一个物理语言文件，以及导入器读写的记录格式
//! - **group**: 共享同一套 key 的文件分组（Localizable）
mod file;
mod group;
mod value_set;

#[cfg(test)]
mod tests;

pub use file::{File, ValueRecord};
pub use group::{fold_records, presentation_position, Localizable};
pub use value_set::{LanguageValue, ValueSet, ValueSetField};
