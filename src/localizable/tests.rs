use super::*;
use crate::datatypes::{FileFormat, Language, LocalizableKind};
use std::path::PathBuf;

/// 创建测试用的 Localizable（英语 + 法语）
fn create_test_localizable() -> Localizable {
    Localizable::new("Main", LocalizableKind::Strings, PathBuf::from("Main"))
        .with_file(File::new(
            Language::new("en"),
            FileFormat::Strings,
            PathBuf::from("en.lproj/Main.strings"),
            "Main",
        ))
        .with_file(File::new(
            Language::new("fr"),
            FileFormat::Strings,
            PathBuf::from("fr.lproj/Main.strings"),
            "Main",
        ))
}

#[test]
fn test_fold_records_merges_languages() {
    let en = Language::new("en");
    let fr = Language::new("fr");
    let mut value_sets = Vec::new();

    fold_records(
        &mut value_sets,
        &en,
        vec![
            ValueRecord::new("greeting", "Hi"),
            ValueRecord::new("farewell", "Bye").with_comment("说再见"),
        ],
    );
    fold_records(
        &mut value_sets,
        &fr,
        vec![
            ValueRecord::new("greeting", "Salut").with_comment("问候"),
            ValueRecord::new("farewell", "Au revoir").with_comment("ignored"),
        ],
    );

    assert_eq!(value_sets.len(), 2);
    assert_eq!(value_sets[0].text(&en), "Hi");
    assert_eq!(value_sets[0].text(&fr), "Salut");
    // 第一个非空注释生效
    assert_eq!(value_sets[0].comment, "问候");
    assert_eq!(value_sets[1].comment, "说再见");
}

#[test]
fn test_fold_records_keeps_position_and_variable() {
    let en = Language::new("en");
    let mut value_sets = Vec::new();
    let mut record = ValueRecord::new("title", "Title");
    record.original_index = Some(7);
    record.variable_name = Some("TITLE".to_string());

    fold_records(&mut value_sets, &en, vec![record]);

    let value = value_sets[0].value(&en).unwrap();
    assert_eq!(value.original_index, Some(7));
    assert_eq!(value.variable_name.as_deref(), Some("TITLE"));
}

#[test]
fn test_languages_follow_files() {
    let mut localizable = create_test_localizable();
    assert_eq!(
        localizable.languages(),
        vec![Language::new("en"), Language::new("fr")]
    );
    assert_eq!(localizable.file_index(&Language::new("fr")), Some(1));

    localizable.files.remove(0);
    assert!(!localizable.has_language(&Language::new("en")));
    assert!(localizable.file_for(&Language::new("en")).is_none());
}

#[test]
fn test_values_for_language() {
    let en = Language::new("en");
    let fr = Language::new("fr");
    let mut localizable = create_test_localizable();
    localizable.value_sets = vec![
        ValueSet::new("a").with_value(en.clone(), "A").with_comment("c"),
        ValueSet::new("b").with_value(fr.clone(), "B"),
    ];

    let values = localizable.values_for(&en);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].key, "a");
    assert_eq!(values[0].comment, "c");
    assert_eq!(localizable.values_for(&fr)[0].value, "B");
}

#[test]
fn test_duplicate_keys_are_allowed_in_model() {
    let mut localizable = create_test_localizable();
    localizable.value_sets.push(ValueSet::new("dup"));
    localizable.value_sets.push(ValueSet::new("dup"));
    assert!(localizable.contains_key("dup"));
    assert_eq!(localizable.value_sets.len(), 2);
}

#[test]
fn test_is_translated() {
    let en = Language::new("en");
    let fr = Language::new("fr");
    let localizable = create_test_localizable();

    let partial = ValueSet::new("a").with_value(en.clone(), "A");
    let full = ValueSet::new("b").with_value(en, "B").with_value(fr, "B");
    assert!(!localizable.is_translated(&partial));
    assert!(localizable.is_translated(&full));
}

#[test]
fn test_replace_language_values() {
    let en = Language::new("en");
    let fr = Language::new("fr");
    let mut localizable = create_test_localizable();
    localizable.value_sets = vec![
        ValueSet::new("a").with_value(en.clone(), "A").with_value(fr.clone(), "A-fr"),
        ValueSet::new("gone").with_value(fr.clone(), "x"),
        ValueSet::new("new-empty"),
    ];

    localizable.replace_language_values(
        &fr,
        vec![ValueRecord::new("a", "A2"), ValueRecord::new("c", "C")],
    );

    let keys: Vec<&str> = localizable.value_sets.iter().map(|vs| vs.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "new-empty", "c"]);
    assert_eq!(localizable.value_sets[0].text(&fr), "A2");
    assert_eq!(localizable.value_sets[0].text(&en), "A");
}

#[test]
fn test_presentation_position() {
    let make = |name: &str, localized: bool| {
        let l = Localizable::new(name, LocalizableKind::Strings, PathBuf::from(name));
        if localized { l } else { l.unlocalized() }
    };
    let localizables = vec![
        make("Zeta", true),
        make("alpha", false),
        make("Beta", true),
        Localizable::new("Info", LocalizableKind::Config, PathBuf::from("Info")),
    ];

    assert_eq!(presentation_position(&localizables, 2, false), Some(0));
    assert_eq!(presentation_position(&localizables, 0, false), Some(1));
    assert_eq!(presentation_position(&localizables, 1, false), None);
    assert_eq!(presentation_position(&localizables, 1, true), Some(2));
    assert_eq!(presentation_position(&localizables, 3, false), Some(0));
}
