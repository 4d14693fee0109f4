//! 撤销往返属性测试
//!
//! 任意一串编辑之后撤销同样次数，分组内容与脏集合都回到编辑前。

mod common;

use common::*;
use l10n_editor::{Language, LocalizableId, ValueSet, ValueSetField};
use proptest::prelude::*;

const MAIN: LocalizableId = LocalizableId(0);

#[derive(Debug, Clone)]
enum Op {
    Add { key: String, english: String, french: Option<String> },
    Remove { index: usize },
    SetValue { index: usize, french: bool, value: String },
    SetKey { index: usize, key: String },
    SetComment { index: usize, comment: String },
}

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,6}"
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[a-z]{1,5}", text(), proptest::option::of(text()))
            .prop_map(|(key, english, french)| Op::Add { key, english, french }),
        (0usize..8).prop_map(|index| Op::Remove { index }),
        (0usize..8, any::<bool>(), text()).prop_map(|(index, french, value)| Op::SetValue {
            index,
            french,
            value
        }),
        (0usize..8, "[a-z]{1,5}").prop_map(|(index, key)| Op::SetKey { index, key }),
        (0usize..8, text()).prop_map(|(index, comment)| Op::SetComment { index, comment }),
    ]
}

fn language(french: bool) -> Language {
    if french {
        fr()
    } else {
        en()
    }
}

/// 应用一个操作，返回是否真正产生了编辑
fn apply(fixture: &mut Fixture, op: &Op) -> bool {
    let session = &mut fixture.session;
    let ids: Vec<_> = session
        .localizable(MAIN)
        .map(|l| l.value_sets.iter().map(|vs| vs.id()).collect())
        .unwrap_or_default();
    let pick = |index: usize| ids.get(index % ids.len().max(1)).copied();

    let result = match op {
        Op::Add { key, english, french } => {
            let mut value_set = ValueSet::new(key.as_str()).with_value(en(), english.as_str());
            if let Some(french) = french {
                value_set = value_set.with_value(fr(), french.as_str());
            }
            session.add_value_sets(vec![value_set], Some(MAIN))
        }
        Op::Remove { index } => match pick(*index) {
            Some(id) => session.remove_value_sets(vec![id], Some(MAIN)),
            None => Ok(false),
        },
        Op::SetValue { index, french, value } => match pick(*index) {
            Some(id) => session.update_value_set_field(
                Some(MAIN),
                id,
                ValueSetField::Value(language(*french)),
                value.as_str(),
            ),
            None => Ok(false),
        },
        Op::SetKey { index, key } => match pick(*index) {
            Some(id) => session.update_value_set_field(Some(MAIN), id, ValueSetField::Key, key.as_str()),
            None => Ok(false),
        },
        Op::SetComment { index, comment } => match pick(*index) {
            Some(id) => session.update_value_set_field(Some(MAIN), id, ValueSetField::Comment, comment.as_str()),
            None => Ok(false),
        },
    };
    result.unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_restores_contents_and_dirty_set(ops in proptest::collection::vec(op(), 1..12)) {
        let mut fixture = open(vec![bilingual_localizable()]);
        let before = fixture.session.localizable(MAIN).unwrap().value_sets.clone();

        let applied = ops.iter().filter(|op| apply(&mut fixture, op)).count();
        prop_assert_eq!(fixture.session.history().len(), applied);

        for _ in 0..applied {
            prop_assert!(fixture.session.undo().unwrap());
        }

        let after = &fixture.session.localizable(MAIN).unwrap().value_sets;
        prop_assert_eq!(after, &before);
        prop_assert!(fixture.session.dirty_files().is_empty());
        prop_assert!(!fixture.session.is_document_edited());
    }

    #[test]
    fn redo_replays_the_same_edits(ops in proptest::collection::vec(op(), 1..8)) {
        let mut fixture = open(vec![bilingual_localizable()]);

        let applied = ops.iter().filter(|op| apply(&mut fixture, op)).count();
        let edited = fixture.session.localizable(MAIN).unwrap().value_sets.clone();
        let mut dirty = fixture.session.dirty_files();
        dirty.sort();

        for _ in 0..applied {
            fixture.session.undo().unwrap();
        }
        for _ in 0..applied {
            prop_assert!(fixture.session.redo().unwrap());
        }

        let mut redone_dirty = fixture.session.dirty_files();
        redone_dirty.sort();
        prop_assert_eq!(&fixture.session.localizable(MAIN).unwrap().value_sets, &edited);
        prop_assert_eq!(redone_dirty, dirty);
    }
}
