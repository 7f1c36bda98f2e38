//! Draft-mode records: opening, fixing, dismissing

mod common;

use arbor_core::editor::draft::DraftCause;
use arbor_core::editor::InsertionType;
use arbor_core::{EditAction, Key};
use common::{assert_in_sync, typed};

#[test]
fn test_only_fix_returns_construct_to_clean() {
    let mut module = typed("x = input(5");
    assert_eq!(module.text(), "x = input(5)");

    let record = module.drafts()[0].clone();
    assert!(matches!(record.cause, DraftCause::TypeMismatch { .. }));
    assert_eq!(record.fixes.len(), 1);
    assert_eq!(record.fixes[0].label, "Wrap in str()");

    let outcome = module.execute(EditAction::ApplyDraftFix {
        construct: record.construct,
        fix: 0,
    });
    assert!(outcome.applied);
    assert_eq!(module.text(), "x = input(str(5))");
    assert!(module.drafts().is_empty());
    assert_in_sync(&module);
}

#[test]
fn test_mismatched_literal_is_draft_not_invalid() {
    let mut module = typed("x = input(");
    let outcome = module.press(Key::Char('5'));
    assert!(outcome.applied);
    assert_eq!(outcome.verdict, Some(InsertionType::DraftMode));
}

#[test]
fn test_hover_message_follows_record() {
    let mut module = typed("total");
    module.press(Key::Right);
    let construct = module.drafts()[0].construct;
    assert!(module
        .sink()
        .hover_for(construct)
        .map(|text| text.contains("total"))
        .unwrap_or(false));

    let outcome = module.press(Key::Escape);
    assert!(outcome.applied);
    assert!(module.sink().hover_for(construct).is_none());
    assert!(module.drafts().is_empty());
}

#[test]
fn test_declaring_variable_closes_record() {
    let mut module = typed("total");
    module.press(Key::Right);
    let record = module.drafts()[0].clone();
    let declare = record
        .fixes
        .iter()
        .position(|fix| fix.label.starts_with("Declare"))
        .unwrap();

    module.execute(EditAction::ApplyDraftFix {
        construct: record.construct,
        fix: declare,
    });
    assert_eq!(module.text(), "total = ___\ntotal");
    assert!(module.drafts().is_empty());
    assert_in_sync(&module);
}

#[test]
fn test_missing_import_fix_inserts_import_line() {
    let mut module = typed("x = randint(");
    assert_eq!(module.text(), "x = randint(___, ___)");
    let record = module.drafts()[0].clone();
    assert!(matches!(record.cause, DraftCause::MissingImport { .. }));

    module.execute(EditAction::ApplyDraftFix {
        construct: record.construct,
        fix: 0,
    });
    assert_eq!(module.text(), "from random import randint\nx = randint(___, ___)");
    assert!(module.drafts().is_empty());
    assert_in_sync(&module);
}

#[test]
fn test_record_closes_when_cause_goes_away() {
    let mut module = typed("x = input(5");
    assert_eq!(module.drafts().len(), 1);
    module.press(Key::Backspace);
    assert_eq!(module.text(), "x = input(___)");
    assert!(module.drafts().is_empty());
}

#[test]
fn test_unknown_fix_is_refused() {
    let mut module = typed("total");
    module.press(Key::Right);
    let construct = module.drafts()[0].construct;
    let outcome = module.execute(EditAction::ApplyDraftFix { construct, fix: 9 });
    assert!(!outcome.applied);
    assert_eq!(module.drafts().len(), 1);
}
