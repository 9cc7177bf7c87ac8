use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E2001)
        .with_message("test error")
        .with_label(Info::new(1, 4, "a + b"), "here")
        .with_note("some context")
        .with_suggestion("try this");

    assert_eq!(diag.code, ErrorCode::E2001);
    assert_eq!(diag.message, "test error");
    assert_eq!(diag.labels.len(), 1);
    assert!(diag.labels[0].is_primary);
    assert_eq!(diag.notes.len(), 1);
    assert_eq!(diag.suggestions.len(), 1);
    assert_eq!(diag.labels[0].info, Info::new(1, 4, "a + b"));
}

#[test]
fn test_display_lists_labels_notes_and_help() {
    let diag = Diagnostic::error(ErrorCode::E2004)
        .with_message("bad call")
        .with_label(Info::new(2, 1, "f' 1"), "call")
        .with_secondary_label(Info::new(1, 1, "g' 2"), "called from here")
        .with_note("f takes 2 arguments")
        .with_suggestion("pass another argument");

    assert_eq!(
        diag.to_string(),
        "error [E2004]: bad call\n  --> (2:1): call\n      (1:1): called from here\n  = note: f takes 2 arguments\n  = help: pass another argument"
    );
}
