use pretty_assertions::assert_eq;

use super::*;

#[test]
fn render_message_places_caret_under_column() {
    let info = Info::new(3, 5, "let x = y");
    assert_eq!(info.render("boom", false), "(3:5) boom\nlet x = y\n    ^");
}

#[test]
fn render_chain_entry_puts_name_first() {
    let info = Info::new(1, 1, "f' 1");
    assert_eq!(info.render("from", true), "from (1:1)\nf' 1\n^");
}

#[test]
fn default_info_renders_without_panicking() {
    let info = Info::default();
    assert_eq!(info.render("at", true), "at (0:0)\n\n^");
}

#[test]
fn display_is_compact() {
    assert_eq!(Info::new(12, 7, "").to_string(), "(12:7)");
}
