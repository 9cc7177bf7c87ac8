//! Source locations.
//!
//! An [`Info`] pins a node to a line and column and keeps the text of that
//! line, so a diagnostic can be rendered with a caret without going back to
//! the source file.

use std::fmt;
use std::sync::Arc;

/// Line/column location plus the text of the line it points into.
///
/// Lines and columns are 1-based. The default value is a synthetic location
/// used for trees built by hand.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct Info {
    pub line: u32,
    pub column: u32,
    pub line_text: Arc<str>,
}

#[cfg(target_pointer_width = "64")]
crate::static_assert_size!(Info, 24);

impl Info {
    pub fn new(line: u32, column: u32, line_text: impl Into<Arc<str>>) -> Self {
        Info {
            line,
            column,
            line_text: line_text.into(),
        }
    }

    /// Render `name` against this location with a caret under the column.
    ///
    /// `name (l:c)` when `before` is set (chain entries such as `from`/`at`),
    /// `(l:c) name` otherwise (a plain error message).
    pub fn render(&self, name: &str, before: bool) -> String {
        let pad = " ".repeat(self.column.saturating_sub(1) as usize);
        if before {
            format!(
                "{name} ({}:{})\n{}\n{pad}^",
                self.line, self.column, self.line_text
            )
        } else {
            format!(
                "({}:{}) {name}\n{}\n{pad}^",
                self.line, self.column, self.line_text
            )
        }
    }
}

impl fmt::Debug for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

#[cfg(test)]
mod tests;
