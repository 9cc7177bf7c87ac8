use std::fmt;

/// Error codes for type resolution diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E2xxx: Type errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Type mismatch (a cast or unification failed)
    E2001,
    /// Unknown identifier
    E2003,
    /// Wrong number of arguments
    E2004,
    /// Cannot infer return type
    E2005,
    /// Duplicate definition
    E2006,
    /// Mutability violation
    E2007,
    /// Type cannot be bound, assigned or returned here
    E2008,
    /// Invalid jump label
    E2009,
    /// Called a value that is not callable
    E2010,
    /// Field or index access not supported
    E2011,
    /// Operator not supported for operand types
    E2012,
    /// Malformed construct reached the resolver
    E9001,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E9001 => "E9001",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
