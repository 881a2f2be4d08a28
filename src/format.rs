//! Text format identity.
//!
//! Every strategy cache, writer and cursor is bound to one [`Format`]. CSV is
//! not listed: its cells are encoded with the JSV rules.

/// The structured text notations understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// JSON: quoted keys and strings with backslash escapes, `null` literal.
    Json,
    /// JSV: unquoted keys, strings quoted only when they contain structural
    /// characters, quotes escaped by doubling, no `null` literal.
    Jsv,
}

impl Format {
    /// Returns the lowercase name of this format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Jsv => "jsv",
        }
    }

    /// Whether the format has a literal for absent values.
    #[must_use]
    pub const fn has_null_literal(&self) -> bool {
        matches!(self, Format::Json)
    }
}
