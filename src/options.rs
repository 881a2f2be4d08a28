//! Configuration options for writing and reading.
//!
//! This module provides the types that customize output and parsing:
//!
//! - [`Options`]: the configuration snapshot consulted by every write and read
//! - [`NamingPolicy`]: member name transform applied when writing
//! - [`DateHandling`] / [`TimeSpanHandling`]: date and duration encodings
//! - [`CsvOptions`] and [`Delimiter`]: CSV layout
//!
//! Options are plain values. They can be passed explicitly to every
//! `*_with_options` facade, or installed for the current thread with
//! [`Options::scope`], which pushes onto a per-thread stack and pops when the
//! returned guard is dropped.
//!
//! ## Examples
//!
//! ```rust
//! use jsv_text::{NamingPolicy, Options};
//!
//! let options = Options::new()
//!     .with_naming(NamingPolicy::CamelCase)
//!     .with_null_values(true);
//!
//! {
//!     let _scope = options.scope();
//!     assert_eq!(Options::current().naming, NamingPolicy::CamelCase);
//! }
//! assert_eq!(Options::current().naming, NamingPolicy::Verbatim);
//! ```

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// Member name transform applied at write time.
///
/// Reading always matches member names case-insensitively and ignoring
/// underscores, so text written under any policy reads back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingPolicy {
    /// Names are written as declared.
    #[default]
    Verbatim,
    /// `FirstName` is written as `firstName`.
    CamelCase,
    /// `FirstName` is written as `first_name`.
    SnakeCase,
}

impl NamingPolicy {
    /// Applies the policy to a declared member name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::NamingPolicy;
    ///
    /// assert_eq!(NamingPolicy::CamelCase.apply("FirstName"), "firstName");
    /// assert_eq!(NamingPolicy::SnakeCase.apply("FirstName"), "first_name");
    /// assert_eq!(NamingPolicy::Verbatim.apply("FirstName"), "FirstName");
    /// ```
    #[must_use]
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            NamingPolicy::Verbatim => Cow::Borrowed(name),
            NamingPolicy::CamelCase => Cow::Owned(name.to_lower_camel_case()),
            NamingPolicy::SnakeCase => Cow::Owned(name.to_snake_case()),
        }
    }
}

/// Textual encoding for date/time values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateHandling {
    /// `2024-01-15T10:30:00Z`, fractional seconds only when present.
    #[default]
    Iso8601,
    /// `Mon, 15 Jan 2024 10:30:00 GMT`
    Rfc1123,
    /// Seconds since the Unix epoch.
    UnixTime,
    /// Milliseconds since the Unix epoch.
    UnixTimeMs,
    /// `/Date(1705314600000)/`
    DcjsCompatible,
}

/// Textual encoding for time spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeSpanHandling {
    /// `P1DT2H3M4.5S`
    #[default]
    Iso8601Duration,
    /// `1.02:03:04.5`
    Standard,
}

/// Field delimiter for CSV output.
///
/// # Examples
///
/// ```rust
/// use jsv_text::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_char(), ',');
/// assert_eq!(Delimiter::Tab.as_char(), '\t');
/// assert_eq!(Delimiter::Pipe.as_char(), '|');
/// assert_eq!(Delimiter::Other('^').as_char(), '^');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
    Semicolon,
    /// Any other single character.
    Other(char),
}

impl Delimiter {
    /// Returns the character for this delimiter.
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
            Delimiter::Semicolon => ';',
            Delimiter::Other(ch) => *ch,
        }
    }
}

/// CSV layout options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: Delimiter,
    pub quote: char,
    pub row_separator: String,
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: Delimiter::default(),
            quote: '"',
            row_separator: default_row_separator().to_string(),
            include_headers: true,
        }
    }
}

#[cfg(windows)]
fn default_row_separator() -> &'static str {
    "\r\n"
}

#[cfg(not(windows))]
fn default_row_separator() -> &'static str {
    "\n"
}

/// The configuration snapshot consulted while writing and reading.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{DateHandling, Options};
///
/// let options = Options::new()
///     .with_type_info(true)
///     .with_type_attr("$type")
///     .with_date_handling(DateHandling::UnixTimeMs)
///     .with_max_depth(16);
/// assert_eq!(options.type_attr, "$type");
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Emit members whose value is absent instead of omitting them.
    pub include_null_values: bool,
    /// Emit the discriminator on every composite value.
    pub include_type_info: bool,
    /// Never emit the discriminator, even for abstract slots.
    pub exclude_type_info: bool,
    /// Per-type discriminator override keyed by short type name.
    pub type_info_overrides: BTreeMap<String, bool>,
    /// Name of the discriminator key.
    pub type_attr: String,
    pub naming: NamingPolicy,
    pub treat_enum_as_integer: bool,
    /// Values nested deeper than this are silently skipped.
    pub max_depth: usize,
    /// Use a value's declared interface name as its discriminator.
    pub prefer_interfaces: bool,
    /// Members dropped at write time, keyed as `"Type.Member"`.
    pub excluded_members: BTreeSet<String>,
    pub date_handling: DateHandling,
    pub time_span_handling: TimeSpanHandling,
    /// Escape every non-ASCII character in JSON strings.
    pub escape_unicode: bool,
    /// Reject unterminated quotes, unbalanced nesting and missing separators.
    pub strict: bool,
    pub csv: CsvOptions,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_null_values: false,
            include_type_info: false,
            exclude_type_info: false,
            type_info_overrides: BTreeMap::new(),
            type_attr: "__type".to_string(),
            naming: NamingPolicy::default(),
            treat_enum_as_integer: false,
            max_depth: 50,
            prefer_interfaces: false,
            excluded_members: BTreeSet::new(),
            date_handling: DateHandling::default(),
            time_span_handling: TimeSpanHandling::default(),
            escape_unicode: false,
            strict: false,
            csv: CsvOptions::default(),
        }
    }
}

thread_local! {
    static SCOPES: RefCell<Vec<Arc<Options>>> = const { RefCell::new(Vec::new()) };
}

fn defaults() -> &'static Arc<Options> {
    static DEFAULTS: OnceLock<Arc<Options>> = OnceLock::new();
    DEFAULTS.get_or_init(|| Arc::new(Options::default()))
}

impl Options {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the innermost scoped options of the calling thread, or the defaults.
    #[must_use]
    pub fn current() -> Arc<Options> {
        SCOPES
            .with(|scopes| scopes.borrow().last().cloned())
            .unwrap_or_else(|| Arc::clone(defaults()))
    }

    /// Installs these options for the calling thread until the guard is dropped.
    ///
    /// Scopes nest; dropping a guard restores the options that were current
    /// when it was created.
    #[must_use = "the options are uninstalled as soon as the scope guard is dropped"]
    pub fn scope(self) -> OptionsScope {
        let depth = SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            scopes.push(Arc::new(self));
            scopes.len() - 1
        });
        OptionsScope {
            depth,
            _not_send: PhantomData,
        }
    }

    #[must_use]
    pub fn with_null_values(mut self, include: bool) -> Self {
        self.include_null_values = include;
        self
    }

    #[must_use]
    pub fn with_type_info(mut self, include: bool) -> Self {
        self.include_type_info = include;
        self
    }

    #[must_use]
    pub fn without_type_info(mut self) -> Self {
        self.exclude_type_info = true;
        self
    }

    /// Forces (`true`) or suppresses (`false`) the discriminator for one type.
    #[must_use]
    pub fn with_type_info_for(mut self, short_type_name: &str, include: bool) -> Self {
        self.type_info_overrides
            .insert(short_type_name.to_string(), include);
        self
    }

    #[must_use]
    pub fn with_type_attr(mut self, attr: &str) -> Self {
        self.type_attr = attr.to_string();
        self
    }

    #[must_use]
    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_enum_as_integer(mut self, enabled: bool) -> Self {
        self.treat_enum_as_integer = enabled;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_prefer_interfaces(mut self, enabled: bool) -> Self {
        self.prefer_interfaces = enabled;
        self
    }

    /// Drops a member at write time; `key` is `"Type.Member"` with the short type name.
    #[must_use]
    pub fn with_excluded_member(mut self, key: &str) -> Self {
        self.excluded_members.insert(key.to_string());
        self
    }

    #[must_use]
    pub fn with_date_handling(mut self, handling: DateHandling) -> Self {
        self.date_handling = handling;
        self
    }

    #[must_use]
    pub fn with_time_span_handling(mut self, handling: TimeSpanHandling) -> Self {
        self.time_span_handling = handling;
        self
    }

    #[must_use]
    pub fn with_escape_unicode(mut self, enabled: bool) -> Self {
        self.escape_unicode = enabled;
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Resolves whether the discriminator is forced or suppressed for a type.
    pub(crate) fn type_info_override(&self, short_type_name: &str) -> Option<bool> {
        self.type_info_overrides.get(short_type_name).copied()
    }
}

/// Guard returned by [`Options::scope`].
///
/// Dropping it removes its own scope and any scope pushed after it.
pub struct OptionsScope {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for OptionsScope {
    fn drop(&mut self) {
        SCOPES.with(|scopes| scopes.borrow_mut().truncate(self.depth));
    }
}
