//! Tokenizing and the read context.
//!
//! This module provides the [`Cursor`], which extracts structural tokens from
//! JSON or JSV text, and the [`Reader`], the per-call context handed to every
//! strategy read.
//!
//! ## Tokens
//!
//! [`Cursor::eat_value`] consumes one value unit and returns it as a slice of
//! the input:
//!
//! - a quoted string (JSON escapes with `\`, JSV escapes a quote by doubling it)
//! - a balanced `{...}` or `[...]` span, skipping over quoted regions
//! - an unquoted scalar, ending at the next `,`, `}` or `]` (and at whitespace
//!   in JSON)
//!
//! It returns `None` at end of input or directly in front of a separator or
//! closer, which list readers turn into a default element: `[1,2,]` holds
//! three elements.
//!
//! ## Malformed input
//!
//! Parsing is lenient by default: an unterminated quote or an unbalanced span
//! extends to the end of input, and a map or list missing its closer ends at
//! the end of input. With `Options::strict` those cases are syntax errors.
//!
//! ```rust
//! use jsv_text::de::Cursor;
//! use jsv_text::Format;
//!
//! let mut cursor = Cursor::new("[1,{a:[2,3]},\"x,y\"]", Format::Jsv);
//! let items = cursor.list_items().unwrap();
//! assert_eq!(items, vec!["1", "{a:[2,3]}", "\"x,y\""]);
//! ```

use crate::cache::StrategyCache;
use crate::format::Format;
use crate::reflect::{AnyBox, TypeDescriptor};
use crate::{Error, Options, Result};
use std::borrow::Cow;

/// Position-tracking tokenizer over one input string.
pub struct Cursor<'a> {
    text: &'a str,
    position: usize,
    format: Format,
    strict: bool,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(text: &'a str, format: Format) -> Self {
        Cursor {
            text,
            position: 0,
            format,
            strict: false,
        }
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.position).copied()
    }

    fn error(&self, msg: &str) -> Error {
        Error::syntax(self.text, self.position, msg)
    }

    /// Advances past whitespace.
    pub fn eat_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    /// Consumes one value unit; `None` at end of input or before a separator/closer.
    pub fn eat_value(&mut self) -> Result<Option<&'a str>> {
        self.eat_whitespace();
        let start = self.position;
        match self.peek() {
            None | Some(b',') | Some(b'}') | Some(b']') => Ok(None),
            Some(b'"') => {
                self.skip_quoted()?;
                Ok(Some(&self.text[start..self.position]))
            }
            Some(b'{') | Some(b'[') => {
                self.skip_balanced()?;
                Ok(Some(&self.text[start..self.position]))
            }
            Some(_) => {
                while let Some(b) = self.peek() {
                    if matches!(b, b',' | b'}' | b']')
                        || (self.format == Format::Json && b.is_ascii_whitespace())
                    {
                        break;
                    }
                    self.position += 1;
                }
                Ok(Some(self.text[start..self.position].trim_end()))
            }
        }
    }

    /// Consumes `{` if it is the next non-whitespace character.
    pub fn eat_map_start_char(&mut self) -> bool {
        self.eat_char(b'{')
    }

    /// Consumes `[` if it is the next non-whitespace character.
    pub fn eat_list_start_char(&mut self) -> bool {
        self.eat_char(b'[')
    }

    fn eat_char(&mut self, expected: u8) -> bool {
        self.eat_whitespace();
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a map key: a quoted string, a balanced span, or text up to `:`.
    pub fn eat_map_key(&mut self) -> Result<Option<&'a str>> {
        self.eat_whitespace();
        let start = self.position;
        match self.peek() {
            None | Some(b':') | Some(b',') | Some(b'}') => Ok(None),
            Some(b'"') => {
                self.skip_quoted()?;
                Ok(Some(&self.text[start..self.position]))
            }
            Some(b'{') | Some(b'[') => {
                self.skip_balanced()?;
                Ok(Some(&self.text[start..self.position]))
            }
            Some(_) => {
                while let Some(b) = self.peek() {
                    if matches!(b, b':' | b',' | b'}') {
                        break;
                    }
                    self.position += 1;
                }
                Ok(Some(self.text[start..self.position].trim_end()))
            }
        }
    }

    /// Consumes the `:` between a key and its value.
    pub fn eat_map_key_separator(&mut self) -> bool {
        self.eat_char(b':')
    }

    /// Consumes `,` (returns `true`, more items follow) or `}` (returns `false`).
    ///
    /// At end of input returns `false`, or a syntax error in strict mode.
    pub fn eat_item_separator_or_map_end(&mut self) -> Result<bool> {
        self.eat_separator_or(b'}', "expected ',' or '}'")
    }

    /// Consumes `,` (returns `true`, more items follow) or `]` (returns `false`).
    pub fn eat_item_separator_or_list_end(&mut self) -> Result<bool> {
        self.eat_separator_or(b']', "expected ',' or ']'")
    }

    fn eat_separator_or(&mut self, closer: u8, msg: &str) -> Result<bool> {
        self.eat_whitespace();
        match self.peek() {
            Some(b',') => {
                self.position += 1;
                Ok(true)
            }
            Some(b) if b == closer => {
                self.position += 1;
                Ok(false)
            }
            None if !self.strict => Ok(false),
            _ if !self.strict => {
                // skip the stray token and stop reading this container
                self.position = self.text.len();
                Ok(false)
            }
            _ => Err(self.error(msg)),
        }
    }

    fn skip_quoted(&mut self) -> Result<()> {
        let bytes = self.text.as_bytes();
        let open = self.position;
        self.position += 1;
        while self.position < bytes.len() {
            match (self.format, bytes[self.position]) {
                (Format::Json, b'\\') => self.position += 2,
                (_, b'"') => {
                    if self.format == Format::Jsv && bytes.get(self.position + 1) == Some(&b'"') {
                        self.position += 2;
                    } else {
                        self.position += 1;
                        return Ok(());
                    }
                }
                _ => self.position += 1,
            }
        }
        self.position = bytes.len();
        if self.strict {
            Err(Error::syntax(self.text, open, "unterminated string"))
        } else {
            Ok(())
        }
    }

    fn skip_balanced(&mut self) -> Result<()> {
        let open = self.position;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.skip_quoted()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.position += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.position += 1;
        }
        if self.strict {
            Err(Error::syntax(self.text, open, "unbalanced brackets"))
        } else {
            Ok(())
        }
    }

    /// Splits a `{key:value,...}` map into raw key and value tokens.
    ///
    /// Missing values are returned as empty slices.
    pub fn map_entries(&mut self) -> Result<Vec<(&'a str, &'a str)>> {
        if !self.eat_map_start_char() {
            return Err(self.error("expected '{'"));
        }
        let mut entries = Vec::new();
        loop {
            self.eat_whitespace();
            match self.peek() {
                Some(b'}') => {
                    self.position += 1;
                    break;
                }
                None if self.strict => return Err(self.error("unterminated map")),
                None => break,
                _ => {}
            }
            let key = self.eat_map_key()?.unwrap_or("");
            if !self.eat_map_key_separator() {
                if self.strict {
                    return Err(self.error("expected ':' after map key"));
                }
                if !key.is_empty() {
                    entries.push((key, ""));
                }
            } else {
                let value = self.eat_value()?.unwrap_or("");
                entries.push((key, value));
            }
            if !self.eat_item_separator_or_map_end()? {
                break;
            }
        }
        Ok(entries)
    }

    /// Splits a `[a,b,...]` list into raw element tokens.
    ///
    /// An empty slot, including one after a trailing separator, is returned
    /// as an empty slice.
    pub fn list_items(&mut self) -> Result<Vec<&'a str>> {
        if !self.eat_list_start_char() {
            return Err(self.error("expected '['"));
        }
        let mut items = Vec::new();
        self.eat_whitespace();
        if self.peek() == Some(b']') {
            self.position += 1;
            return Ok(items);
        }
        loop {
            if self.is_at_end() {
                if self.strict {
                    return Err(self.error("unterminated list"));
                }
                break;
            }
            items.push(self.eat_value()?.unwrap_or(""));
            if !self.eat_item_separator_or_list_end()? {
                break;
            }
        }
        Ok(items)
    }
}

/// Reads a root value of type `descriptor` from `text`.
pub(crate) fn read_root(
    cache: &StrategyCache,
    options: &Options,
    descriptor: TypeDescriptor,
    text: &str,
) -> Result<AnyBox> {
    let mut reader = Reader::new(options, cache);
    reader.read_value(descriptor, text.trim())
}

/// Per-call read context handed to every strategy read.
pub struct Reader<'a> {
    format: Format,
    options: &'a Options,
    cache: &'a StrategyCache,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(options: &'a Options, cache: &'a StrategyCache) -> Self {
        Reader {
            format: cache.format(),
            options,
            cache,
            depth: 0,
        }
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub fn options(&self) -> &'a Options {
        self.options
    }

    pub(crate) fn cache(&self) -> &'a StrategyCache {
        self.cache
    }

    /// Creates a cursor over `text` configured for this read.
    #[must_use]
    pub fn cursor<'t>(&self, text: &'t str) -> Cursor<'t> {
        Cursor::new(text, self.format).strict(self.options.strict)
    }

    /// Whether `token` stands for an absent value.
    #[must_use]
    pub fn is_null(&self, token: &str) -> bool {
        let token = token.trim();
        token.is_empty() || (self.format == Format::Json && token == "null")
    }

    /// Decodes a string token: unescapes quoted text, passes bare text through.
    pub fn unquote<'t>(&self, token: &'t str) -> Result<Cow<'t, str>> {
        let token = token.trim();
        match self.format {
            Format::Json if token.starts_with('"') => {
                crate::codec::parse_json_string(token).map(Cow::Owned)
            }
            Format::Json => Ok(Cow::Borrowed(token)),
            Format::Jsv => Ok(crate::codec::parse_jsv_string(token)),
        }
    }

    /// Whether nested values would be cut off by the depth guard.
    ///
    /// Containers check this and return their empty form, so slots that
    /// cannot be read from absent text (trait objects) are never reached.
    #[must_use]
    pub fn depth_exhausted(&self) -> bool {
        self.depth >= self.options.max_depth
    }

    /// Reads `text` through the cached strategy of `descriptor`.
    ///
    /// Past `max_depth` the value is read as if absent.
    pub fn read_value(&mut self, descriptor: TypeDescriptor, text: &str) -> Result<AnyBox> {
        let strategy = self.cache.get_or_build(descriptor);
        if self.depth >= self.options.max_depth {
            tracing::warn!(
                type_name = descriptor.name(),
                max_depth = self.options.max_depth,
                "recursion depth exceeded, value read as absent"
            );
            return (strategy.read)(self, "");
        }
        self.depth += 1;
        let result = (strategy.read)(self, text);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eat_value_kinds() {
        let mut c = Cursor::new(r#"  "a\"b" , {x:[1,"]"]} , plain text ]"#, Format::Json);
        assert_eq!(c.eat_value().unwrap(), Some(r#""a\"b""#));
        assert!(c.eat_item_separator_or_list_end().unwrap());
        assert_eq!(c.eat_value().unwrap(), Some(r#"{x:[1,"]"]}"#));
        assert!(c.eat_item_separator_or_list_end().unwrap());
        assert_eq!(c.eat_value().unwrap(), Some("plain"));
    }

    #[test]
    fn test_jsv_scalar_keeps_inner_spaces() {
        let mut c = Cursor::new("{Value:Some Value ,B:2}", Format::Jsv);
        let entries = c.map_entries().unwrap();
        assert_eq!(entries, vec![("Value", "Some Value"), ("B", "2")]);
    }

    #[test]
    fn test_jsv_doubled_quote_does_not_close() {
        let mut c = Cursor::new(r#"["a""b,c",d]"#, Format::Jsv);
        assert_eq!(c.list_items().unwrap(), vec![r#""a""b,c""#, "d"]);
    }

    #[test]
    fn test_trailing_separator_yields_empty_slot() {
        let mut c = Cursor::new("[1,2,]", Format::Jsv);
        assert_eq!(c.list_items().unwrap(), vec!["1", "2", ""]);
        let mut c = Cursor::new("[]", Format::Jsv);
        assert!(c.list_items().unwrap().is_empty());
    }

    #[test]
    fn test_eat_value_none_before_closer() {
        let mut c = Cursor::new("]", Format::Jsv);
        assert_eq!(c.eat_value().unwrap(), None);
        let mut c = Cursor::new("", Format::Json);
        assert_eq!(c.eat_value().unwrap(), None);
    }

    #[test]
    fn test_lenient_unterminated_quote_runs_to_end() {
        let mut c = Cursor::new(r#"["abc,def"#, Format::Json);
        assert_eq!(c.list_items().unwrap(), vec![r#""abc,def"#]);
    }

    #[test]
    fn test_strict_unterminated_quote_fails() {
        let mut c = Cursor::new(r#"["abc,def"#, Format::Json).strict(true);
        assert!(matches!(c.list_items(), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_lenient_unbalanced_map_ends_at_input_end() {
        let mut c = Cursor::new("{a:1,b:{c:2", Format::Jsv);
        assert_eq!(c.map_entries().unwrap(), vec![("a", "1"), ("b", "{c:2")]);
        let mut c = Cursor::new("{a:1,b:{c:2", Format::Jsv).strict(true);
        assert!(c.map_entries().is_err());
    }

    #[test]
    fn test_strict_missing_key_separator_fails() {
        let mut c = Cursor::new("{a 1}", Format::Jsv).strict(true);
        assert!(c.map_entries().is_err());
    }

    #[test]
    fn test_quoted_and_complex_keys() {
        let mut c = Cursor::new(r#"{"a:b":1,{x:1}:2}"#, Format::Jsv);
        assert_eq!(
            c.map_entries().unwrap(),
            vec![(r#""a:b""#, "1"), ("{x:1}", "2")]
        );
    }

    #[test]
    fn test_json_whitespace_between_tokens() {
        let mut c = Cursor::new("{ \"a\" : 1 ,\n \"b\" : [ 1 , 2 ] }", Format::Json);
        assert_eq!(
            c.map_entries().unwrap(),
            vec![("\"a\"", "1"), ("\"b\"", "[ 1 , 2 ]")]
        );
    }
}
