//! The write context threaded through every strategy write.
//!
//! A [`Writer`] owns the output buffer of one serialize call and carries the
//! per-call state that nested writes consult:
//!
//! - the active [`Options`] snapshot and the [`StrategyCache`] of the format
//! - the current recursion depth, checked against `Options::max_depth`
//! - whether a map key is being written (JSV quotes `:` inside keys)
//! - a pending request to emit the type discriminator on the next composite
//!
//! The state lives on the writer, so concurrent calls on different threads,
//! and successive calls on the same thread, never observe each other.
//!
//! Most users should go through the facades in [`crate::jsv`] and
//! [`crate::json`]; a writer is only handed out to custom code running
//! inside a strategy.

use crate::cache::StrategyCache;
use crate::format::Format;
use crate::reflect::{Reflect, TypeDescriptor};
use crate::{Options, Result};

/// Writes a root value into a fresh buffer.
///
/// A late-bound root (the caller only has a `&dyn Reflect`) leads with the
/// discriminator when its concrete type is a composite.
pub(crate) fn write_root(
    cache: &StrategyCache,
    options: &Options,
    value: &dyn Reflect,
    late_bound: bool,
) -> Result<String> {
    let descriptor = value.descriptor();
    let mut writer = Writer::new(options, cache);
    if late_bound && !options.exclude_type_info && cache.get_or_build(descriptor).is_composite() {
        writer.request_type_info();
    }
    writer.write_value(descriptor, value)?;
    Ok(writer.into_inner())
}

/// Output buffer plus per-call write state.
pub struct Writer<'a> {
    output: String,
    format: Format,
    options: &'a Options,
    cache: &'a StrategyCache,
    depth: usize,
    map_key_depth: usize,
    type_hint: bool,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(options: &'a Options, cache: &'a StrategyCache) -> Self {
        Writer {
            // 256 bytes covers typical small records without regrowing
            output: String::with_capacity(256),
            format: cache.format(),
            options,
            cache,
            depth: 0,
            map_key_depth: 0,
            type_hint: false,
        }
    }

    pub(crate) fn into_inner(self) -> String {
        self.output
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

    pub fn push(&mut self, ch: char) {
        self.output.push(ch);
    }

    pub fn push_str(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// Whether a dictionary key is currently being written.
    #[must_use]
    pub fn in_map_key(&self) -> bool {
        self.map_key_depth > 0
    }

    /// Runs `f` with the map-key flag raised; the flag is lowered on return.
    pub(crate) fn with_map_key<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.map_key_depth += 1;
        let result = f(self);
        self.map_key_depth -= 1;
        result
    }

    /// Runs `f` against an empty buffer and returns what it wrote.
    pub(crate) fn capture(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<String> {
        let saved = std::mem::take(&mut self.output);
        let result = f(self);
        let captured = std::mem::replace(&mut self.output, saved);
        result.map(|()| captured)
    }

    /// Asks the next composite write to lead with the discriminator.
    pub(crate) fn request_type_info(&mut self) {
        self.type_hint = true;
    }

    /// Consumes a pending discriminator request.
    pub(crate) fn take_type_info(&mut self) -> bool {
        std::mem::take(&mut self.type_hint)
    }

    /// Writes `value` through the cached strategy of `descriptor`.
    ///
    /// Past `max_depth` the absent-value token is written in place of the
    /// value and the call succeeds.
    pub fn write_value(&mut self, descriptor: TypeDescriptor, value: &dyn Reflect) -> Result<()> {
        if self.depth >= self.options.max_depth {
            tracing::warn!(
                type_name = descriptor.name(),
                max_depth = self.options.max_depth,
                "recursion depth exceeded, value truncated"
            );
            self.type_hint = false;
            self.write_null();
            return Ok(());
        }
        let strategy = self.cache.get_or_build(descriptor);
        self.depth += 1;
        let result = (strategy.write)(self, value);
        self.depth -= 1;
        result
    }

    /// Writes a string token with the escaping rules of the format.
    pub fn write_string(&mut self, s: &str) {
        let in_key = self.in_map_key();
        let escape_unicode = self.options.escape_unicode;
        match self.format {
            Format::Json => crate::codec::write_json_string(&mut self.output, s, escape_unicode),
            Format::Jsv => crate::codec::write_jsv_string(&mut self.output, s, in_key),
        }
    }

    /// Writes the format's absent-value token (`null` in JSON, nothing in JSV).
    pub fn write_null(&mut self) {
        if self.format.has_null_literal() {
            self.output.push_str("null");
        }
    }

    /// Writes a member or dictionary key that is already a plain string.
    pub(crate) fn write_key(&mut self, key: &str) {
        self.with_map_key(|w| w.write_string(key));
    }
}
