//! JSV facade.
//!
//! JSV is the compact notation of this crate: `{Name:Alice,Tags:[a,b]}`.
//! Keys and strings are only quoted when they contain structural
//! characters, a quote inside a quoted string is doubled, and there is no
//! `null` literal: an absent value is simply empty and reads back as the
//! type's default.
//!
//! ```rust
//! use jsv_text::{jsv, reflect_composite};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct User { name: String, tags: Vec<String> }
//!
//! reflect_composite!(User { "Name" => name, "Tags" => tags });
//!
//! let user = User { name: "Alice".into(), tags: vec!["a".into(), "b,c".into()] };
//! let text = jsv::to_string(&user).unwrap();
//! assert_eq!(text, r#"{Name:Alice,Tags:[a,"b,c"]}"#);
//! assert_eq!(jsv::from_str::<User>(&text).unwrap(), user);
//! ```

use crate::cache::StrategyCache;
use crate::format::Format;
use crate::reflect::{unbox, AnyBox, Reflect, TypeDescriptor};
use crate::{de, ser, Error, Options, Result};
use std::io;
use std::sync::OnceLock;

/// The process-wide strategy cache for JSV.
#[must_use]
pub fn cache() -> &'static StrategyCache {
    static CACHE: OnceLock<StrategyCache> = OnceLock::new();
    CACHE.get_or_init(|| StrategyCache::new(Format::Jsv))
}

/// Writes `value` as JSV using the options current on this thread.
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: Reflect>(value: &T) -> Result<String> {
    to_string_with_options(value, &Options::current())
}

/// Writes `value` as JSV with explicit options.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{jsv, Options};
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert("a".to_string(), None::<i32>);
/// map.insert("b".to_string(), Some(2));
///
/// let options = Options::new().with_null_values(true);
/// assert_eq!(jsv::to_string_with_options(&map, &options).unwrap(), "{a:,b:2}");
/// ```
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T: Reflect>(value: &T, options: &Options) -> Result<String> {
    ser::write_root(cache(), options, value, false)
}

/// Writes a value known only by its runtime type.
///
/// A composite leads with the discriminator so it can be read back into an
/// abstract slot.
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_dyn(value: &dyn Reflect) -> Result<String> {
    ser::write_root(cache(), &Options::current(), value, true)
}

/// Writes `value` as JSV into `writer`.
///
/// # Errors
///
/// Returns an error if writing the value or writing to `writer` fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: Reflect,
{
    to_writer_with_options(writer, value, &Options::current())
}

/// Writes `value` as JSV into `writer` with explicit options.
///
/// # Errors
///
/// Returns an error if writing the value or writing to `writer` fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &Options) -> Result<()>
where
    W: io::Write,
    T: Reflect,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Reads a `T` from JSV text using the options current on this thread.
///
/// Empty text reads as the default of `T`.
///
/// # Examples
///
/// ```rust
/// use jsv_text::jsv;
///
/// assert_eq!(jsv::from_str::<Vec<i32>>("[1,2,3]").unwrap(), vec![1, 2, 3]);
/// assert_eq!(jsv::from_str::<i32>("").unwrap(), 0);
/// ```
///
/// # Errors
///
/// Returns an error if a scalar cannot be parsed, an abstract slot has no
/// usable discriminator, or strict parsing rejects malformed input.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: Reflect>(s: &str) -> Result<T> {
    from_str_with_options(s, &Options::current())
}

/// Reads a `T` from JSV text with explicit options.
///
/// # Errors
///
/// See [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T: Reflect>(s: &str, options: &Options) -> Result<T> {
    unbox(de::read_root(cache(), options, TypeDescriptor::of::<T>(), s)?)
}

/// Reads a value of the runtime type `descriptor`.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{jsv, TypeDescriptor};
///
/// let value = jsv::from_str_dyn("[1,2]", TypeDescriptor::of::<Vec<u8>>()).unwrap();
/// assert_eq!(value.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2]));
/// ```
///
/// # Errors
///
/// See [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_dyn(s: &str, descriptor: TypeDescriptor) -> Result<AnyBox> {
    de::read_root(cache(), &Options::current(), descriptor, s)
}

/// Reads a `T` from JSV bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or see [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T: Reflect>(v: &[u8]) -> Result<T> {
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Reads a `T` from an I/O stream of JSV.
///
/// # Errors
///
/// Returns an error if reading from `reader` fails, or see [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: Reflect,
{
    from_reader_with_options(reader, &Options::current())
}

/// Reads a `T` from an I/O stream of JSV with explicit options.
///
/// # Errors
///
/// Returns an error if reading from `reader` fails, or see [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader_with_options<R, T>(mut reader: R, options: &Options) -> Result<T>
where
    R: io::Read,
    T: Reflect,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str_with_options(&string, options)
}
