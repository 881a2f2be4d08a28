//! JSON facade.
//!
//! Output is standard JSON: quoted keys, backslash escapes, numbers and
//! booleans bare, `null` for absent values. Dictionary keys that are not
//! strings are wrapped in quotes so they read back as keys.
//!
//! ```rust
//! use jsv_text::json;
//! use std::collections::BTreeMap;
//!
//! let mut map = BTreeMap::new();
//! map.insert(1, "a".to_string());
//! assert_eq!(json::to_string(&map).unwrap(), r#"{"1":"a"}"#);
//!
//! let back: BTreeMap<i32, String> = json::from_str(r#"{"1":"a"}"#).unwrap();
//! assert_eq!(back, map);
//! ```

use crate::cache::StrategyCache;
use crate::format::Format;
use crate::reflect::{unbox, AnyBox, Reflect, TypeDescriptor};
use crate::{de, ser, Error, Options, Result, Value};
use std::io;
use std::sync::OnceLock;

/// The process-wide strategy cache for JSON.
#[must_use]
pub fn cache() -> &'static StrategyCache {
    static CACHE: OnceLock<StrategyCache> = OnceLock::new();
    CACHE.get_or_init(|| StrategyCache::new(Format::Json))
}

/// Writes `value` as JSON using the options current on this thread.
///
/// # Examples
///
/// ```rust
/// use jsv_text::json;
///
/// let text = json::to_string(&vec![Some("a\"b".to_string()), None]).unwrap();
/// assert_eq!(text, r#"["a\"b",null]"#);
/// ```
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: Reflect>(value: &T) -> Result<String> {
    to_string_with_options(value, &Options::current())
}

/// Writes `value` as JSON with explicit options.
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T: Reflect>(value: &T, options: &Options) -> Result<String> {
    ser::write_root(cache(), options, value, false)
}

/// Writes a value known only by its runtime type, leading composites with
/// the discriminator.
///
/// # Errors
///
/// Returns an error if a strategy fails to write a nested value.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_dyn(value: &dyn Reflect) -> Result<String> {
    ser::write_root(cache(), &Options::current(), value, true)
}

/// Writes `value` as JSON into `writer`.
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

/// Writes `value` as JSON into `writer` with explicit options.
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

/// Converts any [`Reflect`] value into a dynamic [`Value`].
///
/// # Examples
///
/// ```rust
/// use jsv_text::{json, reflect_composite, Value};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
/// reflect_composite!(Point { "X" => x, "Y" => y });
///
/// let value = json::to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.get("Y"), Some(&Value::from(2)));
/// ```
///
/// # Errors
///
/// Returns an error if `value` cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T: Reflect>(value: &T) -> Result<Value> {
    let options = Options::current();
    let text = to_string_with_options(value, &options)?;
    from_str_with_options(&text, &options)
}

/// Reads a `T` from JSON text using the options current on this thread.
///
/// `null` and empty text read as the default of `T`.
///
/// # Errors
///
/// Returns an error if a scalar cannot be parsed, an abstract slot has no
/// usable discriminator, or strict parsing rejects malformed input.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: Reflect>(s: &str) -> Result<T> {
    from_str_with_options(s, &Options::current())
}

/// Reads a `T` from JSON text with explicit options.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{json, Error, Options};
///
/// let strict = Options::new().with_strict(true);
/// assert!(matches!(
///     json::from_str_with_options::<Vec<i32>>("[1,2", &strict),
///     Err(Error::Syntax { .. })
/// ));
/// assert_eq!(json::from_str::<Vec<i32>>("[1,2").unwrap(), vec![1, 2]);
/// ```
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
/// # Errors
///
/// See [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_dyn(s: &str, descriptor: TypeDescriptor) -> Result<AnyBox> {
    de::read_root(cache(), &Options::current(), descriptor, s)
}

/// Reads a `T` from JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or see [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T: Reflect>(v: &[u8]) -> Result<T> {
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Reads a `T` from an I/O stream of JSON.
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

/// Reads a `T` from an I/O stream of JSON with explicit options.
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
