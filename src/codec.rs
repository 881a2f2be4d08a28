//! Scalar encodings and string escaping.
//!
//! Every primitive kind implements [`Primitive`]: a pure `encode` to text
//! and its exact inverse `decode`. The resolver wraps both into the
//! type-erased accessors of a [`PrimitiveShape`].
//!
//! | Kind | Encoding |
//! |---|---|
//! | integers, `Decimal`, `BigInt` | invariant decimal digits |
//! | `f32`, `f64` | shortest round-trip text, `MIN`/`MAX` in exponent form, `NaN`, `Infinity`, `-Infinity` |
//! | `bool` | `true` / `false` |
//! | `char` | the character as a string |
//! | [`Bytes`] | standard base64 |
//! | dates | per [`DateHandling`], every encoding is accepted when reading |
//! | `chrono::Duration` | per [`TimeSpanHandling`], both encodings are accepted when reading |
//! | `Uuid` | 32 hex digits, any standard form accepted when reading |
//!
//! In JSON, numbers and booleans are bare literals; every other kind is a
//! quoted string. In JSV all kinds go through the JSV quoting rule.

use crate::collections::Bytes;
use crate::de::Reader;
use crate::format::Format;
use crate::options::{DateHandling, TimeSpanHandling};
use crate::reflect::{AnyBox, PrimitiveKind, PrimitiveShape, Reflect, Shape};
use crate::ser::Writer;
use crate::{Error, Options, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::any::Any;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::str::FromStr;
use uuid::Uuid;

/// A scalar with a fixed textual encoding.
pub trait Primitive: Reflect + Sized + PartialEq {
    const KIND: PrimitiveKind;

    /// The value an absent or empty token reads as.
    fn default_value() -> Self;

    fn encode(&self, options: &Options, out: &mut String);

    fn decode(text: &str, options: &Options) -> Result<Self>;
}

impl PrimitiveShape {
    /// Builds the erased accessors for `T`.
    #[must_use]
    pub fn of<T: Primitive>() -> Self {
        PrimitiveShape {
            kind: T::KIND,
            write: write_primitive::<T>,
            read: read_primitive::<T>,
            is_default: is_default_primitive::<T>,
        }
    }
}

fn write_primitive<T: Primitive>(value: &dyn Any, writer: &mut Writer<'_>) -> Result<()> {
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| Error::type_mismatch(T::type_name(), "another primitive"))?;
    let mut text = String::new();
    value.encode(writer.options(), &mut text);
    let bare = match writer.format() {
        Format::Json => T::KIND.is_bare_in_json() && !is_non_finite(&text),
        Format::Jsv => false,
    };
    if bare {
        writer.push_str(&text);
    } else {
        writer.write_string(&text);
    }
    Ok(())
}

fn read_primitive<T: Primitive>(token: &str, reader: &Reader<'_>) -> Result<AnyBox> {
    if reader.is_null(token) {
        return Ok(Box::new(T::default_value()));
    }
    let text = reader.unquote(token)?;
    if text.is_empty() {
        return Ok(Box::new(T::default_value()));
    }
    Ok(Box::new(T::decode(&text, reader.options())?))
}

fn is_default_primitive<T: Primitive>(value: &dyn Any) -> bool {
    value
        .downcast_ref::<T>()
        .is_some_and(|v| *v == T::default_value())
}

fn is_non_finite(text: &str) -> bool {
    matches!(text, "NaN" | "Infinity" | "-Infinity")
}

macro_rules! integer_primitive {
    ($kind:ident: $($ty:ty),*) => {$(
        impl Primitive for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;

            fn default_value() -> Self {
                0
            }

            fn encode(&self, _options: &Options, out: &mut String) {
                let _ = write!(out, "{}", self);
            }

            fn decode(text: &str, _options: &Options) -> Result<Self> {
                text.parse::<$ty>()
                    .map_err(|e| Error::parse(stringify!($ty), text, e))
            }
        }

        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Primitive(PrimitiveShape::of::<$ty>())
            }
        }
    )*};
}

integer_primitive!(Int: i8, i16, i32, i64, i128, isize);
integer_primitive!(UInt: u8, u16, u32, u64, u128, usize);

macro_rules! float_primitive {
    ($($ty:ty),*) => {$(
        impl Primitive for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::Float;

            fn default_value() -> Self {
                0.0
            }

            fn encode(&self, _options: &Options, out: &mut String) {
                let v = *self;
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    out.push_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
                } else if v == <$ty>::MAX || v == <$ty>::MIN {
                    let _ = write!(out, "{:e}", v);
                } else {
                    let _ = write!(out, "{}", v);
                }
            }

            fn decode(text: &str, _options: &Options) -> Result<Self> {
                match text {
                    "NaN" => Ok(<$ty>::NAN),
                    "Infinity" => Ok(<$ty>::INFINITY),
                    "-Infinity" => Ok(<$ty>::NEG_INFINITY),
                    _ => text
                        .parse::<$ty>()
                        .map_err(|e| Error::parse(stringify!($ty), text, e)),
                }
            }
        }

        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Primitive(PrimitiveShape::of::<$ty>())
            }
        }
    )*};
}

float_primitive!(f32, f64);

/// Implements [`Reflect`] for a type whose [`Primitive`] impl is written by hand.
macro_rules! primitive_reflect {
    ($($ty:ty),*) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Primitive(PrimitiveShape::of::<$ty>())
            }
        }
    )*};
}

primitive_reflect!(
    bool,
    char,
    Decimal,
    BigInt,
    Bytes,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate,
    Duration,
    Uuid
);

impl Primitive for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Bool;

    fn default_value() -> Self {
        false
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(Error::parse("bool", text, "expected true or false"))
        }
    }
}

impl Primitive for char {
    const KIND: PrimitiveKind = PrimitiveKind::Char;

    fn default_value() -> Self {
        '\0'
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        out.push(*self);
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::parse("char", text, "expected a single character")),
        }
    }
}

impl Primitive for Decimal {
    const KIND: PrimitiveKind = PrimitiveKind::Decimal;

    fn default_value() -> Self {
        Decimal::ZERO
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        let _ = write!(out, "{}", self);
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|e| Error::parse("Decimal", text, e))
    }
}

impl Primitive for BigInt {
    const KIND: PrimitiveKind = PrimitiveKind::BigInt;

    fn default_value() -> Self {
        BigInt::default()
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        let _ = write!(out, "{}", self);
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        BigInt::from_str(text).map_err(|e| Error::parse("BigInt", text, e))
    }
}

impl Primitive for Bytes {
    const KIND: PrimitiveKind = PrimitiveKind::Bytes;

    fn default_value() -> Self {
        Bytes::default()
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        STANDARD.encode_string(self.as_slice(), out);
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        STANDARD
            .decode(text)
            .map(Bytes::from)
            .map_err(|e| Error::parse("Bytes", text, e))
    }
}

impl Primitive for Uuid {
    const KIND: PrimitiveKind = PrimitiveKind::Guid;

    fn default_value() -> Self {
        Uuid::nil()
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        let _ = write!(out, "{}", self.simple());
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        Uuid::parse_str(text).map_err(|e| Error::parse("Uuid", text, e))
    }
}

// Dates

const RFC1123: &str = "%a, %d %b %Y %H:%M:%S GMT";
const NAIVE_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const NAIVE_DATE: &str = "%Y-%m-%d";

fn encode_utc(value: &DateTime<Utc>, handling: DateHandling, out: &mut String) {
    match handling {
        DateHandling::Iso8601 => out.push_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        DateHandling::Rfc1123 => {
            let _ = write!(out, "{}", value.format(RFC1123));
        }
        DateHandling::UnixTime => {
            let _ = write!(out, "{}", value.timestamp());
        }
        DateHandling::UnixTimeMs => {
            let _ = write!(out, "{}", value.timestamp_millis());
        }
        DateHandling::DcjsCompatible => {
            let _ = write!(out, "/Date({})/", value.timestamp_millis());
        }
    }
}

/// Parses any of the date encodings; bare integers follow `handling`.
fn decode_utc(text: &str, handling: DateHandling) -> Result<DateTime<Utc>> {
    let invalid = || Error::parse("DateTime", text, "unrecognized date format");
    if let Some(inner) = text
        .strip_prefix("/Date(")
        .and_then(|rest| rest.strip_suffix(")/"))
    {
        // an optional timezone suffix such as `+0100` follows the millis
        let digits_end = inner
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map_or(inner.len(), |(i, _)| i);
        let millis: i64 = inner[..digits_end].parse().map_err(|_| invalid())?;
        return DateTime::from_timestamp_millis(millis).ok_or_else(invalid);
    }
    if let Ok(number) = text.parse::<i64>() {
        let parsed = match handling {
            DateHandling::UnixTime => DateTime::from_timestamp(number, 0),
            _ => DateTime::from_timestamp_millis(number),
        };
        return parsed.ok_or_else(invalid);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, NAIVE_DATE_TIME) {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, NAIVE_DATE) {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(invalid())
}

impl Primitive for DateTime<Utc> {
    const KIND: PrimitiveKind = PrimitiveKind::DateTime;

    fn default_value() -> Self {
        DateTime::<Utc>::default()
    }

    fn encode(&self, options: &Options, out: &mut String) {
        encode_utc(self, options.date_handling, out);
    }

    fn decode(text: &str, options: &Options) -> Result<Self> {
        decode_utc(text, options.date_handling)
    }
}

impl Primitive for NaiveDateTime {
    const KIND: PrimitiveKind = PrimitiveKind::DateTime;

    fn default_value() -> Self {
        NaiveDateTime::default()
    }

    fn encode(&self, options: &Options, out: &mut String) {
        match options.date_handling {
            DateHandling::Iso8601 => {
                let _ = write!(out, "{}", self.format(NAIVE_DATE_TIME));
            }
            handling => encode_utc(&self.and_utc(), handling, out),
        }
    }

    fn decode(text: &str, options: &Options) -> Result<Self> {
        match NaiveDateTime::parse_from_str(text, NAIVE_DATE_TIME) {
            Ok(naive) => Ok(naive),
            Err(_) => decode_utc(text, options.date_handling).map(|dt| dt.naive_utc()),
        }
    }
}

impl Primitive for NaiveDate {
    const KIND: PrimitiveKind = PrimitiveKind::Date;

    fn default_value() -> Self {
        NaiveDate::default()
    }

    fn encode(&self, _options: &Options, out: &mut String) {
        let _ = write!(out, "{}", self.format(NAIVE_DATE));
    }

    fn decode(text: &str, options: &Options) -> Result<Self> {
        match NaiveDate::parse_from_str(text, NAIVE_DATE) {
            Ok(date) => Ok(date),
            Err(_) => decode_utc(text, options.date_handling).map(|dt| dt.date_naive()),
        }
    }
}

// Time spans

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Splits a duration into sign, whole seconds and sub-second nanos.
fn split_duration(value: &Duration) -> (bool, i64, i64) {
    let negative = *value < Duration::zero();
    let magnitude = if negative { -*value } else { *value };
    let secs = magnitude.num_seconds();
    let nanos = (magnitude - Duration::seconds(secs))
        .num_nanoseconds()
        .unwrap_or(0);
    (negative, secs, nanos)
}

fn push_fraction(out: &mut String, nanos: i64) {
    if nanos > 0 {
        let digits = format!("{:09}", nanos);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
}

fn encode_duration(value: &Duration, handling: TimeSpanHandling, out: &mut String) {
    let (negative, secs, nanos) = split_duration(value);
    let (days, hours, minutes, seconds) = (
        secs / 86_400,
        (secs / 3_600) % 24,
        (secs / 60) % 60,
        secs % 60,
    );
    if negative {
        out.push('-');
    }
    match handling {
        TimeSpanHandling::Iso8601Duration => {
            out.push('P');
            if days > 0 {
                let _ = write!(out, "{}D", days);
            }
            if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
                out.push('T');
                if hours > 0 {
                    let _ = write!(out, "{}H", hours);
                }
                if minutes > 0 {
                    let _ = write!(out, "{}M", minutes);
                }
                if seconds > 0 || nanos > 0 || (hours == 0 && minutes == 0) {
                    let _ = write!(out, "{}", seconds);
                    push_fraction(out, nanos);
                    out.push('S');
                }
            }
        }
        TimeSpanHandling::Standard => {
            if days > 0 {
                let _ = write!(out, "{}.", days);
            }
            let _ = write!(out, "{:02}:{:02}:{:02}", hours, minutes, seconds);
            push_fraction(out, nanos);
        }
    }
}

/// Parses `12` or `4.5` into whole units and nanos of the unit's fraction.
fn parse_decimal_seconds(text: &str) -> Option<(i64, i64)> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    if fraction.is_empty() {
        return Some((whole, 0));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut padded: String = fraction.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    Some((whole, padded.parse().ok()?))
}

fn parse_iso_duration(body: &str) -> Option<(i64, i64)> {
    let mut secs: i64 = 0;
    let mut nanos: i64 = 0;
    let mut in_time = false;
    let mut number = String::new();
    for ch in body.chars() {
        match ch {
            'T' => in_time = true,
            '0'..='9' | '.' | ',' => number.push(if ch == ',' { '.' } else { ch }),
            unit => {
                let (whole, fraction) = parse_decimal_seconds(&number)?;
                number.clear();
                let scale: i64 = match (in_time, unit) {
                    (false, 'Y') => 365 * 86_400,
                    (false, 'M') => 30 * 86_400,
                    (false, 'W') => 7 * 86_400,
                    (false, 'D') => 86_400,
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return None,
                };
                secs = secs.checked_add(whole.checked_mul(scale)?)?;
                let scaled = i128::from(fraction) * i128::from(scale);
                secs = secs.checked_add(i64::try_from(scaled / i128::from(NANOS_PER_SEC)).ok()?)?;
                nanos += i64::try_from(scaled % i128::from(NANOS_PER_SEC)).ok()?;
            }
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some((secs + nanos / NANOS_PER_SEC, nanos % NANOS_PER_SEC))
}

fn parse_standard_duration(body: &str) -> Option<(i64, i64)> {
    let (head, rest) = body.split_once(':')?;
    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (days.parse::<i64>().ok()?, hours.parse::<i64>().ok()?),
        None => (0, head.parse::<i64>().ok()?),
    };
    let (minutes, seconds) = rest.split_once(':').unwrap_or((rest, "0"));
    let minutes: i64 = minutes.parse().ok()?;
    let (seconds, nanos) = parse_decimal_seconds(seconds)?;
    let secs = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some((secs, nanos))
}

fn decode_duration(text: &str) -> Result<Duration> {
    let invalid = || Error::parse("Duration", text, "unrecognized time span format");
    let (negative, body) = match text.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, text),
    };
    let (secs, nanos) = match body.strip_prefix('P') {
        Some(iso) => parse_iso_duration(iso),
        None => parse_standard_duration(body),
    }
    .ok_or_else(invalid)?;
    let magnitude = Duration::try_seconds(secs).ok_or_else(invalid)? + Duration::nanoseconds(nanos);
    Ok(if negative { -magnitude } else { magnitude })
}

impl Primitive for Duration {
    const KIND: PrimitiveKind = PrimitiveKind::TimeSpan;

    fn default_value() -> Self {
        Duration::zero()
    }

    fn encode(&self, options: &Options, out: &mut String) {
        encode_duration(self, options.time_span_handling, out);
    }

    fn decode(text: &str, _options: &Options) -> Result<Self> {
        decode_duration(text)
    }
}

// Strings

/// Appends `s` as a quoted JSON string.
pub(crate) fn write_json_string(out: &mut String, s: &str, escape_unicode: bool) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if escape_unicode && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Decodes a quoted JSON string token; a missing closing quote is tolerated.
pub(crate) fn parse_json_string(token: &str) -> Result<String> {
    let body = token.strip_prefix('"').unwrap_or(token);
    let body = match body.strip_suffix('"') {
        Some(inner) if !inner.ends_with('\\') || inner.ends_with("\\\\") => inner,
        _ => body,
    };
    let invalid = |msg: &str| Error::parse("String", token, msg);
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let high = read_hex4(&mut chars).ok_or_else(|| invalid("invalid \\u escape"))?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_hex4(&mut chars),
                        _ => None,
                    }
                    .ok_or_else(|| invalid("unpaired surrogate"))?;
                    0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
                } else {
                    high
                };
                out.push(char::from_u32(code).ok_or_else(|| invalid("invalid code point"))?);
            }
            _ => return Err(invalid("invalid escape sequence")),
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}

/// Whether `s` must be quoted in JSV.
fn jsv_needs_quotes(s: &str, in_map_key: bool) -> bool {
    s.is_empty()
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || s.contains(['"', ',', '{', '}', '[', ']', '\r', '\n'])
        || (in_map_key && s.contains(':'))
}

/// Appends `s` in JSV form: raw, or quoted with `"` doubled.
pub(crate) fn write_jsv_string(out: &mut String, s: &str, in_map_key: bool) {
    if !jsv_needs_quotes(s, in_map_key) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for ch in s.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Decodes a JSV string token; unquoted tokens are returned as-is.
pub(crate) fn parse_jsv_string(token: &str) -> Cow<'_, str> {
    let Some(body) = token.strip_prefix('"') else {
        return Cow::Borrowed(token);
    };
    let body = body.strip_suffix('"').unwrap_or(body);
    if body.contains('"') {
        Cow::Owned(body.replace("\"\"", "\""))
    } else {
        Cow::Borrowed(body)
    }
}
