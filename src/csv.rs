//! CSV facade.
//!
//! A value is written as a header row followed by one record per row. The
//! rows are found as follows:
//!
//! 1. a sequence (or array) value: its items are the rows
//! 2. a composite value: its first sequence member supplies the rows; when it
//!    has none, its first composite member is searched the same way
//! 3. anything else is written as a single row
//!
//! Composite rows take their columns from the member plan. Dictionary and
//! [`Value`] object rows take the union of their keys, in first-seen order.
//! String cells are written raw; other cells carry their JSV text. A cell
//! containing the delimiter, the quote character, CR or LF is quoted, with
//! the quote character doubled inside.
//!
//! ```rust
//! use jsv_text::{csv, reflect_composite, CsvOptions, Options};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Item { id: u32, name: String }
//! reflect_composite!(Item { "Id" => id, "Name" => name });
//!
//! let items = vec![
//!     Item { id: 1, name: "Widget".into() },
//!     Item { id: 2, name: "Gadget, large".into() },
//! ];
//! let options = Options::new().with_csv(CsvOptions { row_separator: "\n".into(), ..CsvOptions::default() });
//! let text = csv::to_string_with_options(&items, &options).unwrap();
//! assert_eq!(text, "Id,Name\n1,Widget\n2,\"Gadget, large\"\n");
//!
//! let back: Vec<Item> = csv::from_str_with_options(&text, &options).unwrap();
//! assert_eq!(back, items);
//! ```

use crate::cache::StrategyCache;
use crate::de::Reader;
use crate::reflect::{unbox, AnyBox, Reflect, Shape, TypeDescriptor};
use crate::ser::Writer;
use crate::{jsv, CsvOptions, Error, Options, Result, Value, ValueMap};
use std::any::TypeId;
use std::io;

/// The records found inside a value.
struct Rows<'v> {
    element: TypeDescriptor,
    items: Vec<&'v dyn Reflect>,
}

/// Finds the sequence that supplies the rows of `value`, if any.
fn locate_rows<'v>(
    cache: &StrategyCache,
    descriptor: TypeDescriptor,
    value: &'v dyn Reflect,
) -> Option<Rows<'v>> {
    let strategy = cache.get_or_build(descriptor);
    let any = value.as_any();
    match &strategy.shape {
        Shape::Sequence(seq) | Shape::Array(seq) => Some(Rows {
            element: seq.element,
            items: (seq.items)(any),
        }),
        Shape::Pointer(pointer) => {
            (pointer.get)(any).and_then(|inner| locate_rows(cache, pointer.inner, inner))
        }
        Shape::Optional(option) => {
            (option.get)(any).and_then(|inner| locate_rows(cache, option.inner, inner))
        }
        Shape::Dynamic => match any.downcast_ref::<Value>()? {
            Value::Array(items) => Some(Rows {
                element: TypeDescriptor::of::<Value>(),
                items: items.iter().map(|item| item as &dyn Reflect).collect(),
            }),
            _ => None,
        },
        _ => {
            let plan = strategy.plan.as_ref()?;
            let is_sequence = |descriptor: TypeDescriptor| {
                matches!(
                    cache.get_or_build(descriptor).shape,
                    Shape::Sequence(_) | Shape::Array(_)
                )
            };
            if let Some(member) = plan.members.iter().find(|m| is_sequence(m.descriptor)) {
                return (member.get)(any).and_then(|v| locate_rows(cache, member.descriptor, v));
            }
            let member = plan
                .members
                .iter()
                .find(|m| cache.get_or_build(m.descriptor).is_composite())?;
            (member.get)(any).and_then(|v| locate_rows(cache, member.descriptor, v))
        }
    }
}

struct Table {
    headers: Option<Vec<String>>,
    records: Vec<Vec<String>>,
}

fn cell(writer: &mut Writer<'_>, descriptor: TypeDescriptor, value: &dyn Reflect) -> Result<String> {
    let any = value.as_any();
    if let Some(s) = any.downcast_ref::<String>() {
        return Ok(s.clone());
    }
    if let Some(Value::String(s)) = any.downcast_ref::<Value>() {
        return Ok(s.clone());
    }
    writer.capture(|w| w.write_value(descriptor, value))
}

/// Lines up keyed records under the union of their keys.
fn keyed_table(keyed: Vec<Vec<(String, String)>>) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for (key, _) in keyed.iter().flatten() {
        if !headers.contains(key) {
            headers.push(key.clone());
        }
    }
    let records = keyed
        .into_iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| {
                    record
                        .iter()
                        .find(|(key, _)| key == header)
                        .map(|(_, value)| value.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Table {
        headers: Some(headers),
        records,
    }
}

fn tabulate(writer: &mut Writer<'_>, rows: &Rows<'_>) -> Result<Table> {
    let options = writer.options();
    let strategy = writer.cache().get_or_build(rows.element);
    if let Some(plan) = &strategy.plan {
        let columns = plan.columns(options);
        let headers = columns
            .iter()
            .map(|m| options.naming.apply(&m.name).into_owned())
            .collect();
        let mut records = Vec::with_capacity(rows.items.len());
        for item in &rows.items {
            let any = item.as_any();
            let mut record = Vec::with_capacity(columns.len());
            for member in &columns {
                record.push(match (member.get)(any) {
                    Some(value) => cell(writer, member.descriptor, value)?,
                    None => String::new(),
                });
            }
            records.push(record);
        }
        return Ok(Table {
            headers: Some(headers),
            records,
        });
    }
    match &strategy.shape {
        Shape::Dictionary(map) => {
            let mut keyed = Vec::with_capacity(rows.items.len());
            for item in &rows.items {
                let mut record = Vec::new();
                for (key, value) in (map.entries)(item.as_any()) {
                    record.push((cell(writer, map.key, key)?, cell(writer, map.value, value)?));
                }
                keyed.push(record);
            }
            Ok(keyed_table(keyed))
        }
        Shape::Dynamic => {
            let element = TypeDescriptor::of::<Value>();
            let mut keyed = Vec::with_capacity(rows.items.len());
            for item in &rows.items {
                let mut record = Vec::new();
                if let Some(Value::Object(map)) = item.as_any().downcast_ref::<Value>() {
                    for (key, value) in map {
                        record.push((key.clone(), cell(writer, element, value)?));
                    }
                }
                keyed.push(record);
            }
            Ok(keyed_table(keyed))
        }
        _ => {
            let mut records = Vec::with_capacity(rows.items.len());
            for item in &rows.items {
                records.push(vec![cell(writer, rows.element, *item)?]);
            }
            Ok(Table {
                headers: None,
                records,
            })
        }
    }
}

fn write_record(out: &mut String, cells: &[String], csv: &CsvOptions) {
    let delimiter = csv.delimiter.as_char();
    // a lone empty cell would otherwise be a blank line
    if let [only] = cells {
        if only.is_empty() {
            out.push(csv.quote);
            out.push(csv.quote);
            out.push_str(&csv.row_separator);
            return;
        }
    }
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        if cell.contains([delimiter, csv.quote, '\r', '\n']) {
            out.push(csv.quote);
            for ch in cell.chars() {
                if ch == csv.quote {
                    out.push(ch);
                }
                out.push(ch);
            }
            out.push(csv.quote);
        } else {
            out.push_str(cell);
        }
    }
    out.push_str(&csv.row_separator);
}

/// Writes `value` as CSV using the options current on this thread.
///
/// # Errors
///
/// Returns an error if a cell value fails to write.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: Reflect>(value: &T) -> Result<String> {
    to_string_with_options(value, &Options::current())
}

/// Writes `value` as CSV with explicit options.
///
/// # Errors
///
/// Returns an error if a cell value fails to write.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T: Reflect>(value: &T, options: &Options) -> Result<String> {
    let cache = jsv::cache();
    let descriptor = TypeDescriptor::of::<T>();
    let rows = locate_rows(cache, descriptor, value).unwrap_or_else(|| {
        tracing::debug!(
            type_name = descriptor.name(),
            "no sequence found, writing a single row"
        );
        Rows {
            element: descriptor,
            items: vec![value as &dyn Reflect],
        }
    });
    let mut writer = Writer::new(options, cache);
    let table = tabulate(&mut writer, &rows)?;
    let mut out = String::new();
    if options.csv.include_headers {
        if let Some(headers) = &table.headers {
            write_record(&mut out, headers, &options.csv);
        }
    }
    for record in &table.records {
        write_record(&mut out, record, &options.csv);
    }
    Ok(out)
}

/// Writes `value` as CSV into `writer`.
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

/// Writes `value` as CSV into `writer` with explicit options.
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

/// Splits CSV text into records of unescaped cells.
///
/// Both `\n` and `\r\n` end a record; blank lines are skipped, a line
/// holding only an empty quoted cell is not.
fn parse_records(text: &str, csv: &CsvOptions) -> Vec<Vec<String>> {
    let delimiter = csv.delimiter.as_char();
    let quote = csv.quote;
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch != quote {
                cell.push(ch);
            } else if chars.peek() == Some(&quote) {
                cell.push(quote);
                chars.next();
            } else {
                in_quotes = false;
            }
        } else if ch == quote && cell.is_empty() {
            in_quotes = true;
            quoted = true;
        } else if ch == delimiter {
            record.push(std::mem::take(&mut cell));
        } else if ch == '\r' || ch == '\n' {
            if ch == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            record.push(std::mem::take(&mut cell));
            if record.len() == 1 && record[0].is_empty() && !quoted {
                record.clear();
            } else {
                records.push(std::mem::take(&mut record));
            }
            quoted = false;
        } else {
            cell.push(ch);
        }
    }
    if !cell.is_empty() || !record.is_empty() || quoted {
        record.push(cell);
        records.push(record);
    }
    records
}

fn read_cell(reader: &mut Reader<'_>, descriptor: TypeDescriptor, cell: &str) -> Result<AnyBox> {
    if descriptor.id() == TypeId::of::<String>() {
        return Ok(Box::new(cell.to_string()));
    }
    reader.read_value(descriptor, cell)
}

/// Reads one record as a value of `element`.
fn read_record(
    reader: &mut Reader<'_>,
    element: TypeDescriptor,
    headers: &[String],
    record: &[String],
) -> Result<AnyBox> {
    let strategy = reader.cache().get_or_build(element);
    if let Some(plan) = &strategy.plan {
        let mut target = (plan.construct)();
        for (header, cell) in headers.iter().zip(record) {
            let Some(member) = plan.find(header) else {
                continue;
            };
            let Some(set) = &member.set else {
                continue;
            };
            set(&mut *target, read_cell(reader, member.descriptor, cell)?)?;
        }
        return Ok(target);
    }
    match &strategy.shape {
        Shape::Dictionary(map) => {
            let mut pairs = Vec::with_capacity(record.len());
            for (header, cell) in headers.iter().zip(record) {
                pairs.push((
                    read_cell(reader, map.key, header)?,
                    read_cell(reader, map.value, cell)?,
                ));
            }
            (map.build)(pairs)
        }
        Shape::Dynamic => {
            let mut map = ValueMap::with_capacity(record.len());
            for (header, cell) in headers.iter().zip(record) {
                map.insert(header.clone(), Value::String(cell.clone()));
            }
            Ok(Box::new(Value::Object(map)))
        }
        _ => read_cell(reader, element, record.first().map(String::as_str).unwrap_or("")),
    }
}

/// Whether records of `element` are keyed by a header row.
fn has_columns(cache: &StrategyCache, element: TypeDescriptor) -> bool {
    let strategy = cache.get_or_build(element);
    strategy.plan.is_some() || matches!(strategy.shape, Shape::Dictionary(_) | Shape::Dynamic)
}

/// Column names to use when the text carries no header row.
fn implied_headers(cache: &StrategyCache, element: TypeDescriptor, options: &Options) -> Vec<String> {
    match &cache.get_or_build(element).plan {
        Some(plan) => plan
            .columns(options)
            .iter()
            .map(|m| options.naming.apply(&m.name).into_owned())
            .collect(),
        None => Vec::new(),
    }
}

/// Reads a `T` from CSV text using the options current on this thread.
///
/// # Errors
///
/// Returns an error if a cell cannot be parsed as its member type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: Reflect>(s: &str) -> Result<T> {
    from_str_with_options(s, &Options::current())
}

/// Reads a `T` from CSV text with explicit options.
///
/// A sequence type reads every record; any other type reads the first one.
///
/// # Errors
///
/// Returns an error if a cell cannot be parsed as its member type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T: Reflect>(s: &str, options: &Options) -> Result<T> {
    let cache = jsv::cache();
    let descriptor = TypeDescriptor::of::<T>();
    let strategy = cache.get_or_build(descriptor);
    let (element, many) = match &strategy.shape {
        Shape::Sequence(seq) | Shape::Array(seq) => (seq.element, Some(seq.build)),
        _ => (descriptor, None),
    };
    let mut records = parse_records(s, &options.csv).into_iter();
    let headers = if options.csv.include_headers && has_columns(cache, element) {
        records.next().unwrap_or_default()
    } else {
        implied_headers(cache, element, options)
    };
    let mut reader = Reader::new(options, cache);
    let value = match many {
        Some(build) => {
            let mut values = Vec::new();
            for record in records {
                values.push(read_record(&mut reader, element, &headers, &record)?);
            }
            build(values)?
        }
        None => match records.next() {
            Some(record) => read_record(&mut reader, element, &headers, &record)?,
            None => reader.read_value(element, "")?,
        },
    };
    unbox(value)
}
