//! Strategy resolution: from a type's [`Shape`] to its write/read pair.
//!
//! Resolution is shallow. Nested types are named by descriptor and their
//! strategies are fetched from the cache when a value is actually written or
//! read, so resolving a self-referential type terminates.

use crate::cache::{custom_type_mismatch, CustomCodec, ReadFn, Strategy, StrategyCache, WriteFn};
use crate::codec::parse_json_string;
use crate::de::Reader;
use crate::format::Format;
use crate::reflect::{
    AbstractShape, AnyBox, EnumShape, MapShape, OpaqueShape, OptionShape, PairShape, PointerShape,
    PrimitiveShape, Reflect, SeqShape, Shape, TypeDescriptor,
};
use crate::ser::Writer;
use crate::value::{self, Value};
use crate::{Error, Result};
use std::any::TypeId;
use std::borrow::Cow;
use std::sync::Arc;

pub(crate) fn resolve(cache: &StrategyCache, descriptor: TypeDescriptor) -> Strategy {
    let shape = descriptor.shape();
    if let Some(codec) = cache.custom(descriptor.id()) {
        let (write, read) = custom(descriptor, codec);
        return Strategy {
            descriptor,
            shape,
            write,
            read,
            plan: None,
            custom: true,
        };
    }
    let mut plan = None;
    let (write, read) = match shape.clone() {
        Shape::Primitive(p) => primitive(p),
        Shape::Str => string(),
        Shape::Enum(e) => enumeration(descriptor, e),
        Shape::Array(s) | Shape::Sequence(s) => sequence(s),
        Shape::Dictionary(m) => dictionary(m),
        Shape::KeyValuePair(p) => pair(descriptor, p),
        Shape::Optional(o) => optional(o),
        Shape::Pointer(p) => pointer(descriptor, p),
        Shape::Composite(c) => {
            let (write, read, composite) = crate::composite::strategy(descriptor, c);
            plan = Some(composite);
            (write, read)
        }
        Shape::Abstract(a) => abstraction(descriptor, a),
        Shape::Dynamic => dynamic(),
        Shape::Opaque(o) => opaque(descriptor, o),
    };
    Strategy {
        descriptor,
        shape,
        write,
        read,
        plan,
        custom: false,
    }
}

fn mismatch(descriptor: TypeDescriptor) -> Error {
    Error::type_mismatch(descriptor.name(), "a value of another type")
}

fn custom(descriptor: TypeDescriptor, codec: CustomCodec) -> (WriteFn, ReadFn) {
    let CustomCodec { write, parse } = codec;
    (
        Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
            let text = write(v.as_any()).ok_or_else(|| custom_type_mismatch(descriptor))?;
            w.write_string(&text);
            Ok(())
        }),
        Arc::new(move |r: &mut Reader<'_>, text: &str| {
            let text = r.unquote(text)?;
            parse(&*text)
        }),
    )
}

fn primitive(p: PrimitiveShape) -> (WriteFn, ReadFn) {
    let (write, read) = (p.write, p.read);
    (
        Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| write(v.as_any(), w)),
        Arc::new(move |r: &mut Reader<'_>, text: &str| read(text, r)),
    )
}

fn string() -> (WriteFn, ReadFn) {
    (
        Arc::new(|w: &mut Writer<'_>, v: &dyn Reflect| {
            let s = v
                .as_any()
                .downcast_ref::<String>()
                .ok_or_else(|| mismatch(TypeDescriptor::of::<String>()))?;
            w.write_string(s);
            Ok(())
        }),
        Arc::new(|r: &mut Reader<'_>, text: &str| {
            if r.is_null(text) {
                return Ok(Box::new(String::new()) as AnyBox);
            }
            Ok(Box::new(r.unquote(text)?.into_owned()) as AnyBox)
        }),
    )
}

fn enumeration(descriptor: TypeDescriptor, e: EnumShape) -> (WriteFn, ReadFn) {
    let shape = Arc::new(e);
    let read_shape = Arc::clone(&shape);
    let write: WriteFn = Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
        let number = (shape.to_int)(v.as_any()).ok_or_else(|| mismatch(descriptor))?;
        let name = shape
            .variants
            .iter()
            .find(|(_, value)| *value == number)
            .map(|(name, _)| *name);
        match name {
            Some(name) if !shape.flags && !w.options().treat_enum_as_integer => {
                w.write_string(name);
            }
            _ => w.push_str(&number.to_string()),
        }
        Ok(())
    });
    let read: ReadFn = Arc::new(move |r: &mut Reader<'_>, text: &str| {
        let shape = &read_shape;
        let number = if r.is_null(text) {
            shape
                .variants
                .iter()
                .map(|(_, value)| *value)
                .find(|value| *value == 0)
                .or_else(|| shape.variants.first().map(|(_, value)| *value))
                .ok_or_else(|| Error::parse(descriptor.name(), text, "enumeration has no variants"))?
        } else {
            let token = r.unquote(text)?;
            match token.parse::<i64>() {
                Ok(number) => number,
                Err(_) => shape
                    .variants
                    .iter()
                    .find(|(name, _)| *name == token)
                    .or_else(|| {
                        shape
                            .variants
                            .iter()
                            .find(|(name, _)| name.eq_ignore_ascii_case(&token))
                    })
                    .map(|(_, value)| *value)
                    .ok_or_else(|| Error::parse(descriptor.name(), &token, "unknown variant"))?,
            }
        };
        (shape.from_int)(number)
            .ok_or_else(|| Error::parse(descriptor.name(), text, "value has no matching variant"))
    });
    (write, read)
}

fn sequence(s: SeqShape) -> (WriteFn, ReadFn) {
    let (items, build, element) = (s.items, s.build, s.element);
    let write: WriteFn = Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
        w.push('[');
        for (i, item) in items(v.as_any()).into_iter().enumerate() {
            if i > 0 {
                w.push(',');
            }
            w.write_value(element, item)?;
        }
        w.push(']');
        Ok(())
    });
    let read: ReadFn = Arc::new(move |r: &mut Reader<'_>, text: &str| {
        if r.is_null(text) || r.depth_exhausted() {
            return build(Vec::new());
        }
        // JSV accepts a bare comma-separated list, as found in CSV cells
        let text = match (r.format(), text.trim_start().starts_with('[')) {
            (Format::Jsv, false) => Cow::Owned(format!("[{}]", text)),
            _ => Cow::Borrowed(text),
        };
        let tokens = r.cursor(&text).list_items()?;
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            values.push(r.read_value(element, token)?);
        }
        build(values)
    });
    (write, read)
}

/// Writes a dictionary key so that it reads back as a key.
///
/// JSON keys are always strings: a key whose own encoding is not a quoted
/// string is wrapped in one.
fn write_map_key(w: &mut Writer<'_>, descriptor: TypeDescriptor, key: &dyn Reflect) -> Result<()> {
    if let Some(s) = key.as_any().downcast_ref::<String>() {
        w.write_key(s);
        return Ok(());
    }
    let text = w.with_map_key(|w| w.capture(|w| w.write_value(descriptor, key)))?;
    match w.format() {
        Format::Json if !text.starts_with('"') => w.write_string(&text),
        _ => w.push_str(&text),
    }
    Ok(())
}

fn dictionary(m: MapShape) -> (WriteFn, ReadFn) {
    let (entries, build, key, value) = (m.entries, m.build, m.key, m.value);
    let key_is_string = key.id() == TypeId::of::<String>();
    let write: WriteFn = Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
        w.push('{');
        for (i, (k, item)) in entries(v.as_any()).into_iter().enumerate() {
            if i > 0 {
                w.push(',');
            }
            write_map_key(w, key, k)?;
            w.push(':');
            w.write_value(value, item)?;
        }
        w.push('}');
        Ok(())
    });
    let read: ReadFn = Arc::new(move |r: &mut Reader<'_>, text: &str| {
        if r.is_null(text) || r.depth_exhausted() {
            return build(Vec::new());
        }
        let tokens = r.cursor(text).map_entries()?;
        let mut pairs = Vec::with_capacity(tokens.len());
        for (key_token, value_token) in tokens {
            let key_text = match r.format() {
                Format::Json if !key_is_string && key_token.starts_with('"') => {
                    Cow::Owned(parse_json_string(key_token)?)
                }
                _ => Cow::Borrowed(key_token),
            };
            let k = r.read_value(key, &key_text)?;
            let v = r.read_value(value, value_token)?;
            pairs.push((k, v));
        }
        build(pairs)
    });
    (write, read)
}

fn pair(descriptor: TypeDescriptor, p: PairShape) -> (WriteFn, ReadFn) {
    let (parts, build, key, value) = (p.parts, p.build, p.key, p.value);
    let write: WriteFn = Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
        let (k, item) = parts(v.as_any()).ok_or_else(|| mismatch(descriptor))?;
        let naming = w.options().naming;
        w.push('{');
        w.write_key(&naming.apply("Key"));
        w.push(':');
        w.write_value(key, k)?;
        w.push(',');
        w.write_key(&naming.apply("Value"));
        w.push(':');
        w.write_value(value, item)?;
        w.push('}');
        Ok(())
    });
    let read: ReadFn = Arc::new(move |r: &mut Reader<'_>, text: &str| {
        let (mut key_token, mut value_token) = ("", "");
        if !r.is_null(text) {
            for (field, token) in r.cursor(text).map_entries()? {
                let field = r.unquote(field)?;
                if field.eq_ignore_ascii_case("key") {
                    key_token = token;
                } else if field.eq_ignore_ascii_case("value") {
                    value_token = token;
                } else {
                    return Err(Error::invalid_pair_field(&descriptor.short_name(), &field));
                }
            }
        }
        let k = r.read_value(key, key_token)?;
        let v = r.read_value(value, value_token)?;
        build(k, v)
    });
    (write, read)
}

fn optional(o: OptionShape) -> (WriteFn, ReadFn) {
    let OptionShape {
        inner,
        get,
        some,
        none,
    } = o;
    (
        Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| match get(v.as_any()) {
            Some(value) => w.write_value(inner, value),
            None => {
                w.write_null();
                Ok(())
            }
        }),
        Arc::new(move |r: &mut Reader<'_>, text: &str| {
            if r.is_null(text) || r.depth_exhausted() {
                return Ok(none());
            }
            some(r.read_value(inner, text)?)
        }),
    )
}

fn pointer(descriptor: TypeDescriptor, p: PointerShape) -> (WriteFn, ReadFn) {
    let PointerShape { inner, get, wrap } = p;
    (
        Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
            let value = get(v.as_any()).ok_or_else(|| mismatch(descriptor))?;
            w.write_value(inner, value)
        }),
        Arc::new(move |r: &mut Reader<'_>, text: &str| wrap(r.read_value(inner, text)?)),
    )
}

fn abstraction(descriptor: TypeDescriptor, a: AbstractShape) -> (WriteFn, ReadFn) {
    let shape = Arc::new(a);
    let read_shape = Arc::clone(&shape);
    let write: WriteFn = Arc::new(move |w: &mut Writer<'_>, v: &dyn Reflect| {
        let concrete = (shape.concrete)(v.as_any()).ok_or_else(|| mismatch(descriptor))?;
        let concrete_type = concrete.descriptor();
        if !w.options().exclude_type_info && w.cache().get_or_build(concrete_type).is_composite() {
            w.request_type_info();
        }
        w.write_value(concrete_type, concrete)
    });
    let read: ReadFn = Arc::new(move |r: &mut Reader<'_>, text: &str| {
        let type_attr = &r.options().type_attr;
        let short_name = descriptor.short_name();
        if r.is_null(text) {
            return Err(Error::missing_discriminator(&short_name, type_attr));
        }
        let mut discriminator = None;
        for (key, token) in r.cursor(text).map_entries()? {
            if r.unquote(key)? == type_attr.as_str() {
                discriminator = Some(r.unquote(token)?.into_owned());
                break;
            }
        }
        let discriminator =
            discriminator.ok_or_else(|| Error::missing_discriminator(&short_name, type_attr))?;
        let implementor = read_shape
            .find(&discriminator)
            .ok_or_else(|| Error::unknown_type(&short_name, &discriminator))?;
        let concrete = r.read_value(implementor.descriptor, text)?;
        (implementor.upcast)(concrete)
    });
    (write, read)
}

fn dynamic() -> (WriteFn, ReadFn) {
    (
        Arc::new(|w: &mut Writer<'_>, v: &dyn Reflect| {
            let value = v
                .as_any()
                .downcast_ref::<Value>()
                .ok_or_else(|| mismatch(TypeDescriptor::of::<Value>()))?;
            value::write_dynamic(w, value)
        }),
        Arc::new(|r: &mut Reader<'_>, text: &str| {
            value::read_dynamic(r, text).map(|v| Box::new(v) as AnyBox)
        }),
    )
}

fn opaque(descriptor: TypeDescriptor, o: OpaqueShape) -> (WriteFn, ReadFn) {
    tracing::debug!(
        type_name = descriptor.name(),
        "no serializable structure, using the empty-map strategy"
    );
    (
        Arc::new(|w: &mut Writer<'_>, _: &dyn Reflect| {
            w.push_str("{}");
            Ok(())
        }),
        Arc::new(move |_: &mut Reader<'_>, _: &str| match o.construct {
            Some(construct) => Ok(construct()),
            None => Err(Error::unsupported_type(descriptor.name())),
        }),
    )
}
