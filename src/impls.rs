//! [`Reflect`] for standard containers, smart pointers and `Option`.

use crate::reflect::{
    unbox, AnyBox, MapShape, OptionShape, PairShape, PointerShape, Reflect, SeqKind, SeqShape,
    Shape, TypeDescriptor,
};
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

fn items_of<C, T>(any: &dyn Any) -> Vec<&dyn Reflect>
where
    C: 'static,
    T: Reflect,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    match any.downcast_ref::<C>() {
        Some(collection) => collection.into_iter().map(|item| item as &dyn Reflect).collect(),
        None => Vec::new(),
    }
}

fn build_from<C, T>(values: Vec<AnyBox>) -> Result<AnyBox>
where
    C: FromIterator<T> + 'static,
    T: Reflect,
{
    let collection: C = values.into_iter().map(unbox::<T>).collect::<Result<C>>()?;
    Ok(Box::new(collection))
}

fn sequence_shape<C, T>(kind: SeqKind) -> Shape
where
    C: FromIterator<T> + 'static,
    T: Reflect,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    Shape::Sequence(SeqShape {
        kind,
        element: TypeDescriptor::of::<T>(),
        items: items_of::<C, T>,
        build: build_from::<C, T>,
    })
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        sequence_shape::<Vec<T>, T>(SeqKind::List)
    }
}

impl<T: Reflect> Reflect for LinkedList<T> {
    fn shape() -> Shape {
        sequence_shape::<LinkedList<T>, T>(SeqKind::List)
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn shape() -> Shape {
        sequence_shape::<VecDeque<T>, T>(SeqKind::Queue)
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn shape() -> Shape {
        sequence_shape::<HashSet<T>, T>(SeqKind::Set)
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn shape() -> Shape {
        sequence_shape::<BTreeSet<T>, T>(SeqKind::Set)
    }
}

impl<T: Reflect + Eq + Hash> Reflect for IndexSet<T> {
    fn shape() -> Shape {
        sequence_shape::<IndexSet<T>, T>(SeqKind::Set)
    }
}

fn array_items<T: Reflect, const N: usize>(any: &dyn Any) -> Vec<&dyn Reflect> {
    items_of::<[T; N], T>(any)
}

/// Missing trailing elements are filled with defaults; extra elements are an error.
fn build_array<T: Reflect + Default, const N: usize>(values: Vec<AnyBox>) -> Result<AnyBox> {
    if values.len() > N {
        return Err(Error::parse(
            std::any::type_name::<[T; N]>(),
            &format!("{} elements", values.len()),
            format!("expected at most {} elements", N),
        ));
    }
    let mut items = values.into_iter();
    let mut array: [T; N] = std::array::from_fn(|_| T::default());
    for slot in array.iter_mut() {
        match items.next() {
            Some(value) => *slot = unbox::<T>(value)?,
            None => break,
        }
    }
    Ok(Box::new(array))
}

impl<T: Reflect + Default, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::Array(SeqShape {
            kind: SeqKind::Array,
            element: TypeDescriptor::of::<T>(),
            items: array_items::<T, N>,
            build: build_array::<T, N>,
        })
    }
}

fn entries_of<C, K, V>(any: &dyn Any) -> Vec<(&dyn Reflect, &dyn Reflect)>
where
    C: 'static,
    K: Reflect,
    V: Reflect,
    for<'a> &'a C: IntoIterator<Item = (&'a K, &'a V)>,
{
    match any.downcast_ref::<C>() {
        Some(map) => map
            .into_iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect(),
        None => Vec::new(),
    }
}

fn build_map<C, K, V>(pairs: Vec<(AnyBox, AnyBox)>) -> Result<AnyBox>
where
    C: FromIterator<(K, V)> + 'static,
    K: Reflect,
    V: Reflect,
{
    let map: C = pairs
        .into_iter()
        .map(|(k, v)| Ok((unbox::<K>(k)?, unbox::<V>(v)?)))
        .collect::<Result<C>>()?;
    Ok(Box::new(map))
}

fn dictionary_shape<C, K, V>() -> Shape
where
    C: FromIterator<(K, V)> + 'static,
    K: Reflect,
    V: Reflect,
    for<'a> &'a C: IntoIterator<Item = (&'a K, &'a V)>,
{
    Shape::Dictionary(MapShape {
        key: TypeDescriptor::of::<K>(),
        value: TypeDescriptor::of::<V>(),
        entries: entries_of::<C, K, V>,
        build: build_map::<C, K, V>,
    })
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn shape() -> Shape {
        dictionary_shape::<HashMap<K, V>, K, V>()
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        dictionary_shape::<BTreeMap<K, V>, K, V>()
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for IndexMap<K, V> {
    fn shape() -> Shape {
        dictionary_shape::<IndexMap<K, V>, K, V>()
    }
}

fn tuple_parts<K: Reflect, V: Reflect>(any: &dyn Any) -> Option<(&dyn Reflect, &dyn Reflect)> {
    any.downcast_ref::<(K, V)>()
        .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
}

fn build_tuple<K: Reflect, V: Reflect>(key: AnyBox, value: AnyBox) -> Result<AnyBox> {
    Ok(Box::new((unbox::<K>(key)?, unbox::<V>(value)?)))
}

/// A 2-tuple is written as a key-value pair.
impl<K: Reflect, V: Reflect> Reflect for (K, V) {
    fn shape() -> Shape {
        Shape::KeyValuePair(PairShape {
            key: TypeDescriptor::of::<K>(),
            value: TypeDescriptor::of::<V>(),
            parts: tuple_parts::<K, V>,
            build: build_tuple::<K, V>,
        })
    }
}

fn option_get<T: Reflect>(any: &dyn Any) -> Option<&dyn Reflect> {
    any.downcast_ref::<Option<T>>()
        .and_then(Option::as_ref)
        .map(|v| v as &dyn Reflect)
}

fn option_some<T: Reflect>(value: AnyBox) -> Result<AnyBox> {
    Ok(Box::new(Some(unbox::<T>(value)?)))
}

fn option_none<T: Reflect>() -> AnyBox {
    Box::new(None::<T>)
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(OptionShape {
            inner: TypeDescriptor::of::<T>(),
            get: option_get::<T>,
            some: option_some::<T>,
            none: option_none::<T>,
        })
    }
}

fn box_get<T: Reflect>(any: &dyn Any) -> Option<&dyn Reflect> {
    any.downcast_ref::<Box<T>>().map(|b| &**b as &dyn Reflect)
}

fn box_wrap<T: Reflect>(value: AnyBox) -> Result<AnyBox> {
    Ok(Box::new(Box::new(unbox::<T>(value)?)))
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        Shape::Pointer(PointerShape {
            inner: TypeDescriptor::of::<T>(),
            get: box_get::<T>,
            wrap: box_wrap::<T>,
        })
    }
}

fn arc_get<T: Reflect>(any: &dyn Any) -> Option<&dyn Reflect> {
    any.downcast_ref::<Arc<T>>().map(|a| &**a as &dyn Reflect)
}

fn arc_wrap<T: Reflect>(value: AnyBox) -> Result<AnyBox> {
    Ok(Box::new(Arc::new(unbox::<T>(value)?)))
}

impl<T: Reflect> Reflect for Arc<T> {
    fn shape() -> Shape {
        Shape::Pointer(PointerShape {
            inner: TypeDescriptor::of::<T>(),
            get: arc_get::<T>,
            wrap: arc_wrap::<T>,
        })
    }
}

impl Reflect for String {
    fn shape() -> Shape {
        Shape::Str
    }
}
