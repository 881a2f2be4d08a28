//! Collection types with a dedicated text shape.
//!
//! - [`Bytes`]: a byte buffer written as base64 instead of a number list
//! - [`Stack`]: a LIFO collection written top first
//! - [`KeyValuePair`]: a single `{Key:..,Value:..}` pair

use crate::reflect::{unbox, AnyBox, PairShape, Reflect, SeqKind, SeqShape, Shape, TypeDescriptor};
use crate::Result;
use std::any::Any;
use std::ops::Deref;

/// A byte buffer encoded as base64 text.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{jsv, Bytes};
///
/// let bytes = Bytes::from(b"hello".to_vec());
/// assert_eq!(jsv::to_string(&bytes).unwrap(), "aGVsbG8=");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    #[must_use]
    pub fn new() -> Self {
        Bytes(Vec::new())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Bytes(bytes.to_vec())
    }
}

/// A last-in, first-out collection.
///
/// Written top first, so `[3,2,1]` is the stack that had 1, 2 and 3 pushed
/// in that order; reading pushes the items back in reverse.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{jsv, Stack};
///
/// let mut stack = Stack::new();
/// stack.push(1);
/// stack.push(2);
/// stack.push(3);
/// assert_eq!(jsv::to_string(&stack).unwrap(), "[3,2,1]");
///
/// let mut back: Stack<i32> = jsv::from_str("[3,2,1]").unwrap();
/// assert_eq!(back.pop(), Some(3));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Stack { items: Vec::new() }
    }
}

impl<T> Stack<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates from the top of the stack down.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }
}

/// Builds a stack from items listed top first.
impl<T> FromIterator<T> for Stack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.reverse();
        Stack { items }
    }
}

fn stack_items<T: Reflect>(any: &dyn Any) -> Vec<&dyn Reflect> {
    match any.downcast_ref::<Stack<T>>() {
        Some(stack) => stack.iter().map(|item| item as &dyn Reflect).collect(),
        None => Vec::new(),
    }
}

fn build_stack<T: Reflect>(values: Vec<AnyBox>) -> Result<AnyBox> {
    let stack: Stack<T> = values.into_iter().map(unbox::<T>).collect::<Result<_>>()?;
    Ok(Box::new(stack))
}

impl<T: Reflect> Reflect for Stack<T> {
    fn shape() -> Shape {
        Shape::Sequence(SeqShape {
            kind: SeqKind::Stack,
            element: TypeDescriptor::of::<T>(),
            items: stack_items::<T>,
            build: build_stack::<T>,
        })
    }
}

/// One key and its value, written as `{Key:..,Value:..}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyValuePair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValuePair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        KeyValuePair { key, value }
    }
}

fn pair_parts<K: Reflect, V: Reflect>(any: &dyn Any) -> Option<(&dyn Reflect, &dyn Reflect)> {
    any.downcast_ref::<KeyValuePair<K, V>>()
        .map(|pair| (&pair.key as &dyn Reflect, &pair.value as &dyn Reflect))
}

fn build_pair<K: Reflect, V: Reflect>(key: AnyBox, value: AnyBox) -> Result<AnyBox> {
    Ok(Box::new(KeyValuePair::new(unbox::<K>(key)?, unbox::<V>(value)?)))
}

impl<K: Reflect, V: Reflect> Reflect for KeyValuePair<K, V> {
    fn shape() -> Shape {
        Shape::KeyValuePair(PairShape {
            key: TypeDescriptor::of::<K>(),
            value: TypeDescriptor::of::<V>(),
            parts: pair_parts::<K, V>,
            build: build_pair::<K, V>,
        })
    }
}
