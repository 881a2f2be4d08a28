//! Type descriptions consumed by the strategy resolver.
//!
//! The engine never inspects values structurally on its own. Every type that
//! can be written or read implements [`Reflect`], whose [`Reflect::shape`]
//! returns a [`Shape`]: which family the type belongs to, plus the type-erased
//! accessors the resolver needs (iterate a list, build a map, get or set a
//! member, default-construct a composite).
//!
//! Shapes are shallow: a shape names nested types through [`TypeDescriptor`]s
//! and never calls their `shape()`. Self-referential types therefore describe
//! themselves without recursion, and nested strategies are looked up lazily
//! through the cache at write/read time.
//!
//! ## Describing a composite
//!
//! ```rust
//! use jsv_text::{jsv, Reflect, Shape};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl Reflect for Point {
//!     fn shape() -> Shape {
//!         Shape::composite::<Point>()
//!             .member("X", |p: &Point| &p.x, |p: &mut Point, v| p.x = v)
//!             .member("Y", |p: &Point| &p.y, |p: &mut Point, v| p.y = v)
//!             .build()
//!     }
//! }
//!
//! let text = jsv::to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, "{X:1,Y:2}");
//! assert_eq!(jsv::from_str::<Point>(&text).unwrap(), Point { x: 1, y: 2 });
//! ```

use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Object-safe accessors every [`Reflect`] type gets for free.
///
/// Implemented by a blanket impl; call these on `&dyn Reflect` (or on a
/// trait object whose trait extends [`Reflect`]) to reach the concrete value.
pub trait AsReflect {
    fn as_reflect(&self) -> &dyn Reflect;
    fn as_any(&self) -> &dyn Any;
    /// Descriptor of the concrete runtime type.
    fn descriptor(&self) -> TypeDescriptor;
}

impl<T: Reflect> AsReflect for T {
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }
}

/// A type the engine can write and read.
pub trait Reflect: AsReflect + Any + Send + Sync {
    /// Describes the type's serialization shape.
    fn shape() -> Shape
    where
        Self: Sized;

    /// The name carried by the discriminator for this type.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// The primary interface this value is known by, used as its
    /// discriminator when `prefer_interfaces` is enabled.
    fn interface_name(&self) -> Option<&'static str> {
        None
    }
}

/// Opaque identity of a [`Reflect`] type, usable as a cache key.
///
/// Equality and hashing consider the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl TypeDescriptor {
    /// Returns the descriptor of `T`.
    #[must_use]
    pub fn of<T: Reflect>() -> Self {
        TypeDescriptor {
            id: TypeId::of::<T>(),
            name: T::type_name(),
            shape: T::shape,
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths removed, including inside generic arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::TypeDescriptor;
    ///
    /// let d = TypeDescriptor::of::<Vec<Option<String>>>();
    /// assert_eq!(d.short_name(), "Vec<Option<String>>");
    /// ```
    #[must_use]
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Builds the shape of the described type.
    #[must_use]
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Type-erased owned value produced by a read.
pub type AnyBox = Box<dyn Any>;

pub(crate) type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Reflect> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&mut dyn Any, AnyBox) -> Result<()> + Send + Sync>;
pub(crate) type Predicate = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;
pub(crate) type Upcast = Arc<dyn Fn(AnyBox) -> Result<AnyBox> + Send + Sync>;

fn getter<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Reflect> + Send + Sync + 'static,
{
    f
}

/// Moves a concrete `T` out of an erased box.
pub(crate) fn unbox<T: Reflect>(value: AnyBox) -> Result<T> {
    value
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| Error::type_mismatch(T::type_name(), "a value of another type"))
}

pub(crate) fn construct_default<T: Default + 'static>() -> AnyBox {
    Box::new(T::default())
}

/// The family a type belongs to, with the accessors its strategy needs.
#[derive(Clone)]
pub enum Shape {
    /// Scalar with a fixed textual encoding.
    Primitive(PrimitiveShape),
    /// `String`.
    Str,
    Enum(EnumShape),
    /// Fixed-length array; reading requires the exact length.
    Array(SeqShape),
    /// Generic collection: list, set, queue or stack.
    Sequence(SeqShape),
    Dictionary(MapShape),
    KeyValuePair(PairShape),
    Optional(OptionShape),
    /// Transparent owner of one value (`Box<T>`, `Arc<T>`).
    Pointer(PointerShape),
    Composite(CompositeShape),
    /// Trait-object slot resolved through the discriminator.
    Abstract(AbstractShape),
    /// Late-bound [`crate::Value`].
    Dynamic,
    /// Unsupported shape: writes an empty map, reads through the constructor.
    Opaque(OpaqueShape),
}

impl Shape {
    /// Short family label used in logs.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Shape::Primitive(_) => "primitive",
            Shape::Str => "string",
            Shape::Enum(_) => "enum",
            Shape::Array(_) => "array",
            Shape::Sequence(_) => "sequence",
            Shape::Dictionary(_) => "dictionary",
            Shape::KeyValuePair(_) => "key-value pair",
            Shape::Optional(_) => "optional",
            Shape::Pointer(_) => "pointer",
            Shape::Composite(_) => "composite",
            Shape::Abstract(_) => "abstract",
            Shape::Dynamic => "dynamic",
            Shape::Opaque(_) => "opaque",
        }
    }

    /// Whether values of this shape are written as a single scalar token.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Shape::Primitive(_) | Shape::Str | Shape::Enum(_))
    }

    /// Starts describing a composite type constructed through `Default`.
    pub fn composite<T: Reflect + Default>() -> CompositeBuilder<T> {
        CompositeBuilder {
            shape: CompositeShape {
                construct: construct_default::<T>,
                data_contract: false,
                members: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Describes an enumeration.
    pub fn enumeration<T: ReflectEnum>() -> Shape {
        Shape::Enum(EnumShape {
            variants: T::VARIANTS.iter().map(|(n, v)| (*n, v.to_i64())).collect(),
            flags: T::FLAGS,
            to_int: enum_to_int::<T>,
            from_int: enum_from_int::<T>,
        })
    }

    /// Describes a type with no readable structure; reads yield `T::default()`.
    pub fn opaque<T: Reflect + Default>() -> Shape {
        Shape::Opaque(OpaqueShape {
            construct: Some(construct_default::<T>),
        })
    }
}

/// Encoding family of a primitive scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Int,
    UInt,
    Float,
    Decimal,
    BigInt,
    Char,
    Bytes,
    DateTime,
    Date,
    TimeSpan,
    Guid,
}

impl PrimitiveKind {
    /// Whether the JSON encoding is a bare literal (number or bool).
    #[must_use]
    pub const fn is_bare_in_json(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::Int
                | PrimitiveKind::UInt
                | PrimitiveKind::Float
                | PrimitiveKind::Decimal
                | PrimitiveKind::BigInt
        )
    }
}

/// Accessors for a primitive scalar; built by [`crate::codec::Primitive`].
#[derive(Clone)]
pub struct PrimitiveShape {
    pub kind: PrimitiveKind,
    pub(crate) write: fn(&dyn Any, &mut crate::ser::Writer<'_>) -> Result<()>,
    pub(crate) read: fn(&str, &crate::de::Reader<'_>) -> Result<AnyBox>,
    pub(crate) is_default: fn(&dyn Any) -> bool,
}

/// A fieldless enumeration, or a flags newtype when `FLAGS` is set.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{jsv, Reflect, ReflectEnum, Shape};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Color { Red, Green }
///
/// impl ReflectEnum for Color {
///     const VARIANTS: &'static [(&'static str, Self)] = &[("Red", Color::Red), ("Green", Color::Green)];
///     fn to_i64(self) -> i64 { self as i64 }
/// }
///
/// impl Reflect for Color {
///     fn shape() -> Shape { Shape::enumeration::<Color>() }
/// }
///
/// assert_eq!(jsv::to_string(&Color::Green).unwrap(), "Green");
/// assert_eq!(jsv::from_str::<Color>("1").unwrap(), Color::Green);
/// ```
pub trait ReflectEnum: Reflect + Sized + Copy + PartialEq {
    const VARIANTS: &'static [(&'static str, Self)];
    /// Flags enums are always written as integers.
    const FLAGS: bool = false;

    fn to_i64(self) -> i64;

    fn from_i64(value: i64) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, v)| v.to_i64() == value)
            .map(|(_, v)| *v)
    }
}

fn enum_to_int<T: ReflectEnum>(value: &dyn Any) -> Option<i64> {
    value.downcast_ref::<T>().map(|v| v.to_i64())
}

fn enum_from_int<T: ReflectEnum>(value: i64) -> Option<AnyBox> {
    T::from_i64(value).map(|v| Box::new(v) as AnyBox)
}

#[derive(Clone)]
pub struct EnumShape {
    pub variants: Vec<(&'static str, i64)>,
    pub flags: bool,
    pub(crate) to_int: fn(&dyn Any) -> Option<i64>,
    pub(crate) from_int: fn(i64) -> Option<AnyBox>,
}

/// Kind of a generic collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqKind {
    Array,
    List,
    Set,
    /// Items are visited and rebuilt in FIFO order.
    Queue,
    /// Items are visited top first and pushed back in reverse.
    Stack,
}

#[derive(Clone)]
pub struct SeqShape {
    pub kind: SeqKind,
    pub element: TypeDescriptor,
    pub(crate) items: for<'a> fn(&'a dyn Any) -> Vec<&'a dyn Reflect>,
    pub(crate) build: fn(Vec<AnyBox>) -> Result<AnyBox>,
}

#[derive(Clone)]
pub struct MapShape {
    pub key: TypeDescriptor,
    pub value: TypeDescriptor,
    pub(crate) entries: for<'a> fn(&'a dyn Any) -> Vec<(&'a dyn Reflect, &'a dyn Reflect)>,
    pub(crate) build: fn(Vec<(AnyBox, AnyBox)>) -> Result<AnyBox>,
}

#[derive(Clone)]
pub struct PairShape {
    pub key: TypeDescriptor,
    pub value: TypeDescriptor,
    pub(crate) parts: for<'a> fn(&'a dyn Any) -> Option<(&'a dyn Reflect, &'a dyn Reflect)>,
    pub(crate) build: fn(AnyBox, AnyBox) -> Result<AnyBox>,
}

#[derive(Clone)]
pub struct OptionShape {
    pub inner: TypeDescriptor,
    pub(crate) get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>,
    pub(crate) some: fn(AnyBox) -> Result<AnyBox>,
    pub(crate) none: fn() -> AnyBox,
}

#[derive(Clone)]
pub struct PointerShape {
    pub inner: TypeDescriptor,
    pub(crate) get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>,
    pub(crate) wrap: fn(AnyBox) -> Result<AnyBox>,
}

#[derive(Clone)]
pub struct OpaqueShape {
    pub(crate) construct: Option<fn() -> AnyBox>,
}

/// A trait-object slot and the concrete types a discriminator may name.
#[derive(Clone)]
pub struct AbstractShape {
    pub(crate) concrete: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>,
    pub(crate) implementors: Vec<Implementor>,
}

#[derive(Clone)]
pub struct Implementor {
    pub descriptor: TypeDescriptor,
    pub(crate) upcast: Upcast,
}

impl AbstractShape {
    /// `concrete` borrows the value held by the slot.
    pub fn new(concrete: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>) -> Self {
        AbstractShape {
            concrete,
            implementors: Vec::new(),
        }
    }

    /// Registers a concrete type `C` and how to place it into the slot type `S`.
    #[must_use]
    pub fn implementor<C: Reflect, S: 'static>(mut self, upcast: fn(C) -> S) -> Self {
        self.implementors.push(Implementor {
            descriptor: TypeDescriptor::of::<C>(),
            upcast: Arc::new(move |value: AnyBox| {
                let concrete = unbox::<C>(value)?;
                Ok(Box::new(upcast(concrete)) as AnyBox)
            }),
        });
        self
    }

    /// Finds the implementor named by a discriminator.
    ///
    /// Matches the full type name first, then the short name.
    pub(crate) fn find(&self, discriminator: &str) -> Option<&Implementor> {
        self.implementors
            .iter()
            .find(|i| i.descriptor.name() == discriminator)
            .or_else(|| {
                let short = short_type_name(discriminator);
                self.implementors
                    .iter()
                    .find(|i| i.descriptor.short_name() == short)
            })
    }
}

/// Description of a composite (named-member) type.
#[derive(Clone)]
pub struct CompositeShape {
    pub(crate) construct: fn() -> AnyBox,
    pub data_contract: bool,
    pub members: Vec<MemberShape>,
}

/// One member of a composite, as declared.
#[derive(Clone)]
pub struct MemberShape {
    pub name: String,
    pub order: Option<i32>,
    pub data_member: bool,
    pub ignore: bool,
    pub emit_default_value: bool,
    pub descriptor: TypeDescriptor,
    pub(crate) get: Getter,
    pub(crate) set: Option<Setter>,
    pub(crate) should_serialize: Option<Predicate>,
}

/// Per-member declaration attributes.
///
/// # Examples
///
/// ```rust
/// use jsv_text::{MemberAttrs, Reflect, Shape};
///
/// #[derive(Default)]
/// struct Account { id: u64, balance: i64 }
///
/// impl Reflect for Account {
///     fn shape() -> Shape {
///         Shape::composite::<Account>()
///             .data_contract()
///             .member_with("Id", |a: &Account| &a.id, |a: &mut Account, v| a.id = v,
///                 MemberAttrs::new().data_member().order(1))
///             .member_with("Balance", |a: &Account| &a.balance, |a: &mut Account, v| a.balance = v,
///                 MemberAttrs::new().data_member().order(2).emit_default_value(false))
///             .build()
///     }
/// }
/// ```
pub struct MemberAttrs<T> {
    name: Option<String>,
    order: Option<i32>,
    data_member: bool,
    ignore: bool,
    emit_default_value: bool,
    should_serialize: Option<Arc<dyn Fn(&T) -> bool + Send + Sync>>,
}

impl<T> Default for MemberAttrs<T> {
    fn default() -> Self {
        MemberAttrs {
            name: None,
            order: None,
            data_member: false,
            ignore: false,
            emit_default_value: true,
            should_serialize: None,
        }
    }
}

impl<T> MemberAttrs<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the member for inclusion under a data contract.
    #[must_use]
    pub fn data_member(mut self) -> Self {
        self.data_member = true;
        self
    }

    /// Overrides the serialized name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// When `false`, a scalar member equal to its type's default is omitted.
    #[must_use]
    pub fn emit_default_value(mut self, emit: bool) -> Self {
        self.emit_default_value = emit;
        self
    }

    #[must_use]
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Per-instance predicate; the member is skipped when it returns `false`.
    #[must_use]
    pub fn should_serialize(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.should_serialize = Some(Arc::new(predicate));
        self
    }
}

/// Builder returned by [`Shape::composite`].
pub struct CompositeBuilder<T> {
    shape: CompositeShape,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> CompositeBuilder<T> {
    /// Only members marked [`MemberAttrs::data_member`] are serialized.
    #[must_use]
    pub fn data_contract(mut self) -> Self {
        self.shape.data_contract = true;
        self
    }

    /// Adds a readable and writable member.
    #[must_use]
    pub fn member<F, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.member_with(name, get, set, MemberAttrs::new())
    }

    /// Adds a member with declaration attributes.
    #[must_use]
    pub fn member_with<F, G, S>(mut self, name: &str, get: G, set: S, attrs: MemberAttrs<T>) -> Self
    where
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let setter: Setter = Arc::new(move |target: &mut dyn Any, value: AnyBox| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| Error::type_mismatch(T::type_name(), "another composite"))?;
            set(target, unbox::<F>(value)?);
            Ok(())
        });
        self.push::<F, G>(name, get, Some(setter), attrs);
        self
    }

    /// Adds a member that is written but never assigned when reading.
    #[must_use]
    pub fn read_only<F, G>(mut self, name: &str, get: G) -> Self
    where
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
    {
        self.push::<F, G>(name, get, None, MemberAttrs::new());
        self
    }

    /// Flattens the members of a base composite ahead of the members added so far.
    ///
    /// Base members are reached through `base` / `base_mut`, so values set on
    /// the base while reading land in the embedded base value. The base keeps
    /// its own member selection: a data-contract base contributes only its
    /// data members, and every inherited member counts as a data member of
    /// the derived type.
    #[must_use]
    pub fn inherit<B, G, M>(mut self, base: G, base_mut: M) -> Self
    where
        B: Reflect,
        G: Fn(&T) -> &B + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        let Shape::Composite(base_shape) = B::shape() else {
            return self;
        };
        let base_contract = base_shape.data_contract;
        let base = Arc::new(base);
        let base_mut = Arc::new(base_mut);
        let selected = base_shape
            .members
            .into_iter()
            .filter(|member| !base_contract || member.data_member);
        let inherited = selected.map(|member| {
            let MemberShape {
                name,
                order,
                data_member: _,
                ignore,
                emit_default_value,
                descriptor,
                get: inner_get,
                set: inner_set,
                should_serialize: inner_predicate,
            } = member;
            let outer = Arc::clone(&base);
            let get: Getter = Arc::new(getter(move |any: &dyn Any| {
                let owner = any.downcast_ref::<T>()?;
                inner_get(outer(owner).as_any())
            }));
            let set = inner_set.map(|inner_set| {
                let outer = Arc::clone(&base_mut);
                Arc::new(move |any: &mut dyn Any, value: AnyBox| {
                    let owner = any
                        .downcast_mut::<T>()
                        .ok_or_else(|| Error::type_mismatch(T::type_name(), "another composite"))?;
                    inner_set(outer(owner) as &mut dyn Any, value)
                }) as Setter
            });
            let should_serialize = inner_predicate.map(|inner| {
                let outer = Arc::clone(&base);
                Arc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
                    Some(owner) => inner(outer(owner).as_any()),
                    None => true,
                }) as Predicate
            });
            MemberShape {
                name,
                order,
                data_member: true,
                ignore,
                emit_default_value,
                descriptor,
                get,
                set,
                should_serialize,
            }
        });
        let own = std::mem::take(&mut self.shape.members);
        self.shape.members = inherited.chain(own).collect();
        self
    }

    fn push<F, G>(&mut self, name: &str, get: G, set: Option<Setter>, attrs: MemberAttrs<T>)
    where
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
    {
        let get: Getter = Arc::new(getter(move |any: &dyn Any| {
            any.downcast_ref::<T>().map(|owner| get(owner) as &dyn Reflect)
        }));
        let should_serialize = attrs.should_serialize.map(|predicate| {
            Arc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
                Some(owner) => predicate(owner),
                None => true,
            }) as Predicate
        });
        self.shape.members.push(MemberShape {
            name: attrs.name.unwrap_or_else(|| name.to_string()),
            order: attrs.order,
            data_member: attrs.data_member,
            ignore: attrs.ignore,
            emit_default_value: attrs.emit_default_value,
            descriptor: TypeDescriptor::of::<F>(),
            get,
            set,
            should_serialize,
        });
    }

    #[must_use]
    pub fn build(self) -> Shape {
        Shape::Composite(self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Base {
        name: String,
    }

    impl Reflect for Base {
        fn shape() -> Shape {
            Shape::composite::<Base>()
                .member("Name", |b: &Base| &b.name, |b: &mut Base, v| b.name = v)
                .build()
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        level: u8,
    }

    impl Reflect for Derived {
        fn shape() -> Shape {
            Shape::composite::<Derived>()
                .member("Level", |d: &Derived| &d.level, |d: &mut Derived, v| d.level = v)
                .inherit(|d: &Derived| &d.base, |d: &mut Derived| &mut d.base)
                .build()
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::C"), "C");
        assert_eq!(
            short_type_name("std::collections::HashMap<alloc::string::String, i32>"),
            "HashMap<String, i32>"
        );
        assert_eq!(short_type_name("i32"), "i32");
    }

    #[test]
    fn test_descriptor_identity() {
        assert_eq!(TypeDescriptor::of::<Base>(), TypeDescriptor::of::<Base>());
        assert_ne!(TypeDescriptor::of::<Base>(), TypeDescriptor::of::<Derived>());
        assert_eq!(TypeDescriptor::of::<Base>().short_name(), "Base");
    }

    #[test]
    fn test_inherited_members_come_first_and_write_through() {
        let Shape::Composite(shape) = Derived::shape() else {
            panic!("expected composite");
        };
        let names: Vec<_> = shape.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Level"]);

        let mut value = Derived::default();
        let set = shape.members[0].set.clone().unwrap();
        set(&mut value as &mut dyn Any, Box::new("inherited".to_string())).unwrap();
        assert_eq!(value.base.name, "inherited");

        let got = (shape.members[0].get)(&value as &dyn Any).unwrap();
        assert_eq!(got.as_any().downcast_ref::<String>().unwrap(), "inherited");
    }

    #[derive(Default)]
    struct Account {
        id: u32,
        secret: String,
    }

    impl Reflect for Account {
        fn shape() -> Shape {
            Shape::composite::<Account>()
                .member_with(
                    "Id",
                    |a: &Account| &a.id,
                    |a: &mut Account, v| a.id = v,
                    MemberAttrs::new().data_member(),
                )
                .member("Secret", |a: &Account| &a.secret, |a: &mut Account, v| a.secret = v)
                .data_contract()
                .build()
        }
    }

    #[derive(Default)]
    struct Admin {
        account: Account,
        level: u8,
    }

    impl Reflect for Admin {
        fn shape() -> Shape {
            Shape::composite::<Admin>()
                .member("Level", |a: &Admin| &a.level, |a: &mut Admin, v| a.level = v)
                .inherit(|a: &Admin| &a.account, |a: &mut Admin| &mut a.account)
                .build()
        }
    }

    #[derive(Default)]
    struct Audited {
        base: Base,
        stamp: i64,
    }

    impl Reflect for Audited {
        fn shape() -> Shape {
            Shape::composite::<Audited>()
                .member_with(
                    "Stamp",
                    |a: &Audited| &a.stamp,
                    |a: &mut Audited, v| a.stamp = v,
                    MemberAttrs::new().data_member(),
                )
                .inherit(|a: &Audited| &a.base, |a: &mut Audited| &mut a.base)
                .data_contract()
                .build()
        }
    }

    #[test]
    fn test_inherit_keeps_base_member_selection() {
        let Shape::Composite(admin) = Admin::shape() else {
            panic!("expected composite");
        };
        let names: Vec<_> = admin.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Level"]);

        let admin = Admin {
            account: Account {
                id: 4,
                secret: "hunter2".to_string(),
            },
            level: 1,
        };
        assert_eq!(crate::jsv::to_string(&admin).unwrap(), "{Id:4,Level:1}");

        let audited = Audited {
            base: Base {
                name: "x".to_string(),
            },
            stamp: 9,
        };
        assert_eq!(crate::jsv::to_string(&audited).unwrap(), "{Name:x,Stamp:9}");
    }

    #[test]
    fn test_setter_rejects_wrong_type() {
        let Shape::Composite(shape) = Base::shape() else {
            panic!("expected composite");
        };
        let mut value = Base::default();
        let set = shape.members[0].set.clone().unwrap();
        assert!(set(&mut value as &mut dyn Any, Box::new(5i32)).is_err());
    }
}
