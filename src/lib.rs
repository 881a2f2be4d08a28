//! # jsv_text
//!
//! Cached, strategy-driven text serialization for JSON, the compact JSV
//! notation, and CSV.
//!
//! ## How it works
//!
//! Every type that can be written or read implements [`Reflect`], which
//! describes its [`Shape`]: a primitive, a collection, a dictionary, a
//! composite of named members, a trait-object slot, and so on. The first
//! time a type is used, its shape is resolved into a [`Strategy`] (a
//! write function and a read function) and published in the format's
//! [`StrategyCache`]. Later calls, from any thread, reuse it without
//! locking.
//!
//! ## Key Features
//!
//! - **Two notations, one engine**: [`json`] for standard JSON, [`jsv`] for
//!   the compact `{Name:Alice,Tags:[a,b]}` notation, [`csv`] for tables
//! - **Lock-free strategy cache**: copy-on-write snapshots published with
//!   compare-and-swap
//! - **Type discriminators**: values in `Box<dyn Trait>` slots carry a
//!   `__type` key and read back as the right concrete type
//! - **Lenient by default**: empty input reads as the default value;
//!   [`Options::strict`] turns malformed input into [`Error::Syntax`]
//! - **Dynamic values**: [`Value`] reads any input whose shape is unknown
//!
//! ## Quick Start
//!
//! ```rust
//! use jsv_text::{json, jsv, reflect_composite};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! reflect_composite!(User { "Id" => id, "Name" => name, "Active" => active });
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//!
//! assert_eq!(jsv::to_string(&user).unwrap(), "{Id:123,Name:Alice,Active:true}");
//! assert_eq!(
//!     json::to_string(&user).unwrap(),
//!     r#"{"Id":123,"Name":"Alice","Active":true}"#
//! );
//!
//! let back: User = jsv::from_str("{Id:123,Name:Alice,Active:true}").unwrap();
//! assert_eq!(back, user);
//! ```
//!
//! ### Describing Types by Hand
//!
//! [`reflect_composite!`] covers plain structs. The builder behind it adds
//! member attributes, read-only members and inherited base members:
//!
//! ```rust
//! use jsv_text::{json, MemberAttrs, Reflect, Shape};
//!
//! #[derive(Default)]
//! struct Order { id: u64, note: String, discount: i32 }
//!
//! impl Reflect for Order {
//!     fn shape() -> Shape {
//!         Shape::composite::<Order>()
//!             .member("Id", |o: &Order| &o.id, |o: &mut Order, v| o.id = v)
//!             .member_with("Note", |o: &Order| &o.note, |o: &mut Order, v| o.note = v,
//!                 MemberAttrs::new().should_serialize(|o: &Order| !o.note.is_empty()))
//!             .member_with("Discount", |o: &Order| &o.discount, |o: &mut Order, v| o.discount = v,
//!                 MemberAttrs::new().emit_default_value(false))
//!             .build()
//!     }
//! }
//!
//! let order = Order { id: 7, ..Order::default() };
//! assert_eq!(json::to_string(&order).unwrap(), r#"{"Id":7}"#);
//! ```
//!
//! ### Dynamic Values with the value! Macro
//!
//! ```rust
//! use jsv_text::{jsv, value};
//!
//! let data = value!({
//!     "name": "Alice",
//!     "tags": ["rust", "jsv"]
//! });
//! assert_eq!(jsv::to_string(&data).unwrap(), "{name:Alice,tags:[rust,jsv]}");
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - Recursion is bounded by [`Options::max_depth`]

pub mod cache;
pub mod codec;
pub mod collections;
mod composite;
pub mod csv;
pub mod de;
pub mod error;
pub mod format;
mod impls;
pub mod json;
pub mod jsv;
pub mod macros;
pub mod map;
pub mod options;
pub mod reflect;
mod resolve;
pub mod ser;
pub mod value;

pub use cache::{Strategy, StrategyCache};
pub use codec::Primitive;
pub use collections::{Bytes, KeyValuePair, Stack};
pub use de::{Cursor, Reader};
pub use error::{Error, Result};
pub use format::Format;
pub use map::ValueMap;
pub use options::{CsvOptions, DateHandling, Delimiter, NamingPolicy, Options, TimeSpanHandling};
pub use reflect::{
    AbstractShape, AnyBox, AsReflect, MemberAttrs, Reflect, ReflectEnum, Shape, TypeDescriptor,
};
pub use ser::Writer;
pub use value::{Number, Value};
