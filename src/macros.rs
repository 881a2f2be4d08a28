/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// ```rust
/// use jsv_text::{value, Value};
///
/// let v = value!({ "id": 1, "tags": ["a", "b"], "parent": null });
/// assert_eq!(v.get("id"), Some(&Value::from(1)));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::ValueMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::ValueMap::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($s:expr) => {
        $crate::Value::from($s)
    };
}

/// Implements [`Reflect`](crate::Reflect) for a struct as a composite of
/// the listed fields, in the order given.
///
/// ```rust
/// use jsv_text::{jsv, reflect_composite};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// reflect_composite!(Point { "X" => x, "Y" => y });
///
/// assert_eq!(jsv::to_string(&Point { x: 1, y: 2 }).unwrap(), "{X:1,Y:2}");
/// ```
#[macro_export]
macro_rules! reflect_composite {
    ($ty:ty { $($name:literal => $field:ident),* $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::composite::<$ty>()
                    $(
                        .member(
                            $name,
                            |owner: &$ty| &owner.$field,
                            |owner: &mut $ty, value| owner.$field = value,
                        )
                    )*
                    .build()
            }
        }
    };
}

/// Implements [`Reflect`](crate::Reflect) for `Box<dyn Trait>`, listing the
/// concrete types a discriminator may name.
///
/// The trait must have `Reflect` as a supertrait.
///
/// ```rust
/// use jsv_text::{json, reflect_abstract, reflect_composite, AsReflect, Reflect};
///
/// trait Shape2d: Reflect {}
///
/// #[derive(Default)]
/// struct Circle { radius: f64 }
/// reflect_composite!(Circle { "Radius" => radius });
/// impl Shape2d for Circle {}
///
/// reflect_abstract!(Shape2d => Circle);
///
/// let shape: Box<dyn Shape2d> = Box::new(Circle { radius: 1.5 });
/// let text = json::to_string(&shape).unwrap();
/// assert!(text.starts_with(r#"{"__type":""#));
/// let back: Box<dyn Shape2d> = json::from_str(&text).unwrap();
/// assert_eq!(AsReflect::descriptor(&*back).short_name(), "Circle");
/// ```
#[macro_export]
macro_rules! reflect_abstract {
    ($tr:path => $($implementor:ty),+ $(,)?) => {
        impl $crate::Reflect for ::std::boxed::Box<dyn $tr> {
            fn shape() -> $crate::Shape {
                fn concrete(any: &dyn ::std::any::Any) -> ::std::option::Option<&dyn $crate::Reflect> {
                    any.downcast_ref::<::std::boxed::Box<dyn $tr>>()
                        .map(|slot| $crate::AsReflect::as_reflect(&**slot))
                }
                $crate::Shape::Abstract(
                    $crate::AbstractShape::new(concrete)
                        $(
                            .implementor::<$implementor, ::std::boxed::Box<dyn $tr>>(
                                |value: $implementor| -> ::std::boxed::Box<dyn $tr> {
                                    ::std::boxed::Box::new(value)
                                },
                            )
                        )+
                )
            }

            fn type_name() -> &'static str {
                ::std::any::type_name::<dyn $tr>()
            }
        }
    };
}
