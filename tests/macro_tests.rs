use jsv_text::{json, jsv, reflect_abstract, reflect_composite, value, AsReflect, Number, Value, ValueMap};

#[test]
fn test_value_macro_scalars() {
    assert_eq!(value!(null), Value::Null);
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(-123), Value::Number(Number::Integer(-123)));
    assert_eq!(value!(3.5), Value::Number(Number::Float(3.5)));
    assert_eq!(value!(""), Value::String(String::new()));
}

#[test]
fn test_value_macro_expressions() {
    let name = "Alice".to_string();
    let count = 3u8;
    let v = value!({ "name": (name.clone()), "count": count });
    assert_eq!(v.get("name"), Some(&Value::String(name)));
    assert_eq!(v.get("count"), Some(&Value::from(3)));
}

#[test]
fn test_value_macro_nested_writes_both_notations() {
    let v = value!({
        "users": [
            { "id": 1, "tags": ["a", "b"] },
            { "id": 2, "tags": [] }
        ],
        "empty": {},
        "missing": null
    });

    assert_eq!(
        jsv::to_string(&v).unwrap(),
        "{users:[{id:1,tags:[a,b]},{id:2,tags:[]}],empty:{},missing:}"
    );
    assert_eq!(
        json::to_string(&v).unwrap(),
        r#"{"users":[{"id":1,"tags":["a","b"]},{"id":2,"tags":[]}],"empty":{},"missing":null}"#
    );
}

#[test]
fn test_value_macro_object_matches_map() {
    let mut map = ValueMap::new();
    map.insert("x".to_string(), Value::from(1));
    map.insert("y".to_string(), Value::Array(vec![Value::Bool(false)]));
    assert_eq!(value!({ "x": 1, "y": [false] }), Value::Object(map));
}

mod geometry {
    use jsv_text::{reflect_composite, Reflect};

    pub trait Figure: Reflect {
        fn area(&self) -> f64;
    }

    #[derive(Default, Debug, PartialEq)]
    pub struct Square {
        pub side: f64,
    }

    #[derive(Default, Debug, PartialEq)]
    pub struct Rect {
        pub width: f64,
        pub height: f64,
    }

    reflect_composite!(Square { "Side" => side });
    reflect_composite!(Rect {
        "Width" => width,
        "Height" => height,
    });

    impl Figure for Square {
        fn area(&self) -> f64 {
            self.side * self.side
        }
    }

    impl Figure for Rect {
        fn area(&self) -> f64 {
            self.width * self.height
        }
    }
}

reflect_abstract!(geometry::Figure => geometry::Square, geometry::Rect,);

#[derive(Default)]
struct Drawing {
    title: String,
    figures: Vec<Box<dyn geometry::Figure>>,
}

reflect_composite!(Drawing { "Title" => title, "Figures" => figures });

#[test]
fn test_reflect_composite_with_module_paths() {
    let rect = geometry::Rect {
        width: 2.0,
        height: 1.5,
    };
    assert_eq!(jsv::to_string(&rect).unwrap(), "{Width:2,Height:1.5}");
    assert_eq!(jsv::from_str::<geometry::Rect>("{Height:1.5,Width:2}").unwrap(), rect);
}

#[test]
fn test_reflect_abstract_multiple_implementors() {
    let drawing = Drawing {
        title: "plan".to_string(),
        figures: vec![
            Box::new(geometry::Square { side: 2.0 }),
            Box::new(geometry::Rect {
                width: 1.0,
                height: 3.0,
            }),
        ],
    };

    let text = json::to_string(&drawing).unwrap();
    assert!(text.contains(r#""__type":"macro_tests::geometry::Square""#));
    assert!(text.contains(r#""__type":"macro_tests::geometry::Rect""#));

    let back: Drawing = json::from_str(&text).unwrap();
    assert_eq!(back.title, "plan");
    let areas: Vec<f64> = back.figures.iter().map(|f| f.area()).collect();
    assert_eq!(areas, vec![4.0, 3.0]);
    assert_eq!(AsReflect::descriptor(&*back.figures[1]).short_name(), "Rect");
}
