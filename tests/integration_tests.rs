use chrono::{TimeZone, Utc};
use jsv_text::{
    json, jsv, reflect_abstract, reflect_composite, AsReflect, Error, KeyValuePair, MemberAttrs,
    NamingPolicy, Options, Reflect, ReflectEnum, Shape, Value,
};
use std::any::type_name;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Default, Debug, PartialEq, Clone)]
struct User {
    id: u32,
    first_name: String,
    active: bool,
    tags: Vec<String>,
}

reflect_composite!(User {
    "Id" => id,
    "FirstName" => first_name,
    "Active" => active,
    "Tags" => tags,
});

#[derive(Default, Debug, PartialEq, Clone)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

reflect_composite!(Product { "Sku" => sku, "Price" => price, "Quantity" => quantity });

#[derive(Default, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

reflect_composite!(Order {
    "OrderId" => order_id,
    "Customer" => customer,
    "Items" => items,
    "Total" => total,
});

fn alice() -> User {
    User {
        id: 123,
        first_name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

#[test]
fn test_simple_struct_both_formats() {
    let user = alice();

    let text = jsv::to_string(&user).unwrap();
    assert_eq!(text, "{Id:123,FirstName:Alice,Active:true,Tags:[admin,developer]}");
    assert_eq!(jsv::from_str::<User>(&text).unwrap(), user);

    let text = json::to_string(&user).unwrap();
    assert_eq!(
        text,
        r#"{"Id":123,"FirstName":"Alice","Active":true,"Tags":["admin","developer"]}"#
    );
    assert_eq!(json::from_str::<User>(&text).unwrap(), user);
}

#[test]
fn test_nested_struct() {
    let order = Order {
        order_id: 12345,
        customer: alice(),
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET, LARGE".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
    };

    let text = jsv::to_string(&order).unwrap();
    assert!(text.contains(r#"Sku:"GADGET, LARGE""#));
    assert_eq!(jsv::from_str::<Order>(&text).unwrap(), order);

    let text = json::to_string(&order).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["Items"][1]["Quantity"], serde_json::json!(1));
    assert_eq!(json::from_str::<Order>(&text).unwrap(), order);
}

#[test]
fn test_member_order_is_stable() {
    let user = alice();
    let first = json::to_string(&user).unwrap();
    for _ in 0..5 {
        assert_eq!(json::to_string(&user).unwrap(), first);
    }
}

#[test]
fn test_unknown_members_are_skipped() {
    let user: User = jsv::from_str("{Id:1,Unknown:{a:[1,2]},FirstName:Bob}").unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.first_name, "Bob");
}

#[test]
fn test_bad_scalar_fails_the_read() {
    let result = jsv::from_str::<User>("{Id:abc}");
    assert!(matches!(result, Err(Error::Parse { .. })));
}

// Discriminated trait-object slots

trait Parameter: Reflect {}

#[derive(Default, Debug, PartialEq)]
struct TestParameter {
    value: String,
}

reflect_composite!(TestParameter { "Value" => value });

impl Parameter for TestParameter {}

reflect_abstract!(Parameter => TestParameter);

trait Holder: Reflect {}

#[derive(Default)]
struct TestObject {
    interface_parameter: Option<Box<dyn Parameter>>,
}

reflect_composite!(TestObject { "InterfaceParameter" => interface_parameter });

impl Holder for TestObject {}

#[derive(Default)]
struct ConcreteObject {
    parameter: TestParameter,
}

reflect_composite!(ConcreteObject { "Parameter" => parameter });

impl Holder for ConcreteObject {}

reflect_abstract!(Holder => TestObject, ConcreteObject);

fn some_value() -> TestParameter {
    TestParameter {
        value: "Some Value".to_string(),
    }
}

#[test]
fn test_nested_discriminators() {
    let holder: Box<dyn Holder> = Box::new(TestObject {
        interface_parameter: Some(Box::new(some_value())),
    });
    let text = jsv::to_string(&holder).unwrap();
    assert_eq!(
        text,
        format!(
            "{{__type:{},InterfaceParameter:{{__type:{},Value:Some Value}}}}",
            type_name::<TestObject>(),
            type_name::<TestParameter>()
        )
    );

    let back: Box<dyn Holder> = jsv::from_str(&text).unwrap();
    let object = AsReflect::as_any(&*back)
        .downcast_ref::<TestObject>()
        .expect("concrete TestObject");
    let parameter = object.interface_parameter.as_ref().expect("parameter");
    assert_eq!(
        AsReflect::as_any(&**parameter).downcast_ref::<TestParameter>(),
        Some(&some_value())
    );
}

#[test]
fn test_concrete_member_has_no_discriminator() {
    let holder: Box<dyn Holder> = Box::new(ConcreteObject {
        parameter: some_value(),
    });
    let text = jsv::to_string(&holder).unwrap();
    assert_eq!(
        text,
        format!(
            "{{__type:{},Parameter:{{Value:Some Value}}}}",
            type_name::<ConcreteObject>()
        )
    );
}

#[test]
fn test_late_bound_root_leads_with_discriminator() {
    let object = ConcreteObject {
        parameter: some_value(),
    };
    let text = json::to_string_dyn(&object).unwrap();
    assert!(text.starts_with(&format!(
        r#"{{"__type":"{}","#,
        type_name::<ConcreteObject>()
    )));
    let plain = json::to_string(&object).unwrap();
    assert_eq!(plain, r#"{"Parameter":{"Value":"Some Value"}}"#);
}

#[test]
fn test_abstract_slot_requires_discriminator() {
    let missing = jsv::from_str::<Box<dyn Parameter>>("{Value:x}");
    assert!(matches!(missing, Err(Error::MissingDiscriminator { .. })));

    let unknown = jsv::from_str::<Box<dyn Parameter>>("{__type:Nope,Value:x}");
    assert!(matches!(unknown, Err(Error::UnknownType { .. })));

    let short: Box<dyn Parameter> = jsv::from_str("{__type:TestParameter,Value:x}").unwrap();
    assert_eq!(AsReflect::descriptor(&*short).short_name(), "TestParameter");
}

#[test]
fn test_exclude_type_info_suppresses_discriminator() {
    let holder: Box<dyn Holder> = Box::new(ConcreteObject::default());
    let options = Options::new().without_type_info();
    let text = jsv::to_string_with_options(&holder, &options).unwrap();
    assert!(!text.contains("__type"));
}

// Inherited members

#[derive(Default, Debug, PartialEq)]
struct BaseEntity {
    id: String,
}

reflect_composite!(BaseEntity { "Id" => id });

#[derive(Default, Debug, PartialEq)]
struct DerivedEntity {
    base: BaseEntity,
}

impl DerivedEntity {
    fn new(id: &str) -> Self {
        DerivedEntity {
            base: BaseEntity { id: id.to_string() },
        }
    }
}

impl Reflect for DerivedEntity {
    fn shape() -> Shape {
        Shape::composite::<DerivedEntity>()
            .inherit(|d: &DerivedEntity| &d.base, |d: &mut DerivedEntity| &mut d.base)
            .build()
    }
}

#[test]
fn test_inherited_member_round_trip() {
    let entity = DerivedEntity::new("abc");
    let text = json::to_string(&entity).unwrap();
    assert_eq!(text, r#"{"Id":"abc"}"#);
    assert_eq!(json::from_str::<DerivedEntity>(&text).unwrap(), entity);
}

// Collections

#[test]
fn test_integer_dictionary_keys_are_quoted_in_json() {
    let mut map = HashMap::new();
    map.insert(1, "a".to_string());
    let text = json::to_string(&map).unwrap();
    assert_eq!(text, r#"{"1":"a"}"#);
    assert_eq!(json::from_str::<HashMap<i32, String>>(&text).unwrap(), map);

    assert_eq!(jsv::to_string(&map).unwrap(), "{1:a}");
}

#[test]
fn test_queue_round_trip_in_json() {
    let queue: VecDeque<i32> = [1, 2, 3].into_iter().collect();
    let text = json::to_string(&queue).unwrap();
    assert_eq!(text, "[1,2,3]");
    let back: VecDeque<i32> = json::from_str(&text).unwrap();
    assert_eq!(back.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_trailing_separator_reads_default_element() {
    assert_eq!(jsv::from_str::<Vec<i32>>("[1,2,]").unwrap(), vec![1, 2, 0]);
    assert_eq!(json::from_str::<Vec<i32>>("[1,2,]").unwrap(), vec![1, 2, 0]);
}

#[test]
fn test_key_value_pair() {
    let pair = KeyValuePair::new("a".to_string(), 1);
    assert_eq!(jsv::to_string(&pair).unwrap(), "{Key:a,Value:1}");

    let back: KeyValuePair<String, i32> = jsv::from_str("{key:b,value:2}").unwrap();
    assert_eq!(back, KeyValuePair::new("b".to_string(), 2));

    let invalid = jsv::from_str::<KeyValuePair<String, i32>>("{Key:a,Other:1}");
    assert!(matches!(invalid, Err(Error::InvalidPairField { .. })));
}

#[test]
fn test_fixed_array_pads_missing_elements() {
    let back: [u8; 4] = jsv::from_str("[1,2]").unwrap();
    assert_eq!(back, [1, 2, 0, 0]);
}

// Defaults and absent values

#[derive(Default, Debug, PartialEq)]
struct Counter {
    name: String,
    hits: i32,
    note: Option<String>,
}

impl Reflect for Counter {
    fn shape() -> Shape {
        Shape::composite::<Counter>()
            .member("Name", |c: &Counter| &c.name, |c: &mut Counter, v| c.name = v)
            .member_with(
                "Hits",
                |c: &Counter| &c.hits,
                |c: &mut Counter, v| c.hits = v,
                MemberAttrs::new().emit_default_value(false),
            )
            .member("Note", |c: &Counter| &c.note, |c: &mut Counter, v| c.note = v)
            .build()
    }
}

#[test]
fn test_default_valued_member_is_suppressed() {
    let mut counter = Counter {
        name: "c".to_string(),
        ..Counter::default()
    };
    assert_eq!(json::to_string(&counter).unwrap(), r#"{"Name":"c"}"#);

    counter.hits = 5;
    assert_eq!(json::to_string(&counter).unwrap(), r#"{"Name":"c","Hits":5}"#);
}

#[test]
fn test_null_values_are_opt_in() {
    let counter = Counter {
        name: "c".to_string(),
        hits: 1,
        note: None,
    };
    let options = Options::new().with_null_values(true);
    assert_eq!(
        json::to_string_with_options(&counter, &options).unwrap(),
        r#"{"Name":"c","Hits":1,"Note":null}"#
    );
    assert_eq!(
        jsv::to_string_with_options(&counter, &options).unwrap(),
        "{Name:c,Hits:1,Note:}"
    );
    let back: Counter = jsv::from_str("{Name:c,Hits:1,Note:}").unwrap();
    assert_eq!(back, counter);
}

#[test]
fn test_empty_input_reads_default() {
    assert_eq!(jsv::from_str::<User>("").unwrap(), User::default());
    assert_eq!(json::from_str::<User>("null").unwrap(), User::default());
}

// Options

#[test]
fn test_naming_policy_and_lenient_member_match() {
    let options = Options::new().with_naming(NamingPolicy::CamelCase);
    let text = json::to_string_with_options(&alice(), &options).unwrap();
    assert!(text.starts_with(r#"{"id":123,"firstName":"Alice""#));

    let snake = Options::new().with_naming(NamingPolicy::SnakeCase);
    let text = jsv::to_string_with_options(&alice(), &snake).unwrap();
    assert!(text.contains("first_name:Alice"));
    assert_eq!(jsv::from_str::<User>(&text).unwrap(), alice());
}

#[test]
fn test_scoped_options_apply_to_facades() {
    let _scope = Options::new().with_excluded_member("User.Tags").scope();
    let text = jsv::to_string(&alice()).unwrap();
    assert_eq!(text, "{Id:123,FirstName:Alice,Active:true}");
}

#[test]
fn test_per_type_discriminator_override() {
    let options = Options::new().with_type_info_for("User", true);
    let text = jsv::to_string_with_options(&alice(), &options).unwrap();
    assert!(text.starts_with(&format!("{{__type:{},", type_name::<User>())));

    let attr = Options::new().with_type_info(true).with_type_attr("$type");
    let text = json::to_string_with_options(&BaseEntity::default(), &attr).unwrap();
    assert!(text.starts_with(r#"{"$type":"#));
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
enum Status {
    #[default]
    Pending,
    Shipped,
    Delivered,
}

impl ReflectEnum for Status {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("Pending", Status::Pending),
        ("Shipped", Status::Shipped),
        ("Delivered", Status::Delivered),
    ];

    fn to_i64(self) -> i64 {
        self as i64
    }
}

impl Reflect for Status {
    fn shape() -> Shape {
        Shape::enumeration::<Status>()
    }
}

#[test]
fn test_enum_names_and_integers() {
    assert_eq!(json::to_string(&Status::Shipped).unwrap(), r#""Shipped""#);
    let options = Options::new().with_enum_as_integer(true);
    assert_eq!(
        json::to_string_with_options(&Status::Delivered, &options).unwrap(),
        "2"
    );
    assert_eq!(jsv::from_str::<Status>("delivered").unwrap(), Status::Delivered);
    assert_eq!(jsv::from_str::<Status>("1").unwrap(), Status::Shipped);
    assert_eq!(jsv::from_str::<Status>("").unwrap(), Status::Pending);
    assert!(jsv::from_str::<Status>("Lost").is_err());
}

#[test]
fn test_dates_in_json() {
    let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let text = json::to_string(&date).unwrap();
    assert_eq!(text, r#""2024-01-02T03:04:05Z""#);
    assert_eq!(json::from_str::<chrono::DateTime<Utc>>(&text).unwrap(), date);

    let dcjs = Options::new().with_date_handling(jsv_text::DateHandling::DcjsCompatible);
    let text = jsv::to_string_with_options(&date, &dcjs).unwrap();
    assert_eq!(text, "/Date(1704164645000)/");
    assert_eq!(jsv::from_str::<chrono::DateTime<Utc>>(&text).unwrap(), date);
}

// Malformed input

#[test]
fn test_lenient_and_strict_parsing() {
    let lenient: Vec<String> = jsv::from_str("[a,\"b").unwrap();
    assert_eq!(lenient, vec!["a", "b"]);

    let strict = Options::new().with_strict(true);
    assert!(matches!(
        jsv::from_str_with_options::<Vec<String>>("[a,\"b", &strict),
        Err(Error::Syntax { .. })
    ));

    let partial: User = jsv::from_str("{Id:7,FirstName:Al").unwrap();
    assert_eq!(partial.id, 7);
    assert_eq!(partial.first_name, "Al");
    assert!(jsv::from_str_with_options::<User>("{Id:7,FirstName:Al", &strict).is_err());
}

// Recursion guard

#[derive(Default, Debug)]
struct Node {
    name: String,
    child: Option<Box<Node>>,
}

reflect_composite!(Node { "Name" => name, "Child" => child });

fn chain(names: &[&str]) -> Option<Box<Node>> {
    let (first, rest) = names.split_first()?;
    Some(Box::new(Node {
        name: first.to_string(),
        child: chain(rest),
    }))
}

#[test]
fn test_depth_guard_truncates_silently() {
    let root = chain(&["a", "b", "c", "d"]).map(|node| *node).unwrap_or_default();
    let full = jsv::to_string(&root).unwrap();
    assert!(full.contains("Name:d"));

    let shallow = Options::new().with_max_depth(4);
    let truncated = jsv::to_string_with_options(&root, &shallow).unwrap();
    assert!(truncated.starts_with("{Name:a"));
    assert!(!truncated.contains("Name:c"));
}

#[test]
fn test_depth_guard_keeps_json_valid_and_skips_trait_slots() {
    let object = TestObject {
        interface_parameter: Some(Box::new(some_value())),
    };
    let shallow = Options::new().with_max_depth(2);

    let truncated = json::to_string_with_options(&object, &shallow).unwrap();
    assert_eq!(truncated, r#"{"InterfaceParameter":null}"#);
    assert!(serde_json::from_str::<serde_json::Value>(&truncated).is_ok());

    let full = json::to_string(&object).unwrap();
    let back: TestObject = json::from_str_with_options(&full, &shallow).unwrap();
    assert!(back.interface_parameter.is_none());
}

// Dynamic values

#[test]
fn test_value_reads_any_shape() {
    let value: Value = jsv::from_str("{a:1,b:[x,y],c:{d:}}").unwrap();
    assert_eq!(value.get("a").and_then(Value::as_str), Some("1"));
    assert_eq!(
        value.get("b").and_then(Value::as_array).map(Vec::len),
        Some(2)
    );
    assert_eq!(value.get("c").and_then(|c| c.get("d")), Some(&Value::Null));

    let value = json::to_value(&alice()).unwrap();
    assert_eq!(value.get("Id").and_then(Value::as_i64), Some(123));
    assert_eq!(value.get("Active").and_then(Value::as_bool), Some(true));
}

#[test]
fn test_value_as_member() {
    #[derive(Default)]
    struct Envelope {
        kind: String,
        payload: Value,
    }

    reflect_composite!(Envelope { "Kind" => kind, "Payload" => payload });

    let envelope = Envelope {
        kind: "k".to_string(),
        payload: Value::Null,
    };
    assert_eq!(json::to_string(&envelope).unwrap(), r#"{"Kind":"k"}"#);

    let back: Envelope = json::from_str(r#"{"Kind":"k","Payload":[1,"two"]}"#).unwrap();
    assert_eq!(back.payload, jsv_text::value!([1, "two"]));
}

#[test]
fn test_btree_map_of_structs() {
    let mut map = BTreeMap::new();
    map.insert("first".to_string(), alice());
    let text = jsv::to_string(&map).unwrap();
    assert!(text.starts_with("{first:{Id:123,"));
    assert_eq!(jsv::from_str::<BTreeMap<String, User>>(&text).unwrap(), map);
}

#[derive(Default, Debug, PartialEq, Clone, Copy)]
struct Cents(i64);

impl Reflect for Cents {
    fn shape() -> Shape {
        Shape::opaque::<Cents>()
    }
}

#[derive(Default, Debug, PartialEq)]
struct Invoice {
    number: u32,
    amount: Cents,
}

reflect_composite!(Invoice { "Number" => number, "Amount" => amount });

#[test]
fn test_custom_codec_inside_composite() {
    jsv::cache().register_custom::<Cents>(
        |c| format!("{}.{:02}", c.0 / 100, c.0 % 100),
        |text| {
            let (whole, frac) = text.split_once('.').unwrap_or((text, "0"));
            let whole: i64 = whole.parse().map_err(Error::custom)?;
            let frac: i64 = frac.parse().map_err(Error::custom)?;
            Ok(Cents(whole * 100 + frac))
        },
    );

    let invoice = Invoice {
        number: 9,
        amount: Cents(1250),
    };
    let text = jsv::to_string(&invoice).unwrap();
    assert_eq!(text, "{Number:9,Amount:12.50}");
    assert_eq!(jsv::from_str::<Invoice>(&text).unwrap(), invoice);

    let bad = jsv::from_str::<Invoice>("{Number:9,Amount:twelve}");
    assert!(matches!(bad, Err(Error::Custom(_))));
}

#[derive(Default, Debug, PartialEq, Clone)]
struct Sensor {
    name: String,
    readings: Vec<f64>,
}

reflect_composite!(Sensor { "Name" => name, "Readings" => readings });

#[test]
fn test_concurrent_first_use_through_facade() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let sensor = Sensor {
                    name: format!("s{}", i),
                    readings: vec![f64::from(i), 0.5],
                };
                barrier.wait();
                let text = json::to_string(&sensor).unwrap();
                let back: Sensor = json::from_str(&text).unwrap();
                (sensor, back)
            })
        })
        .collect();

    for handle in handles {
        let (sent, received) = handle.join().unwrap();
        assert_eq!(sent, received);
    }
    assert!(json::cache().contains(jsv_text::TypeDescriptor::of::<Sensor>()));
}
