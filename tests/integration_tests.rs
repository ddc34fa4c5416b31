use polycodec::{
    from_slice, from_value, read, to_value, to_vec, write, write_string, CodecOptions, Error,
    Format, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Shape {
    Empty,
    Circle(f64),
    Rect { w: u32, h: u32 },
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

fn order() -> Order {
    Order {
        order_id: 12345,
        customer: User {
            tags: vec!["vip".to_string()],
            ..alice()
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
    }
}

fn assert_roundtrip<T>(original: &T)
where
    T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug,
{
    for format in Format::ALL {
        let bytes = to_vec(format, original).unwrap();
        let back: T = from_slice(format, &bytes)
            .unwrap_or_else(|e| panic!("{} failed on {:?}: {}", format, original, e));
        assert_eq!(*original, back, "format {}", format);
    }
}

#[test]
fn test_simple_struct() {
    assert_roundtrip(&alice());
}

#[test]
fn test_nested_struct() {
    let order = order();
    let yaml = write_string(Format::Yaml, &to_value(&order).unwrap()).unwrap();
    println!("Order YAML:\n{}", yaml);
    assert_roundtrip(&order);
}

#[test]
fn test_array_of_objects() {
    assert_roundtrip(&order().items);
}

#[test]
fn test_enums() {
    assert_roundtrip(&vec![
        Shape::Empty,
        Shape::Circle(1.5),
        Shape::Rect { w: 3, h: 4 },
    ]);
    assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));
}

#[test]
fn test_maps_keep_key_order() {
    let mut map = BTreeMap::new();
    map.insert("b".to_string(), 2);
    map.insert("a".to_string(), 1);
    let value = to_value(&map).unwrap();
    assert_eq!(value.struct_key_at(0), Some("a"));
    assert_roundtrip(&map);
}

#[test]
fn test_primitives() {
    assert_roundtrip(&42i32);
    assert_roundtrip(&3.5f64);
    assert_roundtrip(&true);
    assert_roundtrip(&false);
    assert_roundtrip(&"hello world".to_string());
    assert_roundtrip(&vec![1, 2, 3, 4, 5]);
    assert_roundtrip(&(7u8, "pair".to_string()));
}

#[test]
fn test_numbers() {
    assert_roundtrip(&-128i8);
    assert_roundtrip(&32767i16);
    assert_roundtrip(&-2147483648i32);
    assert_roundtrip(&9223372036854775807i64);
    assert_roundtrip(&-9223372036854775808i64);
    assert_roundtrip(&255u8);
    assert_roundtrip(&4294967295u32);
    assert_roundtrip(&u64::MAX);
    assert_roundtrip(&-2.5f32);
    assert_roundtrip(&0.1f64);
    assert_roundtrip(&1e300f64);
}

#[test]
fn test_special_strings() {
    let special_strings = [
        "",
        "hello, world",
        "line1\nline2",
        "tab\there",
        "pipe|here",
        " leading space",
        "trailing space ",
        "true",
        "no",
        "null",
        "123",
        "3.5",
        "-inf",
        "\"quoted\"",
        "key: value",
        "# not a comment",
        "<tag> & 'apos'",
        "ünïcödé ✓",
    ];

    for s in special_strings {
        assert_roundtrip(&s.to_string());
    }
}

#[test]
fn test_empty_collections() {
    let empty_vec: Vec<i32> = vec![];
    assert_roundtrip(&empty_vec);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Empty {}

    assert_roundtrip(&Empty {});
}

#[test]
fn test_optional_fields() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Profile {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    }

    assert_roundtrip(&Profile {
        name: "Bob".to_string(),
        email: None,
    });
    assert_roundtrip(&Profile {
        name: "Bob".to_string(),
        email: Some("bob@example.com".to_string()),
    });

    let unset: Option<i32> = None;
    assert!(matches!(to_value(&unset), Err(Error::UnsupportedType(_))));
    assert!(matches!(to_value(&()), Err(Error::UnsupportedType(_))));
}

#[test]
fn test_to_value() {
    let value = to_value(&alice()).unwrap();
    assert_eq!(value.struct_get("id"), Some(&Value::Int(123)));
    assert_eq!(value.struct_get("name"), Some(&Value::from("Alice")));
    assert_eq!(value.struct_get("active"), Some(&Value::Bool(true)));
    assert_eq!(value.struct_get("tags").map(Value::list_size), Some(2));

    let back: User = from_value(value).unwrap();
    assert_eq!(back, alice());
}

#[test]
fn test_shape_mismatch_is_an_error() {
    let value = to_value(&alice()).unwrap();
    assert!(from_value::<Vec<u32>>(value).is_err());
    assert!(from_value::<u8>(Value::Int(300)).is_err());
    assert!(from_value::<String>(Value::Int(1)).is_err());
}

#[test]
fn test_cross_format_conversion() {
    let original = to_value(&order()).unwrap();
    for from in Format::ALL {
        for to in Format::ALL {
            let src = write(from, &original).unwrap();
            let dst = polycodec::convert(from, to, &src).unwrap();
            assert_eq!(read(to, &dst).unwrap(), original, "{} -> {}", from, to);
        }
    }
}

#[test]
fn test_depth_limit() {
    let mut deep = Value::from(0);
    for _ in 0..10 {
        deep = Value::List(vec![deep]);
    }
    let options = CodecOptions::new().with_max_depth(5);
    for format in Format::ALL {
        assert_eq!(
            polycodec::write_with_options(format, &deep, &options),
            Err(Error::DepthLimitExceeded(5)),
            "format {}",
            format
        );
        let bytes = write(format, &deep).unwrap();
        assert_eq!(
            polycodec::read_with_options(format, &bytes, &options),
            Err(Error::DepthLimitExceeded(5)),
            "format {}",
            format
        );
        assert_eq!(read(format, &bytes).unwrap(), deep);
    }
}

// YAML and TOML are left out: cut at a line boundary they are still valid documents.
#[test]
fn test_truncated_input_fails_cleanly() {
    let value = to_value(&order()).unwrap();
    for format in [
        Format::Binary,
        Format::JsonBinary,
        Format::JsonText,
        Format::Xml,
        Format::Txt,
    ] {
        let bytes = write(format, &value).unwrap();
        for cut in [1, bytes.len() / 3, bytes.len() / 2, bytes.len() - 2] {
            assert!(
                read(format, &bytes[..cut]).is_err(),
                "{} accepted a prefix of {} bytes",
                format,
                cut
            );
        }
    }
}
