use polycodec::{value, write_string, Format, Kind, Matrix, StructMap, Value};

#[test]
fn test_value_macro_booleans() {
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(false), Value::Bool(false));
}

#[test]
fn test_value_macro_numbers() {
    assert_eq!(value!(42), Value::Int(42));
    assert_eq!(value!(-123), Value::Int(-123));
    assert_eq!(value!(7u64), Value::Uint(7));
    assert_eq!(value!(3.5), Value::Float(3.5));
    assert_eq!(value!(0.5f32), Value::Float(0.5));
}

#[test]
fn test_value_macro_strings() {
    assert_eq!(
        value!("hello world"),
        Value::String("hello world".to_string())
    );
    assert_eq!(value!(""), Value::String(String::new()));
    let owned = String::from("owned");
    assert_eq!(value!(owned), Value::from("owned"));
}

#[test]
fn test_value_macro_lists() {
    assert_eq!(value!([]), Value::List(vec![]));
    assert_eq!(
        value!([1, "hello", true, (-2), [0.5]]),
        Value::List(vec![
            Value::Int(1),
            Value::from("hello"),
            Value::Bool(true),
            Value::Int(-2),
            Value::List(vec![Value::Float(0.5)]),
        ])
    );
    assert_eq!(value!([1, 2,]).list_size(), 2);
}

#[test]
fn test_value_macro_structs() {
    assert_eq!(value!({}), Value::Struct(StructMap::new()));

    let simple = value!({
        "name": "Alice",
        "age": 30
    });
    assert_eq!(simple.struct_size(), 2);
    assert_eq!(simple.struct_get("name"), Some(&Value::from("Alice")));
    assert_eq!(simple.struct_get("age"), Some(&Value::Int(30)));
}

#[test]
fn test_value_macro_nested() {
    let nested = value!({
        "user": {
            "id": 123,
            "name": "Bob",
            "active": true
        },
        "tags": ["admin", "developer"],
        "count": 42
    });

    assert_eq!(nested.struct_size(), 3);
    let user = nested.struct_get("user").unwrap();
    assert!(user.is_struct());
    assert_eq!(user.struct_get("id"), Some(&Value::Int(123)));
    assert_eq!(user.struct_get("name"), Some(&Value::from("Bob")));

    let tags = nested.struct_get("tags").unwrap();
    assert_eq!(tags.list_get(1), Some(&Value::from("developer")));
    assert_eq!(nested.struct_key_at(2), Some("count"));
}

#[test]
fn test_value_macro_repeated_key_keeps_last() {
    let value = value!({ "a": 1, "b": 2, "a": 3 });
    assert_eq!(value.struct_size(), 2);
    assert_eq!(value.struct_key_at(0), Some("a"));
    assert_eq!(value.struct_get("a"), Some(&Value::Int(3)));
}

#[test]
fn test_value_macro_accepts_other_values() {
    let grid = Matrix::new(&[2, 2]).unwrap();
    let value = value!({ "grid": (grid.clone()), "kind": (Kind::List.name()) });
    assert_eq!(value.struct_get("grid"), Some(&Value::Matrix(grid)));
    assert_eq!(value.struct_get("kind"), Some(&Value::from("list")));
}

#[test]
fn test_value_kind_predicates() {
    let bool_val = value!(true);
    assert!(bool_val.is_bool());
    assert_eq!(bool_val.as_bool(), Some(true));

    let str_val = value!("hello");
    assert!(str_val.is_string());
    assert_eq!(str_val.as_str(), Some("hello"));

    let list_val = value!([1, 2, 3]);
    assert!(list_val.is_list());
    assert_eq!(list_val.as_list().map(Vec::len), Some(3));

    let struct_val = value!({"key": "value"});
    assert_eq!(struct_val.kind(), Kind::Struct);
    assert_eq!(struct_val.as_struct().map(StructMap::len), Some(1));
}

#[test]
fn test_macro_output_encodes() {
    let doc = value!({ "ok": true, "items": [1, 2] });
    assert_eq!(
        write_string(Format::Yaml, &doc).unwrap(),
        "ok: true\nitems: [1, 2]\n"
    );
}
