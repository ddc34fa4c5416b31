//! Property-based tests for the round-trip guarantees of every format.
//!
//! The binary formats must reproduce any tree bit for bit. Text formats get trees
//! they can represent: finite floats, unsigned values above `i64::MAX` (smaller ones
//! read back as `Int`), and no matrices for Txt. Their strings and keys range over
//! printable Unicode and ASCII control characters.

use polycodec::{from_slice, read, to_value, to_vec, write, Format, Matrix, StructMap, Value};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

fn matrix() -> impl Strategy<Value = Matrix> {
    prop::collection::vec(1usize..=3, 1..=3).prop_flat_map(|dims| {
        let total: usize = dims.iter().product();
        prop::collection::vec(any::<f64>().prop_filter("finite", |f| f.is_finite()), total)
            .prop_map(move |data| Matrix::from_data(dims.clone(), data).unwrap())
    })
}

/// Printable text plus the ASCII control range, which exercises quoting and escapes.
fn text() -> BoxedStrategy<String> {
    prop_oneof!["\\PC{0,16}", "[\\x00-\\x7f]{0,8}"].boxed()
}

fn tree(leaf: BoxedStrategy<Value>, key: BoxedStrategy<String>) -> impl Strategy<Value = Value> {
    leaf.prop_recursive(3, 24, 4, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec((key.clone(), inner), 0..4).prop_map(|entries| {
                let mut map = StructMap::new();
                for (key, value) in entries {
                    map.set(key, value);
                }
                Value::Struct(map)
            }),
        ]
    })
}

fn any_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        any::<f64>().prop_map(Value::Float),
        "\\PC{0,16}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        matrix().prop_map(Value::Matrix),
    ];
    tree(leaf.boxed(), "[a-z][a-z_]{0,7}".boxed())
}

fn text_tree(with_matrix: bool) -> impl Strategy<Value = Value> {
    let finite = any::<f64>().prop_filter("finite", |f| f.is_finite());
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        ((i64::MAX as u64 + 1)..=u64::MAX).prop_map(Value::Uint),
        finite.prop_map(Value::Float),
        text().prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
    ];
    let leaf = if with_matrix {
        prop_oneof![4 => leaf, 1 => matrix().prop_map(Value::Matrix)].boxed()
    } else {
        leaf.boxed()
    };
    tree(leaf, text())
}

fn roundtrips(format: Format, value: &Value) -> bool {
    match write(format, value).and_then(|bytes| read(format, &bytes)) {
        Ok(back) => back == *value,
        Err(e) => {
            eprintln!("{} failed: {}", format, e);
            false
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Record {
    id: i64,
    label: String,
    weights: Vec<f64>,
    enabled: bool,
}

fn record() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        "[a-z ]{0,10}",
        prop::collection::vec(-1.0e6f64..1.0e6, 0..5),
        any::<bool>(),
    )
        .prop_map(|(id, label, weights, enabled)| Record {
            id,
            label,
            weights,
            enabled,
        })
}

proptest! {
    #[test]
    fn prop_binary_roundtrip(value in any_tree()) {
        prop_assert!(roundtrips(Format::Binary, &value));
        prop_assert!(roundtrips(Format::JsonBinary, &value));
    }

    #[test]
    fn prop_text_roundtrip(value in text_tree(true)) {
        for format in [Format::JsonText, Format::Yaml, Format::Xml, Format::Toml] {
            prop_assert!(roundtrips(format, &value), "format {}", format);
        }
    }

    #[test]
    fn prop_txt_roundtrip(value in text_tree(false)) {
        prop_assert!(roundtrips(Format::Txt, &value));
    }

    #[test]
    fn prop_json_strings(s in "\\PC{0,24}") {
        prop_assert!(roundtrips(Format::JsonText, &Value::String(s)));
    }

    #[test]
    fn prop_clone_is_equal(value in any_tree()) {
        let copy = value.clone();
        prop_assert_eq!(copy, value);
    }

    #[test]
    fn prop_typed_records(records in prop::collection::vec(record(), 0..4)) {
        for format in Format::ALL {
            let bytes = to_vec(format, &records).unwrap();
            let back: Vec<Record> = from_slice(format, &bytes).unwrap();
            prop_assert_eq!(&back, &records);
        }
        prop_assert!(to_value(&records).unwrap().is_list());
    }
}
