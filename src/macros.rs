/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Object keys must be string literals and keep their written order. Any other
/// leaf is converted with `Value::from`, so `42` is an `Int`, `42u32` a `Uint`,
/// `1.5` a `Float`. Negative numbers and other multi-token expressions need
/// parentheses: `[(-1), (n + 1)]`. There is no null.
///
/// ```rust
/// use polycodec::{value, Value};
///
/// let doc = value!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     "offset": (-3),
///     "nested": { "ok": true }
/// });
/// assert_eq!(doc.struct_get("offset"), Some(&Value::Int(-3)));
/// assert_eq!(doc.struct_key_at(3), Some("nested"));
/// ```
#[macro_export]
macro_rules! value {
    ([]) => {
        $crate::Value::List(::std::vec::Vec::new())
    };

    ([ $($elem:tt),+ $(,)? ]) => {
        $crate::Value::List(::std::vec![$($crate::value!($elem)),+])
    };

    ({}) => {
        $crate::Value::Struct($crate::StructMap::new())
    };

    ({ $($key:literal : $value:tt),+ $(,)? }) => {{
        let mut map = $crate::StructMap::new();
        $(
            map.set($key, $crate::value!($value));
        )+
        $crate::Value::Struct(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{StructMap, Value};

    #[test]
    fn test_value_macro_scalars() {
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(42), Value::Int(42));
        assert_eq!(value!(42u8), Value::Uint(42));
        assert_eq!(value!(3.5), Value::Float(3.5));
        assert_eq!(value!("hello"), Value::String("hello".to_string()));
        assert_eq!(value!((-7)), Value::Int(-7));
    }

    #[test]
    fn test_value_macro_containers() {
        assert_eq!(value!([]), Value::List(vec![]));
        assert_eq!(value!({}), Value::Struct(StructMap::new()));

        let list = value!([1, "two", [3.0]]);
        assert_eq!(list.list_size(), 3);
        assert_eq!(list.list_get(1), Some(&Value::from("two")));
        assert_eq!(
            list.list_get(2),
            Some(&Value::List(vec![Value::Float(3.0)]))
        );

        let obj = value!({ "b": 1, "a": { "c": false }, });
        assert_eq!(obj.struct_key_at(0), Some("b"));
        assert_eq!(
            obj.struct_get("a").and_then(|a| a.struct_get("c")),
            Some(&Value::Bool(false))
        );
    }
}
