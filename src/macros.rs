/// Builds a [`Value`](crate::Value) from a literal-like description.
///
/// Lists use `[...]`, maps use `{ key => value }` with arbitrary keys, and
/// `null`, `true` and `false` map to the constants. Any other expression is
/// converted with [`to_value`](crate::to_value), falling back to null when the
/// conversion fails.
///
/// ```rust
/// use sigma::{to_string, value};
///
/// let v = value!({ 1 => 2, "3" => [true, null] });
/// assert_eq!(to_string(&v).unwrap(), r#"{1=2,"3"=[&t,&n]}"#);
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
        $crate::Value::List(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(::std::vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::Map::new())
    };

    ({ $($key:tt => $value:tt),* $(,)? }) => {{
        let mut map = $crate::Map::new();
        $(
            map.insert($crate::value!($key), $crate::value!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($s:expr) => {{
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    }};
}
