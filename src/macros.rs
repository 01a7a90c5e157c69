/// Builds a [`DxValue`](crate::DxValue) from a literal.
///
/// ```rust
/// use dx_format::{dx, DxValue};
///
/// assert_eq!(dx!(null), DxValue::Null);
/// assert_eq!(dx!(^"js"), DxValue::Ref("js".to_string()));
/// assert_eq!(dx!(["react", 18, [true, null]]).as_array().map(Vec::len), Some(3));
/// ```
#[macro_export]
macro_rules! dx {
    (null) => {
        $crate::DxValue::Null
    };

    (true) => {
        $crate::DxValue::Bool(true)
    };

    (false) => {
        $crate::DxValue::Bool(false)
    };

    // Reference pointer
    (^ $key:expr) => {
        $crate::DxValue::Ref(::std::string::ToString::to_string(&$key))
    };

    ([]) => {
        $crate::DxValue::Array(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::DxValue::Array(vec![$($crate::dx!($elem)),*])
    };

    // Anything with a `From` impl: strings, numbers, options
    ($other:expr) => {
        $crate::DxValue::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::DxValue;

    #[test]
    fn test_dx_macro_primitives() {
        assert_eq!(dx!(null), DxValue::Null);
        assert_eq!(dx!(true), DxValue::Bool(true));
        assert_eq!(dx!(false), DxValue::Bool(false));
        assert_eq!(dx!(42), DxValue::Number(42.0));
        assert_eq!(dx!(3.5), DxValue::Number(3.5));
        assert_eq!(dx!("hello"), DxValue::String("hello".to_string()));
    }

    #[test]
    fn test_dx_macro_refs() {
        let key = "js";
        assert_eq!(dx!(^key), DxValue::Ref("js".to_string()));
        assert_eq!(dx!(^"python"), DxValue::Ref("python".to_string()));
    }

    #[test]
    fn test_dx_macro_arrays() {
        assert_eq!(dx!([]), DxValue::Array(vec![]));

        let arr = dx!([1, "two", [null, false]]);
        match arr {
            DxValue::Array(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0], DxValue::Number(1.0));
                assert_eq!(items[1], DxValue::String("two".to_string()));
                assert_eq!(
                    items[2],
                    DxValue::Array(vec![DxValue::Null, DxValue::Bool(false)])
                );
            }
            _ => panic!("Expected array"),
        }
    }
}
