//! Proptest strategies for event property payloads.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Any JSON scalar: null, bool, integer, fractional float or string.
pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6)
            .prop_filter("fractional", |f| f.fract() != 0.0)
            .prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Nested JSON values up to a small depth.
pub fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

/// An event properties object.
pub fn arb_properties() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..6)
        .prop_map(|map| Value::Object(map.into_iter().collect::<Map<String, Value>>()))
}
