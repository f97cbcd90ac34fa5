//! Integration tests for dynamic values
//!
//! Tests cover:
//! - Construction and kind reporting
//! - Object and Array access
//! - Aliasing versus deep clone
//! - Exact and convertible extraction

use gany_core::{Any, Caster, Kind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct Label(String);

impl Caster for Label {}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_basic_construction() {
    assert_eq!(Any::default().kind(), Kind::Undefined);
    assert!(Any::default().is_undefined());
    assert_eq!(Any::null().kind(), Kind::Null);

    let int32 = Any::from(123);
    assert_eq!(int32.kind(), Kind::Int32);
    assert_eq!(int32.downcast::<i32>().unwrap(), 123);

    let int64 = Any::from(123i64);
    assert_eq!(int64.kind(), Kind::Int64);
    assert_eq!(int64.downcast::<i64>().unwrap(), 123);

    let float = Any::from(3.14f32);
    assert!(float.is_float());
    assert_eq!(float.downcast::<f32>().unwrap(), 3.14f32);

    let double = Any::from(3.14);
    assert!(double.is_double());
    assert_eq!(double.downcast::<f64>().unwrap(), 3.14);

    let string = Any::from("Hello");
    assert_eq!(string.kind(), Kind::String);
    assert_eq!(string.downcast::<String>().unwrap(), "Hello");

    assert_eq!(Any::from(true).kind(), Kind::Bool);
    assert_eq!(Any::new(Label("x".into())).kind(), Kind::UserObject);
    assert_eq!([1, 2, 3].into_iter().collect::<Any>().kind(), Kind::Array);
    assert_eq!(
        Any::object_from([("a", Any::from(1)), ("b", Any::from(2))]).kind(),
        Kind::Object
    );
    assert_eq!(Any::function(|a: i32| a + 1).kind(), Kind::Function);
}

#[test]
fn test_null_equals_null() {
    assert_eq!(Any::null(), Any::null());
    assert_ne!(Any::null(), Any::undefined());
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_object_operations() {
    let mut obj = Any::object();
    obj.set_item("name", "John").unwrap();
    obj.set_item("age", 30).unwrap();

    assert_eq!(obj.get("name").try_to_string().unwrap(), "John");
    assert_eq!(obj.get("age").to_int32().unwrap(), 30);
    assert!(obj.contains("name"));
    obj.erase("name");
    assert!(!obj.contains("name"));
    assert_eq!(obj.size(), 1);
}

#[test]
fn test_array_operations() {
    let arr: Any = [1, 2, 3].into_iter().collect();
    assert_eq!(arr.get(0).to_int32().unwrap(), 1);
    assert_eq!(arr.get(2).to_int32().unwrap(), 3);
    assert!(arr.get(3).is_undefined());

    arr.push_back(4);
    assert_eq!(arr.get(3).to_int32().unwrap(), 4);
    assert_eq!(arr.size(), 4);
    assert!(arr.contains(2));

    arr.clear();
    assert_eq!(arr.size(), 0);
}

#[test]
fn test_nested_path_access() {
    let mut inner = Any::object();
    inner.set_item("city", "Paris").unwrap();
    let mut outer = Any::object();
    outer.set_item("address", inner).unwrap();
    assert_eq!(outer.get("address.city").try_to_string().unwrap(), "Paris");
    assert!(outer.get("address.zip").is_undefined());
}

// ============================================================================
// Aliasing
// ============================================================================

#[test]
fn test_clone_aliases_deep_clone_copies() {
    let original = Any::object_from([("list", [1, 2].into_iter().collect::<Any>())]);
    let alias = original.clone();
    let copy = original.deep_clone();

    original.get("list").push_back(3);
    assert_eq!(alias.get("list").size(), 3);
    assert_eq!(copy.get("list").size(), 2);
    assert!(alias.same_as(&original));
    assert!(!copy.same_as(&original));
}

#[test]
fn test_user_object_round_trip() {
    let value = Any::new(Label("tag".into()));
    assert_eq!(value.downcast::<Label>().unwrap(), Label("tag".into()));
    assert!(value.is_type::<Label>());
    assert!(value.downcast::<i32>().is_err());

    let copy = value.deep_clone();
    value.with_native_mut::<Label, _>(|l| l.0.push('!')).unwrap();
    assert_eq!(value.downcast::<Label>().unwrap().0, "tag!");
    assert_eq!(copy.downcast::<Label>().unwrap().0, "tag");
}

// ============================================================================
// Casting
// ============================================================================

#[test]
fn test_cast_basic_types() {
    assert_eq!(Any::from(123).cast::<i32>().unwrap(), 123);
    assert_eq!(Any::from(12.34).cast::<f64>().unwrap(), 12.34);
    assert_eq!(Any::from("hello").cast::<String>().unwrap(), "hello");
    assert!(Any::from(true).cast::<bool>().unwrap());
}

#[test]
fn test_cast_containers() {
    let arr: Any = [1, 2, 3].into_iter().collect();
    let items = arr.cast::<Vec<Any>>().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].to_int32().unwrap(), 2);

    let obj = Any::object_from([("name", Any::from("Alice")), ("age", Any::from(28))]);
    let map = obj.cast::<HashMap<String, Any>>().unwrap();
    assert_eq!(map["name"].try_to_string().unwrap(), "Alice");
    assert_eq!(map["age"].to_int32().unwrap(), 28);
}

#[test]
fn test_cast_conversions() {
    let text = Any::from("123");
    assert_eq!(text.cast::<i32>().unwrap(), 123);
    assert_eq!(text.cast::<f64>().unwrap(), 123.0);
    assert_eq!(Any::from(123).cast::<String>().unwrap(), "123");
    assert_eq!(Any::from(123.45).cast::<String>().unwrap(), "123.45");

    assert_eq!(Any::from(123).cast::<f64>().unwrap(), 123.0);
    assert_eq!(Any::from(123.45).cast::<i32>().unwrap(), 123);
    assert_eq!(Any::from(456.78f32).cast::<i32>().unwrap(), 456);
    assert_eq!(Any::from(789).cast::<f32>().unwrap(), 789.0);
    assert!((Any::from(321.65).cast::<f32>().unwrap() - 321.65f32).abs() < 1e-4);
    assert!((Any::from(654.32f32).cast::<f64>().unwrap() - 654.32).abs() < 0.001);
}

#[test]
fn test_cast_failure() {
    let err = Any::object().cast::<Label>().unwrap_err();
    assert_eq!(err.category(), "CastFailure");
}
