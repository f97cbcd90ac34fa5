//! Integration tests for operator and call dispatch
//!
//! Tests cover:
//! - The numeric fast path and its promotion rules
//! - Meta-method fallback for user types
//! - Function overloads, replacement and the convertible pass
//! - Error surfaces of failed dispatch

use gany_core::{registry, Any, Caster, GanyError, GanyResult, IntoFunction, MetaFunction};
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Caster for Vec2 {}

#[derive(Debug, Clone, PartialEq)]
struct Bag(Vec<i32>);

impl Caster for Bag {}

static REGISTER: Once = Once::new();

fn register_types() {
    REGISTER.call_once(|| {
        let reg = registry();
        reg.class::<Vec2>("math", "Vec2", "2D vector")
            .init(|x: f64, y: f64| Vec2 { x, y }, "")
            .func(
                MetaFunction::Addition,
                |a: Vec2, b: Vec2| Vec2 {
                    x: a.x + b.x,
                    y: a.y + b.y,
                },
                "",
            )
            .func(
                MetaFunction::Multiplication,
                |a: Vec2, k: f64| Vec2 {
                    x: a.x * k,
                    y: a.y * k,
                },
                "",
            )
            .func(MetaFunction::Negate, |a: Vec2| Vec2 { x: -a.x, y: -a.y }, "")
            .func(MetaFunction::EqualTo, |a: Vec2, b: Vec2| a == b, "")
            .func(
                MetaFunction::LessThan,
                |a: Vec2, b: Vec2| a.x * a.x + a.y * a.y < b.x * b.x + b.y * b.y,
                "",
            )
            .func(MetaFunction::ToString, |a: Vec2| format!("({}, {})", a.x, a.y), "")
            .func(
                MetaFunction::ToObject,
                |a: Vec2| Any::object_from([("x", Any::from(a.x)), ("y", Any::from(a.y))]),
                "",
            )
            .build()
            .unwrap();

        reg.class::<Bag>("", "Bag", "")
            .init(|| Bag(Vec::new()), "")
            .method("add", |b: &mut Bag, v: i32| b.0.push(v), "")
            .method(MetaFunction::Length, |b: &Bag| b.0.len() as u64, "")
            .method(
                MetaFunction::GetItem,
                |b: &Bag, i: i32| b.0.get(i as usize).copied().unwrap_or(-1),
                "",
            )
            .method(MetaFunction::ToInt32, |b: &Bag| b.0.iter().sum::<i32>(), "")
            .build()
            .unwrap();
    });
}

fn vec2(x: f64, y: f64) -> Any {
    Any::new(Vec2 { x, y })
}

// ============================================================================
// Numeric fast path
// ============================================================================

#[test]
fn test_integer_arithmetic() {
    let (a, b) = (Any::from(10), Any::from(5));
    assert_eq!(a.add(&b).unwrap().to_int32().unwrap(), 15);
    assert_eq!(a.sub(&b).unwrap().to_int32().unwrap(), 5);
    assert_eq!(a.mul(&b).unwrap().to_int32().unwrap(), 50);
    assert_eq!(a.div(&b).unwrap().to_int32().unwrap(), 2);
}

#[test]
fn test_mixed_width_promotion() {
    let r = Any::from(10).add(&Any::from(5.5)).unwrap();
    assert!(r.is_double());
    assert_eq!(r.to_double().unwrap(), 15.5);

    let r = Any::from(10i8).add(&Any::from(1i64)).unwrap();
    assert!(r.is_int64());
}

#[test]
fn test_unsigned_subtraction_wraps() {
    let r = Any::from(0u32).sub(&Any::from(1i32)).unwrap();
    assert!(r.is_unsigned());
    assert_eq!(r.to_int64().unwrap(), 4294967295);
}

// ============================================================================
// Meta-method fallback
// ============================================================================

#[test]
fn test_user_type_operators() {
    register_types();
    let (a, b) = (vec2(1.0, 2.0), vec2(3.0, 4.0));

    let sum = a.add(&b).unwrap();
    assert_eq!(sum.downcast::<Vec2>().unwrap(), Vec2 { x: 4.0, y: 6.0 });
    let scaled = a.mul(&Any::from(2)).unwrap();
    assert_eq!(scaled.downcast::<Vec2>().unwrap(), Vec2 { x: 2.0, y: 4.0 });
    assert_eq!(a.neg().unwrap().downcast::<Vec2>().unwrap().x, -1.0);

    assert!(a.equal_to(&vec2(1.0, 2.0)).unwrap());
    assert!(a.less_than(&b).unwrap());
    assert!(b.greater_than(&a).unwrap());
    assert_eq!(a.try_to_string().unwrap(), "(1, 2)");
    assert_eq!(a.to_json_string(-1), r#"{"x":1,"y":2}"#);
}

#[test]
fn test_missing_operator() {
    register_types();
    let err = vec2(1.0, 1.0).sub(&vec2(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, GanyError::OperatorNotSupported(_)));
    let err = Any::object().neg().unwrap_err();
    assert!(matches!(err, GanyError::OperatorNotSupported(_)));
}

#[test]
fn test_container_protocol() {
    register_types();
    let bag = Any::from_class(registry().class_instance(Bag::type_key()))
        .invoke(&[])
        .unwrap();
    bag.call("add", &[Any::from(4)]).unwrap();
    bag.call("add", &[Any::from(6)]).unwrap();
    assert_eq!(bag.length().unwrap(), 2);
    assert_eq!(bag.get(1).to_int32().unwrap(), 6);
    assert_eq!(bag.to_int32().unwrap(), 10);
}

#[test]
fn test_identity_without_eq() {
    register_types();
    let bag = Any::new(Bag(vec![1]));
    assert!(bag.equal_to(&bag.clone()).unwrap());
    assert!(!bag.equal_to(&Any::new(Bag(vec![1]))).unwrap());
}

// ============================================================================
// Overloads
// ============================================================================

#[test]
fn test_function_overloads() {
    let reg = registry();
    let f = Any::function(|a: i32| a + 1);
    let callable = f.as_function().unwrap();
    callable.merge((|a: i32, b: i32| a + b).into_overload(reg));
    callable.merge((|s: String| s + " World!").into_overload(reg));

    assert_eq!(f.invoke(&[Any::from(2)]).unwrap().to_int32().unwrap(), 3);
    assert_eq!(
        f.invoke(&[Any::from(2), Any::from(3)]).unwrap().to_int32().unwrap(),
        5
    );
    assert_eq!(
        f.invoke(&[Any::from("Hello")]).unwrap().try_to_string().unwrap(),
        "Hello World!"
    );
}

#[test]
fn test_replacement_keeps_chain() {
    let reg = registry();
    let f = Any::function(|a: i32| a);
    let callable = f.as_function().unwrap();
    callable.merge((|a: i32, b: i32| a * b).into_overload(reg));
    callable.merge((|a: i32| -a).into_overload(reg));

    assert_eq!(callable.overloads().len(), 2);
    assert_eq!(f.invoke(&[Any::from(3)]).unwrap().to_int32().unwrap(), -3);
    assert_eq!(
        f.invoke(&[Any::from(3), Any::from(4)]).unwrap().to_int32().unwrap(),
        12
    );
}

#[test]
fn test_convertible_pass() {
    let f = Any::function(|a: i64, b: f64| a as f64 + b);
    let r = f.invoke(&[Any::from("2"), Any::from(true)]).unwrap();
    assert_eq!(r.to_double().unwrap(), 3.0);
}

#[test]
fn test_no_matching_overload() {
    let f = Any::function(|a: i32, b: i32| a + b);
    let err = f.invoke(&[Any::from(1)]).unwrap_err();
    assert!(matches!(err, GanyError::NoMatchingOverload(_)));
}

#[test]
fn test_error_inside_body() {
    let f = Any::function(|a: i32| -> GanyResult<i32> {
        if a < 0 {
            return Err("negative input".into());
        }
        Ok(a)
    });
    let err = f.invoke(&[Any::from(-1)]).unwrap_err();
    assert!(err.to_string().contains("negative input"));
}
