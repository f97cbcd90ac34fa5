//! Array, Object and Enum classes

use super::builtin;
use crate::any::Any;
use crate::error::GanyResult;
use crate::iterator::{ArrayIterator, ObjectIterator};
use crate::kind::MetaFunction;
use crate::registry::Registry;
use crate::type_key::TypeKey;
use std::collections::BTreeMap;
use tracing::warn;

/// Returns false when `ret` is the boolean `false`
fn keep_going(ret: &Any) -> bool {
    !(ret.is_bool() && !ret.to_bool().unwrap_or(true))
}

fn array_eq(a: &Any, b: &Any) -> bool {
    if !b.is_array() || a.size() != b.size() {
        return false;
    }
    for (x, y) in a.array_items().iter().zip(b.array_items().iter()) {
        match x.equal_to(y) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!("array comparison failed: {}", e);
                return false;
            }
        }
    }
    true
}

fn object_eq(a: &Any, b: &Any) -> bool {
    if !b.is_object() || a.size() != b.size() {
        return false;
    }
    for (k, v) in a.object_entries() {
        if !b.contains(k.as_str()) {
            return false;
        }
        match v.equal_to(&b.get(k.as_str())) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!("object comparison failed at {}: {}", k, e);
                return false;
            }
        }
    }
    true
}

/// Stable merge sort driven by a fallible "less than" callback
fn merge_sort(items: Vec<Any>, less: &dyn Fn(&Any, &Any) -> GanyResult<bool>) -> GanyResult<Vec<Any>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(left, less)?;
    let right = merge_sort(right, less)?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut l, mut r) = (left.into_iter().peekable(), right.into_iter().peekable());
    while let (Some(a), Some(b)) = (l.peek(), r.peek()) {
        if less(b, a)? {
            out.extend(r.next());
        } else {
            out.extend(l.next());
        }
    }
    out.extend(l);
    out.extend(r);
    Ok(out)
}

fn enum_object(e: &Any) -> GanyResult<Any> {
    e.as_enum()
        .map(|d| d.object().clone())
        .ok_or_else(|| e.mismatch::<crate::class::EnumDescriptor>())
}

fn for_each_entry(object: &Any, f: &Any) -> GanyResult<()> {
    for (k, v) in object.object_entries() {
        if !keep_going(&f.invoke(&[Any::from(k), v])?) {
            break;
        }
    }
    Ok(())
}

pub(super) fn register(reg: &Registry) -> GanyResult<()> {
    builtin(reg, TypeKey::ARRAY, "Array", "Ordered sequence")
        .func(
            MetaFunction::Addition,
            |a: Vec<Any>, b: Vec<Any>| a.into_iter().chain(b).collect::<Vec<_>>(),
            "",
        )
        .func(
            MetaFunction::Multiplication,
            |a: Vec<Any>, n: i32| {
                (0..n.max(0))
                    .flat_map(|_| a.iter().cloned())
                    .collect::<Vec<_>>()
            },
            "",
        )
        .func(MetaFunction::EqualTo, |a: Any, b: Any| array_eq(&a, &b), "")
        .func(
            "forEach",
            |this: Any, f: Any| -> GanyResult<()> {
                for item in this.array_items() {
                    if !keep_going(&f.invoke(&[item])?) {
                        break;
                    }
                }
                Ok(())
            },
            "Call f(value) per element until it returns false.",
        )
        .func(
            "insert",
            |this: Any, index: i32, value: Any| {
                if let Some(items) = this.array_body() {
                    let mut items = items.lock();
                    if let Some(i) = usize::try_from(index).ok().filter(|i| *i <= items.len()) {
                        items.insert(i, value);
                    }
                }
            },
            "",
        )
        .func(
            "sort",
            |this: Any, cmp: Any| -> GanyResult<()> {
                if !cmp.is_function() {
                    return Ok(());
                }
                let less = |a: &Any, b: &Any| cmp.invoke(&[a.clone(), b.clone()])?.to_bool();
                let sorted = merge_sort(this.array_items(), &less)?;
                if let Some(items) = this.array_body() {
                    *items.lock() = sorted;
                }
                Ok(())
            },
            "Sort in place with cmp(a, b) returning a < b.",
        )
        .func("iterator", |this: Any| ArrayIterator::new(this), "")
        .finish()?;

    builtin(reg, TypeKey::OBJECT, "Object", "String-keyed mapping")
        .func(
            MetaFunction::Addition,
            |a: BTreeMap<String, Any>, b: BTreeMap<String, Any>| {
                let mut merged = a;
                for (k, v) in b {
                    merged.entry(k).or_insert(v);
                }
                merged
            },
            "",
        )
        .func(MetaFunction::EqualTo, |a: Any, b: Any| object_eq(&a, &b), "")
        .func(
            "forEach",
            |this: Any, f: Any| for_each_entry(&this, &f),
            "Call f(key, value) per entry until it returns false.",
        )
        .func("iterator", |this: Any| ObjectIterator::new(this), "")
        .finish()?;

    builtin(reg, TypeKey::ENUM, "Enum", "Enum descriptor")
        .func(MetaFunction::ToObject, |e: Any| enum_object(&e), "")
        .func(
            "forEach",
            |e: Any, f: Any| -> GanyResult<()> { for_each_entry(&enum_object(&e)?, &f) },
            "",
        )
        .func(
            "iterator",
            |e: Any| -> GanyResult<ObjectIterator> { Ok(ObjectIterator::read_only(enum_object(&e)?)) },
            "",
        )
        .finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::any::Any;
    use crate::registry::registry;

    fn ints(values: &[i32]) -> Any {
        values.iter().copied().collect()
    }

    #[test]
    fn test_array_operators() {
        let _ = registry();
        let joined = ints(&[1, 2]).add(&ints(&[3])).unwrap();
        assert!(joined.equal_to(&ints(&[1, 2, 3])).unwrap());
        let repeated = ints(&[7]).mul(&Any::from(3)).unwrap();
        assert_eq!(repeated.size(), 3);
        assert!(!ints(&[1]).equal_to(&ints(&[1, 2])).unwrap());
    }

    #[test]
    fn test_array_methods() {
        let _ = registry();
        let array = ints(&[3, 1, 2]);
        array
            .call("sort", &[Any::function(|a: i32, b: i32| a < b)])
            .unwrap();
        assert_eq!(array.to_json_string(-1), "[1,2,3]");

        array.call("insert", &[Any::from(1), Any::from(9)]).unwrap();
        array.call("insert", &[Any::from(10), Any::from(9)]).unwrap();
        assert_eq!(array.to_json_string(-1), "[1,9,2,3]");

        let seen = Any::array();
        let sink = seen.clone();
        array
            .call(
                "forEach",
                &[Any::function(move |v: Any| {
                    sink.push_back(v.clone());
                    v.to_int32().unwrap_or(0) != 9
                })],
            )
            .unwrap();
        assert_eq!(seen.size(), 2);
    }

    #[test]
    fn test_object_merge_left_wins() {
        let _ = registry();
        let a = Any::object_from([("x", Any::from(1)), ("y", Any::from(2))]);
        let b = Any::object_from([("y", Any::from(20)), ("z", Any::from(30))]);
        let merged = a.add(&b).unwrap();
        assert_eq!(merged.to_json_string(-1), r#"{"x":1,"y":2,"z":30}"#);
        assert!(a.equal_to(&a.deep_clone()).unwrap());
        assert!(!a.equal_to(&b).unwrap());
    }

    #[test]
    fn test_object_for_each_and_iterator() {
        let _ = registry();
        let object = Any::object_from([("a", Any::from(1)), ("b", Any::from(2))]);
        let keys = Any::array();
        let sink = keys.clone();
        object
            .call(
                "forEach",
                &[Any::function(move |k: String, _v: Any| sink.push_back(k))],
            )
            .unwrap();
        assert_eq!(keys.to_json_string(-1), r#"["a","b"]"#);

        let it = object.iterator().unwrap();
        assert!(it.has_next().unwrap());
        assert_eq!(it.next().unwrap().first.try_to_string().unwrap(), "a");
    }
}
