//! Type-erasure bridge between native types and [`Any`]
//!
//! Every native type that crosses into the dynamic world implements
//! [`Caster`]. The default methods box the value as a user object under
//! [`TypeKey::of`], so a plain struct only needs `impl Caster for Point {}`.
//!
//! Extraction comes in two strengths:
//! - [`Any::downcast`]: exact type only, fails with `TypeMismatch`
//! - [`Any::cast`]: exact, then the inheritance upcast chain, then
//!   [`Caster::convert`], fails with `CastFailure`

use crate::any::{Any, AnyValue};
use crate::class::ClassRef;
use crate::error::{GanyError, GanyResult};
use crate::registry::registry;
use crate::type_key::TypeKey;
use std::collections::{BTreeMap, HashMap};

/// Box and unbox rules for a native type
pub trait Caster: Clone + Send + Sync + Sized + 'static {
    /// Key the type is registered under
    fn type_key() -> TypeKey {
        TypeKey::of::<Self>()
    }

    /// Box the value
    fn into_any(self) -> Any {
        Any::from_user(Self::type_key(), self)
    }

    /// Exact extraction
    fn try_as(any: &Any) -> Option<Self> {
        any.with_native::<Self, _>(Clone::clone).ok()
    }

    /// Lossy conversion from another kind
    fn convert(_any: &Any) -> Option<Self> {
        None
    }
}

macro_rules! impl_scalar_caster {
    ($($t:ty => $key:ident, $variant:ident, |$a:ident| $conv:expr;)*) => {
        $(
            impl Caster for $t {
                fn type_key() -> TypeKey {
                    TypeKey::$key
                }

                fn into_any(self) -> Any {
                    Any::from(self)
                }

                fn try_as(any: &Any) -> Option<Self> {
                    match any.value() {
                        AnyValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }

                fn convert($a: &Any) -> Option<Self> {
                    $conv
                }
            }
        )*
    };
}

impl_scalar_caster! {
    bool => BOOL, Bool, |a| a.to_bool().ok();
    i8 => INT8, Int8, |a| a.to_int32().ok().map(|v| v as i8);
    u8 => UINT8, UInt8, |a| a.to_int32().ok().map(|v| v as u8);
    i16 => INT16, Int16, |a| a.to_int32().ok().map(|v| v as i16);
    u16 => UINT16, UInt16, |a| a.to_int32().ok().map(|v| v as u16);
    i32 => INT32, Int32, |a| a.to_int32().ok();
    u32 => UINT32, UInt32, |a| a.to_int64().ok().map(|v| v as u32);
    i64 => INT64, Int64, |a| a.to_int64().ok();
    u64 => UINT64, UInt64, |a| a.to_int64().ok().map(|v| v as u64);
    f32 => FLOAT, Float32, |a| a.to_float().ok();
    f64 => DOUBLE, Float64, |a| a.to_double().ok();
    String => STRING, String, |a| a.try_to_string().ok();
}

impl Caster for () {
    fn type_key() -> TypeKey {
        TypeKey::UNDEFINED
    }

    fn into_any(self) -> Any {
        Any::undefined()
    }

    fn try_as(any: &Any) -> Option<Self> {
        any.is_undefined().then_some(())
    }

    fn convert(_any: &Any) -> Option<Self> {
        Some(())
    }
}

impl Caster for Any {
    fn type_key() -> TypeKey {
        TypeKey::ANY
    }

    fn into_any(self) -> Any {
        self
    }

    fn try_as(any: &Any) -> Option<Self> {
        Some(any.clone())
    }
}

impl Caster for ClassRef {
    fn type_key() -> TypeKey {
        TypeKey::CLASS
    }

    fn into_any(self) -> Any {
        Any::from_class(self)
    }

    fn try_as(any: &Any) -> Option<Self> {
        any.as_class().cloned()
    }
}

impl<T: Caster> Caster for Vec<T> {
    fn type_key() -> TypeKey {
        TypeKey::ARRAY
    }

    fn into_any(self) -> Any {
        Any::array_from(self.into_iter().map(Caster::into_any).collect())
    }

    fn try_as(any: &Any) -> Option<Self> {
        if !any.is_array() {
            return None;
        }
        any.array_items().iter().map(T::try_as).collect()
    }

    fn convert(any: &Any) -> Option<Self> {
        if !any.is_array() {
            return None;
        }
        any.array_items().iter().map(|v| v.cast::<T>().ok()).collect()
    }
}

macro_rules! impl_map_caster {
    ($($map:ident),*) => {
        $(
            impl<T: Caster> Caster for $map<String, T> {
                fn type_key() -> TypeKey {
                    TypeKey::OBJECT
                }

                fn into_any(self) -> Any {
                    Any::object_from(self.into_iter().map(|(k, v)| (k, v.into_any())))
                }

                fn try_as(any: &Any) -> Option<Self> {
                    if !any.is_object() {
                        return None;
                    }
                    any.object_entries()
                        .into_iter()
                        .map(|(k, v)| T::try_as(&v).map(|v| (k, v)))
                        .collect()
                }

                fn convert(any: &Any) -> Option<Self> {
                    if !any.is_object() {
                        return None;
                    }
                    any.object_entries()
                        .into_iter()
                        .map(|(k, v)| v.cast::<T>().ok().map(|v| (k, v)))
                        .collect()
                }
            }
        )*
    };
}

impl_map_caster!(HashMap, BTreeMap);

impl<T: Caster> Caster for Option<T> {
    fn type_key() -> TypeKey {
        T::type_key()
    }

    fn into_any(self) -> Any {
        match self {
            Some(v) => v.into_any(),
            None => Any::null(),
        }
    }

    fn try_as(any: &Any) -> Option<Self> {
        if any.is_null() || any.is_undefined() {
            return Some(None);
        }
        T::try_as(any).map(Some)
    }

    fn convert(any: &Any) -> Option<Self> {
        any.cast::<T>().ok().map(Some)
    }
}

/// Values a native function may return
pub trait IntoReturn {
    /// Key of the returned type, used in signatures
    fn return_key() -> TypeKey;

    /// Box the returned value, propagating errors
    fn into_return(self) -> GanyResult<Any>;
}

impl<T: Caster> IntoReturn for T {
    fn return_key() -> TypeKey {
        T::type_key()
    }

    fn into_return(self) -> GanyResult<Any> {
        Ok(self.into_any())
    }
}

impl<T: Caster> IntoReturn for GanyResult<T> {
    fn return_key() -> TypeKey {
        T::type_key()
    }

    fn into_return(self) -> GanyResult<Any> {
        self.map(Caster::into_any)
    }
}

impl Any {
    /// Exact extraction of `T`
    pub fn downcast<T: Caster>(&self) -> GanyResult<T> {
        T::try_as(self).ok_or_else(|| GanyError::TypeMismatch {
            expected: T::type_key().name().to_string(),
            got: self.class_type_name(),
        })
    }

    /// Convertible extraction of `T`
    pub fn cast<T: Caster>(&self) -> GanyResult<T> {
        if let Some(v) = T::try_as(self) {
            return Ok(v);
        }
        let target = registry().class_instance(T::type_key());
        let base = self.class().cast_to_base(&target, self);
        if !base.is_undefined() {
            if let Some(v) = T::try_as(&base) {
                return Ok(v);
            }
        }
        T::convert(self).ok_or_else(|| GanyError::CastFailure {
            from: self.class_type_name(),
            to: T::type_key().name().to_string(),
        })
    }

    /// Returns true if the boxed value is exactly a `T`
    pub fn is_type<T: Caster>(&self) -> bool {
        T::type_key().is_wildcard() || self.type_key() == T::type_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Caster for Point {}

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(Any::new(true).downcast::<bool>().unwrap(), true);
        assert_eq!(Any::new(-5i8).downcast::<i8>().unwrap(), -5);
        assert_eq!(Any::new(250u8).downcast::<u8>().unwrap(), 250);
        assert_eq!(Any::new(-300i16).downcast::<i16>().unwrap(), -300);
        assert_eq!(Any::new(60000u16).downcast::<u16>().unwrap(), 60000);
        assert_eq!(Any::new(i32::MIN).downcast::<i32>().unwrap(), i32::MIN);
        assert_eq!(Any::new(u32::MAX).downcast::<u32>().unwrap(), u32::MAX);
        assert_eq!(Any::new(i64::MAX).downcast::<i64>().unwrap(), i64::MAX);
        assert_eq!(Any::new(u64::MAX).downcast::<u64>().unwrap(), u64::MAX);
        assert_eq!(Any::new(1.5f32).downcast::<f32>().unwrap(), 1.5);
        assert_eq!(Any::new(2.25f64).downcast::<f64>().unwrap(), 2.25);
        assert_eq!(Any::new("hi".to_string()).downcast::<String>().unwrap(), "hi");
    }

    #[test]
    fn test_downcast_is_exact() {
        let err = Any::from(1i32).downcast::<i64>().unwrap_err();
        assert!(matches!(err, GanyError::TypeMismatch { .. }));
        assert!(Any::from(1i32).downcast::<u32>().is_err());
    }

    #[test]
    fn test_cast_converts() {
        assert_eq!(Any::from("123").cast::<i32>().unwrap(), 123);
        assert_eq!(Any::from("123.45").cast::<f64>().unwrap(), 123.45);
        assert_eq!(Any::from(123).cast::<String>().unwrap(), "123");
        assert_eq!(Any::from(123.45).cast::<String>().unwrap(), "123.45");
        assert_eq!(Any::from(456.78f32).cast::<i32>().unwrap(), 456);
    }

    #[test]
    fn test_user_value_round_trip() {
        let p = Point { x: 1, y: 2 };
        let boxed = Any::new(p.clone());
        assert!(boxed.is_user_object());
        assert!(boxed.is_type::<Point>());
        assert_eq!(boxed.downcast::<Point>().unwrap(), p);
        let err = Any::from(1).cast::<Point>().unwrap_err();
        assert!(matches!(err, GanyError::CastFailure { .. }));
    }

    #[test]
    fn test_containers() {
        let v = Any::new(vec![1, 2, 3]);
        assert!(v.is_array());
        assert_eq!(v.downcast::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
        assert_eq!(v.cast::<Vec<i64>>().unwrap(), vec![1i64, 2, 3]);

        let mut m = HashMap::new();
        m.insert("a".to_string(), 1.5);
        let o = Any::new(m.clone());
        assert!(o.is_object());
        assert_eq!(o.downcast::<HashMap<String, f64>>().unwrap(), m);
    }

    #[test]
    fn test_option() {
        assert_eq!(Any::null().downcast::<Option<i32>>().unwrap(), None);
        assert_eq!(Any::from(4).downcast::<Option<i32>>().unwrap(), Some(4));
        assert!(Any::new(None::<i32>).is_null());
    }

    #[test]
    fn test_into_return_propagates() {
        let ok: GanyResult<i32> = Ok(3);
        assert_eq!(ok.into_return().unwrap().to_int32().unwrap(), 3);
        let err: GanyResult<i32> = Err("bad".into());
        assert!(err.into_return().is_err());
    }
}
