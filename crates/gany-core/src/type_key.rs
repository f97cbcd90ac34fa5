//! Stable native type identity
//!
//! A [`TypeKey`] names a native type by a string that is identical in every
//! module built against the same crate version, so independently loaded
//! modules resolve the same type to the same class descriptor.

use crate::kind::Kind;
use std::fmt;

/// Identifies a native type across module boundaries
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    name: &'static str,
}

impl TypeKey {
    /// `()` and the undefined value
    pub const UNDEFINED: TypeKey = TypeKey::named("undefined");
    /// The null value
    pub const NULL: TypeKey = TypeKey::named("null");
    /// `bool`
    pub const BOOL: TypeKey = TypeKey::named("bool");
    /// `i8`
    pub const INT8: TypeKey = TypeKey::named("int8");
    /// `u8`
    pub const UINT8: TypeKey = TypeKey::named("uint8");
    /// `i16`
    pub const INT16: TypeKey = TypeKey::named("int16");
    /// `u16`
    pub const UINT16: TypeKey = TypeKey::named("uint16");
    /// `i32`
    pub const INT32: TypeKey = TypeKey::named("int32");
    /// `u32`
    pub const UINT32: TypeKey = TypeKey::named("uint32");
    /// `i64`
    pub const INT64: TypeKey = TypeKey::named("int64");
    /// `u64`
    pub const UINT64: TypeKey = TypeKey::named("uint64");
    /// `f32`
    pub const FLOAT: TypeKey = TypeKey::named("float");
    /// `f64`
    pub const DOUBLE: TypeKey = TypeKey::named("double");
    /// `String`
    pub const STRING: TypeKey = TypeKey::named("string");
    /// Array container
    pub const ARRAY: TypeKey = TypeKey::named("Array");
    /// Object container
    pub const OBJECT: TypeKey = TypeKey::named("Object");
    /// Function
    pub const FUNCTION: TypeKey = TypeKey::named("Function");
    /// Class descriptor
    pub const CLASS: TypeKey = TypeKey::named("Class");
    /// Property descriptor
    pub const PROPERTY: TypeKey = TypeKey::named("Property");
    /// Enum descriptor
    pub const ENUM: TypeKey = TypeKey::named("Enum");
    /// Captured error
    pub const EXCEPTION: TypeKey = TypeKey::named("Exception");
    /// Bound method
    pub const CALLER: TypeKey = TypeKey::named("Caller");
    /// The wildcard parameter type
    pub const ANY: TypeKey = TypeKey::named("Any");

    /// Keys with a fixed slot in the registry's fast-path table
    pub const BASIC: [TypeKey; 23] = [
        TypeKey::UNDEFINED,
        TypeKey::NULL,
        TypeKey::BOOL,
        TypeKey::INT8,
        TypeKey::UINT8,
        TypeKey::INT16,
        TypeKey::UINT16,
        TypeKey::INT32,
        TypeKey::UINT32,
        TypeKey::INT64,
        TypeKey::UINT64,
        TypeKey::FLOAT,
        TypeKey::DOUBLE,
        TypeKey::STRING,
        TypeKey::ARRAY,
        TypeKey::OBJECT,
        TypeKey::FUNCTION,
        TypeKey::CLASS,
        TypeKey::PROPERTY,
        TypeKey::ENUM,
        TypeKey::EXCEPTION,
        TypeKey::CALLER,
        TypeKey::ANY,
    ];

    /// Key with an explicit stable name
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }

    /// Key of a native type, named after its fully qualified path
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Stable name of the key
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Slot in [`TypeKey::BASIC`], if this is a built-in key
    pub fn basic_index(&self) -> Option<usize> {
        TypeKey::BASIC.iter().position(|k| k == self)
    }

    /// Returns true for built-in keys
    pub fn is_basic(&self) -> bool {
        self.basic_index().is_some()
    }

    /// Returns true for the wildcard key
    pub fn is_wildcard(&self) -> bool {
        *self == TypeKey::ANY
    }

    /// Returns true for the unsigned integer keys
    pub fn is_unsigned(&self) -> bool {
        matches!(
            *self,
            TypeKey::UINT8 | TypeKey::UINT16 | TypeKey::UINT32 | TypeKey::UINT64
        )
    }

    /// Kind of values boxed under this key
    pub fn kind(&self) -> Kind {
        match *self {
            TypeKey::UNDEFINED => Kind::Undefined,
            TypeKey::NULL => Kind::Null,
            TypeKey::BOOL => Kind::Bool,
            TypeKey::INT8 | TypeKey::UINT8 => Kind::Int8,
            TypeKey::INT16 | TypeKey::UINT16 => Kind::Int16,
            TypeKey::INT32 | TypeKey::UINT32 => Kind::Int32,
            TypeKey::INT64 | TypeKey::UINT64 => Kind::Int64,
            TypeKey::FLOAT => Kind::Float32,
            TypeKey::DOUBLE => Kind::Float64,
            TypeKey::STRING => Kind::String,
            TypeKey::ARRAY => Kind::Array,
            TypeKey::OBJECT => Kind::Object,
            TypeKey::FUNCTION => Kind::Function,
            TypeKey::CLASS => Kind::Class,
            TypeKey::PROPERTY => Kind::Property,
            TypeKey::ENUM => Kind::Enum,
            TypeKey::EXCEPTION => Kind::Exception,
            TypeKey::CALLER => Kind::Caller,
            _ => Kind::UserObject,
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Local;

    #[test]
    fn test_basic_keys_have_slots() {
        for (i, key) in TypeKey::BASIC.iter().enumerate() {
            assert_eq!(key.basic_index(), Some(i));
        }
        assert!(!TypeKey::of::<Local>().is_basic());
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(TypeKey::UINT32.kind(), Kind::Int32);
        assert_eq!(TypeKey::DOUBLE.kind(), Kind::Float64);
        assert_eq!(TypeKey::of::<Local>().kind(), Kind::UserObject);
        assert!(TypeKey::UINT8.is_unsigned());
        assert!(!TypeKey::INT8.is_unsigned());
    }

    #[test]
    fn test_of_is_stable() {
        assert_eq!(TypeKey::of::<Local>(), TypeKey::of::<Local>());
        assert!(TypeKey::of::<Local>().name().ends_with("Local"));
    }
}
