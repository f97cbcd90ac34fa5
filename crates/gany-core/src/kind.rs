//! Value kinds and reserved meta-function names

use std::fmt;

/// Discriminant of a dynamic value
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// No value
    Undefined = 0,
    /// Explicit null
    Null = 1,
    /// Boolean
    Bool = 2,
    /// 8-bit integer, signed or unsigned
    Int8 = 3,
    /// 16-bit integer, signed or unsigned
    Int16 = 4,
    /// 32-bit integer, signed or unsigned
    Int32 = 5,
    /// 64-bit integer, signed or unsigned
    Int64 = 6,
    /// 32-bit float
    Float32 = 7,
    /// 64-bit float
    Float64 = 8,
    /// UTF-8 string
    String = 9,
    /// Ordered sequence
    Array = 10,
    /// String-keyed mapping
    Object = 11,
    /// Callable function
    Function = 12,
    /// Class descriptor
    Class = 13,
    /// Property descriptor
    Property = 14,
    /// Enum descriptor
    Enum = 15,
    /// Captured error
    Exception = 16,
    /// Any value whose behavior comes from a registered class
    UserObject = 17,
    /// Method bound to an instance
    Caller = 18,
}

impl Kind {
    /// Every kind in discriminant order
    pub const ALL: [Kind; 19] = [
        Kind::Undefined,
        Kind::Null,
        Kind::Bool,
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::Float32,
        Kind::Float64,
        Kind::String,
        Kind::Array,
        Kind::Object,
        Kind::Function,
        Kind::Class,
        Kind::Property,
        Kind::Enum,
        Kind::Exception,
        Kind::UserObject,
        Kind::Caller,
    ];

    /// Lower-case kind name
    pub fn name(self) -> &'static str {
        match self {
            Kind::Undefined => "undefined",
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Float32 => "float",
            Kind::Float64 => "double",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Function => "function",
            Kind::Class => "class",
            Kind::Property => "property",
            Kind::Enum => "enum",
            Kind::Exception => "exception",
            Kind::UserObject => "user_obj",
            Kind::Caller => "caller",
        }
    }

    /// Returns true for the integer and floating point kinds
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Kind::Int8
                | Kind::Int16
                | Kind::Int32
                | Kind::Int64
                | Kind::Float32
                | Kind::Float64
        )
    }

    /// Returns true for Float32 and Float64
    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float32 | Kind::Float64)
    }

    /// Promotion rank used by the numeric fast path
    pub(crate) fn rank(self) -> u8 {
        match self {
            Kind::Int8 => 1,
            Kind::Int16 => 2,
            Kind::Int32 => 3,
            Kind::Int64 => 4,
            Kind::Float32 => 5,
            Kind::Float64 => 6,
            _ => 0,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reserved member names that drive operators and conversions
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaFunction {
    /// Constructor
    Init,
    /// Unary minus
    Negate,
    /// `+`
    Addition,
    /// `-`
    Subtraction,
    /// `*`
    Multiplication,
    /// `/`
    Division,
    /// `%`
    Modulo,
    /// `^`
    BitXor,
    /// `|`
    BitOr,
    /// `&`
    BitAnd,
    /// `~`
    BitNot,
    /// `==`
    EqualTo,
    /// `<`
    LessThan,
    /// Index read
    GetItem,
    /// Index write
    SetItem,
    /// Index removal
    DelItem,
    /// Length
    Length,
    /// String conversion
    ToString,
    /// int32 conversion
    ToInt32,
    /// int64 conversion
    ToInt64,
    /// double conversion
    ToDouble,
    /// bool conversion
    ToBoolean,
    /// Object conversion
    ToObject,
}

impl MetaFunction {
    /// Every meta function in declaration order
    pub const ALL: [MetaFunction; 23] = [
        MetaFunction::Init,
        MetaFunction::Negate,
        MetaFunction::Addition,
        MetaFunction::Subtraction,
        MetaFunction::Multiplication,
        MetaFunction::Division,
        MetaFunction::Modulo,
        MetaFunction::BitXor,
        MetaFunction::BitOr,
        MetaFunction::BitAnd,
        MetaFunction::BitNot,
        MetaFunction::EqualTo,
        MetaFunction::LessThan,
        MetaFunction::GetItem,
        MetaFunction::SetItem,
        MetaFunction::DelItem,
        MetaFunction::Length,
        MetaFunction::ToString,
        MetaFunction::ToInt32,
        MetaFunction::ToInt64,
        MetaFunction::ToDouble,
        MetaFunction::ToBoolean,
        MetaFunction::ToObject,
    ];

    /// Member name the function is registered under
    pub fn name(self) -> &'static str {
        match self {
            MetaFunction::Init => "__init",
            MetaFunction::Negate => "__neg",
            MetaFunction::Addition => "__add",
            MetaFunction::Subtraction => "__sub",
            MetaFunction::Multiplication => "__mul",
            MetaFunction::Division => "__div",
            MetaFunction::Modulo => "__mod",
            MetaFunction::BitXor => "__xor",
            MetaFunction::BitOr => "__or",
            MetaFunction::BitAnd => "__and",
            MetaFunction::BitNot => "__not",
            MetaFunction::EqualTo => "__eq",
            MetaFunction::LessThan => "__lt",
            MetaFunction::GetItem => "__getitem",
            MetaFunction::SetItem => "__setitem",
            MetaFunction::DelItem => "__delitem",
            MetaFunction::Length => "__len",
            MetaFunction::ToString => "__str",
            MetaFunction::ToInt32 => "__to_int32",
            MetaFunction::ToInt64 => "__to_int64",
            MetaFunction::ToDouble => "__to_double",
            MetaFunction::ToBoolean => "__to_bool",
            MetaFunction::ToObject => "__to_object",
        }
    }

    /// Reverse of [`MetaFunction::name`]
    pub fn from_name(name: &str) -> Option<MetaFunction> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl AsRef<str> for MetaFunction {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for MetaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminants_follow_order() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn test_promotion_rank() {
        assert!(Kind::Float64.rank() > Kind::Float32.rank());
        assert!(Kind::Float32.rank() > Kind::Int64.rank());
        assert!(Kind::Int16.rank() > Kind::Int8.rank());
        assert_eq!(Kind::String.rank(), 0);
    }

    #[test]
    fn test_meta_function_names() {
        assert_eq!(MetaFunction::Init.name(), "__init");
        assert_eq!(MetaFunction::Modulo.name(), "__mod");
        assert_eq!(MetaFunction::ToObject.to_string(), "__to_object");
        assert_eq!(MetaFunction::ALL.len(), 23);
    }
}
