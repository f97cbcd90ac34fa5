//! Scalar classes: integers, floats, bool, string and null
//!
//! Two numeric operands never reach these methods; the operator fast path
//! handles them. They serve mixed operands, where the right-hand side is
//! converted to the receiver's type first.

use super::builtin;
use crate::any::{Any, FLOAT_EPSILON};
use crate::error::{GanyError, GanyResult};
use crate::kind::MetaFunction;
use crate::registry::Registry;
use crate::type_key::TypeKey;

fn division_by_zero() -> GanyError {
    GanyError::OperatorNotSupported("Integer division by zero.".to_string())
}

macro_rules! register_integer {
    ($reg:expr, $t:ty, $name:literal) => {
        $reg.class::<$t>("", $name, stringify!($t))
            .init(|rh: Any| rh.cast::<$t>(), "")
            .func(MetaFunction::ToObject, |v: $t| v, "")
            .func(MetaFunction::EqualTo, |a: $t, b: $t| a == b, "")
            .func(MetaFunction::LessThan, |a: $t, b: $t| a < b, "")
            .func(
                MetaFunction::Addition,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a.wrapping_add(rh.cast::<$t>()?)) },
                "",
            )
            .func(
                MetaFunction::Subtraction,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a.wrapping_sub(rh.cast::<$t>()?)) },
                "",
            )
            .func(
                MetaFunction::Multiplication,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a.wrapping_mul(rh.cast::<$t>()?)) },
                "",
            )
            .func(
                MetaFunction::Division,
                |a: $t, rh: Any| -> GanyResult<$t> {
                    match rh.cast::<$t>()? {
                        0 => Err(division_by_zero()),
                        b => Ok(a.wrapping_div(b)),
                    }
                },
                "",
            )
            .func(
                MetaFunction::Modulo,
                |a: $t, b: $t| -> GanyResult<$t> {
                    match b {
                        0 => Err(division_by_zero()),
                        b => Ok(a.wrapping_rem(b)),
                    }
                },
                "",
            )
            .func(MetaFunction::Negate, |a: $t| a.wrapping_neg(), "")
            .func(MetaFunction::BitXor, |a: $t, b: $t| a ^ b, "")
            .func(MetaFunction::BitOr, |a: $t, b: $t| a | b, "")
            .func(MetaFunction::BitAnd, |a: $t, b: $t| a & b, "")
            .func(MetaFunction::BitNot, |a: $t| !a, "")
            .finish()?;
    };
}

macro_rules! register_float {
    ($reg:expr, $t:ty, $name:literal) => {
        $reg.class::<$t>("", $name, stringify!($t))
            .init(|rh: Any| rh.cast::<$t>(), "")
            .func(MetaFunction::ToObject, |v: $t| v, "")
            .func(
                MetaFunction::EqualTo,
                |a: $t, b: $t| ((a - b) as f64).abs() < FLOAT_EPSILON,
                "",
            )
            .func(MetaFunction::LessThan, |a: $t, b: $t| a < b, "")
            .func(
                MetaFunction::Addition,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a + rh.cast::<$t>()?) },
                "",
            )
            .func(
                MetaFunction::Subtraction,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a - rh.cast::<$t>()?) },
                "",
            )
            .func(
                MetaFunction::Multiplication,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a * rh.cast::<$t>()?) },
                "",
            )
            .func(
                MetaFunction::Division,
                |a: $t, rh: Any| -> GanyResult<$t> { Ok(a / rh.cast::<$t>()?) },
                "",
            )
            .func(MetaFunction::Negate, |a: $t| -a, "")
            .finish()?;
    };
}

fn char_at(s: &str, index: i32) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i))
        .map(String::from)
        .unwrap_or_default()
}

pub(super) fn register(reg: &Registry) -> GanyResult<()> {
    register_integer!(reg, i8, "int8");
    register_integer!(reg, u8, "uint8");
    register_integer!(reg, i16, "int16");
    register_integer!(reg, u16, "uint16");
    register_integer!(reg, i32, "int32");
    register_integer!(reg, u32, "uint32");
    register_integer!(reg, i64, "int64");
    register_integer!(reg, u64, "uint64");
    register_float!(reg, f32, "float");
    register_float!(reg, f64, "double");

    reg.class::<bool>("", "bool", "boolean")
        .init(|rh: Any| rh.to_bool(), "")
        .func(MetaFunction::ToObject, |v: bool| v, "")
        .func(MetaFunction::EqualTo, |a: bool, b: bool| a == b, "")
        .finish()?;

    reg.class::<String>("", "string", "string")
        .init(|rh: Any| rh.try_to_string(), "")
        .func(MetaFunction::ToObject, |s: String| s, "")
        .func(MetaFunction::Length, |s: String| s.chars().count() as u64, "")
        .func(MetaFunction::Addition, |a: String, b: String| a + &b, "")
        .func(MetaFunction::EqualTo, |a: String, b: String| a == b, "")
        .func(MetaFunction::LessThan, |a: String, b: String| a < b, "")
        .func(MetaFunction::GetItem, |s: String, index: i32| char_at(&s, index), "")
        .finish()?;

    builtin(reg, TypeKey::NULL, "null", "null")
        .func(MetaFunction::ToString, |_: Any| "null".to_string(), "")
        .func(MetaFunction::EqualTo, |a: Any, b: Any| a.is_null() && b.is_null(), "")
        .func(MetaFunction::LessThan, |_: Any, _: Any| false, "")
        .finish()?;
    Ok(())
}
