//! Operators
//!
//! Two numeric operands take the fast path: the wider kind wins
//! (Float64 > Float32 > Int64 > Int32 > Int16 > Int8) and the operation runs in
//! the unsigned domain when either operand is the unsigned variant of that
//! width. Integer arithmetic wraps. Everything else is routed to the
//! operator meta-method of the left operand's class.

use super::{Any, AnyValue};
use crate::error::{GanyError, GanyResult};
use crate::kind::{Kind, MetaFunction};

/// Float equality tolerance
pub const FLOAT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Xor,
    Or,
    And,
}

impl BinOp {
    fn meta(self) -> MetaFunction {
        match self {
            BinOp::Add => MetaFunction::Addition,
            BinOp::Sub => MetaFunction::Subtraction,
            BinOp::Mul => MetaFunction::Multiplication,
            BinOp::Div => MetaFunction::Division,
            BinOp::Rem => MetaFunction::Modulo,
            BinOp::Xor => MetaFunction::BitXor,
            BinOp::Or => MetaFunction::BitOr,
            BinOp::And => MetaFunction::BitAnd,
        }
    }
}

macro_rules! int_arith {
    ($t:ty, $op:expr, $a:expr, $b:expr) => {{
        let (x, y) = ($a as $t, $b as $t);
        match $op {
            BinOp::Add => Ok(Any::from(x.wrapping_add(y))),
            BinOp::Sub => Ok(Any::from(x.wrapping_sub(y))),
            BinOp::Mul => Ok(Any::from(x.wrapping_mul(y))),
            BinOp::Div if y == 0 => Err(division_by_zero()),
            BinOp::Div => Ok(Any::from(x.wrapping_div(y))),
            BinOp::Rem if y == 0 => Err(division_by_zero()),
            BinOp::Rem => Ok(Any::from(x.wrapping_rem(y))),
            BinOp::Xor => Ok(Any::from(x ^ y)),
            BinOp::Or => Ok(Any::from(x | y)),
            BinOp::And => Ok(Any::from(x & y)),
        }
    }};
}

macro_rules! float_arith {
    ($op:expr, $x:expr, $y:expr) => {{
        match $op {
            BinOp::Add => Some(Any::from($x + $y)),
            BinOp::Sub => Some(Any::from($x - $y)),
            BinOp::Mul => Some(Any::from($x * $y)),
            BinOp::Div => Some(Any::from($x / $y)),
            BinOp::Rem => Some(Any::from($x % $y)),
            _ => None,
        }
    }};
}

macro_rules! int_compare {
    ($t:ty, $a:expr, $b:expr) => {
        ($a as $t) < ($b as $t)
    };
}

fn division_by_zero() -> GanyError {
    GanyError::OperatorNotSupported("Integer division by zero.".to_string())
}

/// Widest numeric kind of the pair and whether the unsigned domain applies
fn numeric_width(a: &Any, b: &Any) -> Option<(Kind, bool)> {
    let (ka, kb) = (a.kind(), b.kind());
    if !ka.is_numeric() || !kb.is_numeric() {
        return None;
    }
    let kind = if ka.rank() >= kb.rank() { ka } else { kb };
    let unsigned = (ka == kind && a.is_unsigned()) || (kb == kind && b.is_unsigned());
    Some((kind, unsigned))
}

/// Truncate to the signed integer of the given width
fn truncate(v: i128, kind: Kind) -> i128 {
    match kind {
        Kind::Int8 => v as i8 as i128,
        Kind::Int16 => v as i16 as i128,
        Kind::Int32 => v as i32 as i128,
        _ => v as i64 as i128,
    }
}

impl Any {
    /// Integer payload widened without loss
    pub(crate) fn int_bits(&self) -> Option<i128> {
        Some(match self.value() {
            AnyValue::Int8(v) => *v as i128,
            AnyValue::UInt8(v) => *v as i128,
            AnyValue::Int16(v) => *v as i128,
            AnyValue::UInt16(v) => *v as i128,
            AnyValue::Int32(v) => *v as i128,
            AnyValue::UInt32(v) => *v as i128,
            AnyValue::Int64(v) => *v as i128,
            AnyValue::UInt64(v) => *v as i128,
            _ => return None,
        })
    }

    /// Numeric payload as f64
    pub(crate) fn float_bits(&self) -> Option<f64> {
        match self.value() {
            AnyValue::Float32(v) => Some(*v as f64),
            AnyValue::Float64(v) => Some(*v),
            _ => self.int_bits().map(|v| v as f64),
        }
    }

    fn binary(&self, rh: &Any, op: BinOp) -> GanyResult<Any> {
        if let Some((kind, unsigned)) = numeric_width(self, rh) {
            if kind.is_float() {
                let (x, y) = (self.float_bits().unwrap_or(0.0), rh.float_bits().unwrap_or(0.0));
                let fast = if kind == Kind::Float64 {
                    float_arith!(op, x, y)
                } else {
                    float_arith!(op, x as f32, y as f32)
                };
                if let Some(v) = fast {
                    return Ok(v);
                }
            } else {
                let (a, b) = (self.int_bits().unwrap_or(0), rh.int_bits().unwrap_or(0));
                return match (kind, unsigned) {
                    (Kind::Int64, true) => int_arith!(u64, op, a, b),
                    (Kind::Int64, false) => int_arith!(i64, op, a, b),
                    (Kind::Int32, true) => int_arith!(u32, op, a, b),
                    (Kind::Int32, false) => int_arith!(i32, op, a, b),
                    (Kind::Int16, true) => int_arith!(u16, op, a, b),
                    (Kind::Int16, false) => int_arith!(i16, op, a, b),
                    (_, true) => int_arith!(u8, op, a, b),
                    (_, false) => int_arith!(i8, op, a, b),
                };
            }
        }
        self.meta_binary(op.meta(), rh)
    }

    fn meta_binary(&self, meta: MetaFunction, rh: &Any) -> GanyResult<Any> {
        let class = self.class();
        if !class.contains_member(meta.name()) {
            return Err(GanyError::OperatorNotSupported(format!(
                "{} does not support operator {} with rh: {}.",
                class.name(),
                meta,
                rh.class_type_name()
            )));
        }
        let ret = class.call(self, meta.name(), std::slice::from_ref(rh))?;
        if ret.is_undefined() {
            return Err(GanyError::OperatorNotSupported(format!(
                "{} operator {} with rh: {} returned Undefined.",
                class.name(),
                meta,
                rh.class_type_name()
            )));
        }
        Ok(ret)
    }

    fn meta_unary(&self, meta: MetaFunction) -> GanyResult<Any> {
        let class = self.class();
        if !class.contains_member(meta.name()) {
            return Err(GanyError::OperatorNotSupported(format!(
                "{} does not support operator {}.",
                class.name(),
                meta
            )));
        }
        let ret = class.call(self, meta.name(), &[])?;
        if ret.is_undefined() {
            return Err(GanyError::OperatorNotSupported(format!(
                "{} operator {} returned Undefined.",
                class.name(),
                meta
            )));
        }
        Ok(ret)
    }

    fn meta_predicate(&self, meta: MetaFunction, rh: &Any) -> GanyResult<bool> {
        let class = self.class();
        let ret = class.call(self, meta.name(), std::slice::from_ref(rh))?;
        match ret.value() {
            AnyValue::Bool(b) => Ok(*b),
            _ => Err(GanyError::ContractViolation(format!(
                "{} operator {} with rh: {} returned {} instead of bool.",
                class.name(),
                meta,
                rh.class_type_name(),
                ret.class_type_name()
            ))),
        }
    }

    /// Unary minus
    pub fn neg(&self) -> GanyResult<Any> {
        Ok(match self.value() {
            AnyValue::Int8(v) => Any::from(v.wrapping_neg()),
            AnyValue::UInt8(v) => Any::from(v.wrapping_neg()),
            AnyValue::Int16(v) => Any::from(v.wrapping_neg()),
            AnyValue::UInt16(v) => Any::from(v.wrapping_neg()),
            AnyValue::Int32(v) => Any::from(v.wrapping_neg()),
            AnyValue::UInt32(v) => Any::from(v.wrapping_neg()),
            AnyValue::Int64(v) => Any::from(v.wrapping_neg()),
            AnyValue::UInt64(v) => Any::from(v.wrapping_neg()),
            AnyValue::Float32(v) => Any::from(-*v),
            AnyValue::Float64(v) => Any::from(-*v),
            _ => return self.meta_unary(MetaFunction::Negate),
        })
    }

    /// `self + rh`
    pub fn add(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Add)
    }

    /// `self - rh`
    pub fn sub(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Sub)
    }

    /// `self * rh`
    pub fn mul(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Mul)
    }

    /// `self / rh`; integer division by zero is an error
    pub fn div(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Div)
    }

    /// `self % rh`; floats use fmod semantics
    pub fn rem(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Rem)
    }

    /// `self ^ rh`
    pub fn bit_xor(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Xor)
    }

    /// `self | rh`
    pub fn bit_or(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::Or)
    }

    /// `self & rh`
    pub fn bit_and(&self, rh: &Any) -> GanyResult<Any> {
        self.binary(rh, BinOp::And)
    }

    /// `~self`
    pub fn bit_not(&self) -> GanyResult<Any> {
        Ok(match self.value() {
            AnyValue::Int8(v) => Any::from(!*v),
            AnyValue::UInt8(v) => Any::from(!*v),
            AnyValue::Int16(v) => Any::from(!*v),
            AnyValue::UInt16(v) => Any::from(!*v),
            AnyValue::Int32(v) => Any::from(!*v),
            AnyValue::UInt32(v) => Any::from(!*v),
            AnyValue::Int64(v) => Any::from(!*v),
            AnyValue::UInt64(v) => Any::from(!*v),
            _ => return self.meta_unary(MetaFunction::BitNot),
        })
    }

    /// `self == rh`
    ///
    /// Undefined and Null compare by kind. Floats compare within
    /// [`FLOAT_EPSILON`]. A class without `__eq` compares by identity.
    pub fn equal_to(&self, rh: &Any) -> GanyResult<bool> {
        if self.is_undefined() || self.is_null() || rh.is_undefined() || rh.is_null() {
            return Ok(self.kind() == rh.kind());
        }
        if let Some((kind, _)) = numeric_width(self, rh) {
            if kind.is_float() {
                let (x, y) = (self.float_bits().unwrap_or(0.0), rh.float_bits().unwrap_or(0.0));
                return Ok((x - y).abs() < FLOAT_EPSILON);
            }
            let (a, b) = (self.int_bits().unwrap_or(0), rh.int_bits().unwrap_or(0));
            return Ok(truncate(a, kind) == truncate(b, kind));
        }
        if !self.class().contains_member(MetaFunction::EqualTo.name()) {
            return Ok(self.same_as(rh));
        }
        self.meta_predicate(MetaFunction::EqualTo, rh)
    }

    /// `self < rh`
    pub fn less_than(&self, rh: &Any) -> GanyResult<bool> {
        if let Some((kind, unsigned)) = numeric_width(self, rh) {
            let (a, b) = (self.int_bits().unwrap_or(0), rh.int_bits().unwrap_or(0));
            return Ok(match (kind, unsigned) {
                (Kind::Float64, _) => {
                    self.float_bits().unwrap_or(0.0) < rh.float_bits().unwrap_or(0.0)
                }
                (Kind::Float32, _) => {
                    (self.float_bits().unwrap_or(0.0) as f32) < (rh.float_bits().unwrap_or(0.0) as f32)
                }
                (Kind::Int64, true) => int_compare!(u64, a, b),
                (Kind::Int64, false) => int_compare!(i64, a, b),
                (Kind::Int32, true) => int_compare!(u32, a, b),
                (Kind::Int32, false) => int_compare!(i32, a, b),
                (Kind::Int16, true) => int_compare!(u16, a, b),
                (Kind::Int16, false) => int_compare!(i16, a, b),
                (_, true) => int_compare!(u8, a, b),
                (_, false) => int_compare!(i8, a, b),
            });
        }
        self.meta_predicate(MetaFunction::LessThan, rh)
    }

    /// `self != rh`
    pub fn not_equal(&self, rh: &Any) -> GanyResult<bool> {
        Ok(!self.equal_to(rh)?)
    }

    /// `self > rh`
    pub fn greater_than(&self, rh: &Any) -> GanyResult<bool> {
        Ok(!(self.equal_to(rh)? || self.less_than(rh)?))
    }

    /// `self <= rh`
    pub fn less_equal(&self, rh: &Any) -> GanyResult<bool> {
        Ok(self.less_than(rh)? || self.equal_to(rh)?)
    }

    /// `self >= rh`
    pub fn greater_equal(&self, rh: &Any) -> GanyResult<bool> {
        Ok(!self.less_than(rh)?)
    }
}

macro_rules! impl_std_binop {
    ($trait:ident, $method:ident, $any_method:ident) => {
        impl std::ops::$trait<&Any> for &Any {
            type Output = GanyResult<Any>;

            fn $method(self, rh: &Any) -> Self::Output {
                self.$any_method(rh)
            }
        }
    };
}

impl_std_binop!(Add, add, add);
impl_std_binop!(Sub, sub, sub);
impl_std_binop!(Mul, mul, mul);
impl_std_binop!(Div, div, div);
impl_std_binop!(Rem, rem, rem);
impl_std_binop!(BitXor, bitxor, bit_xor);
impl_std_binop!(BitOr, bitor, bit_or);
impl_std_binop!(BitAnd, bitand, bit_and);

impl std::ops::Neg for &Any {
    type Output = GanyResult<Any>;

    fn neg(self) -> Self::Output {
        Any::neg(self)
    }
}

impl std::ops::Not for &Any {
    type Output = GanyResult<Any>;

    fn not(self) -> Self::Output {
        self.bit_not()
    }
}
