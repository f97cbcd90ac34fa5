//! Kind-directed conversions
//!
//! Built-in kinds convert natively. Other kinds call the matching meta
//! function on their class, and a result of the wrong kind is a
//! `ContractViolation`.

use super::{Any, AnyValue};
use crate::class::ClassRef;
use crate::error::{GanyError, GanyResult};
use crate::kind::MetaFunction;

/// Format a float with `precision` significant digits, `%g` style
pub(crate) fn format_float(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, v))
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Leading integer of `s`, 0 when there is none
fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    s[..end].parse().unwrap_or(0)
}

/// Leading decimal number of `s`, 0 when there is none
fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    end = digits(end);
    if end < bytes.len() && bytes[end] == b'.' {
        end = digits(end + 1);
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'-' || bytes[exp] == b'+') {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

impl Any {
    fn contract(&self, what: &str, kind: &str) -> GanyError {
        GanyError::ContractViolation(format!(
            "{}: {} must return a {}.",
            self.class_type_name(),
            what,
            kind
        ))
    }

    fn call_meta(&self, meta: MetaFunction) -> GanyResult<Any> {
        self.class().call(self, meta.name(), &[])
    }

    /// String form of the value
    pub fn try_to_string(&self) -> GanyResult<String> {
        Ok(match self.value() {
            AnyValue::Undefined => "undefined".to_string(),
            AnyValue::Null => "null".to_string(),
            AnyValue::Bool(b) => b.to_string(),
            AnyValue::Int8(v) => v.to_string(),
            AnyValue::UInt8(v) => v.to_string(),
            AnyValue::Int16(v) => v.to_string(),
            AnyValue::UInt16(v) => v.to_string(),
            AnyValue::Int32(v) => v.to_string(),
            AnyValue::UInt32(v) => v.to_string(),
            AnyValue::Int64(v) => v.to_string(),
            AnyValue::UInt64(v) => v.to_string(),
            AnyValue::Float32(v) => format_float(*v as f64, 7),
            AnyValue::Float64(v) => format_float(*v, 15),
            AnyValue::String(s) => s.clone(),
            AnyValue::Array(_) | AnyValue::Class(_) => self.to_json_string(-1),
            AnyValue::Object(body)
                if body.class.get().map_or(true, |c| {
                    !c.contains_member(MetaFunction::ToString.name())
                }) =>
            {
                self.to_json_string(-1)
            }
            _ => {
                let ret = self.call_meta(MetaFunction::ToString)?;
                match ret.as_str() {
                    Some(s) => s.to_string(),
                    None => return Err(self.contract("toString", "string")),
                }
            }
        })
    }

    /// Convert to i32; strings parse their leading integer
    pub fn to_int32(&self) -> GanyResult<i32> {
        if let Some(v) = self.native_i64() {
            return Ok(v as i32);
        }
        let ret = self.call_meta(MetaFunction::ToInt32)?;
        match ret.value() {
            AnyValue::Int32(v) => Ok(*v),
            AnyValue::UInt32(v) => Ok(*v as i32),
            _ => Err(self.contract("toInt32", "int32")),
        }
    }

    /// Convert to i64; strings parse their leading integer
    pub fn to_int64(&self) -> GanyResult<i64> {
        if let Some(v) = self.native_i64() {
            return Ok(v);
        }
        let ret = self.call_meta(MetaFunction::ToInt64)?;
        match ret.value() {
            AnyValue::Int64(v) => Ok(*v),
            AnyValue::UInt64(v) => Ok(*v as i64),
            _ => Err(self.contract("toInt64", "int64")),
        }
    }

    /// Convert to i8
    pub fn to_int8(&self) -> GanyResult<i8> {
        Ok(self.to_int32()? as i8)
    }

    /// Convert to i16
    pub fn to_int16(&self) -> GanyResult<i16> {
        Ok(self.to_int32()? as i16)
    }

    /// Convert to f64; strings parse their leading number
    pub fn to_double(&self) -> GanyResult<f64> {
        match self.value() {
            AnyValue::Undefined | AnyValue::Null => return Ok(0.0),
            AnyValue::Bool(b) => return Ok(if *b { 1.0 } else { 0.0 }),
            AnyValue::String(s) => return Ok(parse_float_prefix(s)),
            _ => {}
        }
        if let Some(v) = self.float_bits() {
            return Ok(v);
        }
        let ret = self.call_meta(MetaFunction::ToDouble)?;
        match ret.value() {
            AnyValue::Float64(v) => Ok(*v),
            _ => Err(self.contract("toDouble", "double")),
        }
    }

    /// Convert to f32
    pub fn to_float(&self) -> GanyResult<f32> {
        Ok(self.to_double()? as f32)
    }

    /// Convert to bool; strings are true when non-empty
    pub fn to_bool(&self) -> GanyResult<bool> {
        match self.value() {
            AnyValue::Undefined | AnyValue::Null => return Ok(false),
            AnyValue::Bool(b) => return Ok(*b),
            AnyValue::String(s) => return Ok(!s.is_empty()),
            AnyValue::Float32(v) => return Ok(*v != 0.0),
            AnyValue::Float64(v) => return Ok(*v != 0.0),
            _ => {}
        }
        if let Some(v) = self.int_bits() {
            return Ok(v != 0);
        }
        let ret = self.call_meta(MetaFunction::ToBoolean)?;
        match ret.value() {
            AnyValue::Bool(b) => Ok(*b),
            _ => Err(self.contract("toBool", "bool")),
        }
    }

    /// Object or Array view of the value
    ///
    /// Undefined and Null give a new empty Object, containers give
    /// themselves, everything else calls `__to_object`.
    pub fn to_object(&self) -> GanyResult<Any> {
        match self.value() {
            AnyValue::Undefined | AnyValue::Null => Ok(Any::object()),
            AnyValue::Object(_) | AnyValue::Array(_) => Ok(self.clone()),
            _ => self.call_meta(MetaFunction::ToObject),
        }
    }

    /// Serialize as JSON; `indent < 0` is compact
    pub fn to_json_string(&self, indent: i32) -> String {
        crate::json::stringify(self, indent)
    }

    /// Parse JSON text; malformed input yields an empty Object
    pub fn parse_json(text: &str) -> Any {
        crate::json::parse_or_empty(text)
    }

    fn native_i64(&self) -> Option<i64> {
        match self.value() {
            AnyValue::Undefined | AnyValue::Null => Some(0),
            AnyValue::Bool(b) => Some(*b as i64),
            AnyValue::Float32(v) => Some(*v as i64),
            AnyValue::Float64(v) => Some(*v as i64),
            AnyValue::String(s) => Some(parse_int_prefix(s)),
            _ => self.int_bits().map(|v| v as i64),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Any {
                fn from(v: $t) -> Self {
                    Any::from_value(AnyValue::$variant(v))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => String,
}

impl From<&str> for Any {
    fn from(v: &str) -> Self {
        Any::from_value(AnyValue::String(v.to_string()))
    }
}

impl From<&String> for Any {
    fn from(v: &String) -> Self {
        Any::from_value(AnyValue::String(v.clone()))
    }
}

impl From<()> for Any {
    fn from(_: ()) -> Self {
        Any::undefined()
    }
}

impl From<&Any> for Any {
    fn from(v: &Any) -> Self {
        v.clone()
    }
}

impl From<ClassRef> for Any {
    fn from(v: ClassRef) -> Self {
        Any::from_class(v)
    }
}

impl From<Vec<Any>> for Any {
    fn from(v: Vec<Any>) -> Self {
        Any::array_from(v)
    }
}

impl From<GanyError> for Any {
    fn from(v: GanyError) -> Self {
        Any::exception(v)
    }
}
