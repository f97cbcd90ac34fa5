//! JSON writer for [`Any`]
//!
//! Undefined values are skipped inside containers and print nothing at the
//! top level. With `indent >= 0` every element starts on a new line indented
//! by `indent` more spaces than its container, and the closing bracket sits
//! on its own line.

use crate::any::{format_float, Any, AnyValue};
use crate::kind::{Kind, MetaFunction};
use std::fmt::Write;

/// Serialize `value`; `indent < 0` is compact
pub fn stringify(value: &Any, indent: i32) -> String {
    let mut output = String::new();
    write_value(value, indent, 0, &mut output);
    output
}

fn write_value(value: &Any, indent: i32, current: i32, output: &mut String) {
    match value.value() {
        AnyValue::Undefined => {}
        AnyValue::Null => output.push_str("null"),
        AnyValue::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        AnyValue::Int8(v) => write_display(v, output),
        AnyValue::UInt8(v) => write_display(v, output),
        AnyValue::Int16(v) => write_display(v, output),
        AnyValue::UInt16(v) => write_display(v, output),
        AnyValue::Int32(v) => write_display(v, output),
        AnyValue::UInt32(v) => write_display(v, output),
        AnyValue::Int64(v) => write_display(v, output),
        AnyValue::UInt64(v) => write_display(v, output),
        AnyValue::Float32(v) => write_float(*v as f64, 7, output),
        AnyValue::Float64(v) => write_float(*v, 15, output),
        AnyValue::String(s) => escape_string(s, output),
        AnyValue::Array(_) => {
            let items = value.array_items();
            write_container(
                items.iter().filter(|v| !v.is_undefined()).map(|v| (None, v)),
                ('[', ']'),
                indent,
                current,
                output,
            );
        }
        AnyValue::Object(_) => {
            let entries = value.object_entries();
            write_container(
                entries
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (Some(k.as_str()), v)),
                ('{', '}'),
                indent,
                current,
                output,
            );
        }
        AnyValue::Class(class) => {
            let _ = write!(output, "\"<Class: {}>\"", class.name());
        }
        _ => write_fallback(value, indent, current, output),
    }
}

fn write_display(v: impl std::fmt::Display, output: &mut String) {
    let _ = write!(output, "{}", v);
}

fn write_float(v: f64, precision: usize, output: &mut String) {
    if v.is_finite() {
        output.push_str(&format_float(v, precision));
    } else {
        output.push_str("null");
    }
}

fn write_container<'a>(
    items: impl Iterator<Item = (Option<&'a str>, &'a Any)>,
    (open, close): (char, char),
    indent: i32,
    current: i32,
    output: &mut String,
) {
    let nested = current + indent;
    let start = output.len();
    output.push(open);
    let mut count = 0;
    for (key, item) in items {
        if count > 0 {
            output.push(',');
        }
        if indent >= 0 {
            output.push('\n');
            push_spaces(nested, output);
        }
        if let Some(key) = key {
            escape_string(key, output);
            output.push(':');
            if indent > 0 {
                output.push(' ');
            }
        }
        write_value(item, indent, nested, output);
        count += 1;
    }
    if count == 0 {
        output.truncate(start);
        output.push(open);
        output.push(close);
        return;
    }
    if indent >= 0 {
        output.push('\n');
        push_spaces(current, output);
    }
    output.push(close);
}

fn push_spaces(n: i32, output: &mut String) {
    output.extend(std::iter::repeat(' ').take(n.max(0) as usize));
}

/// Values without a JSON shape: their object form, their string form, or
/// a placeholder naming the class and address
fn write_fallback(value: &Any, indent: i32, current: i32, output: &mut String) {
    let class = value.class();
    if value.kind() == Kind::UserObject && class.contains_member(MetaFunction::ToObject.name()) {
        if let Ok(obj) = value.to_object() {
            write_value(&obj, indent, current, output);
            return;
        }
    }
    match value.try_to_string() {
        Ok(s) => escape_string(&s, output),
        Err(_) => {
            let _ = write!(output, "\"<{} at {:#x}>\"", class.name(), value.ptr());
        }
    }
}

/// Write `s` as a quoted JSON string
///
/// Escapes `"` `\` the short control escapes, other control characters as
/// `\u00XX`, and U+2028/U+2029.
fn escape_string(s: &str, output: &mut String) {
    output.push('"');
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\x08' => output.push_str("\\b"),
            '\x0C' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{2028}' => output.push_str("\\u2028"),
            '\u{2029}' => output.push_str("\\u2029"),
            c if (c as u32) <= 0x1F => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(stringify(&Any::null(), -1), "null");
        assert_eq!(stringify(&Any::undefined(), -1), "");
        assert_eq!(stringify(&Any::from(true), -1), "true");
        assert_eq!(stringify(&Any::from(-7i8), -1), "-7");
        assert_eq!(stringify(&Any::from(u64::MAX), -1), "18446744073709551615");
        assert_eq!(stringify(&Any::from(1.5f32), -1), "1.5");
        assert_eq!(stringify(&Any::from(0.1), -1), "0.1");
        assert_eq!(stringify(&Any::from(f64::NAN), -1), "null");
    }

    #[test]
    fn test_escapes() {
        let s = Any::from("a\"b\\c/\n\u{1}\u{2028}");
        assert_eq!(stringify(&s, -1), r#""a\"b\\c/\n\u0001\u2028""#);
    }

    #[test]
    fn test_compact_containers_skip_undefined() {
        let arr = Any::array_from(vec![Any::from(1), Any::undefined(), Any::from("x")]);
        assert_eq!(stringify(&arr, -1), r#"[1,"x"]"#);
        let obj = Any::object_from([("a", Any::from(1)), ("b", Any::undefined())]);
        assert_eq!(stringify(&obj, -1), r#"{"a":1}"#);
        assert_eq!(stringify(&Any::array(), 2), "[]");
        assert_eq!(stringify(&Any::object(), 2), "{}");
        let only_undefined = Any::array_from(vec![Any::undefined()]);
        assert_eq!(stringify(&only_undefined, -1), "[]");
    }

    #[test]
    fn test_indentation() {
        let obj = Any::object_from([
            ("a", Any::from(1)),
            ("b", Any::array_from(vec![Any::from(2), Any::from(3)])),
        ]);
        assert_eq!(
            stringify(&obj, 2),
            "{\n  \"a\": 1,\n  \"b\": [\n    2,\n    3\n  ]\n}"
        );
        assert_eq!(stringify(&obj, 0), "{\n\"a\":1,\n\"b\":[\n2,\n3\n]\n}");
    }
}
