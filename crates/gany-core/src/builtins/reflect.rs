//! Classes of the reflection values and the reflection enums

use super::builtin;
use crate::any::Any;
use crate::caster::Caster;
use crate::class::{ClassRef, Property};
use crate::error::GanyResult;
use crate::function::Callable;
use crate::kind::{Kind, MetaFunction};
use crate::registry::Registry;
use crate::type_key::TypeKey;

impl Caster for Kind {}

impl Caster for MetaFunction {}

fn callable(f: &Any) -> GanyResult<&Callable> {
    f.as_function().ok_or_else(|| f.mismatch::<Callable>())
}

fn describe_function(f: &Any) -> GanyResult<String> {
    let callable = callable(f)?;
    let name = callable.name();
    let label = if callable.is_method() { "Method" } else { "Function" };
    Ok(if name.is_empty() {
        format!("<{} at {:#x}>", label, f.ptr())
    } else {
        format!("<{}: {} at {:#x}>", label, name, f.ptr())
    })
}

fn what(e: &Any) -> GanyResult<String> {
    e.as_exception()
        .map(ToString::to_string)
        .ok_or_else(|| e.mismatch::<crate::error::GanyError>())
}

/// Name of a kind inside the `AnyType` enum
fn kind_key(kind: Kind) -> String {
    format!("{}_t", kind.name())
}

fn meta_key(meta: MetaFunction) -> String {
    format!("{:?}", meta)
}

pub(super) fn register(reg: &Registry) -> GanyResult<()> {
    builtin(reg, TypeKey::FUNCTION, "Function", "Function")
        .func(MetaFunction::ToString, |f: Any| describe_function(&f), "")
        .func(MetaFunction::EqualTo, |a: Any, b: Any| a.same_as(&b), "")
        .func("name", |f: Any| -> GanyResult<String> { Ok(callable(&f)?.name()) }, "")
        .func("isMethod", |f: Any| -> GanyResult<bool> { Ok(callable(&f)?.is_method()) }, "")
        .func("dump", |f: Any| callable(&f)?.dump(), "")
        .finish()?;

    builtin(reg, TypeKey::CLASS, "Class", "Class")
        .func("dump", |c: ClassRef| c.dump(), "")
        .finish()?;

    builtin(reg, TypeKey::EXCEPTION, "Exception", "Exception")
        .func(MetaFunction::ToString, |e: Any| what(&e), "")
        .func("what", |e: Any| what(&e), "")
        .finish()?;

    builtin(reg, TypeKey::PROPERTY, "Property", "Class property")
        .func(
            MetaFunction::ToObject,
            |p: Any| -> GanyResult<Any> {
                p.as_property()
                    .ok_or_else(|| p.mismatch::<Property>())?
                    .dump()
            },
            "",
        )
        .finish()?;

    builtin(reg, TypeKey::CALLER, "Caller", "Method bound to an instance").finish()?;

    let kinds = Any::object_from(Kind::ALL.iter().map(|k| (kind_key(*k), Any::new(*k))));
    reg.class::<Kind>("", "AnyType", "Value kinds.")
        .def_enum("Enum", kinds, "")
        .func(MetaFunction::ToString, |k: Kind| kind_key(k), "")
        .func(MetaFunction::EqualTo, |a: Kind, b: Kind| a == b, "")
        .func(MetaFunction::LessThan, |a: Kind, b: Kind| a < b, "")
        .func(MetaFunction::ToInt32, |k: Kind| k as i32, "")
        .build()?;

    let metas = Any::object_from(MetaFunction::ALL.iter().map(|m| (meta_key(*m), Any::new(*m))));
    reg.class::<MetaFunction>("", "MetaFunction", "Reserved member names.")
        .def_enum("Enum", metas, "")
        .func(MetaFunction::ToString, |m: MetaFunction| meta_key(m), "")
        .func(MetaFunction::EqualTo, |a: MetaFunction, b: MetaFunction| a == b, "")
        .func(
            MetaFunction::LessThan,
            |a: MetaFunction, b: MetaFunction| (a as u8) < (b as u8),
            "",
        )
        .func(MetaFunction::ToInt32, |m: MetaFunction| m as i32, "")
        .func("name", |m: MetaFunction| m.name().to_string(), "")
        .build()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::any::Any;
    use crate::error::GanyError;
    use crate::kind::Kind;
    use crate::registry::registry;

    #[test]
    fn test_function_class() {
        let _ = registry();
        let f = Any::function(|a: i32| a);
        let text = f.try_to_string().unwrap();
        assert!(text.starts_with("<Function at 0x"), "{text}");
        assert!(f.equal_to(&f.clone()).unwrap());
        assert!(!f.equal_to(&Any::function(|a: i32| a)).unwrap());
        assert!(!f.call("isMethod", &[]).unwrap().to_bool().unwrap());
        assert!(f.call("dump", &[]).unwrap().get("overloads").is_array());
    }

    #[test]
    fn test_exception_class() {
        let _ = registry();
        let e = Any::exception(GanyError::Runtime("boom".into()));
        assert_eq!(e.try_to_string().unwrap(), "boom");
        assert_eq!(e.call("what", &[]).unwrap().try_to_string().unwrap(), "boom");
    }

    #[test]
    fn test_reflection_enums() {
        let env = registry().environment();
        let int32 = env.get("AnyType").get("Enum").get("int32_t");
        assert_eq!(int32.to_int32().unwrap(), Kind::Int32 as i32);
        assert_eq!(int32.try_to_string().unwrap(), "int32_t");
        assert_eq!(int32.downcast::<Kind>().unwrap(), Kind::Int32);

        let add = env.get("MetaFunction").get("Addition");
        assert_eq!(add.call("name", &[]).unwrap().try_to_string().unwrap(), "__add");
        let init = env.get("MetaFunction").get("Init");
        assert!(init.less_than(&add).unwrap());
    }
}
