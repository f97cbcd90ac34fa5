//! `AnyClass`: build dynamic classes from dynamic code
//!
//! ```text
//! let b = AnyClass("geo", "Point", "2D point")
//! b.func("__init", fn(self, x, y) { ... })
//!  .property("x", getter, setter)
//! AnyClass.registerToEnv(b.getClass())
//! ```

use crate::any::Any;
use crate::class::{ClassDescriptor, ClassRef};
use crate::error::{GanyError, GanyResult};
use crate::kind::MetaFunction;
use crate::registry::Registry;
use std::sync::{Arc, Weak};

const CLASS_SLOT: &str = "clazz";

fn target(this: &Any) -> GanyResult<ClassRef> {
    this.get(CLASS_SLOT).as_class().cloned().ok_or_else(|| {
        GanyError::Runtime("AnyClass instance has no class under construction.".to_string())
    })
}

fn add_function(this: Any, name: &str, f: &Any, doc: &str, is_method: bool) -> GanyResult<Any> {
    target(&this)?.register_function(name, f, doc, is_method)?;
    Ok(this)
}

fn add_property(this: Any, name: &str, getter: Any, setter: Any, doc: &str) -> GanyResult<Any> {
    target(&this)?.register_property(name, getter, setter, doc)?;
    Ok(this)
}

fn add_enum(this: Any, name: &str, object: &Any, doc: &str) -> GanyResult<Any> {
    target(&this)?.def_enum(name, object, doc)?;
    Ok(this)
}

fn inherit(this: Any, parent: Any) -> GanyResult<Any> {
    let class = target(&this)?;
    if let Some(p) = parent.as_class() {
        class.inherit(p.clone());
    } else if parent.is("AnyClass") {
        class.inherit(target(&parent)?);
    }
    Ok(this)
}

fn registry_of(weak: &Weak<Registry>) -> GanyResult<Arc<Registry>> {
    weak.upgrade()
        .ok_or_else(|| GanyError::Runtime("Registry has been dropped.".to_string()))
}

pub(super) fn register(reg: &Arc<Registry>) -> GanyResult<()> {
    let weak = Arc::downgrade(reg);
    reg.dynamic_class("", "AnyClass", "Class Registration Tool.")
        .init(
            |mut this: Any, namespace: String, name: String, doc: String| {
                this.set_item(CLASS_SLOT, ClassDescriptor::dynamic(&namespace, &name, &doc))
            },
            "",
        )
        .func("getClass", |this: Any| this.get(CLASS_SLOT), "")
        .func(
            "func",
            |this: Any, name: String, f: Any| add_function(this, &name, &f, "", true),
            "",
        )
        .func(
            "func",
            |this: Any, name: String, f: Any, doc: String| add_function(this, &name, &f, &doc, true),
            "",
        )
        .func(
            "func",
            |this: Any, meta: MetaFunction, f: Any| add_function(this, meta.name(), &f, "", true),
            "",
        )
        .func(
            "func",
            |this: Any, meta: MetaFunction, f: Any, doc: String| {
                add_function(this, meta.name(), &f, &doc, true)
            },
            "",
        )
        .func(
            "staticFunc",
            |this: Any, name: String, f: Any| add_function(this, &name, &f, "", false),
            "",
        )
        .func(
            "staticFunc",
            |this: Any, name: String, f: Any, doc: String| add_function(this, &name, &f, &doc, false),
            "",
        )
        .func(
            "staticFunc",
            |this: Any, meta: MetaFunction, f: Any| add_function(this, meta.name(), &f, "", false),
            "",
        )
        .func(
            "staticFunc",
            |this: Any, meta: MetaFunction, f: Any, doc: String| {
                add_function(this, meta.name(), &f, &doc, false)
            },
            "",
        )
        .func(
            "property",
            |this: Any, name: String, getter: Any, setter: Any| {
                add_property(this, &name, getter, setter, "")
            },
            "",
        )
        .func(
            "property",
            |this: Any, name: String, getter: Any, setter: Any, doc: String| {
                add_property(this, &name, getter, setter, &doc)
            },
            "",
        )
        .func(
            "defEnum",
            |this: Any, name: String, object: Any| add_enum(this, &name, &object, ""),
            "",
        )
        .func(
            "defEnum",
            |this: Any, name: String, object: Any, doc: String| add_enum(this, &name, &object, &doc),
            "",
        )
        .func("inherit", inherit, "")
        .static_func(
            "registerToEnv",
            move |class: ClassRef| registry_of(&weak)?.register_to_env(&class),
            "",
        )
        .build()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::any::Any;
    use crate::registry::registry;

    fn any_class() -> Any {
        registry().environment().get("AnyClass")
    }

    #[test]
    fn test_build_dynamic_class() {
        let builder = any_class()
            .invoke(&["shapes".into(), "Square".into(), "a square".into()])
            .unwrap();
        builder
            .call(
                "func",
                &[
                    "__init".into(),
                    Any::function(|mut this: Any, side: f64| this.set_item("side", side)),
                ],
            )
            .unwrap()
            .call(
                "func",
                &[
                    "area".into(),
                    Any::function(|this: Any| -> crate::GanyResult<f64> {
                        let side = this.get("side").to_double()?;
                        Ok(side * side)
                    }),
                    "Area of the square.".into(),
                ],
            )
            .unwrap();

        let class = builder.call("getClass", &[]).unwrap();
        assert!(class.is_class());
        let square = class.invoke(&[Any::from(3.0)]).unwrap();
        assert!(square.is("Square"));
        assert_eq!(square.call("area", &[]).unwrap().to_double().unwrap(), 9.0);

        any_class().call("registerToEnv", &[class]).unwrap();
        assert!(registry().environment().get("shapes").contains("Square"));
    }

    #[test]
    fn test_inherit_from_another_builder() {
        let base = any_class()
            .invoke(&["".into(), "Animal".into(), "".into()])
            .unwrap();
        base.call(
            "func",
            &["legs".into(), Any::function(|_this: Any| 4)],
        )
        .unwrap();

        let derived = any_class()
            .invoke(&["".into(), "Dog".into(), "".into()])
            .unwrap();
        derived.call("inherit", &[base]).unwrap();
        derived
            .call("func", &["__init".into(), Any::function(|_this: Any| ())])
            .unwrap();

        let dog = derived.call("getClass", &[]).unwrap().invoke(&[]).unwrap();
        assert_eq!(dog.call("legs", &[]).unwrap().to_int32().unwrap(), 4);
    }
}
