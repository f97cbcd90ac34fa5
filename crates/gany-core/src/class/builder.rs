//! Fluent class registration
//!
//! ```ignore
//! registry
//!     .class::<Point>("geo", "Point", "2D point")
//!     .init(|x: f64, y: f64| Point { x, y }, "")
//!     .property_rw("x", |p: &Point| p.x, |p: &mut Point, v: f64| p.x = v, "")
//!     .method("length", |p: &Point| p.x.hypot(p.y), "")
//!     .build()?;
//! ```
//!
//! The first registration error is kept and returned by [`ClassBuilder::build`];
//! later steps are skipped.

use super::{ClassRef, Parent};
use crate::any::Any;
use crate::caster::Caster;
use crate::error::{GanyError, GanyResult};
use crate::function::{Callable, IntoFunction, IntoMethod};
use crate::registry::Registry;
use std::marker::PhantomData;

/// Builder over one class descriptor
///
/// `T` is the native type behind the class, [`Any`] for dynamic classes.
pub struct ClassBuilder<'r, T> {
    registry: &'r Registry,
    class: ClassRef,
    error: Option<GanyError>,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Caster> ClassBuilder<'r, T> {
    pub(crate) fn new(registry: &'r Registry, class: ClassRef) -> Self {
        Self {
            registry,
            class,
            error: None,
            _marker: PhantomData,
        }
    }

    fn step(mut self, f: impl FnOnce(&ClassRef, &Registry) -> GanyResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(&self.class, self.registry) {
                self.error = Some(e);
            }
        }
        self
    }

    fn register(self, name: &str, function: Any, doc: &str, is_method: bool) -> Self {
        self.step(|class, _| class.register_function(name, &function, doc, is_method))
    }

    /// The class under construction
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Register a method whose receiver arrives as the first argument
    pub fn func<M>(self, name: impl AsRef<str>, f: impl IntoFunction<M>, doc: &str) -> Self {
        let function = Any::from_callable(Callable::from_fn(self.registry, f));
        self.register(name.as_ref(), function, doc, true)
    }

    /// Register a method borrowing the native receiver
    pub fn method<M>(self, name: impl AsRef<str>, f: impl IntoMethod<T, M>, doc: &str) -> Self {
        let function = Any::from_callable(Callable::from_overloads(vec![
            f.into_overload(self.registry),
        ]));
        self.register(name.as_ref(), function, doc, true)
    }

    /// Register a function called without a receiver
    pub fn static_func<M>(self, name: impl AsRef<str>, f: impl IntoFunction<M>, doc: &str) -> Self {
        let function = Any::from_callable(Callable::from_fn(self.registry, f));
        self.register(name.as_ref(), function, doc, false)
    }

    /// Register an already built Function value
    pub fn function(self, name: impl AsRef<str>, function: Any, doc: &str, is_method: bool) -> Self {
        self.register(name.as_ref(), function, doc, is_method)
    }

    /// Register the constructor
    ///
    /// Native classes take a factory returning the value; dynamic classes
    /// take a body receiving the fresh instance first.
    pub fn init<M>(self, f: impl IntoFunction<M>, doc: &str) -> Self {
        let is_method = self.class.is_dynamic();
        let function = Any::from_callable(Callable::from_fn(self.registry, f));
        self.register(crate::kind::MetaFunction::Init.name(), function, doc, is_method)
    }

    /// Register a read-only property
    pub fn property<M>(self, name: &str, getter: impl IntoMethod<T, M>, doc: &str) -> Self {
        let getter = Any::from_callable(Callable::from_overloads(vec![
            getter.into_overload(self.registry),
        ]));
        self.step(|class, _| class.register_property(name, getter, Any::undefined(), doc))
    }

    /// Register a read-write property
    pub fn property_rw<MG, MS>(
        self,
        name: &str,
        getter: impl IntoMethod<T, MG>,
        setter: impl IntoMethod<T, MS>,
        doc: &str,
    ) -> Self {
        let getter = Any::from_callable(Callable::from_overloads(vec![
            getter.into_overload(self.registry),
        ]));
        let setter = Any::from_callable(Callable::from_overloads(vec![
            setter.into_overload(self.registry),
        ]));
        self.step(|class, _| class.register_property(name, getter, setter, doc))
    }

    /// Register a property from Function values; either may be Undefined
    pub fn property_fn(self, name: &str, getter: Any, setter: Any, doc: &str) -> Self {
        self.step(|class, _| class.register_property(name, getter, setter, doc))
    }

    /// Register an enum backed by `object`
    pub fn def_enum(self, name: &str, object: Any, doc: &str) -> Self {
        self.step(|class, _| class.def_enum(name, &object, doc))
    }

    /// Inherit from the class of the native type `P`
    pub fn inherit<P: Caster>(self) -> Self {
        self.step(|class, registry| {
            class.inherit(registry.class_instance(P::type_key()));
            Ok(())
        })
    }

    /// Inherit from `parent`
    pub fn inherit_class(self, parent: ClassRef) -> Self {
        self.step(|class, _| {
            class.inherit(parent);
            Ok(())
        })
    }

    /// Inherit from `P`, converting the receiver with `upcast`
    pub fn inherit_with<P, F>(self, upcast: F) -> Self
    where
        P: Caster,
        F: Fn(&T) -> P + Send + Sync + 'static,
    {
        let function = Any::variadic(move |args: &[Any]| {
            let this = args.first().cloned().unwrap_or_default();
            this.with_native::<T, _>(|t| upcast(t).into_any())
        });
        self.step(|class, registry| {
            let parent = registry.class_instance(P::type_key());
            class.inherit_parent(Parent::Upcast(parent, function));
            Ok(())
        })
    }

    /// Finish without publishing the class in the environment
    pub fn finish(self) -> GanyResult<ClassRef> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.class),
        }
    }

    /// Finish and publish the class in the environment
    pub fn build(self) -> GanyResult<ClassRef> {
        let registry = self.registry;
        let class = self.finish()?;
        registry.register_to_env(&class)?;
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GanyError;
    use crate::kind::MetaFunction;
    use crate::registry::{Registry, RegistryOptions};
    use crate::{Any, Caster};

    #[derive(Debug, Clone, PartialEq)]
    struct Meters(f64);

    impl Caster for Meters {}

    #[test]
    fn test_native_class() {
        let reg = Registry::new(RegistryOptions::default());
        let class = reg
            .class::<Meters>("units", "Meters", "length")
            .init(Meters, "")
            .property("value", |m: &Meters| m.0, "")
            .method("scale", |m: &mut Meters, by: f64| m.0 *= by, "")
            .func(MetaFunction::Addition, |a: Meters, b: Meters| Meters(a.0 + b.0), "")
            .build()
            .unwrap();
        assert_eq!(class.name(), "Meters");
        assert!(class.contains_member("__add"));
        assert!(reg.environment().get("units").contains("Meters"));
    }

    #[test]
    fn test_first_error_is_kept() {
        let reg = Registry::new(RegistryOptions::default());
        let err = reg
            .dynamic_class("", "Broken", "")
            .function("", Any::function(|| 1), "", false)
            .function("x", Any::from(1), "", false)
            .build()
            .unwrap_err();
        assert!(matches!(err, GanyError::RegistrationError(m) if m.contains("cannot be empty")));
    }
}
