//! Gany dynamic value and reflection runtime
//!
//! This crate provides:
//! - `Any`: a dynamically typed, reference-counted value
//! - Class descriptors with overloaded functions, properties and enums
//! - Overload resolution with exact and convertible passes
//! - Operator dispatch with a numeric fast path and meta-method fallback
//! - JSON parsing and stringification
//! - A registry holding the class table and the environment

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod any;
mod builtins;
pub mod caster;
pub mod class;
pub mod error;
pub mod function;
pub mod iterator;
pub mod json;
pub mod kind;
pub mod module;
pub mod registry;
pub mod type_key;

pub use any::{Any, Caller, UserValue, FLOAT_EPSILON};
pub use caster::{Caster, IntoReturn};
pub use class::{ClassBuilder, ClassDescriptor, ClassRef, EnumDescriptor, Parent, Property};
pub use error::{GanyError, GanyResult};
pub use function::{Callable, IntoFunction, IntoMethod, Overload, Trampoline};
pub use iterator::{ArrayIterator, IteratorItem, ObjectIterator};
pub use kind::{Kind, MetaFunction};
pub use module::{
    register_module, version_string, GanyModule, GANY_VERSION_CODE, GANY_VERSION_MAJOR,
    GANY_VERSION_MINOR, GANY_VERSION_PATCH,
};
pub use registry::{install, registry, Registry, RegistryOptions};
pub use type_key::TypeKey;
