//! Built-in classes
//!
//! Installed into every registry created with `builtins` enabled. Nothing
//! here may reach for the active registry: installation can run while the
//! active registry is still being initialized.

mod any_class;
mod containers;
mod numeric;
mod reflect;

use crate::any::Any;
use crate::class::ClassBuilder;
use crate::error::GanyResult;
use crate::registry::Registry;
use crate::type_key::TypeKey;
use std::sync::Arc;
use tracing::debug;

/// Register every built-in class into `reg`
pub(crate) fn install(reg: &Arc<Registry>) -> GanyResult<()> {
    numeric::register(reg)?;
    containers::register(reg)?;
    reflect::register(reg)?;
    crate::iterator::register(reg)?;
    any_class::register(reg)?;
    debug!("built-in classes installed");
    Ok(())
}

/// Builder for the class of a basic kind whose receiver is the value itself
fn builtin<'r>(reg: &'r Registry, key: TypeKey, name: &str, doc: &str) -> ClassBuilder<'r, Any> {
    let class = reg.class_instance(key);
    class.set_header("", name, doc);
    ClassBuilder::new(reg, class)
}
