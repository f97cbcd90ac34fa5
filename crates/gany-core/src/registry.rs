//! Class table and environment shared by every module
//!
//! A [`Registry`] owns the singleton [`ClassDescriptor`] of each native type
//! key and the root environment Object classes are published into. One
//! registry is active per process: [`registry`] creates a default one on
//! first use, and [`install`] lets a host inject its own before that.
//!
//! Basic kinds resolve through a fixed table indexed by
//! [`TypeKey::basic_index`]; every other key goes through a concurrent map.

use crate::any::Any;
use crate::caster::Caster;
use crate::class::{ClassBuilder, ClassDescriptor, ClassRef};
use crate::error::{GanyError, GanyResult};
use crate::function::{Callable, IntoFunction};
use crate::type_key::TypeKey;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use tracing::{debug, error};

/// Environment variable disabling the built-in classes
pub const ENV_NO_BUILTINS: &str = "GANY_NO_BUILTINS";

/// Environment variable accepting modules built against another version
pub const ENV_LAX_MODULES: &str = "GANY_LAX_MODULES";

/// Registry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Install the built-in classes on creation
    pub builtins: bool,
    /// Reject modules whose version code differs from this build
    pub strict_module_version: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            builtins: true,
            strict_module_version: true,
        }
    }
}

impl RegistryOptions {
    /// Defaults overridden by `GANY_NO_BUILTINS` and `GANY_LAX_MODULES`
    ///
    /// A variable counts as set unless it is empty, `0` or `false`.
    pub fn from_env() -> Self {
        let flag = |name: &str| {
            std::env::var(name)
                .map(|v| !matches!(v.trim(), "" | "0" | "false"))
                .unwrap_or(false)
        };
        Self {
            builtins: !flag(ENV_NO_BUILTINS),
            strict_module_version: !flag(ENV_LAX_MODULES),
        }
    }
}

/// Class table, environment and module table
pub struct Registry {
    options: RegistryOptions,
    basic: Vec<ClassRef>,
    classes: DashMap<TypeKey, ClassRef, BuildHasherDefault<FxHasher>>,
    environment: Any,
    env_lock: Mutex<()>,
    modules: Mutex<FxHashSet<String>>,
}

impl Registry {
    /// Create a registry, installing the built-in classes when enabled
    pub fn new(options: RegistryOptions) -> Arc<Self> {
        let registry = Arc::new(Self {
            options,
            basic: TypeKey::BASIC
                .iter()
                .map(|k| ClassDescriptor::native(*k))
                .collect(),
            classes: DashMap::with_hasher(BuildHasherDefault::default()),
            environment: Any::object_from([("_user", Any::object())]),
            env_lock: Mutex::new(()),
            modules: Mutex::new(FxHashSet::default()),
        });
        if options.builtins {
            if let Err(e) = crate::builtins::install(&registry) {
                error!("failed to install built-in classes: {}", e);
            }
        }
        debug!(builtins = options.builtins, "registry created");
        registry
    }

    /// Configuration the registry was created with
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Singleton class of `key`, created on first request
    pub fn class_instance(&self, key: TypeKey) -> ClassRef {
        if let Some(i) = key.basic_index() {
            if let Some(class) = self.basic.get(i) {
                return class.clone();
            }
        }
        self.classes
            .entry(key)
            .or_insert_with(|| ClassDescriptor::native(key))
            .clone()
    }

    /// Root environment Object
    pub fn environment(&self) -> Any {
        self.environment.clone()
    }

    /// Publish `class` in the environment
    ///
    /// Without a namespace the class lands at `env[name]`; otherwise at
    /// `env[namespace][name]`. Existing entries are never replaced, and
    /// classes without a name are ignored.
    pub fn register_to_env(&self, class: &ClassRef) -> GanyResult<()> {
        let (namespace, name) = (class.namespace(), class.name());
        if name.is_empty() {
            return Ok(());
        }
        let _guard = self.env_lock.lock();
        let mut scope = self.environment.clone();
        if !namespace.is_empty() {
            if !scope.contains(namespace.as_str()) {
                scope.set_item(namespace.as_str(), Any::object())?;
            }
            scope = scope.get_item(namespace.as_str())?;
            if !scope.is_object() {
                return Err(GanyError::RegistrationError(format!(
                    "Environment entry {} is not a namespace.",
                    namespace
                )));
            }
        }
        if !scope.contains(name.as_str()) {
            scope.set_item(name.as_str(), Any::from_class(class.clone()))?;
        }
        Ok(())
    }

    /// Parse JSON text; malformed input yields an empty Object
    pub fn parse_json(&self, text: &str) -> Any {
        crate::json::parse_or_empty(text)
    }

    /// Start registering the class of the native type `T`
    pub fn class<T: Caster>(&self, namespace: &str, name: &str, doc: &str) -> ClassBuilder<'_, T> {
        let class = self.class_instance(T::type_key());
        class.set_header(namespace, name, doc);
        ClassBuilder::new(self, class)
    }

    /// Start registering a class without a native representation
    pub fn dynamic_class(&self, namespace: &str, name: &str, doc: &str) -> ClassBuilder<'_, Any> {
        ClassBuilder::new(self, ClassDescriptor::dynamic(namespace, name, doc))
    }

    /// Wrap a native function, resolving classes through this registry
    pub fn function<M, F: IntoFunction<M>>(&self, f: F) -> Any {
        Any::from_callable(Callable::from_fn(self, f))
    }

    /// Record `name` as loaded; false if it already was
    pub(crate) fn mark_module(&self, name: &str) -> bool {
        self.modules.lock().insert(name.to_string())
    }

    /// Names of the modules registered so far
    pub fn modules(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.lock().iter().cloned().collect();
        names.sort();
        names
    }
}

static ACTIVE: OnceCell<Arc<Registry>> = OnceCell::new();

/// The active registry, created from the environment on first use
pub fn registry() -> &'static Arc<Registry> {
    ACTIVE.get_or_init(|| Registry::new(RegistryOptions::from_env()))
}

/// Make `registry` the active registry
///
/// Succeeds when nothing is active yet or when the same registry already is.
pub fn install(registry: Arc<Registry>) -> GanyResult<()> {
    match ACTIVE.set(registry) {
        Ok(()) => Ok(()),
        Err(rejected) => match ACTIVE.get() {
            Some(active) if Arc::ptr_eq(active, &rejected) => Ok(()),
            _ => Err(GanyError::RegistrationError(
                "A different registry is already active.".to_string(),
            )),
        },
    }
}
