//! Class descriptors
//!
//! A [`ClassDescriptor`] holds the reflection metadata of one type: its
//! identity, a member table (functions, properties, enums and flattened enum
//! values) and an ordered parent list. Member resolution is local first, then
//! each parent in registration order; the first success wins.
//!
//! Descriptors are shared as [`ClassRef`] and mutated in place while a module
//! registers, so every table sits behind its own lock.

mod builder;
mod dump;

pub use builder::ClassBuilder;

use crate::any::{Any, AnyValue, Caller};
use crate::error::{GanyError, GanyResult};
use crate::function::{Callable, Overload};
use crate::kind::{Kind, MetaFunction};
use crate::type_key::TypeKey;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Shared class descriptor
pub type ClassRef = Arc<ClassDescriptor>;

/// One entry of a class's parent list
#[derive(Clone)]
pub enum Parent {
    /// The instance is used as-is
    Direct(ClassRef),
    /// The instance is converted by the function before use
    Upcast(ClassRef, Any),
}

impl Parent {
    /// The parent class
    pub fn class(&self) -> &ClassRef {
        match self {
            Parent::Direct(c) | Parent::Upcast(c, _) => c,
        }
    }

    /// Convert `inst` into the parent's representation
    fn view(&self, inst: &Any) -> GanyResult<Any> {
        match self {
            Parent::Direct(_) => Ok(inst.clone()),
            Parent::Upcast(_, _) if inst.is_undefined() => Ok(Any::undefined()),
            Parent::Upcast(_, f) => f.invoke(std::slice::from_ref(inst)),
        }
    }
}

/// Accessor pair exposed as a member
#[derive(Clone)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) getter: Any,
    pub(crate) setter: Any,
}

impl Property {
    /// Build a property; `getter`/`setter` are Functions or Undefined
    pub fn new(name: impl Into<String>, doc: impl Into<String>, getter: Any, setter: Any) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            getter,
            setter,
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Getter function, Undefined when write-only
    pub fn getter(&self) -> &Any {
        &self.getter
    }

    /// Setter function, Undefined when read-only
    pub fn setter(&self) -> &Any {
        &self.setter
    }
}

/// Named set of constants backed by an Object
#[derive(Clone)]
pub struct EnumDescriptor {
    pub(crate) name: String,
    pub(crate) doc: String,
    pub(crate) object: Any,
}

impl EnumDescriptor {
    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Backing object mapping constant names to values
    pub fn object(&self) -> &Any {
        &self.object
    }
}

struct Header {
    namespace: String,
    name: String,
    doc: String,
    hash: u64,
}

impl Header {
    fn new(namespace: &str, name: &str, doc: &str) -> Self {
        let mut hasher = FxHasher::default();
        namespace.hash(&mut hasher);
        name.hash(&mut hasher);
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            doc: doc.to_string(),
            hash: hasher.finish(),
        }
    }
}

/// Reflection metadata of one type
pub struct ClassDescriptor {
    this: Weak<ClassDescriptor>,
    key: Option<TypeKey>,
    header: RwLock<Header>,
    attributes: RwLock<FxHashMap<String, Any>>,
    parents: RwLock<Vec<Parent>>,
    init: RwLock<Option<Any>>,
    get_item: RwLock<Option<Any>>,
    set_item: RwLock<Option<Any>>,
}

impl ClassDescriptor {
    fn build(key: Option<TypeKey>, namespace: &str, name: &str, doc: &str) -> ClassRef {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            key,
            header: RwLock::new(Header::new(namespace, name, doc)),
            attributes: RwLock::new(FxHashMap::default()),
            parents: RwLock::new(Vec::new()),
            init: RwLock::new(None),
            get_item: RwLock::new(None),
            set_item: RwLock::new(None),
        })
    }

    /// Descriptor of a native type, named after its key
    pub(crate) fn native(key: TypeKey) -> ClassRef {
        Self::build(Some(key), "", key.name(), "")
    }

    /// Descriptor without a native representation
    ///
    /// Instances are Objects tagged with the class, created by its `__init`.
    pub fn dynamic(namespace: &str, name: &str, doc: &str) -> ClassRef {
        Self::build(None, namespace, name, doc)
    }

    /// Native key; None for dynamic classes
    pub fn type_key(&self) -> Option<TypeKey> {
        self.key
    }

    /// Kind of the values this class describes
    pub fn kind(&self) -> Kind {
        self.key.map_or(Kind::UserObject, |k| k.kind())
    }

    /// Returns true for classes without a native representation
    pub fn is_dynamic(&self) -> bool {
        self.key.is_none()
    }

    /// Returns true for the class matching any argument
    pub fn is_wildcard(&self) -> bool {
        self.key.map_or(false, |k| k.is_wildcard())
    }

    /// Class name
    pub fn name(&self) -> String {
        self.header.read().name.clone()
    }

    /// Namespace
    pub fn namespace(&self) -> String {
        self.header.read().namespace.clone()
    }

    /// Documentation
    pub fn doc(&self) -> String {
        self.header.read().doc.clone()
    }

    /// Hash of (namespace, name)
    pub fn hash_code(&self) -> u64 {
        self.header.read().hash
    }

    /// Rename the class
    pub fn set_header(&self, namespace: &str, name: &str, doc: &str) {
        *self.header.write() = Header::new(namespace, name, doc);
    }

    fn self_ref(&self) -> GanyResult<ClassRef> {
        self.this
            .upgrade()
            .ok_or_else(|| GanyError::Runtime(format!("Class {} was dropped.", self.name())))
    }

    /// Snapshot of the member table
    pub fn attributes(&self) -> Vec<(String, Any)> {
        self.attributes
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of the parent list
    pub fn parents(&self) -> Vec<Parent> {
        self.parents.read().clone()
    }

    fn attr(&self, name: &str) -> Option<Any> {
        self.attributes.read().get(name).cloned()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register `function` under `name`
    ///
    /// Merges into an existing function of the same name: an overload with
    /// identical parameter classes is replaced, others are appended. On a
    /// dynamic class, `__init` overloads become constructors that allocate
    /// the instance, run the body with it as `self` and return it.
    pub fn register_function(
        &self,
        name: &str,
        function: &Any,
        doc: &str,
        is_method: bool,
    ) -> GanyResult<()> {
        if name.is_empty() {
            return Err(GanyError::RegistrationError(format!(
                "Class {}: function name cannot be empty.",
                self.name()
            )));
        }
        let Some(callable) = function.as_function() else {
            return Err(GanyError::RegistrationError(format!(
                "Class {}: {} must be a function.",
                self.name(),
                name
            )));
        };

        let is_init = name == MetaFunction::Init.name();
        let qualified = format!("{}.{}", self.name(), name);
        let mut incoming = Vec::new();
        for ov in callable.overloads() {
            let mut ov = (*ov).clone();
            ov.name = qualified.clone();
            ov.doc = doc.to_string();
            ov.is_method = is_method;
            if is_init && self.is_dynamic() {
                ov = self.make_constructor(ov)?;
            }
            incoming.push(ov);
        }

        let func = {
            let mut attrs = self.attributes.write();
            match attrs.get(name).filter(|a| a.is_function()).cloned() {
                Some(existing) => {
                    if let Some(chain) = existing.as_function() {
                        for ov in incoming {
                            chain.merge(ov);
                        }
                    }
                    existing
                }
                None => {
                    let func = Any::from_callable(Callable::from_overloads(incoming));
                    attrs.insert(name.to_string(), func.clone());
                    func
                }
            }
        };

        let slot = match MetaFunction::from_name(name) {
            Some(MetaFunction::Init) => Some(&self.init),
            Some(MetaFunction::GetItem) => Some(&self.get_item),
            Some(MetaFunction::SetItem) => Some(&self.set_item),
            _ => None,
        };
        if let Some(slot) = slot {
            slot.write().get_or_insert(func);
        }
        Ok(())
    }

    fn make_constructor(&self, mut ov: Overload) -> GanyResult<Overload> {
        let class = self.self_ref()?;
        let body = ov.trampoline.clone();
        let weak = Arc::downgrade(&class);
        ov.trampoline = Arc::new(move |args: &[Any]| {
            let class = weak
                .upgrade()
                .ok_or_else(|| GanyError::Runtime("Constructor outlived its class.".into()))?;
            let instance = Any::tagged_object(class);
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(instance.clone());
            full.extend_from_slice(args);
            body(&full)?;
            Ok(instance)
        });
        if ov.check_args && ov.arg_types.len() > 1 {
            ov.arg_types.remove(1);
            ov.arg_types[0] = class;
        }
        Ok(ov)
    }

    /// Register a property
    pub fn register_property(&self, name: &str, getter: Any, setter: Any, doc: &str) -> GanyResult<()> {
        if name.is_empty() {
            return Err(GanyError::RegistrationError(format!(
                "Class {}: property name cannot be empty.",
                self.name()
            )));
        }
        let property = Any::from_property(Property::new(name, doc, getter, setter));
        self.attributes.write().insert(name.to_string(), property);
        Ok(())
    }

    /// Register an enum backed by `object`
    ///
    /// Each constant is also flattened into the member table unless the name
    /// is already taken.
    pub fn def_enum(&self, name: &str, object: &Any, doc: &str) -> GanyResult<()> {
        if !object.is_object() {
            return Err(GanyError::RegistrationError(format!(
                "Class {}: enum {} must be backed by an object.",
                self.name(),
                name
            )));
        }
        let descriptor = EnumDescriptor {
            name: name.to_string(),
            doc: doc.to_string(),
            object: object.clone(),
        };
        let mut attrs = self.attributes.write();
        attrs.insert(name.to_string(), Any::from_enum(descriptor));
        for (k, v) in object.object_entries() {
            attrs.entry(k).or_insert(v);
        }
        Ok(())
    }

    /// Append a parent used as-is
    ///
    /// Cycles are not detected; registering one makes lookups recurse forever.
    pub fn inherit(&self, parent: ClassRef) {
        self.inherit_parent(Parent::Direct(parent));
    }

    /// Append a parent entry
    pub fn inherit_parent(&self, parent: Parent) {
        self.parents.write().push(parent);
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolve `name` locally, then through the parents
    pub fn find_member(&self, name: &str) -> GanyResult<Any> {
        if let Some(attr) = self.attr(name) {
            return Ok(attr);
        }
        let mut messages = Vec::new();
        for parent in self.parents() {
            match parent.class().find_member(name) {
                Ok(member) => return Ok(member),
                Err(e) => messages.push(format!("\n{}", e)),
            }
        }
        Err(GanyError::MemberNotFound(format!(
            "Class {} has no member {}.{}",
            self.name(),
            name,
            messages.join("")
        )))
    }

    /// Returns true if `name` resolves to a function, property or enum
    pub fn contains_member(&self, name: &str) -> bool {
        let local = self
            .attr(name)
            .map_or(false, |a| a.is_function() || a.is_property() || a.is_enum());
        local || self.parents().iter().any(|p| p.class().contains_member(name))
    }

    /// Call member `name`
    ///
    /// Methods get `inst` prepended. On failure every parent is tried in
    /// order, upcasting first when the parent is an upcast pair.
    pub fn call(&self, inst: &Any, name: &str, args: &[Any]) -> GanyResult<Any> {
        let mut errors = Vec::new();

        if let Some(callable) = self.attr(name).as_ref().and_then(Any::as_function) {
            let result = if callable.is_method() {
                if inst.is_undefined() {
                    Err(GanyError::ContractViolation(
                        "Method should be called with self.".to_string(),
                    ))
                } else {
                    let mut full = Vec::with_capacity(args.len() + 1);
                    full.push(inst.clone());
                    full.extend_from_slice(args);
                    callable.call(&full)
                }
            } else {
                callable.call(args)
            };
            match result {
                Ok(v) => return Ok(v),
                Err(e) => errors.push(e),
            }
        }

        for parent in self.parents() {
            let result = parent
                .view(inst)
                .and_then(|base| parent.class().call(&base, name, args));
            match result {
                Ok(v) => return Ok(v),
                Err(e) => {
                    debug!(class = %self.name(), parent = %parent.class().name(), method = name, "parent call failed: {}", e);
                    errors.push(e);
                }
            }
        }

        let mut real: Vec<GanyError> = errors
            .into_iter()
            .filter(|e| !matches!(e, GanyError::MemberNotFound(_)))
            .collect();
        match real.len() {
            0 => Err(GanyError::MemberNotFound(format!(
                "Class {} failed to call method {}.",
                self.name(),
                name
            ))),
            1 => Err(real.remove(0)),
            _ => Err(GanyError::NoMatchingOverload(
                real.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
        }
    }

    /// Read `key` from `inst` through this class
    pub fn get_item(&self, inst: &Any, key: &Any) -> GanyResult<Any> {
        let mut messages = Vec::new();

        if let Some(name) = key.as_str() {
            if let Some(attr) = self.attr(name) {
                match attr.value() {
                    AnyValue::Property(p) if p.getter.is_function() => {
                        match p.getter.invoke(std::slice::from_ref(inst)) {
                            Ok(v) => return Ok(v),
                            Err(e) => messages.push(e.to_string()),
                        }
                    }
                    AnyValue::Enum(e) => return Ok(e.object.clone()),
                    AnyValue::Function(f) => {
                        if f.is_method() {
                            return Ok(Any::from_caller(Caller::new(inst.clone(), name)));
                        }
                        return Ok(attr.clone());
                    }
                    _ => {}
                }
            }
        }

        if let Some(getter) = self.get_item.read().clone() {
            match getter.invoke(&[inst.clone(), key.clone()]) {
                Ok(v) => return Ok(v),
                Err(e) => messages.push(e.to_string()),
            }
        }

        for parent in self.parents() {
            let result = parent
                .view(inst)
                .and_then(|base| parent.class().get_item(&base, key));
            match result {
                Ok(v) if !v.is_undefined() => return Ok(v),
                Ok(_) => {}
                Err(e) => messages.push(e.to_string()),
            }
        }

        Err(GanyError::MemberNotFound(format!(
            "Class {} don't know how to do getItem {}. \n{}",
            self.name(),
            key,
            messages.join("")
        )))
    }

    /// Write `key` on `inst` through this class
    pub fn set_item(&self, inst: &Any, key: &Any, value: &Any) -> GanyResult<()> {
        let mut messages = Vec::new();

        if let Some(name) = key.as_str() {
            if let Some(AnyValue::Property(p)) = self.attr(name).as_ref().map(Any::value) {
                if p.setter.is_function() {
                    match p.setter.invoke(&[inst.clone(), value.clone()]) {
                        Ok(_) => return Ok(()),
                        Err(e) => messages.push(e.to_string()),
                    }
                }
            }
        }

        if let Some(setter) = self.set_item.read().clone() {
            match setter.invoke(&[inst.clone(), key.clone(), value.clone()]) {
                Ok(_) => return Ok(()),
                Err(e) => messages.push(e.to_string()),
            }
        }

        for parent in self.parents() {
            let result = parent
                .view(inst)
                .and_then(|base| parent.class().set_item(&base, key, value));
            match result {
                Ok(()) => return Ok(()),
                Err(e) => messages.push(e.to_string()),
            }
        }

        Err(GanyError::MemberNotFound(format!(
            "Class {} don't know how to do setItem {}. \n{}",
            self.name(),
            key,
            messages.join("")
        )))
    }

    /// Run the constructor
    pub fn construct(&self, args: &[Any]) -> GanyResult<Any> {
        let init = self.init.read().clone();
        match init {
            Some(f) => f.invoke(args),
            None => Err(GanyError::MemberNotFound(format!(
                "Class {} does not have MetaFunction::Init function.",
                self.name()
            ))),
        }
    }

    /// Walk the parents for an upcast pair targeting `target`
    ///
    /// Returns the converted instance, or Undefined when no path exists.
    pub fn cast_to_base(&self, target: &ClassDescriptor, inst: &Any) -> Any {
        for parent in self.parents() {
            match &parent {
                Parent::Direct(p) => {
                    let r = p.cast_to_base(target, inst);
                    if !r.is_undefined() {
                        return r;
                    }
                }
                Parent::Upcast(p, f) => {
                    let converted = match f.invoke(std::slice::from_ref(inst)) {
                        Ok(v) => v,
                        Err(e) => {
                            debug!(class = %self.name(), target = %target.name(), "upcast failed: {}", e);
                            continue;
                        }
                    };
                    if **p == *target {
                        return converted;
                    }
                    let r = p.cast_to_base(target, &converted);
                    if !r.is_undefined() {
                        return r;
                    }
                }
            }
        }
        Any::undefined()
    }
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let (a, b) = (self.header.read(), other.header.read());
        a.hash == b.hash && a.namespace == b.namespace && a.name == b.name
    }
}

impl Eq for ClassDescriptor {}

impl Hash for ClassDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_code().hash(state);
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header.read();
        if header.namespace.is_empty() {
            write!(f, "<Class: {}>", header.name)
        } else {
            write!(f, "<Class: {}.{}>", header.namespace, header.name)
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header.read();
        f.debug_struct("ClassDescriptor")
            .field("namespace", &header.namespace)
            .field("name", &header.name)
            .field("key", &self.key)
            .finish()
    }
}
