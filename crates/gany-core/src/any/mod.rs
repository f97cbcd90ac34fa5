//! The dynamic value
//!
//! [`Any`] is a reference-counted handle to a tagged value. Copying a handle
//! (`Clone`) aliases the same storage, so containers behave with reference
//! semantics. [`Any::deep_clone`] produces an independent copy.
//!
//! # Representation
//!
//! ```text
//! Any ── Arc<AnyValue>
//!          ├─ scalars        inline, immutable
//!          ├─ Array          Mutex<Vec<Any>>
//!          ├─ Object         Mutex<BTreeMap<String, Any>> + optional class tag
//!          ├─ Function/Class/Property/Enum/Caller/Exception
//!          └─ UserObject     RwLock<Box<dyn UserValue>> + TypeKey
//! ```

mod call;
mod convert;
mod item;
mod ops;

pub(crate) use convert::format_float;
pub use ops::FLOAT_EPSILON;

use crate::class::{ClassRef, EnumDescriptor, Property};
use crate::error::{GanyError, GanyResult};
use crate::function::Callable;
use crate::kind::Kind;
use crate::registry::{registry, Registry};
use crate::type_key::TypeKey;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability interface of natively backed user values
///
/// Implemented for every `Clone + Send + Sync + 'static` type.
pub trait UserValue: Send + Sync + 'static {
    /// Borrow as `std::any::Any` for downcasting
    fn as_any(&self) -> &dyn std::any::Any;

    /// Mutably borrow as `std::any::Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Deep copy into a fresh box
    fn clone_boxed(&self) -> Box<dyn UserValue>;
}

impl<T: Clone + Send + Sync + 'static> UserValue for T {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn UserValue> {
        Box::new(self.clone())
    }
}

/// Storage of a native user value
pub(crate) struct UserBox {
    pub(crate) key: TypeKey,
    pub(crate) cell: RwLock<Box<dyn UserValue>>,
}

/// Storage of an Object value
pub(crate) struct ObjectBody {
    pub(crate) entries: Mutex<BTreeMap<String, Any>>,
    pub(crate) class: OnceCell<ClassRef>,
}

impl ObjectBody {
    fn new(entries: BTreeMap<String, Any>) -> Self {
        Self {
            entries: Mutex::new(entries),
            class: OnceCell::new(),
        }
    }
}

/// A method bound to an instance
#[derive(Clone)]
pub struct Caller {
    instance: Any,
    name: String,
}

impl Caller {
    /// Bind `name` to `instance`
    pub fn new(instance: Any, name: impl Into<String>) -> Self {
        Self {
            instance,
            name: name.into(),
        }
    }

    /// The receiver
    pub fn instance(&self) -> &Any {
        &self.instance
    }

    /// The method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the bound method
    pub fn call(&self, args: &[Any]) -> GanyResult<Any> {
        self.instance.class().call(&self.instance, &self.name, args)
    }
}

pub(crate) enum AnyValue {
    Undefined,
    Null,
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Array(Mutex<Vec<Any>>),
    Object(ObjectBody),
    Function(Callable),
    Class(ClassRef),
    Property(Property),
    Enum(EnumDescriptor),
    Exception(GanyError),
    Caller(Caller),
    UserObject(UserBox),
}

/// Reference-counted dynamic value
#[derive(Clone)]
pub struct Any {
    value: Arc<AnyValue>,
}

impl Any {
    pub(crate) fn from_value(value: AnyValue) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    pub(crate) fn value(&self) -> &AnyValue {
        &self.value
    }

    /// The undefined value
    pub fn undefined() -> Self {
        Self::from_value(AnyValue::Undefined)
    }

    /// The null value
    pub fn null() -> Self {
        Self::from_value(AnyValue::Null)
    }

    /// A new empty Array
    pub fn array() -> Self {
        Self::array_from(Vec::new())
    }

    /// A new Array holding `items`
    pub fn array_from(items: Vec<Any>) -> Self {
        Self::from_value(AnyValue::Array(Mutex::new(items)))
    }

    /// A new empty Object
    pub fn object() -> Self {
        Self::from_value(AnyValue::Object(ObjectBody::new(BTreeMap::new())))
    }

    /// A new Object holding `entries`
    pub fn object_from<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Any)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::from_value(AnyValue::Object(ObjectBody::new(map)))
    }

    /// An Object tagged as an instance of `class`
    pub(crate) fn tagged_object(class: ClassRef) -> Self {
        let body = ObjectBody::new(BTreeMap::new());
        let _ = body.class.set(class);
        Self::from_value(AnyValue::Object(body))
    }

    /// Wrap a class descriptor
    pub fn from_class(class: ClassRef) -> Self {
        Self::from_value(AnyValue::Class(class))
    }

    /// Wrap a callable
    pub fn from_callable(callable: Callable) -> Self {
        Self::from_value(AnyValue::Function(callable))
    }

    /// Wrap a property descriptor
    pub fn from_property(property: Property) -> Self {
        Self::from_value(AnyValue::Property(property))
    }

    /// Wrap an enum descriptor
    pub fn from_enum(descriptor: EnumDescriptor) -> Self {
        Self::from_value(AnyValue::Enum(descriptor))
    }

    /// Wrap a bound method
    pub fn from_caller(caller: Caller) -> Self {
        Self::from_value(AnyValue::Caller(caller))
    }

    /// Wrap a native function, resolving argument classes through the active registry
    pub fn function<M, F>(f: F) -> Self
    where
        F: crate::function::IntoFunction<M>,
    {
        Self::from_callable(Callable::from_fn(registry(), f))
    }

    /// Wrap a function taking its arguments as a slice
    pub fn variadic<F>(f: F) -> Self
    where
        F: Fn(&[Any]) -> GanyResult<Any> + Send + Sync + 'static,
    {
        Self::from_callable(Callable::variadic("", "", f))
    }

    /// Capture an error as a value
    pub fn exception(err: GanyError) -> Self {
        Self::from_value(AnyValue::Exception(err))
    }

    /// Box a native value under `key`
    pub fn from_user<T: UserValue>(key: TypeKey, value: T) -> Self {
        Self::from_value(AnyValue::UserObject(UserBox {
            key,
            cell: RwLock::new(Box::new(value)),
        }))
    }

    /// Box a value through its bridge rule
    pub fn new<T: crate::caster::Caster>(value: T) -> Self {
        value.into_any()
    }

    /// Discriminant of the value
    pub fn kind(&self) -> Kind {
        match &*self.value {
            AnyValue::Undefined => Kind::Undefined,
            AnyValue::Null => Kind::Null,
            AnyValue::Bool(_) => Kind::Bool,
            AnyValue::Int8(_) | AnyValue::UInt8(_) => Kind::Int8,
            AnyValue::Int16(_) | AnyValue::UInt16(_) => Kind::Int16,
            AnyValue::Int32(_) | AnyValue::UInt32(_) => Kind::Int32,
            AnyValue::Int64(_) | AnyValue::UInt64(_) => Kind::Int64,
            AnyValue::Float32(_) => Kind::Float32,
            AnyValue::Float64(_) => Kind::Float64,
            AnyValue::String(_) => Kind::String,
            AnyValue::Array(_) => Kind::Array,
            AnyValue::Object(body) => {
                if body.class.get().is_some() {
                    Kind::UserObject
                } else {
                    Kind::Object
                }
            }
            AnyValue::Function(_) => Kind::Function,
            AnyValue::Class(_) => Kind::Class,
            AnyValue::Property(_) => Kind::Property,
            AnyValue::Enum(_) => Kind::Enum,
            AnyValue::Exception(_) => Kind::Exception,
            AnyValue::Caller(_) => Kind::Caller,
            AnyValue::UserObject(_) => Kind::UserObject,
        }
    }

    /// Native type key of the boxed value
    pub fn type_key(&self) -> TypeKey {
        match &*self.value {
            AnyValue::Undefined => TypeKey::UNDEFINED,
            AnyValue::Null => TypeKey::NULL,
            AnyValue::Bool(_) => TypeKey::BOOL,
            AnyValue::Int8(_) => TypeKey::INT8,
            AnyValue::UInt8(_) => TypeKey::UINT8,
            AnyValue::Int16(_) => TypeKey::INT16,
            AnyValue::UInt16(_) => TypeKey::UINT16,
            AnyValue::Int32(_) => TypeKey::INT32,
            AnyValue::UInt32(_) => TypeKey::UINT32,
            AnyValue::Int64(_) => TypeKey::INT64,
            AnyValue::UInt64(_) => TypeKey::UINT64,
            AnyValue::Float32(_) => TypeKey::FLOAT,
            AnyValue::Float64(_) => TypeKey::DOUBLE,
            AnyValue::String(_) => TypeKey::STRING,
            AnyValue::Array(_) => TypeKey::ARRAY,
            AnyValue::Object(_) => TypeKey::OBJECT,
            AnyValue::Function(_) => TypeKey::FUNCTION,
            AnyValue::Class(_) => TypeKey::CLASS,
            AnyValue::Property(_) => TypeKey::PROPERTY,
            AnyValue::Enum(_) => TypeKey::ENUM,
            AnyValue::Exception(_) => TypeKey::EXCEPTION,
            AnyValue::Caller(_) => TypeKey::CALLER,
            AnyValue::UserObject(b) => b.key,
        }
    }

    /// Class describing this value, resolved through the active registry
    pub fn class(&self) -> ClassRef {
        self.class_in(registry())
    }

    /// Class describing this value, resolved through `registry`
    pub fn class_in(&self, registry: &Registry) -> ClassRef {
        if let AnyValue::Object(body) = &*self.value {
            if let Some(class) = body.class.get() {
                return class.clone();
            }
        }
        registry.class_instance(self.type_key())
    }

    /// Name of this value's class
    pub fn class_type_name(&self) -> String {
        self.class().name()
    }

    /// Name of this value's kind
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check the class name; a dotted name is compared with `namespace.name`
    pub fn is(&self, type_name: &str) -> bool {
        let class = self.class();
        if type_name.contains('.') {
            format!("{}.{}", class.namespace(), class.name()) == type_name
        } else {
            class.name() == type_name
        }
    }

    /// Returns true if both handles alias the same storage
    pub fn same_as(&self, other: &Any) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Address of the shared storage
    pub fn ptr(&self) -> usize {
        Arc::as_ptr(&self.value) as usize
    }

    /// Deep copy; containers and user values get fresh storage
    pub fn deep_clone(&self) -> Any {
        match &*self.value {
            AnyValue::Array(items) => {
                let items = items.lock().clone();
                Any::array_from(items.iter().map(Any::deep_clone).collect())
            }
            AnyValue::Object(body) => {
                let entries = body.entries.lock().clone();
                let copy = ObjectBody::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k, v.deep_clone()))
                        .collect(),
                );
                if let Some(class) = body.class.get() {
                    let _ = copy.class.set(class.clone());
                }
                Any::from_value(AnyValue::Object(copy))
            }
            AnyValue::UserObject(b) => Any::from_value(AnyValue::UserObject(UserBox {
                key: b.key,
                cell: RwLock::new(b.cell.read().clone_boxed()),
            })),
            _ => self.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Undefined
    pub fn is_undefined(&self) -> bool {
        matches!(&*self.value, AnyValue::Undefined)
    }

    /// Null
    pub fn is_null(&self) -> bool {
        matches!(&*self.value, AnyValue::Null)
    }

    /// Bool
    pub fn is_bool(&self) -> bool {
        matches!(&*self.value, AnyValue::Bool(_))
    }

    /// Int8 (signed or unsigned)
    pub fn is_int8(&self) -> bool {
        self.kind() == Kind::Int8
    }

    /// Int16 (signed or unsigned)
    pub fn is_int16(&self) -> bool {
        self.kind() == Kind::Int16
    }

    /// Int32 (signed or unsigned)
    pub fn is_int32(&self) -> bool {
        self.kind() == Kind::Int32
    }

    /// Int64 (signed or unsigned)
    pub fn is_int64(&self) -> bool {
        self.kind() == Kind::Int64
    }

    /// Float32
    pub fn is_float(&self) -> bool {
        matches!(&*self.value, AnyValue::Float32(_))
    }

    /// Float64
    pub fn is_double(&self) -> bool {
        matches!(&*self.value, AnyValue::Float64(_))
    }

    /// Any integer or floating point kind
    pub fn is_number(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Unsigned integer
    pub fn is_unsigned(&self) -> bool {
        self.type_key().is_unsigned()
    }

    /// String
    pub fn is_string(&self) -> bool {
        matches!(&*self.value, AnyValue::String(_))
    }

    /// Array
    pub fn is_array(&self) -> bool {
        matches!(&*self.value, AnyValue::Array(_))
    }

    /// Object, including instances of dynamic classes
    pub fn is_object(&self) -> bool {
        matches!(&*self.value, AnyValue::Object(_))
    }

    /// Function
    pub fn is_function(&self) -> bool {
        matches!(&*self.value, AnyValue::Function(_))
    }

    /// Class
    pub fn is_class(&self) -> bool {
        matches!(&*self.value, AnyValue::Class(_))
    }

    /// Property
    pub fn is_property(&self) -> bool {
        matches!(&*self.value, AnyValue::Property(_))
    }

    /// Enum
    pub fn is_enum(&self) -> bool {
        matches!(&*self.value, AnyValue::Enum(_))
    }

    /// Exception
    pub fn is_exception(&self) -> bool {
        matches!(&*self.value, AnyValue::Exception(_))
    }

    /// Native user value or dynamic class instance
    pub fn is_user_object(&self) -> bool {
        self.kind() == Kind::UserObject
    }

    /// Bound method
    pub fn is_caller(&self) -> bool {
        matches!(&*self.value, AnyValue::Caller(_))
    }

    // ------------------------------------------------------------------
    // Borrowing accessors
    // ------------------------------------------------------------------

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match &*self.value {
            AnyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the class payload
    pub fn as_class(&self) -> Option<&ClassRef> {
        match &*self.value {
            AnyValue::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow the function payload
    pub fn as_function(&self) -> Option<&Callable> {
        match &*self.value {
            AnyValue::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Borrow the property payload
    pub fn as_property(&self) -> Option<&Property> {
        match &*self.value {
            AnyValue::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow the enum payload
    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match &*self.value {
            AnyValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the captured error
    pub fn as_exception(&self) -> Option<&GanyError> {
        match &*self.value {
            AnyValue::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the bound method
    pub fn as_caller(&self) -> Option<&Caller> {
        match &*self.value {
            AnyValue::Caller(c) => Some(c),
            _ => None,
        }
    }

    /// Run `f` against the native value of type `T`
    pub fn with_native<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> GanyResult<R> {
        if let AnyValue::UserObject(b) = &*self.value {
            let guard = b.cell.read();
            if let Some(v) = (**guard).as_any().downcast_ref::<T>() {
                return Ok(f(v));
            }
        }
        Err(self.mismatch::<T>())
    }

    /// Run `f` against the native value of type `T`, mutably
    ///
    /// The value is write-locked for the duration of `f`; calling back into
    /// the same instance from `f` deadlocks.
    pub fn with_native_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> GanyResult<R> {
        if let AnyValue::UserObject(b) = &*self.value {
            let mut guard = b.cell.write();
            if let Some(v) = (**guard).as_any_mut().downcast_mut::<T>() {
                return Ok(f(v));
            }
        }
        Err(self.mismatch::<T>())
    }

    pub(crate) fn mismatch<T: ?Sized + 'static>(&self) -> GanyError {
        GanyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            got: self.class_type_name(),
        }
    }

    /// Object entries snapshot; empty for non-objects
    pub fn object_entries(&self) -> Vec<(String, Any)> {
        match &*self.value {
            AnyValue::Object(body) => body
                .entries
                .lock()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Array elements snapshot; empty for non-arrays
    pub fn array_items(&self) -> Vec<Any> {
        match &*self.value {
            AnyValue::Array(items) => items.lock().clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn array_body(&self) -> Option<&Mutex<Vec<Any>>> {
        match &*self.value {
            AnyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn object_body(&self) -> Option<&ObjectBody> {
        match &*self.value {
            AnyValue::Object(body) => Some(body),
            _ => None,
        }
    }
}

impl Default for Any {
    fn default() -> Self {
        Any::undefined()
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        self.equal_to(other).unwrap_or(false)
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_to_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<{} at {:#x}>", self.class_type_name(), self.ptr()),
        }
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Any({}: {})", self.type_name(), self.to_json_string(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_aliases_storage() {
        let a = Any::array();
        let b = a.clone();
        b.push_back(Any::from(1));
        assert_eq!(a.size(), 1);
        assert!(a.same_as(&b));
    }

    #[test]
    fn test_deep_clone_detaches_storage() {
        let mut src = Any::object();
        src.set_item("list", Any::array_from(vec![Any::from(1), Any::from(2)]))
            .unwrap();
        let copy = src.deep_clone();
        copy.get("list").push_back(Any::from(3));
        assert_eq!(src.get("list").size(), 2);
        assert_eq!(copy.get("list").size(), 3);
        assert!(!src.same_as(&copy));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Any::undefined().kind(), Kind::Undefined);
        assert_eq!(Any::null().kind(), Kind::Null);
        assert_eq!(Any::from(1u8).kind(), Kind::Int8);
        assert!(Any::from(1u8).is_unsigned());
        assert_eq!(Any::from("x").kind(), Kind::String);
        assert_eq!(Any::object().kind(), Kind::Object);
        assert_eq!(Any::from(1.5f32).type_name(), "float");
    }

    #[derive(Clone)]
    struct Counter(i32);

    #[test]
    fn test_with_native_mut() {
        let c = Any::from_user(TypeKey::of::<Counter>(), Counter(1));
        c.with_native_mut::<Counter, _>(|c| c.0 += 1).unwrap();
        assert_eq!(c.with_native::<Counter, _>(|c| c.0).unwrap(), 2);
        assert!(c.with_native::<String, _>(|s| s.len()).is_err());
    }
}
