//! Method calls and invocation

use super::{Any, AnyValue};
use crate::error::{GanyError, GanyResult};

impl Any {
    /// Call the member `name`
    ///
    /// Class values call their static members, falling back to the methods
    /// of the built-in `Class` class. Plain Objects look the member up as an
    /// entry and invoke it. Everything else dispatches through its class with
    /// `self` as the receiver.
    pub fn call(&self, name: &str, args: &[Any]) -> GanyResult<Any> {
        match self.value() {
            AnyValue::Class(class) => match class.call(&Any::undefined(), name, args) {
                Err(GanyError::MemberNotFound(_)) => self.class().call(self, name, args),
                result => result,
            },
            AnyValue::Object(body) if body.class.get().is_none() => {
                self.get_item(name)?.invoke(args)
            }
            _ => self.class().call(self, name, args),
        }
    }

    /// Invoke the value itself
    ///
    /// Functions are called, classes are constructed, and bound methods
    /// call their method on the bound instance.
    pub fn invoke(&self, args: &[Any]) -> GanyResult<Any> {
        match self.value() {
            AnyValue::Function(f) => f.call(args),
            AnyValue::Class(class) => class.construct(args),
            AnyValue::Caller(caller) => caller.call(args),
            _ => Err(GanyError::OperatorNotSupported(format!(
                "{} can't be called as a function or constructor.",
                self.class_type_name()
            ))),
        }
    }
}
