//! Overloaded dynamic functions
//!
//! A [`Callable`] is an ordered list of [`Overload`]s. Each overload carries
//! its signature as class references (`[return, param0, ...]`) and a
//! type-erased trampoline. Calls resolve in two passes:
//!
//! 1. exact: the first overload whose parameter classes match the argument
//!    classes (or that is variadic) is invoked; if it fails, the pass stops
//! 2. fuzzy: every overload skipped only because of a type mismatch at the
//!    right arity is retried, letting the bridge convert arguments
//!
//! If nothing succeeds the call fails with `NoMatchingOverload`, listing the
//! requested argument classes, every declared signature and each captured
//! inner error.

mod into;

pub use into::{IntoFunction, IntoMethod};

use crate::any::Any;
use crate::class::ClassRef;
use crate::error::{GanyError, GanyResult};
use crate::registry::Registry;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Type-erased entry point of one overload
pub type Trampoline = Arc<dyn Fn(&[Any]) -> GanyResult<Any> + Send + Sync>;

/// One signature of a [`Callable`]
#[derive(Clone)]
pub struct Overload {
    pub(crate) name: String,
    pub(crate) doc: String,
    /// `[return, param0, ...]`; empty when variadic
    pub(crate) arg_types: Vec<ClassRef>,
    pub(crate) is_method: bool,
    pub(crate) check_args: bool,
    pub(crate) trampoline: Trampoline,
}

impl Overload {
    /// Fixed-arity overload
    pub fn new(arg_types: Vec<ClassRef>, trampoline: Trampoline) -> Self {
        Self {
            name: String::new(),
            doc: String::new(),
            arg_types,
            is_method: false,
            check_args: true,
            trampoline,
        }
    }

    /// Overload accepting any argument list
    pub fn variadic(trampoline: Trampoline) -> Self {
        Self {
            name: String::new(),
            doc: String::new(),
            arg_types: Vec::new(),
            is_method: false,
            check_args: false,
            trampoline,
        }
    }

    /// Qualified name, empty for anonymous functions
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Returns true if the first parameter is the receiver
    pub fn is_method(&self) -> bool {
        self.is_method
    }

    /// Returns true if the overload takes any argument list
    pub fn is_variadic(&self) -> bool {
        !self.check_args
    }

    /// Declared return class
    pub fn return_class(&self) -> Option<&ClassRef> {
        self.arg_types.first()
    }

    /// Declared parameter classes
    pub fn params(&self) -> &[ClassRef] {
        self.arg_types.get(1..).unwrap_or(&[])
    }

    /// Invoke the trampoline directly
    pub fn invoke(&self, args: &[Any]) -> GanyResult<Any> {
        (self.trampoline)(args)
    }

    fn matches(&self, args: &[Any]) -> bool {
        if !self.check_args {
            return true;
        }
        let params = self.params();
        params.len() == args.len()
            && params
                .iter()
                .zip(args)
                .all(|(p, a)| p.is_wildcard() || **p == *a.class())
    }

    /// Both fixed, same length, identical parameter classes
    pub fn compare_args(&self, other: &Overload) -> bool {
        if !self.check_args || !other.check_args {
            return false;
        }
        self.arg_types.len() == other.arg_types.len()
            && self
                .params()
                .iter()
                .zip(other.params())
                .all(|(a, b)| a == b)
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "function"
        } else {
            &self.name
        }
    }

    /// Whether parameter `i` renders as the receiver
    fn is_receiver(&self, i: usize) -> bool {
        let short = self.name.rsplit('.').next().unwrap_or_default();
        self.is_method && i == 0 && !short.starts_with(crate::kind::MetaFunction::Init.name())
    }

    /// Human readable signature, e.g. `Point.add(self, arg1: Point) -> Point`
    pub fn signature(&self) -> String {
        if !self.check_args {
            return format!("{}(...)", self.display_name());
        }
        let params = self
            .params()
            .iter()
            .enumerate()
            .map(|(i, class)| {
                if self.is_receiver(i) {
                    "self".to_string()
                } else {
                    format!("arg{}: {}", i, class.name())
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let ret = self
            .return_class()
            .map(|c| c.name())
            .unwrap_or_default();
        format!("{}({}) -> {}", self.display_name(), params, ret)
    }

    fn dump(&self) -> GanyResult<Any> {
        let mut ov = Any::object();
        ov.set_item("doc", self.doc.as_str())?;
        if self.check_args {
            ov.set_item("return", self.return_class().map(|c| c.name()).unwrap_or_default())?;
            let args = Any::array();
            for (i, class) in self.params().iter().enumerate() {
                let key = if self.is_receiver(i) {
                    "self".to_string()
                } else {
                    format!("arg{i}")
                };
                let mut arg = Any::object();
                arg.set_item("key", key)?;
                arg.set_item("type", class.name())?;
                args.push_back(arg);
            }
            ov.set_item("args", args)?;
        }
        Ok(ov)
    }
}

/// Ordered overload list behind a Function value
pub struct Callable {
    overloads: RwLock<Vec<Arc<Overload>>>,
}

impl Callable {
    pub(crate) fn from_overloads(overloads: Vec<Overload>) -> Self {
        Self {
            overloads: RwLock::new(overloads.into_iter().map(Arc::new).collect()),
        }
    }

    /// Wrap a native function; argument classes resolve through `registry`
    pub fn from_fn<M, F: IntoFunction<M>>(registry: &Registry, f: F) -> Self {
        Self::from_overloads(vec![f.into_overload(registry)])
    }

    /// Wrap a function taking its arguments as a slice
    pub fn variadic<F>(name: &str, doc: &str, f: F) -> Self
    where
        F: Fn(&[Any]) -> GanyResult<Any> + Send + Sync + 'static,
    {
        let mut ov = Overload::variadic(Arc::new(f));
        ov.name = name.to_string();
        ov.doc = doc.to_string();
        Self::from_overloads(vec![ov])
    }

    /// Snapshot of the overload chain
    pub fn overloads(&self) -> Vec<Arc<Overload>> {
        self.overloads.read().clone()
    }

    /// Name of the head overload
    pub fn name(&self) -> String {
        self.overloads
            .read()
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_default()
    }

    /// Method flag of the head overload
    pub fn is_method(&self) -> bool {
        self.overloads.read().first().map_or(false, |o| o.is_method)
    }

    /// Add `ov` to the chain
    ///
    /// Replaces the overload with identical parameter classes, otherwise
    /// appends. Returns false and leaves the chain alone when either side
    /// is variadic.
    pub fn merge(&self, ov: Overload) -> bool {
        let mut chain = self.overloads.write();
        if ov.is_variadic() || chain.first().map_or(false, |h| h.is_variadic()) {
            return false;
        }
        match chain.iter().position(|o| o.compare_args(&ov)) {
            Some(i) => chain[i] = Arc::new(ov),
            None => chain.push(Arc::new(ov)),
        }
        true
    }

    /// Resolve and invoke an overload
    pub fn call(&self, args: &[Any]) -> GanyResult<Any> {
        let overloads = self.overloads();
        let mut unmatched = Vec::new();
        let mut caught: Vec<(Arc<Overload>, GanyError)> = Vec::new();

        for ov in &overloads {
            if ov.matches(args) {
                match ov.invoke(args) {
                    Ok(v) => return Ok(v),
                    Err(e) => caught.push((ov.clone(), e)),
                }
                break;
            } else if ov.params().len() == args.len() {
                unmatched.push(ov.clone());
            }
        }

        for ov in unmatched {
            match ov.invoke(args) {
                Ok(v) => return Ok(v),
                Err(e) => caught.push((ov, e)),
            }
        }

        Err(self.no_match_error(args, &caught))
    }

    fn no_match_error(&self, args: &[Any], caught: &[(Arc<Overload>, GanyError)]) -> GanyError {
        let requested = args
            .iter()
            .map(Any::class_type_name)
            .collect::<Vec<_>>()
            .join(",");
        let mut msg = format!(
            "Failed to call {} with input arguments: [{}].\nAt: {}",
            if self.is_method() { "method" } else { "function" },
            requested,
            self
        );
        if !caught.is_empty() {
            msg.push_str("\nCaused by:");
            for (ov, err) in caught {
                let indented = err
                    .to_string()
                    .lines()
                    .map(|l| format!("  {l}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                msg.push_str(&format!(
                    "\nAttempt to call: \"{}\" failed, Exception:\n{}",
                    ov.signature(),
                    indented
                ));
            }
        }
        GanyError::NoMatchingOverload(msg)
    }

    /// Reflection record: `name`, `overloads`, `doc`
    pub fn dump(&self) -> GanyResult<Any> {
        let mut out = Any::object();
        out.set_item("name", self.name())?;
        let overloads = Any::array();
        for ov in self.overloads() {
            overloads.push_back(ov.dump()?);
        }
        out.set_item("overloads", overloads)?;
        out.set_item("doc", self.to_string())?;
        Ok(out)
    }
}

impl Clone for Callable {
    fn clone(&self) -> Self {
        Self {
            overloads: RwLock::new(self.overloads()),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overloads = self.overloads();
        let head = overloads
            .first()
            .map_or("function", |o| o.display_name());
        write!(f, "{head}(...)")?;
        for ov in &overloads {
            f.write_str("\n")?;
            if !ov.doc.is_empty() {
                writeln!(f, "  // {}", ov.doc)?;
            }
            write!(f, "  {}", ov.signature())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name())
            .field("overloads", &self.overloads.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    fn overloaded() -> Callable {
        let reg = registry();
        let f = Callable::from_fn(reg, |a: i32| a + 1);
        f.merge((|a: i32, b: i32| a + b).into_overload(reg));
        f.merge((|s: String| format!("{s} World!")).into_overload(reg));
        f
    }

    #[test]
    fn test_exact_overload_selection() {
        let f = overloaded();
        assert_eq!(f.call(&[Any::from(2)]).unwrap().to_int32().unwrap(), 3);
        assert_eq!(
            f.call(&[Any::from(2), Any::from(3)]).unwrap().to_int32().unwrap(),
            5
        );
        assert_eq!(
            f.call(&[Any::from("Hello")]).unwrap().try_to_string().unwrap(),
            "Hello World!"
        );
    }

    #[test]
    fn test_fuzzy_pass_converts() {
        let f = Callable::from_fn(registry(), |a: i32| a * 10);
        assert_eq!(f.call(&[Any::from(1.9)]).unwrap().to_int32().unwrap(), 10);
    }

    #[test]
    fn test_replace_on_same_signature() {
        let reg = registry();
        let f = overloaded();
        f.merge((|a: i32| a + 100).into_overload(reg));
        assert_eq!(f.overloads().len(), 3);
        assert_eq!(f.call(&[Any::from(2)]).unwrap().to_int32().unwrap(), 102);
        assert_eq!(
            f.call(&[Any::from(2), Any::from(3)]).unwrap().to_int32().unwrap(),
            5
        );
    }

    #[test]
    fn test_variadic_never_merges() {
        let f = Callable::variadic("v", "", |args| Ok(Any::from(args.len() as i32)));
        assert!(!f.merge((|a: i32| a).into_overload(registry())));
        assert_eq!(f.overloads().len(), 1);
        assert_eq!(
            f.call(&[Any::from(1), Any::null()]).unwrap().to_int32().unwrap(),
            2
        );
    }

    #[test]
    fn test_no_match_message() {
        let f = overloaded();
        let err = f.call(&[Any::from(1), Any::from(2), Any::from(3)]).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, GanyError::NoMatchingOverload(_)));
        assert!(msg.starts_with("Failed to call function with input arguments: [int32,int32,int32]."));
        assert!(msg.contains("function(arg0: int32) -> int32"));
        assert!(msg.contains("function(arg0: int32, arg1: int32) -> int32"));
    }

    #[test]
    fn test_caught_errors_are_indented() {
        let f = Callable::from_fn(registry(), |_a: i32| -> GanyResult<i32> {
            Err("first line\nsecond line".into())
        });
        let msg = f.call(&[Any::from(1)]).unwrap_err().to_string();
        assert!(msg.contains("Caused by:"));
        assert!(msg.contains("\n  first line\n  second line"));
    }

    #[test]
    fn test_variadic_signature() {
        let f = Callable::variadic("", "", |_| Ok(Any::undefined()));
        assert_eq!(f.overloads()[0].signature(), "function(...)");
    }
}
