//! Conversion of native closures into overloads
//!
//! Implemented for closures of up to eight arguments. Each argument is
//! extracted with [`Any::cast`], so the fuzzy overload pass can convert
//! loosely typed input.

use super::Overload;
use crate::any::Any;
use crate::caster::{Caster, IntoReturn};
use crate::error::{GanyError, GanyResult};
use crate::registry::{registry, Registry};
use std::sync::Arc;

/// A native function usable as a free or static function
pub trait IntoFunction<Marker>: Send + Sync + 'static {
    /// Build the overload; classes resolve through `registry`
    fn into_overload(self, registry: &Registry) -> Overload;
}

/// A native function taking the receiver `&T` or `&mut T` first
pub trait IntoMethod<T, Marker>: Send + Sync + 'static {
    /// Build the overload; classes resolve through `registry`
    fn into_overload(self, registry: &Registry) -> Overload;
}

fn arity_error(expected: usize, got: usize) -> GanyError {
    GanyError::ContractViolation(format!(
        "Expected {expected} arguments, but {got} were given."
    ))
}

/// Find the native `T` behind `this`, following the upcast chain
fn receiver<T: Caster>(this: &Any) -> GanyResult<Any> {
    if this.is_type::<T>() {
        return Ok(this.clone());
    }
    let target = registry().class_instance(T::type_key());
    let base = this.class().cast_to_base(&target, this);
    if base.is_type::<T>() {
        Ok(base)
    } else {
        Err(this.mismatch::<T>())
    }
}

macro_rules! impl_into_function {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, R, $($arg,)*> IntoFunction<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoReturn,
            $($arg: Caster,)*
        {
            fn into_overload(self, registry: &Registry) -> Overload {
                let arg_types = vec![
                    registry.class_instance(R::return_key()),
                    $(registry.class_instance($arg::type_key()),)*
                ];
                let arity = arg_types.len() - 1;
                Overload::new(
                    arg_types,
                    Arc::new(move |args: &[Any]| {
                        let [$($arg),*] = args else {
                            return Err(arity_error(arity, args.len()));
                        };
                        $(let $arg = $arg.cast::<$arg>()?;)*
                        (self)($($arg),*).into_return()
                    }),
                )
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<F, T, R, $($arg,)*> IntoMethod<T, fn(&mut T, $($arg,)*) -> R> for F
        where
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            T: Caster,
            R: IntoReturn,
            $($arg: Caster,)*
        {
            fn into_overload(self, registry: &Registry) -> Overload {
                let arg_types = vec![
                    registry.class_instance(R::return_key()),
                    registry.class_instance(T::type_key()),
                    $(registry.class_instance($arg::type_key()),)*
                ];
                let arity = arg_types.len() - 1;
                let mut ov = Overload::new(
                    arg_types,
                    Arc::new(move |args: &[Any]| {
                        let [this, $($arg),*] = args else {
                            return Err(arity_error(arity, args.len()));
                        };
                        $(let $arg = $arg.cast::<$arg>()?;)*
                        let this = receiver::<T>(this)?;
                        this.with_native_mut::<T, _>(|t| (self)(t, $($arg),*))?
                            .into_return()
                    }),
                );
                ov.is_method = true;
                ov
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<F, T, R, $($arg,)*> IntoMethod<T, fn(&T, $($arg,)*) -> R> for F
        where
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
            T: Caster,
            R: IntoReturn,
            $($arg: Caster,)*
        {
            fn into_overload(self, registry: &Registry) -> Overload {
                let arg_types = vec![
                    registry.class_instance(R::return_key()),
                    registry.class_instance(T::type_key()),
                    $(registry.class_instance($arg::type_key()),)*
                ];
                let arity = arg_types.len() - 1;
                let mut ov = Overload::new(
                    arg_types,
                    Arc::new(move |args: &[Any]| {
                        let [this, $($arg),*] = args else {
                            return Err(arity_error(arity, args.len()));
                        };
                        $(let $arg = $arg.cast::<$arg>()?;)*
                        let this = receiver::<T>(this)?;
                        this.with_native::<T, _>(|t| (self)(t, $($arg),*))?
                            .into_return()
                    }),
                );
                ov.is_method = true;
                ov
            }
        }
    };
}

impl_into_function!();
impl_into_function!(A1);
impl_into_function!(A1, A2);
impl_into_function!(A1, A2, A3);
impl_into_function!(A1, A2, A3, A4);
impl_into_function!(A1, A2, A3, A4, A5);
impl_into_function!(A1, A2, A3, A4, A5, A6);
impl_into_function!(A1, A2, A3, A4, A5, A6, A7);
impl_into_function!(A1, A2, A3, A4, A5, A6, A7, A8);
