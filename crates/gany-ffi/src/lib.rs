//! C FFI bindings for the gany runtime
//!
//! This crate exposes `Any` values to foreign hosts through a flat C API.
//! The API follows these principles:
//! - ABI-stable (handles are plain `i64` values)
//! - Every handle owns one boxed `Any` and must be released with `gany_destroy()`
//! - Every returned string must be released with `gany_free_string()`
//! - Errors never cross the boundary: they are logged and a benign default
//!   (`undefined`, `false`, `0`, empty string) is returned
//!
//! Functions implemented by the host are called through a single proxy
//! callback installed with `gany_set_function_proxy()`.
//!
//! Panics are caught like errors. This relies on the workspace profiles
//! building with `panic = "unwind"`; under `panic = "abort"` a panic ends the
//! host process.

use gany_core::{registry, version_string, Any, Callable, GanyError, GanyResult, GANY_VERSION_CODE};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Handle Types
// ============================================================================

/// Handle to a boxed `Any` (0 is the null handle)
pub type GanyHandle = i64;

/// Opaque host-side function identifier
pub type GanyFuncPtr = i64;

/// Host dispatcher for functions created with `gany_create_function()`
///
/// Receives the host function id and `argc` argument handles. The host owns
/// the argument handles and must destroy them. The returned handle is
/// consumed by the runtime; 0 means null.
pub type GanyFunctionProxy =
    extern "C" fn(func: GanyFuncPtr, args: *const GanyHandle, argc: i32) -> GanyHandle;

/// Called once the last reference to a host function is dropped
pub type GanyFunctionDtorListener = extern "C" fn(func: GanyFuncPtr);

/// Receives every error captured at the boundary
pub type GanyLogger = extern "C" fn(message: *const c_char);

static FUNCTION_PROXY: Lazy<RwLock<Option<GanyFunctionProxy>>> = Lazy::new(|| RwLock::new(None));
static DTOR_LISTENER: Lazy<RwLock<Option<GanyFunctionDtorListener>>> =
    Lazy::new(|| RwLock::new(None));
static LOGGER: Lazy<RwLock<Option<GanyLogger>>> = Lazy::new(|| RwLock::new(None));

/// Notifies the destructor listener when the owning function goes away
struct HostFunction {
    func: GanyFuncPtr,
}

impl Drop for HostFunction {
    fn drop(&mut self) {
        if let Some(listener) = *DTOR_LISTENER.read() {
            listener(self.func);
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn into_handle(value: Any) -> GanyHandle {
    Box::into_raw(Box::new(value)) as GanyHandle
}

fn undefined_handle() -> GanyHandle {
    into_handle(Any::undefined())
}

/// Borrow the value behind a handle
unsafe fn any_ref<'a>(handle: GanyHandle) -> GanyResult<&'a Any> {
    if handle == 0 {
        return Err(GanyError::ContractViolation("null gany handle".to_string()));
    }
    Ok(&*(handle as *const Any))
}

unsafe fn str_arg<'a>(s: *const c_char) -> GanyResult<&'a str> {
    if s.is_null() {
        return Err(GanyError::ContractViolation("null string argument".to_string()));
    }
    CStr::from_ptr(s)
        .to_str()
        .map_err(|_| GanyError::ContractViolation("invalid UTF-8 in string argument".to_string()))
}

unsafe fn collect_args(args: *const GanyHandle, argc: i32) -> GanyResult<Vec<Any>> {
    if argc <= 0 {
        return Ok(Vec::new());
    }
    if args.is_null() {
        return Err(GanyError::ContractViolation("null argument array".to_string()));
    }
    std::slice::from_raw_parts(args, argc as usize)
        .iter()
        .map(|&h| any_ref(h).cloned())
        .collect()
}

/// Convert Rust string to C string (caller must free)
fn to_c_string(s: &str) -> *mut c_char {
    let bytes: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
    match CString::new(bytes) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn empty_c_string() -> *mut c_char {
    to_c_string("")
}

fn log_error(message: &str) {
    if let Some(logger) = *LOGGER.read() {
        let c_message = to_c_string(message);
        if !c_message.is_null() {
            logger(c_message);
            // SAFETY: produced by `CString::into_raw` above
            drop(unsafe { CString::from_raw(c_message) });
            return;
        }
    }
    error!(target: "gany_ffi", "{}", message);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic at the C boundary".to_string()
    }
}

/// Run `f`, logging any error or panic and returning `fallback()` instead
fn capture<T>(f: impl FnOnce() -> GanyResult<T>, fallback: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            log_error(&format!("[{}] {}", e.category(), e));
            fallback()
        }
        Err(payload) => {
            log_error(&panic_message(payload.as_ref()));
            fallback()
        }
    }
}

fn capture_handle(f: impl FnOnce() -> GanyResult<Any>) -> GanyHandle {
    capture(|| f().map(into_handle), undefined_handle)
}

fn capture_string(f: impl FnOnce() -> GanyResult<String>) -> *mut c_char {
    capture(|| f().map(|s| to_c_string(&s)), empty_c_string)
}

fn capture_bool(f: impl FnOnce() -> GanyResult<bool>) -> bool {
    capture(f, || false)
}

fn capture_unit(f: impl FnOnce() -> GanyResult<()>) {
    capture(f, || ())
}

// ============================================================================
// Runtime Setup
// ============================================================================

/// Install a stderr `tracing` subscriber filtered by the `GANY_LOG` variable
///
/// # Returns
/// * 0 on success
/// * -1 if a global subscriber is already installed
#[no_mangle]
pub extern "C" fn gany_init_logging() -> c_int {
    let filter = EnvFilter::try_from_env("GANY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Route captured errors to `logger` instead of `tracing` (NULL restores the default)
#[no_mangle]
pub extern "C" fn gany_set_logger(logger: Option<GanyLogger>) {
    *LOGGER.write() = logger;
}

/// Install the dispatcher for host functions (NULL removes it)
#[no_mangle]
pub extern "C" fn gany_set_function_proxy(proxy: Option<GanyFunctionProxy>) {
    *FUNCTION_PROXY.write() = proxy;
}

/// Install the listener told when a host function is released (NULL removes it)
#[no_mangle]
pub extern "C" fn gany_set_function_dtor_listener(listener: Option<GanyFunctionDtorListener>) {
    *DTOR_LISTENER.write() = listener;
}

/// Free a string returned by this API
///
/// # Safety
/// - `s` must come from a `gany_*` function returning an owned string, or be NULL
/// - `s` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn gany_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
}

// ============================================================================
// Value Creation Functions
// ============================================================================

/// Create a new handle aliasing the value of `v`
///
/// # Safety
/// `v` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_create(v: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(v).cloned())
}

/// Create a boolean value
#[no_mangle]
pub extern "C" fn gany_create_bool(v: bool) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create an 8-bit integer value
#[no_mangle]
pub extern "C" fn gany_create_int8(v: i8) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a 16-bit integer value
#[no_mangle]
pub extern "C" fn gany_create_int16(v: i16) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a 32-bit integer value
#[no_mangle]
pub extern "C" fn gany_create_int32(v: i32) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a 64-bit integer value
#[no_mangle]
pub extern "C" fn gany_create_int64(v: i64) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a single precision float value
#[no_mangle]
pub extern "C" fn gany_create_float(v: f32) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a double precision float value
#[no_mangle]
pub extern "C" fn gany_create_double(v: f64) -> GanyHandle {
    into_handle(Any::from(v))
}

/// Create a string value (NULL or invalid UTF-8 yields undefined)
///
/// # Safety
/// `v` must be a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn gany_create_string(v: *const c_char) -> GanyHandle {
    capture_handle(|| str_arg(v).map(Any::from))
}

/// Create an empty array
#[no_mangle]
pub extern "C" fn gany_create_array() -> GanyHandle {
    into_handle(Any::array())
}

/// Create an empty object
#[no_mangle]
pub extern "C" fn gany_create_object() -> GanyHandle {
    into_handle(Any::object())
}

/// Create a function that forwards its calls to the installed proxy
///
/// Each call hands the proxy a fresh handle per argument. Without a proxy,
/// or when the proxy returns 0, the call yields null.
#[no_mangle]
pub extern "C" fn gany_create_function(func: GanyFuncPtr) -> GanyHandle {
    let owner = Arc::new(HostFunction { func });
    let callable = Callable::variadic("CFunction", "C gany function", move |args: &[Any]| {
        let handles: Vec<GanyHandle> = args.iter().cloned().map(into_handle).collect();
        let ret = match *FUNCTION_PROXY.read() {
            Some(proxy) => proxy(owner.func, handles.as_ptr(), handles.len() as i32),
            None => {
                debug!(func = owner.func, "no function proxy installed");
                // nobody took ownership of the argument handles
                for h in handles {
                    // SAFETY: created by `into_handle` above
                    drop(unsafe { Box::from_raw(h as *mut Any) });
                }
                0
            }
        };
        if ret == 0 {
            return Ok(Any::null());
        }
        // SAFETY: the proxy hands over a handle created by this API
        let value = unsafe { Box::from_raw(ret as *mut Any) };
        Ok(*value)
    });
    into_handle(Any::from_callable(callable))
}

/// Create an undefined value
#[no_mangle]
pub extern "C" fn gany_create_undefined() -> GanyHandle {
    undefined_handle()
}

/// Create a null value
#[no_mangle]
pub extern "C" fn gany_create_null() -> GanyHandle {
    into_handle(Any::null())
}

/// Release a handle
///
/// # Safety
/// - `any` must be a live handle or 0
/// - `any` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn gany_destroy(any: GanyHandle) {
    if any == 0 {
        return;
    }
    drop(Box::from_raw(any as *mut Any));
}

/// Handle to the shared environment object
#[no_mangle]
pub extern "C" fn gany_environment() -> GanyHandle {
    capture_handle(|| Ok(registry().environment()))
}

/// Deep copy
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_clone(any: GanyHandle) -> GanyHandle {
    capture_handle(|| Ok(any_ref(any)?.deep_clone()))
}

// ============================================================================
// Introspection
// ============================================================================

/// Fully qualified class name of the value
///
/// # Safety
/// `any` must be a live handle; the result must be freed with `gany_free_string()`
#[no_mangle]
pub unsafe extern "C" fn gany_class_type_name(any: GanyHandle) -> *mut c_char {
    capture_string(|| Ok(any_ref(any)?.class_type_name()))
}

/// Kind name of the value
///
/// # Safety
/// `any` must be a live handle; the result must be freed with `gany_free_string()`
#[no_mangle]
pub unsafe extern "C" fn gany_type_name(any: GanyHandle) -> *mut c_char {
    capture_string(|| Ok(any_ref(any)?.type_name().to_string()))
}

/// Element count, honoring a user `__len`
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_length(any: GanyHandle) -> i32 {
    capture(|| Ok(any_ref(any)?.length()? as i32), || 0)
}

/// Container size
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_size(any: GanyHandle) -> i32 {
    capture(|| Ok(any_ref(any)?.size() as i32), || 0)
}

/// Whether the value's class is `type_name` or inherits from it
///
/// # Safety
/// `any` must be a live handle and `type_name` a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn gany_is(any: GanyHandle, type_name: *const c_char) -> bool {
    capture_bool(|| Ok(any_ref(any)?.is(str_arg(type_name)?)))
}

macro_rules! kind_predicates {
    ($($c_name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("`Any::", stringify!($method), "` on the value")]
            ///
            /// # Safety
            /// `any` must be a live handle
            #[no_mangle]
            pub unsafe extern "C" fn $c_name(any: GanyHandle) -> bool {
                capture_bool(|| Ok(any_ref(any)?.$method()))
            }
        )*
    };
}

kind_predicates! {
    gany_is_undefined => is_undefined,
    gany_is_null => is_null,
    gany_is_function => is_function,
    gany_is_class => is_class,
    gany_is_exception => is_exception,
    gany_is_property => is_property,
    gany_is_enum => is_enum,
    gany_is_object => is_object,
    gany_is_array => is_array,
    gany_is_int32 => is_int32,
    gany_is_int64 => is_int64,
    gany_is_int8 => is_int8,
    gany_is_int16 => is_int16,
    gany_is_float => is_float,
    gany_is_double => is_double,
    gany_is_number => is_number,
    gany_is_string => is_string,
    gany_is_boolean => is_bool,
    gany_is_user_object => is_user_object,
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert to a 32-bit integer (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_int32(any: GanyHandle) -> i32 {
    capture(|| any_ref(any)?.to_int32(), || 0)
}

/// Convert to a 64-bit integer (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_int64(any: GanyHandle) -> i64 {
    capture(|| any_ref(any)?.to_int64(), || 0)
}

/// Convert to an 8-bit integer (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_int8(any: GanyHandle) -> i8 {
    capture(|| any_ref(any)?.to_int8(), || 0)
}

/// Convert to a 16-bit integer (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_int16(any: GanyHandle) -> i16 {
    capture(|| any_ref(any)?.to_int16(), || 0)
}

/// Convert to a float (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_float(any: GanyHandle) -> f32 {
    capture(|| any_ref(any)?.to_float(), || 0.0)
}

/// Convert to a double (0 on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_double(any: GanyHandle) -> f64 {
    capture(|| any_ref(any)?.to_double(), || 0.0)
}

/// Convert to a boolean (false on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_bool(any: GanyHandle) -> bool {
    capture_bool(|| any_ref(any)?.to_bool())
}

/// Render as a string
///
/// # Safety
/// `any` must be a live handle; the result must be freed with `gany_free_string()`
#[no_mangle]
pub unsafe extern "C" fn gany_to_string(any: GanyHandle) -> *mut c_char {
    capture_string(|| any_ref(any)?.try_to_string())
}

/// Render as JSON (`indent < 0` is compact)
///
/// # Safety
/// `any` must be a live handle; the result must be freed with `gany_free_string()`
#[no_mangle]
pub unsafe extern "C" fn gany_to_json_string(any: GanyHandle, indent: i32) -> *mut c_char {
    capture_string(|| Ok(any_ref(any)?.to_json_string(indent)))
}

/// Plain object view of the value
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_to_object(any: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(any)?.to_object())
}

/// Parse JSON text (malformed input yields an empty object)
///
/// # Safety
/// `json` must be a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn gany_parse_json(json: *const c_char) -> GanyHandle {
    capture(
        || Ok(into_handle(Any::parse_json(str_arg(json)?))),
        || into_handle(Any::object()),
    )
}

/// Describe the value: the reflection dump for classes, the signature list
/// for functions, the plain rendering otherwise
///
/// # Safety
/// `any` must be a live handle; the result must be freed with `gany_free_string()`
#[no_mangle]
pub unsafe extern "C" fn gany_dump(any: GanyHandle) -> *mut c_char {
    capture_string(|| {
        let value = any_ref(any)?;
        if let Some(class) = value.as_class() {
            Ok(class.dump()?.to_json_string(2))
        } else if let Some(function) = value.as_function() {
            Ok(function.to_string())
        } else {
            Ok(value.to_string())
        }
    })
}

// ============================================================================
// Container Functions
// ============================================================================

/// Whether `id` is a key, index or member of the value
///
/// # Safety
/// `any` and `id` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_contains(any: GanyHandle, id: GanyHandle) -> bool {
    capture_bool(|| Ok(any_ref(any)?.contains(any_ref(id)?)))
}

/// Remove a key or index
///
/// # Safety
/// `any` and `id` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_erase(any: GanyHandle, id: GanyHandle) {
    capture_unit(|| {
        any_ref(any)?.erase(any_ref(id)?);
        Ok(())
    })
}

/// Append to an array
///
/// # Safety
/// `any` and `rh` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_push_back(any: GanyHandle, rh: GanyHandle) {
    capture_unit(|| {
        any_ref(any)?.push_back(any_ref(rh)?);
        Ok(())
    })
}

/// Empty an array or object
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_clear(any: GanyHandle) {
    capture_unit(|| {
        any_ref(any)?.clear();
        Ok(())
    })
}

/// Iterator over an array, object or enum
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_iterator(any: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(any)?.iterator())
}

/// Whether the iterator has another item
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_has_next(any: GanyHandle) -> bool {
    capture_bool(|| any_ref(any)?.has_next())
}

/// Advance the iterator, returning an `IteratorItem` with `first` and `second`
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_next(any: GanyHandle) -> GanyHandle {
    capture_handle(|| Ok(Any::new(any_ref(any)?.next()?)))
}

// ============================================================================
// Calls and Items
// ============================================================================

/// Call a named member of the value
///
/// # Safety
/// - `any` and every entry of `args` must be live handles
/// - `args` must point to `argc` handles
/// - `method` must be a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn gany_call_method(
    any: GanyHandle,
    method: *const c_char,
    args: *const GanyHandle,
    argc: i32,
) -> GanyHandle {
    capture_handle(|| {
        let args = collect_args(args, argc)?;
        any_ref(any)?.call(str_arg(method)?, &args)
    })
}

/// Invoke the value itself
///
/// # Safety
/// - `any` and every entry of `args` must be live handles
/// - `args` must point to `argc` handles
#[no_mangle]
pub unsafe extern "C" fn gany_call_function(
    any: GanyHandle,
    args: *const GanyHandle,
    argc: i32,
) -> GanyHandle {
    capture_handle(|| {
        let args = collect_args(args, argc)?;
        any_ref(any)?.invoke(&args)
    })
}

/// Read an item or attribute
///
/// # Safety
/// `any` and `key` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_get_item(any: GanyHandle, key: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(any)?.get_item(any_ref(key)?))
}

/// Write an item or attribute
///
/// # Safety
/// `any`, `key` and `value` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_set_item(any: GanyHandle, key: GanyHandle, value: GanyHandle) {
    capture_unit(|| {
        let mut target = any_ref(any)?.clone();
        target.set_item(any_ref(key)?, any_ref(value)?)
    })
}

/// Delete an item or attribute
///
/// # Safety
/// `any` and `key` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_del_item(any: GanyHandle, key: GanyHandle) {
    capture_unit(|| any_ref(any)?.del_item(any_ref(key)?))
}

// ============================================================================
// Operators
// ============================================================================

macro_rules! binary_operators {
    ($($c_name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("`Any::", stringify!($method), "` (undefined on failure)")]
            ///
            /// # Safety
            /// `a` and `b` must be live handles
            #[no_mangle]
            pub unsafe extern "C" fn $c_name(a: GanyHandle, b: GanyHandle) -> GanyHandle {
                capture_handle(|| any_ref(a)?.$method(any_ref(b)?))
            }
        )*
    };
}

binary_operators! {
    gany_operator_add => add,
    gany_operator_sub => sub,
    gany_operator_mul => mul,
    gany_operator_div => div,
    gany_operator_mod => rem,
    gany_operator_bit_xor => bit_xor,
    gany_operator_bit_or => bit_or,
    gany_operator_bit_and => bit_and,
}

/// Arithmetic negation (undefined on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_operator_neg(any: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(any)?.neg())
}

/// Bitwise not (undefined on failure)
///
/// # Safety
/// `any` must be a live handle
#[no_mangle]
pub unsafe extern "C" fn gany_operator_bit_not(any: GanyHandle) -> GanyHandle {
    capture_handle(|| any_ref(any)?.bit_not())
}

/// Equality (false on failure)
///
/// # Safety
/// `a` and `b` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_operator_equal_to(a: GanyHandle, b: GanyHandle) -> bool {
    capture_bool(|| any_ref(a)?.equal_to(any_ref(b)?))
}

/// Ordering (false on failure)
///
/// # Safety
/// `a` and `b` must be live handles
#[no_mangle]
pub unsafe extern "C" fn gany_operator_less_than(a: GanyHandle, b: GanyHandle) -> bool {
    capture_bool(|| any_ref(a)?.less_than(any_ref(b)?))
}

// ============================================================================
// Version Information
// ============================================================================

/// Packed runtime version, `patch << 16 | minor << 32 | major << 48`
#[no_mangle]
pub extern "C" fn gany_version() -> i64 {
    GANY_VERSION_CODE
}

/// Runtime version string (e.g., "1.0.3")
///
/// # Safety
/// The returned string is static and must not be freed
#[no_mangle]
pub extern "C" fn gany_version_string() -> *const c_char {
    static VERSION: Lazy<CString> =
        Lazy::new(|| CString::new(version_string()).unwrap_or_default());
    VERSION.as_ptr()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    unsafe fn take_string(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let out = CStr::from_ptr(s).to_str().unwrap().to_string();
        gany_free_string(s);
        out
    }

    #[test]
    fn test_value_lifecycle() {
        unsafe {
            let v = gany_create_int32(42);
            assert!(gany_is_int32(v));
            assert_eq!(gany_to_int32(v), 42);
            assert_eq!(take_string(gany_type_name(v)), "int32");

            let copy = gany_create(v);
            assert!(gany_operator_equal_to(v, copy));
            gany_destroy(copy);
            gany_destroy(v);
            gany_destroy(0);
        }
    }

    #[test]
    fn test_scalar_conversions() {
        unsafe {
            let s = gany_create_string(b"12\0".as_ptr() as *const c_char);
            assert!(gany_is_string(s));
            assert_eq!(gany_to_int64(s), 12);
            assert_eq!(gany_to_double(s), 12.0);
            gany_destroy(s);

            let b = gany_create_bool(true);
            assert!(gany_is_boolean(b));
            assert_eq!(gany_to_int8(b), 1);
            assert_eq!(take_string(gany_to_string(b)), "true");
            gany_destroy(b);

            let f = gany_create_float(1.5);
            assert!(gany_is_float(f) && gany_is_number(f));
            assert_eq!(gany_to_float(f), 1.5);
            gany_destroy(f);
        }
    }

    #[test]
    fn test_containers() {
        unsafe {
            let arr = gany_create_array();
            for i in 1..=3 {
                let item = gany_create_int32(i);
                gany_push_back(arr, item);
                gany_destroy(item);
            }
            assert_eq!(gany_size(arr), 3);
            assert_eq!(gany_length(arr), 3);
            let json = gany_to_json_string(arr, -1);
            assert_eq!(libc::strlen(json), 7);
            assert_eq!(take_string(json), "[1,2,3]");

            let obj = gany_create_object();
            let key = gany_create_string(b"items\0".as_ptr() as *const c_char);
            gany_set_item(obj, key, arr);
            assert!(gany_contains(obj, key));

            let copy = gany_clone(obj);
            gany_clear(arr);
            let items = gany_get_item(copy, key);
            assert_eq!(gany_size(items), 3);

            gany_del_item(obj, key);
            assert!(!gany_contains(obj, key));

            for h in [arr, obj, key, copy, items] {
                gany_destroy(h);
            }
        }
    }

    #[test]
    fn test_iteration() {
        unsafe {
            let obj = gany_parse_json(b"{\"a\":1,\"b\":2}\0".as_ptr() as *const c_char);
            let second = gany_create_string(b"second\0".as_ptr() as *const c_char);
            let it = gany_iterator(obj);
            let mut sum = 0;
            while gany_has_next(it) {
                let item = gany_next(it);
                let value = gany_get_item(item, second);
                sum += gany_to_int32(value);
                gany_destroy(value);
                gany_destroy(item);
            }
            assert_eq!(sum, 3);
            for h in [it, obj, second] {
                gany_destroy(h);
            }
        }
    }

    #[test]
    fn test_operators() {
        unsafe {
            let a = gany_create_int32(7);
            let b = gany_create_int32(2);

            let sum = gany_operator_add(a, b);
            assert_eq!(gany_to_int32(sum), 9);
            let rem = gany_operator_mod(a, b);
            assert_eq!(gany_to_int32(rem), 1);
            let neg = gany_operator_neg(a);
            assert_eq!(gany_to_int32(neg), -7);
            let not = gany_operator_bit_not(b);
            assert_eq!(gany_to_int32(not), !2);
            assert!(gany_operator_less_than(b, a));
            assert!(!gany_operator_equal_to(a, b));

            for h in [a, b, sum, rem, neg, not] {
                gany_destroy(h);
            }
        }
    }

    static LOGGED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_errors(message: *const c_char) {
        assert!(!message.is_null());
        LOGGED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_errors_become_defaults() {
        unsafe {
            gany_set_logger(Some(count_errors));
            let before = LOGGED.load(Ordering::SeqCst);

            let obj = gany_create_object();
            let one = gany_create_int32(1);
            let bad = gany_operator_sub(obj, one);
            assert!(gany_is_undefined(bad));
            assert_eq!(gany_to_int32(obj), 0);
            assert_eq!(gany_to_int32(0), 0);
            let missing = gany_create_string(ptr::null());
            assert!(gany_is_undefined(missing));

            assert!(LOGGED.load(Ordering::SeqCst) >= before + 4);
            gany_set_logger(None);
            for h in [obj, one, bad, missing] {
                gany_destroy(h);
            }
        }
    }

    #[test]
    fn test_panic_becomes_default() {
        let value = capture(|| -> GanyResult<i32> { panic!("boom") }, || -1);
        assert_eq!(value, -1);
        let handle = capture_handle(|| panic!("boom"));
        unsafe {
            assert!(gany_is_undefined(handle));
            gany_destroy(handle);
        }
    }

    static RELEASED: AtomicI64 = AtomicI64::new(0);

    extern "C" fn sum_proxy(func: GanyFuncPtr, args: *const GanyHandle, argc: i32) -> GanyHandle {
        unsafe {
            let args = std::slice::from_raw_parts(args, argc as usize);
            let total: i64 = args.iter().map(|&h| gany_to_int64(h)).sum();
            for &h in args {
                gany_destroy(h);
            }
            gany_create_int64(total * func)
        }
    }

    extern "C" fn record_release(func: GanyFuncPtr) {
        RELEASED.store(func, Ordering::SeqCst);
    }

    #[test]
    fn test_host_function() {
        unsafe {
            gany_set_function_proxy(Some(sum_proxy));
            gany_set_function_dtor_listener(Some(record_release));

            let f = gany_create_function(10);
            assert!(gany_is_function(f));
            let args = [gany_create_int32(1), gany_create_int32(2)];
            let ret = gany_call_function(f, args.as_ptr(), 2);
            assert_eq!(gany_to_int64(ret), 30);

            gany_destroy(f);
            assert_eq!(RELEASED.load(Ordering::SeqCst), 10);

            for h in args {
                gany_destroy(h);
            }
            gany_destroy(ret);
            gany_set_function_dtor_listener(None);
        }
    }

    #[test]
    fn test_environment_and_dump() {
        unsafe {
            let env = gany_environment();
            let name = gany_create_string(b"AnyClass\0".as_ptr() as *const c_char);
            let class = gany_get_item(env, name);
            assert!(gany_is_class(class));
            assert!(take_string(gany_dump(class)).contains("AnyClass"));
            for h in [env, name, class] {
                gany_destroy(h);
            }
        }
    }

    #[test]
    fn test_version() {
        assert_eq!(gany_version(), GANY_VERSION_CODE);
        let version = unsafe { CStr::from_ptr(gany_version_string()) };
        assert_eq!(version.to_str().unwrap(), "1.0.3");
    }
}
