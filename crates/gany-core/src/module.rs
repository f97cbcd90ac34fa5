//! Module registration
//!
//! A module is a unit of class registrations living outside this crate.
//! The host hands its registry to [`register_module`], which checks the
//! version the module was built against and runs the module body once.

use crate::error::{GanyError, GanyResult};
use crate::registry::{self, Registry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Major version
pub const GANY_VERSION_MAJOR: u64 = 1;
/// Minor version
pub const GANY_VERSION_MINOR: u64 = 0;
/// Patch version
pub const GANY_VERSION_PATCH: u64 = 3;
/// Packed version: `patch << 16 | minor << 32 | major << 48`
pub const GANY_VERSION_CODE: i64 =
    (GANY_VERSION_PATCH << 16 | GANY_VERSION_MINOR << 32 | GANY_VERSION_MAJOR << 48) as i64;

/// `major.minor.patch`
pub fn version_string() -> String {
    format!("{GANY_VERSION_MAJOR}.{GANY_VERSION_MINOR}.{GANY_VERSION_PATCH}")
}

/// A set of class registrations
///
/// ```ignore
/// struct Geometry;
///
/// impl GanyModule for Geometry {
///     const NAME: &'static str = "Geometry";
///
///     fn register(reg: &Registry) -> GanyResult<()> {
///         reg.class::<Point>("geo", "Point", "2D point")
///             .init(|x: f64, y: f64| Point { x, y }, "")
///             .build()?;
///         Ok(())
///     }
/// }
///
/// register_module::<Geometry>(GANY_VERSION_CODE, registry())?;
/// ```
pub trait GanyModule {
    /// Unique module name
    const NAME: &'static str;

    /// Register the module's classes into `reg`
    fn register(reg: &Registry) -> GanyResult<()>;
}

/// Register module `M` into `host`
///
/// `version_code` is the [`GANY_VERSION_CODE`] the module was built
/// against. A mismatch is rejected when the host runs with
/// `strict_module_version`, and only logged otherwise. The host becomes the
/// active registry when none is active yet. A module already registered
/// into `host` is not run again.
pub fn register_module<M: GanyModule>(version_code: i64, host: &Arc<Registry>) -> GanyResult<()> {
    if version_code != GANY_VERSION_CODE {
        warn!(
            module = M::NAME,
            expected = GANY_VERSION_CODE,
            got = version_code,
            "module version mismatch"
        );
        if host.options().strict_module_version {
            return Err(GanyError::RegistrationError(format!(
                "Module {} was built for version code {:#x}, expected {:#x}.",
                M::NAME,
                version_code,
                GANY_VERSION_CODE
            )));
        }
    }

    registry::install(host.clone())?;

    if !host.mark_module(M::NAME) {
        debug!(module = M::NAME, "module already registered");
        return Ok(());
    }
    M::register(host)?;
    debug!(module = M::NAME, "module registered");
    Ok(())
}
