//! The process-wide default loader.
//!
//! Initialized on first use with prefix [`DEFAULT_PREFIX`], the process
//! environment, and the tracing logger. Tests can swap its lookup or logger
//! and restore the previous one afterwards.

use std::sync::{LazyLock, PoisonError, RwLock};

use crate::error::Result;
use crate::loader::{LoadTarget, Loader, LogFn};
use crate::lookup::LookupFn;

/// Prefix used by the default loader.
pub const DEFAULT_PREFIX: &str = "APP_";

static DEFAULT: LazyLock<RwLock<Loader>> =
    LazyLock::new(|| RwLock::new(Loader::new(DEFAULT_PREFIX).with_tracing()));

/// Populate `target` with the default loader.
///
/// ```no_run
/// #[derive(Default, envload::Record)]
/// struct Config {
///     pub host: String,
///     pub port: u16,
/// }
///
/// let mut cfg = Config::default();
/// envload::load(&mut cfg)?; // reads APP_HOST and APP_PORT
/// # Ok::<(), envload::LoadError>(())
/// ```
pub fn load(target: impl LoadTarget) -> Result<()> {
    // Clone so the lock is not held while user lookups run.
    default_loader().load(target)
}

/// A copy of the current default loader.
pub fn default_loader() -> Loader {
    DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the default loader, returning the previous one.
pub fn replace_default(loader: Loader) -> Loader {
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, loader)
}

/// Replace the default loader's lookup, returning the previous one.
pub fn set_default_lookup(lookup: LookupFn) -> LookupFn {
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut guard.lookup, lookup)
}

/// Replace the default loader's logger, returning the previous one.
pub fn set_default_logger(logger: Option<LogFn>) -> Option<LogFn> {
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut guard.log, logger)
}
