//! Backing primitives for the global lock.
//!
//! Every strategy implements [`Primitive`]. The build script picks exactly
//! one of them for the target and exposes the choice as the
//! `global_lock_primitive` cfg; this module binds it to [`Selected`], so
//! the public operations compile down to a direct call with no runtime
//! dispatch.
//!
//! Strategies are compiled when selected, and always under `cfg(test)`
//! where the host can run them, so each one keeps its own tests.

use crate::LockPrimitiveKind;

/// The capability interface shared by all strategies.
pub(crate) trait Primitive: Sync {
    const KIND: LockPrimitiveKind;

    /// Constructs the backing resource if this strategy needs one.
    fn ensure_initialized(&self) {}

    /// Blocks until the calling thread holds the lock.
    fn lock(&self);

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock.
    unsafe fn unlock(&self);

    /// Releases any OS resource owned by the strategy.
    ///
    /// # Safety
    ///
    /// No thread may use the lock concurrently with, or after, this call.
    unsafe fn teardown(&self) {}
}

#[cfg(any(global_lock_primitive = "native_mutex", all(test, feature = "std")))]
pub(crate) mod native;

#[cfg(any(global_lock_primitive = "posix_mutex", all(test, unix)))]
pub(crate) mod posix;

#[cfg(any(global_lock_primitive = "critical_section", all(test, windows)))]
pub(crate) mod windows;

#[cfg(any(
    global_lock_primitive = "atomic_flag_spin",
    global_lock_primitive = "builtin_atomic_spin",
    global_lock_primitive = "builtin_sync_spin",
    test
))]
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) mod spin;

#[cfg(global_lock_primitive = "native_mutex")]
pub(crate) type Selected = native::NativeMutex;

#[cfg(global_lock_primitive = "posix_mutex")]
pub(crate) type Selected = posix::PosixMutex;

#[cfg(global_lock_primitive = "critical_section")]
pub(crate) type Selected = windows::CriticalSection;

#[cfg(global_lock_primitive = "atomic_flag_spin")]
pub(crate) type Selected = spin::AtomicFlagSpin;

#[cfg(global_lock_primitive = "builtin_atomic_spin")]
pub(crate) type Selected = spin::BuiltinAtomicSpin;

#[cfg(global_lock_primitive = "builtin_sync_spin")]
pub(crate) type Selected = spin::BuiltinSyncSpin;

#[cfg(not(any(
    global_lock_primitive = "native_mutex",
    global_lock_primitive = "posix_mutex",
    global_lock_primitive = "critical_section",
    global_lock_primitive = "atomic_flag_spin",
    global_lock_primitive = "builtin_atomic_spin",
    global_lock_primitive = "builtin_sync_spin",
)))]
compile_error!("No valid locking mechanism found on this platform.");
