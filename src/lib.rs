//! # global-lock
//!
//! **global-lock** provides one process-wide mutual-exclusion lock that
//! behaves the same on every target, whatever concurrency primitive that
//! target actually offers.
//!
//! The caller gets three operations, [`lock`], [`unlock`] and
//! [`shutdown`], and never has to know which primitive sits underneath.
//! The build script inspects the target and compiles in exactly one of:
//!
//! 1. a standard-library blocking mutex (the `std` feature),
//! 2. a statically initialised POSIX `pthread_mutex_t`,
//! 3. a Win32 critical section (Windows Vista / major version 6 or later),
//! 4. an atomic-flag spin lock,
//! 5. a 32-bit atomic-exchange spin lock,
//! 6. a pointer-width test-and-set spin lock.
//!
//! If none is available the build fails; there is no unsynchronised
//! fallback. [`ACTIVE`] reports the choice. Set `GLOBAL_LOCK_PRIMITIVE`
//! at build time (e.g. `posix-mutex`) to force a specific one.
//!
//! ## Quick Start
//!
//! ```rust
//! let mut total = 0;
//!
//! global_lock::lock();
//! total += 1;
//! // Safety: this thread took the lock just above.
//! unsafe { global_lock::unlock() };
//!
//! {
//!     let _guard = global_lock::guard();
//!     total += 1;
//! }
//!
//! assert_eq!(total, 2);
//! ```
//!
//! ## Named entry points
//!
//! Hosts that want their own names, or C-linkable symbols, generate them
//! with [`global_lock!`]:
//!
//! ```rust
//! global_lock::global_lock!(lock = acquire_tables, unlock = release_tables, scope = static);
//!
//! acquire_tables();
//! // Safety: taken just above.
//! unsafe { release_tables() };
//! ```
//!
//! The scope is either `static` (module-local functions) or `extern`
//! (`#[no_mangle] extern "C"`, the default). Anything else is rejected at
//! compile time:
//!
//! ```compile_fail
//! global_lock::global_lock!(scope = pub);
//! ```
//!
//! ## Contracts
//!
//! - The lock is not recursive: a thread holding it must not lock again.
//! - Only the holder may unlock.
//! - [`shutdown`] runs once, after every thread is done with the lock.
//!
//! Breaking these is undefined behavior, not a reported error. A failure the
//! lock cannot recover from, such as an OS too old for the primitive,
//! terminates the process with a diagnostic.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod error;
mod kind;
mod primitive;
mod spin_wait;

#[cfg(any(
    global_lock_primitive = "native_mutex",
    global_lock_primitive = "critical_section",
    test
))]
mod lazy;

pub use error::InitError;
pub use kind::LockPrimitiveKind;

pub use global_lock_macros::global_lock;

use primitive::{Primitive, Selected};

/// The one lock of the process.
static GLOBAL: Selected = Selected::new();

/// The primitive compiled into this build.
pub const ACTIVE: LockPrimitiveKind = <Selected as Primitive>::KIND;

/// Blocks until the calling thread holds the global lock.
///
/// The first call constructs the backing primitive if it needs
/// construction. Waiting is unbounded; there is no timeout and no way to
/// cancel a waiting thread.
#[inline]
pub fn lock() {
    GLOBAL.lock();
}

/// Releases the global lock.
///
/// # Safety
///
/// The calling thread must hold the lock, taken by [`lock`] and not yet
/// released.
#[inline]
pub unsafe fn unlock() {
    unsafe { GLOBAL.unlock() };
}

/// Runs the one-time construction of the backing primitive now.
///
/// [`lock`] does this on first use. Calling it early lets a host hit any
/// startup failure during its own initialisation instead of at the first
/// contended call.
pub fn ensure_initialized() {
    GLOBAL.ensure_initialized();
}

/// Releases the OS resources owned by the backing primitive.
///
/// Spin-based primitives own nothing and this is a no-op for them. Without
/// a call here the resource lives until the process exits.
///
/// # Safety
///
/// Must be called once, after every thread has stopped using the lock.
/// Using the lock afterwards is undefined.
pub unsafe fn shutdown() {
    unsafe { GLOBAL.teardown() };
    log::debug!("global lock: shut down ({ACTIVE})");
}

/// Takes the global lock and returns a guard that releases it on drop.
///
/// # Example
/// ```rust
/// let guard = global_lock::guard();
/// // exclusive until `guard` goes out of scope
/// drop(guard);
/// ```
pub fn guard() -> GlobalLockGuard {
    lock();
    GlobalLockGuard { _not_send: core::marker::PhantomData }
}

/// Guard returned by [`guard`].
///
/// Releases the global lock when dropped. It cannot leave the thread that
/// took the lock.
#[must_use = "the global lock is released as soon as the guard is dropped"]
pub struct GlobalLockGuard {
    _not_send: core::marker::PhantomData<*const ()>,
}

impl Drop for GlobalLockGuard {
    fn drop(&mut self) {
        // Safety: the guard only exists while this thread holds the lock.
        unsafe { unlock() };
    }
}
