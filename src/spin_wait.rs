//! Backoff between failed acquisition attempts.
//!
//! Spin-based primitives call [`Backoff::snooze`] after every failed
//! test-and-set. The implementation is chosen per target at compile time:
//!
//! - x86 / x86-64: the `pause` instruction via [`core::hint::spin_loop`],
//! - otherwise, when the scheduler can be asked to run someone else: a
//!   cooperative yield,
//! - otherwise: a fixed busy loop the compiler is not allowed to remove.

#![cfg_attr(global_lock_primitive = "posix_mutex", allow(dead_code))]

use core::sync::atomic::{Ordering, compiler_fence};

/// A single "wait a little" step. Stateless and infallible.
pub(crate) trait Backoff {
    fn snooze();
}

/// CPU spin-loop hint (`pause` on x86).
#[cfg(any(target_arch = "x86", target_arch = "x86_64", test))]
pub(crate) struct Pause;

#[cfg(any(target_arch = "x86", target_arch = "x86_64", test))]
impl Backoff for Pause {
    #[inline]
    fn snooze() {
        core::hint::spin_loop();
    }
}

/// Gives the rest of the time slice back to the scheduler.
#[cfg(any(feature = "std", unix))]
#[cfg_attr(any(target_arch = "x86", target_arch = "x86_64"), allow(dead_code))]
pub(crate) struct Yield;

#[cfg(any(feature = "std", unix))]
impl Backoff for Yield {
    #[inline]
    fn snooze() {
        #[cfg(feature = "std")]
        std::thread::yield_now();

        #[cfg(not(feature = "std"))]
        unsafe {
            libc::sched_yield();
        }
    }
}

/// Number of iterations burned by [`BusyLoop`].
#[cfg_attr(
    any(feature = "std", unix, target_arch = "x86", target_arch = "x86_64"),
    allow(dead_code)
)]
pub(crate) const BUSY_LOOP_ITERATIONS: usize = 1000;

/// Burns a fixed number of iterations, fencing on each one.
#[cfg_attr(
    any(feature = "std", unix, target_arch = "x86", target_arch = "x86_64"),
    allow(dead_code)
)]
pub(crate) struct BusyLoop;

impl Backoff for BusyLoop {
    #[inline]
    fn snooze() {
        for i in 0..BUSY_LOOP_ITERATIONS {
            compiler_fence(Ordering::SeqCst);
            core::hint::black_box(i);
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) type SpinWait = Pause;

#[cfg(all(
    not(any(target_arch = "x86", target_arch = "x86_64")),
    any(feature = "std", unix)
))]
pub(crate) type SpinWait = Yield;

#[cfg(all(
    not(any(target_arch = "x86", target_arch = "x86_64")),
    not(any(feature = "std", unix))
))]
pub(crate) type SpinWait = BusyLoop;
