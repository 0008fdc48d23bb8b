//! Exactly-once, in-place construction of a primitive's state.
//!
//! [`LazyInit`] owns uninitialised storage for a `T` and a lifecycle marker:
//!
//! ```text
//! Uninitialized ──▶ Initializing ──▶ Ready ──▶ ShutDown
//!        ▲                                        │
//!        └────────────── (next first use) ────────┘
//! ```
//!
//! The first caller of [`LazyInit::ensure`] wins the transition to
//! `Initializing` and constructs the value in place, so primitives that
//! must not move after construction (a Win32 `CRITICAL_SECTION`) are
//! supported. Concurrent callers spin briefly with [`SpinWait`], then yield
//! to the scheduler until the value is `Ready`. A failed initialisation is
//! fatal and is never retried.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::error::{InitError, fatal};
use crate::spin_wait::{Backoff, SpinWait};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const SHUT_DOWN: u8 = 3;

/// Spin rounds a waiter burns before it starts yielding its time slice.
const SPINS_BEFORE_YIELD: u32 = 64;

#[cfg(any(feature = "std", unix))]
type InitYield = crate::spin_wait::Yield;

#[cfg(not(any(feature = "std", unix)))]
type InitYield = SpinWait;

/// One wait step for a caller that found construction in progress.
#[inline]
fn wait_for_init<S: Backoff, Y: Backoff>(rounds: &mut u32) {
    if *rounds < SPINS_BEFORE_YIELD {
        *rounds += 1;
        S::snooze();
    } else {
        Y::snooze();
    }
}

/// Observable lifecycle of a [`LazyInit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Uninitialized,
    Initializing,
    Ready,
    ShutDown,
}

pub(crate) struct LazyInit<T> {
    phase: AtomicU8,
    slot: UnsafeCell<MaybeUninit<T>>,
}

// Safety: the slot is written only by the single thread that won the
// `Initializing` transition, and published with release ordering before
// any other thread may read it.
unsafe impl<T: Send + Sync> Sync for LazyInit<T> {}

impl<T> LazyInit<T> {
    pub(crate) const fn new() -> Self {
        Self {
            phase: AtomicU8::new(UNINITIALIZED),
            slot: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Returns the value, constructing it first if needed.
    ///
    /// `init` receives a pointer to uninitialised storage and must fully
    /// initialise it before returning `Ok`. It runs at most once per
    /// lifecycle, even when many threads race here. If it returns an
    /// error the process is terminated.
    #[inline]
    #[track_caller]
    pub(crate) fn ensure<F>(&self, init: F) -> &T
    where
        F: FnOnce(*mut T) -> Result<(), InitError>,
    {
        if self.phase.load(Ordering::Acquire) == READY {
            // Safety: `Ready` is only published after a successful `init`.
            return unsafe { self.get_unchecked() };
        }

        self.ensure_slow(init)
    }

    #[cold]
    #[track_caller]
    fn ensure_slow<F>(&self, init: F) -> &T
    where
        F: FnOnce(*mut T) -> Result<(), InitError>,
    {
        let mut init = Some(init);
        let mut rounds = 0;

        loop {
            match self.phase.load(Ordering::Acquire) {
                READY => return unsafe { self.get_unchecked() },
                from @ (UNINITIALIZED | SHUT_DOWN) => {
                    if self
                        .phase
                        .compare_exchange(from, INITIALIZING, Ordering::Acquire, Ordering::Acquire)
                        .is_err()
                    {
                        continue;
                    }

                    // Restores `from` if `init` unwinds, so waiters do not hang.
                    let rollback = Rollback {
                        phase: &self.phase,
                        from,
                    };

                    let init = match init.take() {
                        Some(init) => init,
                        None => unreachable!("initializer consumed twice"),
                    };

                    if let Err(err) = init(self.as_ptr()) {
                        fatal(&err);
                    }

                    core::mem::forget(rollback);
                    self.phase.store(READY, Ordering::Release);

                    return unsafe { self.get_unchecked() };
                }
                _ => wait_for_init::<SpinWait, InitYield>(&mut rounds),
            }
        }
    }

    /// Returns the value without checking the lifecycle.
    ///
    /// # Safety
    ///
    /// The phase must be `Ready`.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self) -> &T {
        debug_assert_eq!(self.phase(), Phase::Ready);
        unsafe { (*self.slot.get()).assume_init_ref() }
    }

    /// Raw pointer to the storage, valid for the lifetime of `self`.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.slot.get().cast::<T>()
    }

    /// Destroys the value if it was constructed and marks the cell shut
    /// down. Returns `true` if `destroy` ran.
    ///
    /// # Safety
    ///
    /// No other thread may be using the value, or call [`LazyInit::ensure`]
    /// concurrently.
    pub(crate) unsafe fn teardown<F>(&self, destroy: F) -> bool
    where
        F: FnOnce(*mut T),
    {
        if self.phase.load(Ordering::Acquire) != READY {
            return false;
        }

        destroy(self.as_ptr());
        self.phase.store(SHUT_DOWN, Ordering::Release);

        true
    }

    pub(crate) fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            UNINITIALIZED => Phase::Uninitialized,
            INITIALIZING => Phase::Initializing,
            READY => Phase::Ready,
            _ => Phase::ShutDown,
        }
    }
}

impl<T> Drop for LazyInit<T> {
    fn drop(&mut self) {
        if *self.phase.get_mut() == READY {
            unsafe { self.slot.get_mut().assume_init_drop() };
        }
    }
}

struct Rollback<'a> {
    phase: &'a AtomicU8,
    from: u8,
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        self.phase.store(self.from, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::{MIN_WINDOWS_MAJOR, require_min_os_major};

    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn construction_runs_exactly_once_under_contention() {
        static CELL: LazyInit<u64> = LazyInit::new();
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    *CELL.ensure(|slot| {
                        CALLS.fetch_add(1, Ordering::SeqCst);
                        // Widen the race window for the other threads.
                        thread::sleep(Duration::from_millis(20));
                        unsafe { slot.write(7) };
                        Ok(())
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(CELL.phase(), Phase::Ready);
    }

    #[test]
    fn starts_uninitialized() {
        let cell: LazyInit<u8> = LazyInit::new();
        assert_eq!(cell.phase(), Phase::Uninitialized);
    }

    #[test]
    fn teardown_destroys_and_allows_a_new_lifecycle() {
        let cell: LazyInit<String> = LazyInit::new();
        let built = AtomicUsize::new(0);

        let init = |slot: *mut String| {
            built.fetch_add(1, Ordering::SeqCst);
            unsafe { slot.write(String::from("gate")) };
            Ok(())
        };

        assert_eq!(cell.ensure(init), "gate");
        assert_eq!(cell.ensure(|_| unreachable!()), "gate");

        let destroyed = unsafe { cell.teardown(|slot| core::ptr::drop_in_place(slot)) };
        assert!(destroyed);
        assert_eq!(cell.phase(), Phase::ShutDown);

        assert_eq!(cell.ensure(init), "gate");
        assert_eq!(built.load(Ordering::SeqCst), 2);

        unsafe { cell.teardown(|slot| core::ptr::drop_in_place(slot)) };
    }

    #[test]
    fn teardown_before_first_use_is_a_no_op() {
        let cell: LazyInit<u32> = LazyInit::new();
        let destroyed = unsafe { cell.teardown(|_| panic!("nothing to destroy")) };

        assert!(!destroyed);
        assert_eq!(cell.phase(), Phase::Uninitialized);
    }

    #[test]
    fn panicking_initializer_rolls_back() {
        let cell: LazyInit<u32> = LazyInit::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cell.ensure(|_| panic!("constructor blew up"));
        }));

        assert!(result.is_err());
        assert_eq!(cell.phase(), Phase::Uninitialized);

        assert_eq!(
            *cell.ensure(|slot| {
                unsafe { slot.write(3) };
                Ok(())
            }),
            3
        );
    }

    struct Counted<const ID: usize>;

    static SNOOZES: [AtomicUsize; 2] = [AtomicUsize::new(0), AtomicUsize::new(0)];

    impl<const ID: usize> Backoff for Counted<ID> {
        fn snooze() {
            SNOOZES[ID].fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn waiters_spin_then_yield() {
        let mut rounds = 0;

        for _ in 0..SPINS_BEFORE_YIELD + 10 {
            wait_for_init::<Counted<0>, Counted<1>>(&mut rounds);
        }

        assert_eq!(SNOOZES[0].load(Ordering::SeqCst), SPINS_BEFORE_YIELD as usize);
        assert_eq!(SNOOZES[1].load(Ordering::SeqCst), 10);
    }

    #[cfg(any(feature = "std", unix))]
    #[test]
    fn waiters_yield_to_the_scheduler() {
        assert!(core::any::type_name::<InitYield>().ends_with("Yield"));
    }

    /// Set in the child process spawned by
    /// `unsupported_os_version_terminates_process`.
    const FATAL_CHILD: &str = "GLOBAL_LOCK_FATAL_CHILD";

    /// Runs with and without the `std` feature: both paths must end the
    /// process rather than unwind back into the caller.
    #[cfg(any(unix, windows))]
    #[test]
    fn unsupported_os_version_terminates_process() {
        if std::env::var_os(FATAL_CHILD).is_some() {
            let cell: LazyInit<u32> = LazyInit::new();
            let attempts = AtomicUsize::new(0);

            for _ in 0..2 {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    cell.ensure(|slot| {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        require_min_os_major(Some(5), MIN_WINDOWS_MAJOR)?;
                        unsafe { slot.write(1) };
                        Ok(())
                    });
                }));
                let attempts = attempts.load(Ordering::SeqCst);
                println!("returned to caller after {attempts} attempt(s)");
            }
            println!("lock served");
            return;
        }

        let exe = std::env::current_exe().unwrap();
        let output = std::process::Command::new(exe)
            .arg("lazy::tests::unsupported_os_version_terminates_process")
            .arg("--exact")
            .arg("--nocapture")
            .arg("--test-threads=1")
            .env(FATAL_CHILD, "1")
            .output()
            .unwrap();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
        assert!(stderr.contains("major version 5"), "stderr: {stderr}");
        assert!(stderr.contains("File: "), "stderr: {stderr}");
        assert!(!stdout.contains("returned to caller"), "stdout: {stdout}");
        assert!(!stdout.contains("lock served"), "stdout: {stdout}");
    }
}
