use std::ptr;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::Primitive;
use crate::LockPrimitiveKind;
use crate::lazy::LazyInit;

/// Lock state guarded by a standard mutex.
///
/// The standard mutex only protects this small record for the time it
/// takes to update it, so the global lock can be released by a plain
/// function call instead of by dropping a guard.
#[derive(Default)]
struct State {
    held: bool,
    waiters: usize,
}

struct Gate {
    state: Mutex<State>,
    released: Condvar,
}

impl Gate {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Blocking lock built on `std::sync::{Mutex, Condvar}`, constructed on
/// first use and destroyed by `teardown`.
pub(crate) struct NativeMutex {
    gate: LazyInit<Gate>,
}

impl NativeMutex {
    pub(crate) const fn new() -> Self {
        Self {
            gate: LazyInit::new(),
        }
    }

    #[track_caller]
    fn gate(&self) -> &Gate {
        self.gate.ensure(|slot| {
            unsafe {
                slot.write(Gate {
                    state: Mutex::new(State::default()),
                    released: Condvar::new(),
                });
            }
            log::debug!("global lock: constructed {}", Self::KIND);
            Ok(())
        })
    }
}

impl Primitive for NativeMutex {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::NativeMutex;

    fn ensure_initialized(&self) {
        self.gate();
    }

    fn lock(&self) {
        let gate = self.gate();
        let mut state = gate.state();

        while state.held {
            state.waiters += 1;
            state = gate
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiters -= 1;
        }

        state.held = true;
    }

    unsafe fn unlock(&self) {
        // Safety: the caller holds the lock, so `lock` already ran `ensure`.
        let gate = unsafe { self.gate.get_unchecked() };

        let mut state = gate.state();
        debug_assert!(state.held, "global lock released while not held");
        state.held = false;
        let waiting = state.waiters > 0;
        drop(state);

        if waiting {
            gate.released.notify_one();
        }
    }

    unsafe fn teardown(&self) {
        let destroyed = unsafe { self.gate.teardown(|slot| ptr::drop_in_place(slot)) };

        if destroyed {
            log::debug!("global lock: destroyed {}", Self::KIND);
        }
    }
}
