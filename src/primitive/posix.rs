use core::cell::UnsafeCell;

use libc::{
    PTHREAD_MUTEX_INITIALIZER, pthread_mutex_destroy, pthread_mutex_lock, pthread_mutex_t,
    pthread_mutex_unlock,
};

use super::Primitive;
use crate::LockPrimitiveKind;

/// A `pthread_mutex_t` set up with the static initializer.
///
/// No construction call is needed before first use, so
/// `ensure_initialized` keeps the default no-op.
pub(crate) struct PosixMutex {
    mutex: UnsafeCell<pthread_mutex_t>,
}

// Safety: pthread mutexes are designed to be shared between threads; the
// cell is only ever handed to the pthread functions.
unsafe impl Sync for PosixMutex {}

impl PosixMutex {
    pub(crate) const fn new() -> Self {
        Self {
            mutex: UnsafeCell::new(PTHREAD_MUTEX_INITIALIZER),
        }
    }
}

impl Primitive for PosixMutex {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::PosixMutex;

    fn lock(&self) {
        let rc = unsafe { pthread_mutex_lock(self.mutex.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_lock failed");
    }

    unsafe fn unlock(&self) {
        let rc = unsafe { pthread_mutex_unlock(self.mutex.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_unlock failed");
    }

    unsafe fn teardown(&self) {
        let rc = unsafe { pthread_mutex_destroy(self.mutex.get()) };
        debug_assert_eq!(rc, 0, "pthread_mutex_destroy failed");

        log::debug!("global lock: destroyed {}", Self::KIND);
    }
}
