//! Spin-lock strategies for targets without a blocking primitive.
//!
//! All three poll a shared word with an atomic test-and-set and call the
//! backoff `W` after every failed attempt. There is no retry cap and no
//! fairness: a thread that never unlocks starves every other caller.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use super::Primitive;
use crate::LockPrimitiveKind;
use crate::spin_wait::{Backoff, SpinWait};

/// Test-and-set on an `AtomicBool` with acquire / release ordering.
pub(crate) struct AtomicFlagSpin<W = SpinWait> {
    flag: AtomicBool,
    _wait: PhantomData<fn() -> W>,
}

impl<W> AtomicFlagSpin<W> {
    pub(crate) const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            _wait: PhantomData,
        }
    }
}

impl<W: Backoff> Primitive for AtomicFlagSpin<W> {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::AtomicFlagSpin;

    #[inline]
    fn lock(&self) {
        while self.flag.swap(true, Ordering::Acquire) {
            W::snooze();
        }
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Exchange on an `AtomicI32`, sequentially consistent both ways.
pub(crate) struct BuiltinAtomicSpin<W = SpinWait> {
    word: AtomicI32,
    _wait: PhantomData<fn() -> W>,
}

impl<W> BuiltinAtomicSpin<W> {
    pub(crate) const fn new() -> Self {
        Self {
            word: AtomicI32::new(0),
            _wait: PhantomData,
        }
    }
}

impl<W: Backoff> Primitive for BuiltinAtomicSpin<W> {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::BuiltinAtomicSpin;

    #[inline]
    fn lock(&self) {
        while self.word.swap(1, Ordering::SeqCst) != 0 {
            W::snooze();
        }
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.word.store(0, Ordering::SeqCst);
    }
}

/// Pointer-width test-and-set: acquire barrier on set, release on clear.
///
/// Only needs pointer-sized atomics, the last rung before the build fails.
pub(crate) struct BuiltinSyncSpin<W = SpinWait> {
    word: AtomicUsize,
    _wait: PhantomData<fn() -> W>,
}

impl<W> BuiltinSyncSpin<W> {
    pub(crate) const fn new() -> Self {
        Self {
            word: AtomicUsize::new(0),
            _wait: PhantomData,
        }
    }
}

impl<W: Backoff> Primitive for BuiltinSyncSpin<W> {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::BuiltinSyncSpin;

    #[inline]
    fn lock(&self) {
        while self.word.swap(1, Ordering::Acquire) != 0 {
            W::snooze();
        }
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.word.store(0, Ordering::Release);
    }
}
