use core::fmt;

/// The primitive backing the global lock.
///
/// Exactly one kind is compiled into a build; [`crate::ACTIVE`] reports
/// which one. The choice is made by the build script and never changes at
/// runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockPrimitiveKind {
    /// `std::sync::Mutex` paired with a `Condvar`, constructed on first use.
    NativeMutex,
    /// A statically initialised `pthread_mutex_t`.
    PosixMutex,
    /// A Win32 `CRITICAL_SECTION`, constructed on first use.
    WindowsCriticalSection,
    /// An `AtomicBool` used as a test-and-set flag.
    AtomicFlagSpin,
    /// An `AtomicI32` exchanged with sequentially consistent ordering.
    BuiltinAtomicSpin,
    /// A pointer-width word with acquire test-and-set / release clear.
    BuiltinSyncSpin,
}

impl LockPrimitiveKind {
    /// Short, stable name of the primitive.
    pub const fn name(self) -> &'static str {
        match self {
            LockPrimitiveKind::NativeMutex => "native-mutex",
            LockPrimitiveKind::PosixMutex => "posix-mutex",
            LockPrimitiveKind::WindowsCriticalSection => "critical-section",
            LockPrimitiveKind::AtomicFlagSpin => "atomic-flag-spin",
            LockPrimitiveKind::BuiltinAtomicSpin => "builtin-atomic-spin",
            LockPrimitiveKind::BuiltinSyncSpin => "builtin-sync-spin",
        }
    }

    /// Returns `true` if waiting threads busy-wait instead of blocking.
    pub const fn is_spin(self) -> bool {
        matches!(
            self,
            LockPrimitiveKind::AtomicFlagSpin
                | LockPrimitiveKind::BuiltinAtomicSpin
                | LockPrimitiveKind::BuiltinSyncSpin
        )
    }

    /// Returns `true` if [`crate::shutdown`] has an OS resource to release.
    pub const fn owns_os_resource(self) -> bool {
        matches!(
            self,
            LockPrimitiveKind::NativeMutex
                | LockPrimitiveKind::PosixMutex
                | LockPrimitiveKind::WindowsCriticalSection
        )
    }
}

impl fmt::Display for LockPrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
