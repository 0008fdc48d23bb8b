use core::mem;

use windows_sys::Win32::System::SystemInformation::{GetVersionExW, OSVERSIONINFOW};
use windows_sys::Win32::System::Threading::{
    CRITICAL_SECTION, DeleteCriticalSection, EnterCriticalSection, InitializeCriticalSection,
    LeaveCriticalSection,
};

use super::Primitive;
use crate::LockPrimitiveKind;
use crate::error::{MIN_WINDOWS_MAJOR, require_min_os_major};
use crate::lazy::LazyInit;

/// A Win32 critical section, constructed in place on first use.
///
/// The OS version check runs inside the same one-time initialisation as
/// `InitializeCriticalSection`, so it happens exactly once per lifecycle
/// and always before the section is entered.
pub(crate) struct CriticalSection {
    section: LazyInit<CRITICAL_SECTION>,
}

// Safety: a critical section is shared between threads by design; it never
// moves once initialised because it lives inside `LazyInit`'s storage.
unsafe impl Sync for CriticalSection {}

impl CriticalSection {
    pub(crate) const fn new() -> Self {
        Self {
            section: LazyInit::new(),
        }
    }

    #[track_caller]
    fn section(&self) -> *mut CRITICAL_SECTION {
        self.section.ensure(|slot| {
            require_min_os_major(os_major_version(), MIN_WINDOWS_MAJOR)?;
            unsafe { InitializeCriticalSection(slot) };
            log::debug!("global lock: constructed {}", Self::KIND);
            Ok(())
        });

        self.section.as_ptr()
    }
}

/// Major version of the running Windows, or `None` if the query fails.
fn os_major_version() -> Option<u32> {
    let mut info: OSVERSIONINFOW = unsafe { mem::zeroed() };
    info.dwOSVersionInfoSize = mem::size_of::<OSVERSIONINFOW>() as u32;

    if unsafe { GetVersionExW(&mut info) } == 0 {
        return None;
    }

    Some(info.dwMajorVersion)
}

impl Primitive for CriticalSection {
    const KIND: LockPrimitiveKind = LockPrimitiveKind::WindowsCriticalSection;

    fn ensure_initialized(&self) {
        self.section();
    }

    fn lock(&self) {
        unsafe { EnterCriticalSection(self.section()) };
    }

    unsafe fn unlock(&self) {
        unsafe { LeaveCriticalSection(self.section.as_ptr()) };
    }

    unsafe fn teardown(&self) {
        let destroyed = unsafe { self.section.teardown(|slot| DeleteCriticalSection(slot)) };

        if destroyed {
            log::debug!("global lock: destroyed {}", Self::KIND);
        }
    }
}
