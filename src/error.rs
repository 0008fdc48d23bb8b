//! Startup failures and the fatal termination path.
//!
//! A lock that cannot guarantee exclusion must never degrade into a no-op,
//! so none of these errors is returned to callers. They are reported once
//! and the process stops.

use core::fmt;

/// Oldest Windows major version served by the critical-section primitive.
#[cfg(any(global_lock_primitive = "critical_section", test))]
pub(crate) const MIN_WINDOWS_MAJOR: u32 = 6;

/// Why the global lock could not be brought up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The running OS version could not be queried.
    OsVersionUnavailable,

    /// The running OS is older than the primitive supports.
    UnsupportedOsVersion { found: u32, minimum: u32 },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::OsVersionUnavailable => {
                f.write_str("failed to query the operating system version")
            }
            InitError::UnsupportedOsVersion { found, minimum } => write!(
                f,
                "unsupported operating system: major version {found} is below the required {minimum}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {}

/// Checks a detected OS major version against `minimum`.
///
/// `detected` is `None` when the version query itself failed.
#[cfg(any(global_lock_primitive = "critical_section", test))]
pub(crate) fn require_min_os_major(detected: Option<u32>, minimum: u32) -> Result<(), InitError> {
    match detected {
        None => Err(InitError::OsVersionUnavailable),
        Some(found) if found < minimum => Err(InitError::UnsupportedOsVersion { found, minimum }),
        Some(_) => Ok(()),
    }
}

/// Reports `err` and terminates the process with a failure status.
///
/// The reported location is the caller's, so the diagnostic names the
/// primitive whose initialisation failed.
#[cfg(any(
    global_lock_primitive = "native_mutex",
    global_lock_primitive = "critical_section",
    test
))]
#[cold]
#[track_caller]
pub(crate) fn fatal(err: &InitError) -> ! {
    let at = core::panic::Location::caller();

    log::error!("global lock unusable: {err} ({}:{})", at.file(), at.line());

    #[cfg(feature = "std")]
    {
        eprintln!(
            "global lock: {err}\nFile: {}   Line: {}",
            at.file(),
            at.line()
        );
        std::process::exit(1);
    }

    #[cfg(not(feature = "std"))]
    {
        use core::fmt::Write;

        let _ = write!(
            RawStderr,
            "global lock: {err}\nFile: {}   Line: {}\n",
            at.file(),
            at.line()
        );
        exit_failure()
    }
}

/// Unbuffered writes to the standard error handle, for builds without
/// `std`. Output is best effort.
#[cfg(all(
    not(feature = "std"),
    any(global_lock_primitive = "critical_section", test)
))]
struct RawStderr;

#[cfg(all(
    not(feature = "std"),
    any(global_lock_primitive = "critical_section", test)
))]
impl fmt::Write for RawStderr {
    #[cfg(unix)]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut rest = s.as_bytes();

        while !rest.is_empty() {
            let n =
                unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
            if n <= 0 {
                return Err(fmt::Error);
            }
            rest = &rest[n as usize..];
        }

        Ok(())
    }

    #[cfg(windows)]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        use windows_sys::Win32::Storage::FileSystem::WriteFile;
        use windows_sys::Win32::System::Console::{GetStdHandle, STD_ERROR_HANDLE};

        let mut written = 0u32;
        let ok = unsafe {
            WriteFile(
                GetStdHandle(STD_ERROR_HANDLE),
                s.as_ptr(),
                s.len() as u32,
                &mut written,
                core::ptr::null_mut(),
            )
        };

        if ok == 0 { Err(fmt::Error) } else { Ok(()) }
    }

    #[cfg(not(any(unix, windows)))]
    fn write_str(&mut self, _: &str) -> fmt::Result {
        Ok(())
    }
}

/// Ends the process with status 1 without running any unwinding.
#[cfg(all(
    not(feature = "std"),
    any(global_lock_primitive = "critical_section", test)
))]
fn exit_failure() -> ! {
    #[cfg(unix)]
    unsafe {
        libc::exit(1);
    }

    #[cfg(windows)]
    unsafe {
        windows_sys::Win32::System::Threading::ExitProcess(1);
    }

    // No process to end on this target.
    #[cfg(not(any(unix, windows)))]
    panic!("global lock: unrecoverable initialisation failure");
}
