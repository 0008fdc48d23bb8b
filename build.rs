//! Picks the lock primitive for the target being built.
//!
//! Cargo hands the build script the target's capabilities through
//! `CARGO_FEATURE_*` and `CARGO_CFG_*`. The candidates below are tried in
//! priority order and exactly one is emitted as
//! `--cfg global_lock_primitive="<kind>"`. Setting `GLOBAL_LOCK_PRIMITIVE`
//! forces a specific kind instead, as long as the target can provide it.

use std::env;

/// The candidate primitives, highest priority first.
const CANDIDATES: [Candidate; 6] = [
    Candidate::NativeMutex,
    Candidate::PosixMutex,
    Candidate::CriticalSection,
    Candidate::AtomicFlagSpin,
    Candidate::BuiltinAtomicSpin,
    Candidate::BuiltinSyncSpin,
];

#[derive(Clone, Copy)]
enum Candidate {
    NativeMutex,
    PosixMutex,
    CriticalSection,
    AtomicFlagSpin,
    BuiltinAtomicSpin,
    BuiltinSyncSpin,
}

impl Candidate {
    /// Value of the `global_lock_primitive` cfg.
    fn cfg(self) -> &'static str {
        match self {
            Candidate::NativeMutex => "native_mutex",
            Candidate::PosixMutex => "posix_mutex",
            Candidate::CriticalSection => "critical_section",
            Candidate::AtomicFlagSpin => "atomic_flag_spin",
            Candidate::BuiltinAtomicSpin => "builtin_atomic_spin",
            Candidate::BuiltinSyncSpin => "builtin_sync_spin",
        }
    }

    /// Spelling accepted in `GLOBAL_LOCK_PRIMITIVE`.
    fn env_name(self) -> &'static str {
        match self {
            Candidate::NativeMutex => "native-mutex",
            Candidate::PosixMutex => "posix-mutex",
            Candidate::CriticalSection => "critical-section",
            Candidate::AtomicFlagSpin => "atomic-flag-spin",
            Candidate::BuiltinAtomicSpin => "builtin-atomic-spin",
            Candidate::BuiltinSyncSpin => "builtin-sync-spin",
        }
    }

    fn available(self, caps: &Capabilities) -> bool {
        match self {
            Candidate::NativeMutex => caps.std,
            Candidate::PosixMutex => caps.unix,
            Candidate::CriticalSection => caps.windows,
            Candidate::AtomicFlagSpin => caps.has_atomic("8"),
            Candidate::BuiltinAtomicSpin => caps.has_atomic("32"),
            Candidate::BuiltinSyncSpin => caps.has_atomic("ptr"),
        }
    }
}

/// What the target offers, as reported by Cargo.
struct Capabilities {
    std: bool,
    unix: bool,
    windows: bool,
    atomics: Vec<String>,
}

impl Capabilities {
    fn probe() -> Self {
        let families = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
        let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        let atomics = env::var("CARGO_CFG_TARGET_HAS_ATOMIC").unwrap_or_default();

        Self {
            std: env::var_os("CARGO_FEATURE_STD").is_some(),
            unix: families.split(',').any(|f| f == "unix"),
            windows: os == "windows",
            atomics: atomics
                .split(',')
                .filter(|w| !w.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    fn has_atomic(&self, width: &str) -> bool {
        self.atomics.iter().any(|w| w == width)
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GLOBAL_LOCK_PRIMITIVE");

    let values = CANDIDATES
        .iter()
        .map(|c| format!("\"{}\"", c.cfg()))
        .collect::<Vec<_>>()
        .join(", ");
    println!("cargo:rustc-check-cfg=cfg(global_lock_primitive, values({values}))");

    let caps = Capabilities::probe();

    let chosen = match env::var("GLOBAL_LOCK_PRIMITIVE") {
        Ok(forced) => forced_candidate(forced.trim(), &caps),
        Err(_) => CANDIDATES
            .into_iter()
            .find(|c| c.available(&caps))
            .unwrap_or_else(|| {
                panic!(
                    "global-lock: no valid locking mechanism found for target `{}`",
                    env::var("TARGET").unwrap_or_default()
                )
            }),
    };

    println!("cargo:rustc-cfg=global_lock_primitive=\"{}\"", chosen.cfg());
}

/// Resolves a `GLOBAL_LOCK_PRIMITIVE` override, failing the build when the
/// name is unknown or the target cannot provide it.
fn forced_candidate(name: &str, caps: &Capabilities) -> Candidate {
    let Some(candidate) = CANDIDATES.into_iter().find(|c| c.env_name() == name) else {
        let known = CANDIDATES
            .iter()
            .map(|c| c.env_name())
            .collect::<Vec<_>>()
            .join(", ");
        panic!("global-lock: unknown GLOBAL_LOCK_PRIMITIVE `{name}` (expected one of: {known})");
    };

    if !candidate.available(caps) {
        panic!(
            "global-lock: GLOBAL_LOCK_PRIMITIVE `{name}` is not available on target `{}`",
            env::var("TARGET").unwrap_or_default()
        );
    }

    candidate
}
