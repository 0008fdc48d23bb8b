/// Linkage of the generated functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Private to the invoking module.
    Static,
    /// `#[no_mangle] pub extern "C"`, linkable from a C host.
    Extern,
}

impl Scope {
    fn parse(value: &str) -> Result<Self, String> {
        match value {
            "static" => Ok(Scope::Static),
            "extern" => Ok(Scope::Extern),
            other => Err(format!(
                "global_lock!: scope only accepts `static` or `extern`, found `{other}`"
            )),
        }
    }
}

/// Names and linkage of the functions emitted by `global_lock!`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) lock: String,
    pub(crate) unlock: String,
    pub(crate) scope: Scope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock: String::from("global_lock_lock"),
            unlock: String::from("global_lock_unlock"),
            scope: Scope::Extern,
        }
    }
}

impl Config {
    /// Builds a configuration from `key = value` pairs.
    ///
    /// Every key is optional, may appear at most once, and unknown keys
    /// are rejected.
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, String> {
        let mut config = Config::default();
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in pairs {
            if seen.contains(&key) {
                return Err(format!("global_lock!: `{key}` given more than once"));
            }

            match key.as_str() {
                "lock" => config.lock = ident(&key, value)?,
                "unlock" => config.unlock = ident(&key, value)?,
                "scope" => config.scope = Scope::parse(&value)?,
                other => {
                    return Err(format!(
                        "global_lock!: unknown key `{other}` (expected `lock`, `unlock` or `scope`)"
                    ));
                }
            }

            seen.push(key);
        }

        if config.lock == config.unlock {
            return Err(format!(
                "global_lock!: lock and unlock cannot both be named `{}`",
                config.lock
            ));
        }

        Ok(config)
    }

    /// Renders the two functions as Rust source.
    pub(crate) fn render(&self) -> String {
        let Config {
            lock,
            unlock,
            scope,
        } = self;

        match scope {
            Scope::Extern => format!(
                "#[unsafe(no_mangle)]\n\
                 pub extern \"C\" fn {lock}() {{\n\
                     ::global_lock::lock()\n\
                 }}\n\
                 \n\
                 #[doc = \"# Safety\"]\n\
                 #[doc = \"\"]\n\
                 #[doc = \"The calling thread must hold the global lock.\"]\n\
                 #[unsafe(no_mangle)]\n\
                 pub unsafe extern \"C\" fn {unlock}() {{\n\
                     unsafe {{ ::global_lock::unlock() }}\n\
                 }}\n"
            ),
            Scope::Static => format!(
                "#[allow(dead_code)]\n\
                 fn {lock}() {{\n\
                     ::global_lock::lock()\n\
                 }}\n\
                 \n\
                 #[allow(dead_code)]\n\
                 unsafe fn {unlock}() {{\n\
                     unsafe {{ ::global_lock::unlock() }}\n\
                 }}\n"
            ),
        }
    }
}

/// Validates a function name given for `key`.
fn ident(key: &str, value: String) -> Result<String, String> {
    let starts_well = value
        .chars()
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    let rest_ok = value.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
    let valid = starts_well && rest_ok && value != "_";

    if valid {
        Ok(value)
    } else {
        Err(format!(
            "global_lock!: `{key}` must be a plain function name, found `{value}`"
        ))
    }
}
