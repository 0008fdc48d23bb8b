mod config;
mod utils;

use config::Config;
use proc_macro::TokenStream;

/// Generates the named lock / unlock entry points for the global lock.
///
/// ```text
/// global_lock!(lock = name, unlock = name, scope = static | extern);
/// ```
///
/// Every key is optional. The defaults are `global_lock_lock`,
/// `global_lock_unlock` and `extern`. Any other scope is a compile error.
#[proc_macro]
pub fn global_lock(input: TokenStream) -> TokenStream {
    let pairs = utils::split_args(input)
        .iter()
        .map(|arg| utils::key_value(arg))
        .collect::<Result<Vec<_>, _>>();

    let source = match pairs.and_then(Config::from_pairs) {
        Ok(config) => config.render(),
        Err(msg) => format!("compile_error!({msg:?});"),
    };

    source.parse().unwrap_or_else(|err| {
        let msg = format!("global_lock macro error: {err}");
        format!("compile_error!({msg:?});").parse().unwrap()
    })
}
