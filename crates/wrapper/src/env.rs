//! Environment variables the wrapper consults to override configured hosts,
//! fallback, verbosity, and the compiler it shells out to.

pub const HOSTS: &str = "DISTCC_HOSTS";
pub const FALLBACK: &str = "DISTCC_FALLBACK";
pub const VERBOSE: &str = "DISTCC_VERBOSE";
pub const DISABLED: &str = "DISTCC_DISABLED";
pub const COMPILER: &str = "DISTCC_COMPILER";

pub fn hosts_override() -> Option<String> {
    std::env::var(HOSTS).ok().filter(|s| !s.trim().is_empty())
}

/// Any value except `"0"` enables local fallback; the variable's mere absence
/// also enables it (distribution without a safety net would be surprising).
pub fn fallback_enabled() -> bool {
    match std::env::var(FALLBACK) {
        Ok(v) => v != "0",
        Err(_) => true,
    }
}

pub fn verbose() -> bool {
    std::env::var_os(VERBOSE).is_some()
}

pub fn disabled() -> bool {
    std::env::var_os(DISABLED).is_some()
}

pub fn compiler_override() -> Option<String> {
    std::env::var(COMPILER).ok()
}

/// Map the binary's invoked name (argv0 basename) to a logical compiler name,
/// e.g. `distcc-gcc-10` -> `gcc-10`. Falls back to `gcc` for an unrecognized name.
pub fn compiler_from_argv0(argv0: &str) -> String {
    let basename = std::path::Path::new(argv0)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| argv0.to_string());

    basename
        .strip_prefix("distcc-")
        .map(str::to_string)
        .unwrap_or_else(|| "gcc".to_string())
}
