//! Logical compiler name -> resolution strategy: explicit path list from
//! config first, then PATH search.

use crate::config::CompilerSpec;

/// What to actually execute for a logical compiler name. PATH search happens
/// implicitly: [`CompilerSpec::resolve`] only matches *explicit* configured
/// paths, and the fallback is simply to hand the logical name to the process
/// spawner and let the OS search `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerExecutable {
    ConfiguredPath(String),
    SearchPath(String),
}

impl CompilerExecutable {
    pub fn as_os_str(&self) -> &str {
        match self {
            CompilerExecutable::ConfiguredPath(p) => p,
            CompilerExecutable::SearchPath(name) => name,
        }
    }
}

/// Resolve `logical_name` against a configured compiler table, falling back to
/// using the logical name itself as a `PATH`-searched executable.
pub fn resolve_compiler(
    logical_name: &str,
    table: &std::collections::BTreeMap<String, CompilerSpec>,
) -> CompilerExecutable {
    match table.get(logical_name).and_then(CompilerSpec::resolve) {
        Some(path) => CompilerExecutable::ConfiguredPath(path.to_string_lossy().into_owned()),
        None => CompilerExecutable::SearchPath(logical_name.to_string()),
    }
}
