//! Configuration loading: compiled-in defaults, overridden by an optional JSON
//! config file, in turn overridden by environment variables and CLI flags by
//! the calling binary. Follows the teacher's `SubmitterConfig` pattern: a
//! `Deserialize`/`Serialize` struct read from a JSON file under a well-known
//! XDG directory, written back atomically when generated.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One configured worker machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerEndpoint {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_cpus")]
    pub cpus: u32,
}

fn default_port() -> u16 {
    5555
}
fn default_weight() -> f64 {
    1.0
}
fn default_cpus() -> u32 {
    1
}

/// Where to find the real compiler binary for a logical compiler name: either
/// a single path, or an ordered list of candidate paths to probe (mirrors the
/// original `COMPILERS` table entries that held either a string or a list).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CompilerSpec {
    Path(String),
    Candidates(Vec<String>),
}

impl CompilerSpec {
    /// The first candidate path that exists on disk, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        let candidates: &[String] = match self {
            CompilerSpec::Path(p) => std::slice::from_ref(p),
            CompilerSpec::Candidates(v) => v.as_slice(),
        };
        candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub default_port: u16,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,
    #[serde(default = "default_compile_timeout_secs")]
    pub compile_timeout_secs: f64,
}

fn default_connect_timeout_secs() -> f64 {
    2.0
}
fn default_compile_timeout_secs() -> f64 {
    300.0
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            compile_timeout_secs: default_compile_timeout_secs(),
        }
    }
}

/// Top-level configuration consumed by the dispatcher/coordinator/wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub workers: Vec<WorkerEndpoint>,
    #[serde(default)]
    pub compilers: std::collections::BTreeMap<String, CompilerSpec>,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl AppConfig {
    /// A small built-in default: no workers configured, a handful of common
    /// compiler names resolved purely via `PATH` search (see [`resolve_compiler`]).
    pub fn built_in_default() -> Self {
        Self {
            workers: Vec::new(),
            compilers: std::collections::BTreeMap::new(),
            network: NetworkConfig::default(),
        }
    }

    fn normalize(&mut self) {
        for w in &mut self.workers {
            if w.name.trim().is_empty() {
                w.name = w.host.clone();
            }
        }
    }
}

fn xdg_config_home() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        let dir = PathBuf::from(dir);
        if dir.as_os_str().is_empty() {
            anyhow::bail!("XDG_CONFIG_HOME is set but empty");
        }
        return Ok(dir);
    }
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow::anyhow!("HOME is not set"))?;
    let home = PathBuf::from(home);
    if home.as_os_str().is_empty() {
        anyhow::bail!("HOME is set but empty");
    }
    Ok(home.join(".config"))
}

/// Path to the default config file, `~/.config/distcc-rs/config.json` (or
/// `$XDG_CONFIG_HOME/distcc-rs/config.json`).
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_home()?.join("distcc-rs").join("config.json"))
}

/// Load config from an explicit path if given, else the default XDG path if it
/// exists, else the built-in default. Does not consult environment variables or
/// CLI flags — callers layer those on top of the returned value.
pub fn load_config(explicit_path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    let path = match explicit_path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let default = default_config_path()?;
            default.exists().then_some(default)
        }
    };

    let Some(path) = path else {
        return Ok(AppConfig::built_in_default());
    };

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
    let mut cfg: AppConfig = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
    cfg.normalize();
    Ok(cfg)
}

/// Write `cfg` to `path` atomically (write to a sibling `.tmp` file, then
/// rename), creating parent directories as needed.
pub fn save_config(cfg: &AppConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid config path: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(cfg)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

/// Parse a comma-separated hosts override (e.g. from an env var) into worker
/// endpoints using the default port and a weight/cpus of 1, in list order.
pub fn workers_from_hosts_csv(csv: &str, default_port: u16) -> Vec<WorkerEndpoint> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|host| WorkerEndpoint {
            host: host.to_string(),
            port: default_port,
            name: host.to_string(),
            weight: 1.0,
            cpus: 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_spec_resolves_single_path() {
        let spec = CompilerSpec::Path("/bin/sh".to_string());
        assert_eq!(spec.resolve(), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn compiler_spec_resolves_first_existing_candidate() {
        let spec = CompilerSpec::Candidates(vec![
            "/definitely/not/here/clang".to_string(),
            "/bin/sh".to_string(),
        ]);
        assert_eq!(spec.resolve(), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn compiler_spec_resolves_to_none_when_nothing_exists() {
        let spec = CompilerSpec::Candidates(vec!["/nope/a".to_string(), "/nope/b".to_string()]);
        assert_eq!(spec.resolve(), None);
    }

    #[test]
    fn hosts_csv_parses_and_trims() {
        let workers = workers_from_hosts_csv(" 10.0.0.1 , 10.0.0.2,10.0.0.3 ", 5555);
        assert_eq!(workers.len(), 3);
        assert_eq!(workers[0].host, "10.0.0.1");
        assert_eq!(workers[1].name, "10.0.0.2");
        assert_eq!(workers[2].port, 5555);
    }

    #[test]
    fn hosts_csv_skips_empty_entries() {
        let workers = workers_from_hosts_csv("a,,b,", 5555);
        assert_eq!(workers.len(), 2);
    }

    #[test]
    fn config_round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = AppConfig::built_in_default();
        cfg.workers.push(WorkerEndpoint {
            host: "192.168.0.130".to_string(),
            port: 5555,
            name: "g5-130".to_string(),
            weight: 2.0,
            cpus: 2,
        });
        save_config(&cfg, &path).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.workers, cfg.workers);
    }
}
