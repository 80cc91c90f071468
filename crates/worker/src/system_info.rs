//! Best-effort SystemInfo probe reply: hostname, cpu count, load average, and
//! an `arch` tag derived from CPU brand markers. Every individual signal
//! degrades to a safe default rather than failing the probe.

use distcc_protocol::SystemInfo;

fn hostname() -> String {
    let mut buf = vec![0u8; 256];
    // SAFETY: `buf` is a valid, writable buffer of `buf.len()` bytes; gethostname
    // writes a NUL-terminated string no longer than that into it.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "unknown-host".to_string();
    }
    let nul = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..nul]).into_owned()
}

fn cpu_count() -> u32 {
    // SAFETY: sysconf with a valid `_SC_NPROCESSORS_ONLN` name is always safe to call.
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        n as u32
    } else {
        1
    }
}

fn load_average() -> f64 {
    let mut loads = [0.0f64; 1];
    // SAFETY: `loads` has room for the 1 sample we request.
    let n = unsafe { libc::getloadavg(loads.as_mut_ptr(), 1) };
    if n == 1 {
        loads[0]
    } else {
        0.0
    }
}

/// `g5` if the CPU brand string mentions a 970/G5 marker, `g4` for a 7xx/G4
/// marker, otherwise a generic `ppc` tag. Reads `/proc/cpuinfo`, which is the
/// only portable source available without shelling out to `sysctl`.
fn arch_tag() -> String {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").unwrap_or_default().to_lowercase();
    if cpuinfo.contains("970") || cpuinfo.contains("g5") {
        "g5".to_string()
    } else if cpuinfo.contains("74") || cpuinfo.contains("g4") {
        "g4".to_string()
    } else {
        "ppc".to_string()
    }
}

pub fn gather() -> SystemInfo {
    SystemInfo {
        hostname: hostname(),
        arch: arch_tag(),
        cpus: cpu_count(),
        load: load_average(),
    }
}
