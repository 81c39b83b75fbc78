//! Thread-to-core pinning helpers.
//!
//! Best effort: pinning failures are reported to the caller and never
//! fatal, so the simulator still runs on restricted schedulers.

/// Pin the current thread to the core at `index` (in enumeration
/// order). Returns `false` if the core does not exist or the affinity
/// call fails.
pub fn pin_to_core(index: usize) -> bool {
    match core_affinity::get_core_ids() {
        Some(cores) => match cores.get(index) {
            Some(core) => core_affinity::set_for_current(*core),
            None => false,
        },
        None => false,
    }
}

/// Number of cores visible to the affinity API.
pub fn num_cores() -> usize {
    core_affinity::get_core_ids().map(|c| c.len()).unwrap_or(1)
}
