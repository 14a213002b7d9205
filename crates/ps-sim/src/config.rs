//! Engine configuration assembly.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ps_core::{EngineConfig, Policy};

use crate::SimResult;

/// Load an [`EngineConfig`] from a JSON file.
///
/// Missing fields take their defaults, so `{"mlfq": {"base_quantum": 2}}` is a
/// complete file.
pub fn load_engine_config(path: &Path) -> SimResult<EngineConfig> {
    let file = File::open(path)?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

/// Apply command-line values on top of a file or default configuration.
///
/// `actor_count` always comes from the script.
pub fn apply_overrides(
    mut config: EngineConfig,
    policy: Policy,
    actor_count: usize,
    sems: &[(u16, i64)],
) -> EngineConfig {
    config.policy = policy;
    config.actor_count = actor_count;
    for &(id, value) in sems {
        config.semaphores.overrides.insert(id, value);
    }
    config
}
