//! Scenario runner example: load a scenario file and run it headless.
//!
//! Loads a RON, TOML or JSON scenario, runs it for its declared number of
//! ticks, snapshots the simulation and checks the snapshot restores to the
//! same state hash. The argument is either a file path or the base name of
//! a bundled scenario (`hourglass`, `spillway`); the default is `hourglass`.
//!
//! Run with: `cargo run -p cawater-examples --example scenario_runner -- [path|name]`

use std::path::{Path, PathBuf};

use cawater_core::simulation::Simulation;
use cawater_data::load_scenario;
use cawater_data::loader::{DataLoadError, require_data_file};
use cawater_stats::MassStats;
use env_logger::{Builder, Env};
use log::{error, info};

const DEFAULT_TICKS: u64 = 100;
const DEFAULT_SCENARIO: &str = "hourglass";

/// An existing file is used as-is; anything else names a bundled scenario.
fn resolve(arg: &str) -> Result<PathBuf, DataLoadError> {
    let path = Path::new(arg);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    require_data_file(&bundled, arg)
}

fn main() {
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();

    let arg = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SCENARIO.to_string());
    let path = match resolve(&arg) {
        Ok(path) => path,
        Err(e) => {
            error!("{e}");
            return;
        }
    };

    let scenario = match load_scenario(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    let ticks = scenario.ticks.unwrap_or(DEFAULT_TICKS);
    info!(
        "loaded '{}' ({}x{}, {:?}), running {ticks} ticks",
        scenario.name,
        scenario.grid.rows(),
        scenario.grid.columns(),
        scenario.strategy
    );

    println!("=== {} at tick 0 ===", scenario.name);
    print!("{}", scenario.grid);

    let mut sim = scenario.into_simulation();
    let mut stats = MassStats::default();
    for report in &sim.run(ticks).reports {
        stats.record(report);
    }

    println!("\n=== tick {} ===", sim.tick_count());
    print!("{}", sim.grid());
    println!(
        "\ntotal {}  drained/window {}  culled/tick {}  quiet for {} ticks",
        sim.grid().total_mass(),
        stats.drained_in_window(),
        stats.cull_rate(),
        stats.quiet_ticks()
    );

    let bytes = match sim.serialize() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("snapshot failed: {e}");
            return;
        }
    };
    match Simulation::deserialize(&bytes) {
        Ok(restored) if restored.state_hash() == sim.state_hash() => {
            info!("snapshot of {} bytes restores cleanly", bytes.len());
        }
        Ok(_) => error!("snapshot restored to a different state"),
        Err(e) => error!("snapshot rejected: {e}"),
    }
}
