//! Drain monitor example: watching water leave an open grid.
//!
//! Fills the top of a grid whose left and right edges are open, runs it, and
//! feeds every tick report into `MassStats` to print the rolling drain rate,
//! the net change over the window, and any water painted in by hand.
//!
//! Run with: `cargo run -p cawater-examples --example drain_monitor`

use cawater_core::config::WaterConfig;
use cawater_core::edit::Edit;
use cawater_core::fixed::fixed64_to_f64;
use cawater_core::grid::Grid;
use cawater_core::sim::SimulationStrategy;
use cawater_core::simulation::Simulation;
use cawater_stats::{MassStats, StatsConfig};
use env_logger::{Builder, Env};
use log::{error, info, warn};

const ROWS: usize = 12;
const COLUMNS: usize = 24;

fn main() {
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();

    let mut grid = match Grid::new(ROWS, COLUMNS, WaterConfig::default()) {
        Ok(grid) => grid,
        Err(e) => {
            error!("cannot build grid: {e}");
            return;
        }
    };

    // A floor with a lip on each side; the edges beyond it are open.
    for col in 0..COLUMNS {
        grid.set_wall(ROWS - 1, col);
    }
    for row in ROWS - 4..ROWS - 1 {
        grid.set_wall(row, 3);
        grid.set_wall(row, COLUMNS - 4);
    }
    for row in 1..4 {
        for col in 5..COLUMNS - 5 {
            grid.set_water(row, col, 1000);
        }
    }

    let mut sim = Simulation::new(grid, SimulationStrategy::Delta { fixed_timestep: 10 });
    let mut stats = MassStats::new(StatsConfig {
        window_size: 30,
        history_capacity: 64,
        leak_tolerance: 0,
    });

    println!("{:>6} {:>8} {:>10} {:>8} {:>9}", "tick", "total", "drain/t", "net", "edits");

    // 33 host time units per frame at a 10-unit timestep.
    for frame in 0..90u64 {
        if frame == 45 {
            sim.queue_batch((5..COLUMNS - 5).map(|col| Edit::AddWater {
                row: 1,
                col,
                amount: 800,
            }));
        }

        let result = sim.advance(33);
        for report in &result.reports {
            stats.record(report);
        }

        if frame % 5 == 0 {
            println!(
                "{:>6} {:>8} {:>10.2} {:>8} {:>9}",
                sim.tick_count(),
                stats.latest_total().unwrap_or_default(),
                fixed64_to_f64(stats.drain_rate()),
                stats.net_change(),
                stats.external_change(),
            );
        }

        if stats.is_leaking() {
            warn!(
                "unexplained loss of {} over the window",
                stats.unexplained_loss()
            );
        }
    }

    print!("\n{}", sim.grid());
    info!(
        "{} ticks recorded, {} quiet, {} drained in the last window",
        stats.ticks_recorded(),
        stats.quiet_ticks(),
        stats.drained_in_window()
    );
}
