//! Settling example: a block of water dropped into a walled tank.
//!
//! Builds a small tank from a text map, then prints the grid every few ticks
//! until the water stops moving. Each frame is the grid's text rendering:
//! `~` is a full cell, digits are tenths of a full cell.
//!
//! Run with: `cargo run -p cawater-examples --example settling`
//! Set `RUST_LOG=debug` to see grid construction and edit logging.

use cawater_core::config::WaterConfig;
use cawater_core::edit::Edit;
use cawater_core::grid::Grid;
use cawater_core::sim::SimulationStrategy;
use cawater_core::simulation::Simulation;
use env_logger::{Builder, Env};
use log::{error, info};

const TANK: &str = "
############
#..~~~~....#
#..~~~~....#
#..........#
#....##....#
#..........#
############
";

fn main() {
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();

    let grid = match Grid::from_ascii(TANK, WaterConfig::default()) {
        Ok(grid) => grid,
        Err(e) => {
            error!("bad tank map: {e}");
            return;
        }
    };
    let mut sim = Simulation::new(grid, SimulationStrategy::Tick);
    info!("starting with {} units of water", sim.grid().total_mass());

    println!("=== tick 0 ===");
    print!("{}", sim.grid());

    // Knock a hole in the shelf after the water has had time to pool on it.
    let mut shelf_opened = false;

    for _ in 0..400 {
        let result = sim.step();
        let tick = sim.tick_count();

        if tick == 60 && !shelf_opened {
            sim.queue(Edit::SetEmpty { row: 4, col: 5 });
            shelf_opened = true;
            info!("queued shelf removal at tick {tick}");
        }

        if tick % 20 == 0 {
            println!("\n=== tick {tick} ===");
            print!("{}", sim.grid());
        }

        let quiet = result.last_report().is_some_and(|r| r.is_quiescent());
        if quiet && shelf_opened {
            println!("\n=== settled at tick {tick} ===");
            print!("{}", sim.grid());
            break;
        }
    }

    info!(
        "final mass {} across {} water cells",
        sim.grid().total_mass(),
        sim.grid().water_cells()
    );
}
