//! Scenario tests for the water engine.
//!
//! Each test sets up a small grid by hand, runs a few ticks, and checks the
//! exact masses the rules produce.

use cawater_core::cell::CellState;
use cawater_core::config::WaterConfig;
use cawater_core::edit::Edit;
use cawater_core::grid::Grid;
use cawater_core::layout::GridLayout;
use cawater_core::sim::SimulationStrategy;
use cawater_core::simulation::Simulation;
use cawater_core::test_utils::*;

fn mass(grid: &Grid, row: usize, col: usize) -> i32 {
    grid.read_cell(row, col).unwrap().mass
}

fn state(grid: &Grid, row: usize, col: usize) -> CellState {
    grid.read_cell(row, col).unwrap().state
}

// ===========================================================================
// Settling
// ===========================================================================

#[test]
fn settling_on_a_wall_floor() {
    let mut grid = empty_grid(3, 3);
    for col in 0..3 {
        grid.set_wall(2, col);
    }
    grid.set_water(1, 1, 1000);

    grid.tick();

    assert!(mass(&grid, 1, 1) < 1000);
    assert_eq!(state(&grid, 2, 1), CellState::Wall);
    assert_eq!(mass(&grid, 2, 1), 0);
    assert_coherent(&grid);
}

#[test]
fn settling_into_an_open_cell() {
    let mut grid = empty_grid(3, 3);
    grid.set_water(1, 1, 1000);

    grid.tick();

    // min(1000 + 0, 1000) - 0 = 1000, bounded by min(500, 1000).
    assert_eq!(mass(&grid, 2, 1), 500);
    assert_coherent(&grid);
}

#[test]
fn column_settles_to_the_floor() {
    let mut grid = ascii(
        "#####\n\
         #.~.#\n\
         #...#\n\
         #...#\n\
         #####\n",
    );
    for _ in 0..200 {
        grid.tick();
    }
    // Enclosed, so nothing drains; the bottom row ends up holding the most.
    let bottom: i32 = (1..4).map(|col| mass(&grid, 3, col)).sum();
    let top: i32 = (1..4).map(|col| mass(&grid, 1, col)).sum();
    assert!(bottom > top, "bottom {bottom} <= top {top}");
    assert_coherent(&grid);
}

// ===========================================================================
// Void drainage
// ===========================================================================

#[test]
fn left_edge_drains_until_empty() {
    let mut grid = empty_grid(5, 5);
    grid.set_wall(1, 0);
    grid.set_wall(3, 0);
    grid.set_wall(2, 1);
    grid.set_water(2, 0, 800);

    let mut previous = mass(&grid, 2, 0);
    let mut ticks = 0;
    while state(&grid, 2, 0) == CellState::Water {
        grid.tick();
        let current = mass(&grid, 2, 0);
        assert!(current < previous, "mass went {previous} -> {current}");
        previous = current;
        ticks += 1;
        assert!(ticks < 100, "edge cell never emptied");
    }

    for _ in 0..10 {
        grid.tick();
        assert_eq!(state(&grid, 2, 0), CellState::Empty);
        assert_eq!(mass(&grid, 2, 0), 0);
    }
}

#[test]
fn right_edge_drains() {
    let mut grid = empty_grid(3, 4);
    grid.set_wall(0, 3);
    grid.set_wall(2, 3);
    grid.set_wall(1, 2);
    grid.set_water(1, 3, 600);

    let report = grid.tick();
    assert_eq!(report.drained, 300);
    assert_eq!(mass(&grid, 1, 3), 300);
}

#[test]
fn bottom_edge_drains_in_one_tick() {
    let mut grid = empty_grid(4, 4);
    grid.set_wall(3, 0);
    grid.set_wall(3, 2);
    grid.set_water(3, 1, 900);

    let report = grid.tick();
    assert_eq!(report.drained, 900);
    assert_eq!(state(&grid, 3, 1), CellState::Empty);
}

#[test]
fn open_grid_eventually_empties() {
    let mut grid = empty_grid(6, 6);
    grid.set_water(1, 3, 1000);
    grid.set_water(2, 2, 1000);
    for _ in 0..500 {
        grid.tick();
    }
    assert_eq!(grid.total_mass(), 0);
}

// ===========================================================================
// Edits between ticks
// ===========================================================================

#[test]
fn wall_painted_between_ticks_blocks_flow() {
    let mut grid = walled_grid(3, 5);
    grid.set_water(1, 2, 1000);

    grid.tick();
    assert_eq!(mass(&grid, 1, 1), 250);
    assert_eq!(mass(&grid, 1, 2), 500);
    assert_eq!(mass(&grid, 1, 3), 250);

    grid.set_wall(1, 3);
    let report = grid.tick();

    // Only the left neighbour takes mass: (500 - 250) / 4 = 62.
    assert_eq!(report.moved_lateral, 62);
    assert_eq!(mass(&grid, 1, 2), 438);
    assert_eq!(mass(&grid, 1, 1), 312);
    assert_eq!(state(&grid, 1, 3), CellState::Wall);
    assert_eq!(mass(&grid, 1, 3), 0);
}

#[test]
fn queued_wall_applies_before_the_sweep() {
    let mut sim = tick_sim(walled_grid(3, 5));
    sim.queue(Edit::SetWater { row: 1, col: 2, mass: 1000 });
    sim.queue(Edit::SetWall { row: 1, col: 3 });
    sim.step();

    assert_eq!(mass(sim.grid(), 1, 1), 250);
    assert_eq!(mass(sim.grid(), 1, 2), 750);
    assert_eq!(mass(sim.grid(), 1, 3), 0);
}

#[test]
fn painting_by_pixel() {
    let layout = GridLayout::new(16, 32, 8);
    let mut grid = Grid::with_layout(4, 4, layout, WaterConfig::default()).unwrap();

    assert!(!grid.on_grid(31, 8));
    let (row, col) = grid.cell_index(32 + 16 * 2 + 3, 8 + 16 + 15).unwrap();
    assert_eq!((row, col), (1, 2));
    assert!(grid.add_water(row, col, 1000));
    assert_eq!(mass(&grid, 1, 2), 1000);
    assert_eq!(grid.cell_index(0, 0), None);
}

// ===========================================================================
// Idempotence
// ===========================================================================

#[test]
fn dry_grid_never_changes() {
    let mut grid = ascii(
        "#..?.\n\
         .#...\n\
         ..#..\n\
         ?..#.\n",
    );
    let before = grid.clone();
    for _ in 0..20 {
        let report = grid.tick();
        assert!(report.is_quiescent());
    }
    assert_eq!(grid, before);
    assert_eq!(grid.total_mass(), 0);
}

// ===========================================================================
// Compression
// ===========================================================================

#[test]
fn compressed_column_overfills_the_bottom() {
    let config = WaterConfig::default()
        .with_compress_rate(fixed(0.02))
        .with_compress_downward(true);
    let mut grid = Grid::new(8, 3, config).unwrap();
    grid.enclose();
    for row in 1..7 {
        grid.set_water(row, 1, 1000);
    }

    for _ in 0..200 {
        let report = grid.tick();
        assert!(report.is_balanced());
    }

    assert_eq!(grid.total_mass(), 6000);
    assert!(mass(&grid, 6, 1) > 1000);
    assert_coherent(&grid);
}

#[test]
fn uncompressed_column_stays_at_max() {
    let mut grid = walled_grid(6, 3);
    for row in 1..5 {
        grid.set_water(row, 1, 1000);
    }
    let report = grid.tick();
    assert!(report.is_quiescent());
    assert!(grid.cells().iter().all(|c| c.mass() <= 1000));
}

// ===========================================================================
// Simulation clock
// ===========================================================================

#[test]
fn ten_millisecond_water_clock() {
    let strategy = SimulationStrategy::Delta { fixed_timestep: 10 };
    let mut sim = Simulation::new(basin(6, 6, 2), strategy);

    let mut steps = 0;
    for _ in 0..6 {
        steps += sim.advance(16).steps_run;
    }
    assert_eq!(steps, 9);
    assert_eq!(sim.sim_state().accumulator, 6);
}

#[test]
fn ledger_balances_across_a_run() {
    let mut sim = tick_sim(noise_grid(12, 16, 7));
    let start = sim.grid().total_mass();
    let result = sim.run(50);
    let lost: i64 = result.reports.iter().map(|r| r.lost()).sum();
    assert!(result.reports.iter().all(|r| r.is_balanced()));
    assert_eq!(sim.grid().total_mass(), start - lost);
}

#[test]
fn text_rendering_after_settling() {
    let mut grid = ascii(
        "#...#\n\
         #.~.#\n\
         #####\n",
    );
    grid.tick();
    assert_eq!(grid.to_string(), "#...#\n#252#\n#####\n");
}
