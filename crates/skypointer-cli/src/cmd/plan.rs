use crate::output::{direction, print_json};
use anyhow::Context;
use serde::Serialize;
use skypointer_core::{
    config::Config,
    feed::Fix,
    ring::cell_for,
    store::PositionStore,
    tracker::{Move, PositionTracker},
    PointerError,
};
use std::path::Path;

#[derive(Serialize)]
struct Plan {
    fix: Fix,
    cell: usize,
    from: u32,
    #[serde(rename = "move")]
    movement: Move,
}

/// Dry run of `track`: nothing moves and nothing is written.
pub fn run(root: &Path, bearing: f64, track: Option<f64>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    config.check()?;
    let saved = PositionStore::for_root(root).load(config.ring_size, config.revolution);
    let north = saved.north_cell().ok_or(PointerError::Uncalibrated)?;
    let fix = Fix::new(bearing, track)?;

    let tracker = PositionTracker::from_config(&config, saved.position)?;
    let plan = Plan {
        fix,
        cell: cell_for(fix.bearing, north, config.ring_size as usize),
        from: saved.position,
        movement: tracker.preview(fix.heading()),
    };

    if json {
        print_json(&plan)?;
    } else {
        println!(
            "cell {}  move {} {}  from {}",
            plan.cell,
            plan.movement.steps,
            direction(plan.movement.clockwise),
            plan.from
        );
    }
    Ok(())
}
