use crate::output::{print_fields, print_json};
use anyhow::Context;
use serde::Serialize;
use skypointer_core::{config::Config, store::PositionStore};
use std::path::Path;

#[derive(Serialize)]
struct Status {
    calibrated: bool,
    north: Option<usize>,
    position: u32,
    heading_degrees: f64,
    revolution: u32,
    ring_size: u32,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    config.check()?;
    let saved = PositionStore::for_root(root).load(config.ring_size, config.revolution);
    let status = Status {
        calibrated: saved.is_calibrated(),
        north: saved.north_cell(),
        position: saved.position,
        heading_degrees: f64::from(saved.position) * 360.0 / f64::from(config.revolution),
        revolution: config.revolution,
        ring_size: config.ring_size,
    };

    if json {
        return print_json(&status);
    }

    let north = status
        .north
        .map_or_else(|| "uncalibrated".to_string(), |n| n.to_string());
    print_fields(&[
        ("north cell", north),
        (
            "position",
            format!("{}/{}", status.position, status.revolution),
        ),
        ("heading", format!("{:.1}°", status.heading_degrees)),
    ]);
    Ok(())
}
