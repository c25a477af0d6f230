use crate::hardware;
use crate::interrupt::Interrupt;
use crate::output::{direction, print_json};
use anyhow::Context;
use skypointer_core::{config::Config, device::Update, feed::Fix};
use std::path::Path;

pub fn run(
    root: &Path,
    bearing: f64,
    track: Option<f64>,
    simulate: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let fix = Fix::new(bearing, track)?;
    let hardware::Rig { mut pointer, .. } = hardware::open(root, config, simulate)?;

    let rt = tokio::runtime::Runtime::new()?;
    let update = rt.block_on(async move {
        // Ctrl-C is held until the move is done
        let interrupt = Interrupt::arm().await?;
        let update = tokio::task::spawn_blocking(move || pointer.update(&fix)).await??;
        if interrupt.is_set() {
            tracing::info!("interrupted; move finished first");
        }
        anyhow::Ok(update)
    })?;

    if json {
        print_json(&update)?;
    } else {
        print_update(&update);
    }
    Ok(())
}

pub fn print_update(update: &Update) {
    let saved = if update.persisted { "" } else { "  (not saved)" };
    println!(
        "cell {}  moved {} {}  position {}{saved}",
        update.cell,
        update.movement.steps,
        direction(update.movement.clockwise),
        update.position
    );
}
