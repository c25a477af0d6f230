use crate::hardware;
use crate::interrupt::{Interrupt, InterruptibleSignal};
use crate::output::print_json;
use anyhow::Context;
use skypointer_core::{config::Config, PointerError};
use std::path::Path;

pub fn run(root: &Path, north: Option<usize>, simulate: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let hardware::Rig {
        mut pointer,
        signal,
    } = hardware::open(root, config, simulate)?;

    let outcome = match north {
        Some(cell) => pointer.set_north(cell)?,
        None => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async move {
                let interrupt = Interrupt::arm().await?;
                let mut signal = InterruptibleSignal::new(signal, interrupt);
                tokio::task::spawn_blocking(move || {
                    let outcome = pointer.calibrate(&mut signal);
                    pointer.blank()?;
                    match outcome {
                        Err(PointerError::Interrupted) => {
                            anyhow::bail!("calibration interrupted")
                        }
                        other => Ok(other?),
                    }
                })
                .await?
            })?
        }
    };

    if json {
        print_json(&outcome)?;
    } else {
        println!("north cell {}, position zeroed", outcome.north);
    }
    if !outcome.persisted {
        anyhow::bail!("calibration could not be saved");
    }
    Ok(())
}
