use crate::cmd::track::print_update;
use crate::hardware::{self, Device, Signal};
use crate::interrupt::{Interrupt, InterruptibleSignal};
use crate::output::print_json_line;
use anyhow::Context;
use skypointer_core::{config::Config, device::Update, feed, geo::Observer, PointerError};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Start up, then follow one fix per stdin line until EOF or Ctrl-C.
///
/// The pointer is owned by whichever blocking task is currently driving it,
/// so a move always runs to completion before the next line or the shutdown
/// is handled.
pub fn run(root: &Path, simulate: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let observer = config.observer;
    let hardware::Rig { pointer, signal } = hardware::open(root, config, simulate)?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async move {
        let interrupt = Interrupt::arm().await?;
        follow(pointer, signal, observer, interrupt, json).await
    });
    // stdin is read on a blocking thread that cannot be cancelled
    rt.shutdown_background();
    result
}

async fn follow(
    pointer: Device,
    signal: Signal,
    observer: Option<Observer>,
    interrupt: Interrupt,
    json: bool,
) -> anyhow::Result<()> {
    let mut signal = InterruptibleSignal::new(signal, interrupt.clone());
    let (mut pointer, started) = tokio::task::spawn_blocking(move || {
        let mut pointer = pointer;
        let started = pointer.startup(&mut signal);
        (pointer, started)
    })
    .await?;
    match started {
        Ok(()) => {}
        Err(PointerError::Interrupted) => {
            tracing::info!("interrupted during startup");
            return finish(pointer).await;
        }
        Err(e) => {
            abandon(&mut pointer);
            return Err(e).context("startup failed");
        }
    }
    tracing::info!(
        north = pointer.north(),
        position = pointer.position(),
        "tracking; reading fixes from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            biased;
            _ = interrupt.wait() => {
                tracing::info!("interrupted");
                break;
            }
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            tracing::info!("end of input");
            break;
        };

        let fix = match feed::parse_line(&line, observer.as_ref()) {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!(line = %line, error = %e, "skipping unreadable fix");
                continue;
            }
        };

        let (returned, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = match fix {
                Some(fix) => pointer.update(&fix).map(Some),
                None => pointer.blank().map(|()| None),
            };
            (pointer, outcome)
        })
        .await?;
        pointer = returned;

        match outcome {
            Ok(Some(update)) => report(&update, json)?,
            Ok(None) => tracing::debug!("nothing to track"),
            Err(e) => {
                abandon(&mut pointer);
                return Err(e).context("tracking stopped");
            }
        }
    }

    finish(pointer).await
}

async fn finish(mut pointer: Device) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || pointer.shutdown()).await??;
    Ok(())
}

/// Best-effort shutdown after a fault; the fault is what gets reported.
fn abandon(pointer: &mut Device) {
    if let Err(off) = pointer.shutdown() {
        tracing::debug!(error = %off, "shutdown after fault also failed");
    }
}

fn report(update: &Update, json: bool) -> anyhow::Result<()> {
    if json {
        print_json_line(update)
    } else {
        print_update(update);
        Ok(())
    }
}
