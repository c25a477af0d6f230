//! Picks the drivers behind a [`Pointer`]: simulated or the Raspberry Pi.

use skypointer_core::config::Config;
use skypointer_core::hardware::{CoilDriver, LightRing, OperatorSignal, SystemClock};
use skypointer_core::sim::{PeriodicSignal, RecordingCoils, RecordingRing};
use skypointer_core::store::PositionStore;
use skypointer_core::Pointer;
use std::path::Path;

pub type Coils = Box<dyn CoilDriver + Send>;
pub type Ring = Box<dyn LightRing + Send>;
pub type Signal = Box<dyn OperatorSignal + Send>;
pub type Device = Pointer<Coils, Ring, SystemClock>;

pub struct Rig {
    pub pointer: Device,
    pub signal: Signal,
}

pub fn open(root: &Path, config: Config, simulate: bool) -> anyhow::Result<Rig> {
    let (coils, ring, signal) = if simulate {
        simulated(&config)
    } else {
        physical(&config)?
    };
    let store = PositionStore::for_root(root);
    let pointer = Pointer::new(config, coils, ring, store, SystemClock::new())?;
    Ok(Rig { pointer, signal })
}

fn simulated(config: &Config) -> (Coils, Ring, Signal) {
    tracing::debug!("using simulated hardware");
    (
        Box::new(RecordingCoils::new()),
        Box::new(RecordingRing::new(config.ring_size as usize)),
        Box::new(PeriodicSignal::outlasting(
            config.calibration_idle(),
            config.calibration_poll(),
        )),
    )
}

#[cfg(feature = "rpi")]
fn physical(config: &Config) -> anyhow::Result<(Coils, Ring, Signal)> {
    crate::rpi::open(&config.hardware, config.ring_size as usize)
}

#[cfg(not(feature = "rpi"))]
fn physical(_config: &Config) -> anyhow::Result<(Coils, Ring, Signal)> {
    anyhow::bail!("built without Raspberry Pi support; rebuild with --features rpi or pass --simulate")
}
