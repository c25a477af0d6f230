//! Capability traits for everything the pointer touches physically.
//!
//! The tracker, ring and calibration logic only ever see these traits, so
//! the same code drives the GPIO backend and the simulated one in [`crate::sim`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Energizes the four coils of a unipolar stepper.
pub trait CoilDriver {
    fn energize(&mut self, coils: [bool; 4]) -> Result<()>;
}

/// An addressable ring of RGB cells. `show` replaces every cell at once.
pub trait LightRing {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn show(&mut self, cells: &[Rgb]) -> Result<()>;
}

/// The operator's push button.
pub trait OperatorSignal {
    fn is_pressed(&mut self) -> Result<bool>;
}

/// Monotonic time plus a way to wait. `now` is measured from an arbitrary
/// fixed origin.
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<T: CoilDriver + ?Sized> CoilDriver for Box<T> {
    fn energize(&mut self, coils: [bool; 4]) -> Result<()> {
        (**self).energize(coils)
    }
}

impl<T: LightRing + ?Sized> LightRing for Box<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn show(&mut self, cells: &[Rgb]) -> Result<()> {
        (**self).show(cells)
    }
}

impl<T: OperatorSignal + ?Sized> OperatorSignal for Box<T> {
    fn is_pressed(&mut self) -> Result<bool> {
        (**self).is_pressed()
    }
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

// ---------------------------------------------------------------------------
// Rgb
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Rgb = Rgb(0, 0, 0);

    pub fn is_off(self) -> bool {
        self == Self::OFF
    }
}

/// The colours the ring uses, scaled by the configured intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub intensity: u8,
}

impl Palette {
    pub fn new(intensity: u8) -> Self {
        Self { intensity }
    }

    /// Cell under the operator's control during ring calibration.
    pub fn scanning(self) -> Rgb {
        Rgb(0, 0, self.intensity)
    }

    /// North locked in.
    pub fn confirmed(self) -> Rgb {
        Rgb(self.intensity, 0, 0)
    }

    /// Direction to the tracked object.
    pub fn tracking(self) -> Rgb {
        Rgb(0, self.intensity, 0)
    }
}

// ---------------------------------------------------------------------------
// SystemClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
