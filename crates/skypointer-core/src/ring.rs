//! The ring of lights that shows which way to look.

use crate::error::Result;
use crate::hardware::{Clock, LightRing, Palette, Rgb};
use std::time::Duration;

/// Cell facing `bearing_degrees`, given the cell that faces north.
///
/// Rounds to the nearest cell. The model uses truncation with carried error
/// instead; the ring is cosmetic and does not accumulate.
pub fn cell_for(bearing_degrees: f64, north: usize, ring_size: usize) -> usize {
    if ring_size == 0 {
        return 0;
    }
    let offset = (ring_size as f64 * bearing_degrees / 360.0).round() as i64;
    (north as i64 + offset).rem_euclid(ring_size as i64) as usize
}

#[derive(Debug)]
pub struct Indicator<R> {
    ring: R,
    palette: Palette,
}

impl<R: LightRing> Indicator<R> {
    pub fn new(ring: R, palette: Palette) -> Self {
        Self { ring, palette }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Light the cell pointing at `bearing_degrees` and clear every other one.
    pub fn indicate(&mut self, bearing_degrees: f64, north: usize) -> Result<usize> {
        let cell = cell_for(bearing_degrees, north, self.ring.len());
        self.light(cell, self.palette.tracking())?;
        Ok(cell)
    }

    /// Show exactly one lit cell.
    pub fn light(&mut self, cell: usize, color: Rgb) -> Result<()> {
        let mut frame = vec![Rgb::OFF; self.ring.len()];
        if let Some(c) = frame.get_mut(cell) {
            *c = color;
        }
        self.ring.show(&frame)
    }

    pub fn clear(&mut self) -> Result<()> {
        let frame = vec![Rgb::OFF; self.ring.len()];
        self.ring.show(&frame)
    }

    /// Run a single lit cell once round the ring, then clear it. Shown at
    /// startup so the operator can see the ring works.
    pub fn spin(&mut self, clock: &impl Clock, interval: Duration) -> Result<()> {
        self.clear()?;
        for cell in 0..self.ring.len() {
            self.light(cell, self.palette.scanning())?;
            clock.sleep(interval);
        }
        self.clear()
    }

    pub fn ring(&self) -> &R {
        &self.ring
    }
}
