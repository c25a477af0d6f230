//! The assembled pointer: tracker, stepper, ring and store under one owner.
//!
//! All mutable tracking state lives here and is only touched through
//! `&mut self`, so calibration, tracking and shutdown cannot interleave.

use crate::calibration::{self, CalibrationTiming};
use crate::config::Config;
use crate::error::{PointerError, Result};
use crate::feed::Fix;
use crate::hardware::{Clock, CoilDriver, LightRing, OperatorSignal, Palette};
use crate::ring::Indicator;
use crate::stepper::Stepper;
use crate::store::{PositionStore, SavedPosition};
use crate::tracker::{Move, PositionTracker};
use serde::Serialize;

/// Result of one tracking cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Update {
    pub cell: usize,
    #[serde(rename = "move")]
    pub movement: Move,
    pub position: u32,
    /// False when the new position could not be written; the in-memory
    /// position is still correct.
    pub persisted: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Calibrated {
    pub north: usize,
    pub persisted: bool,
}

pub struct Pointer<C, R, K> {
    config: Config,
    tracker: PositionTracker,
    stepper: Stepper<C>,
    indicator: Indicator<R>,
    store: PositionStore,
    clock: K,
    north: Option<usize>,
}

impl<C, R, K> Pointer<C, R, K>
where
    C: CoilDriver,
    R: LightRing,
    K: Clock,
{
    /// Assemble a pointer from its parts, resuming from whatever the store
    /// last recorded.
    pub fn new(config: Config, coils: C, ring: R, store: PositionStore, clock: K) -> Result<Self> {
        config.check()?;
        if ring.len() != config.ring_size as usize {
            return Err(PointerError::InvalidConfig(format!(
                "ring has {} cells but ring_size is {}",
                ring.len(),
                config.ring_size
            )));
        }
        let saved = store.load(config.ring_size, config.revolution);
        let tracker = PositionTracker::from_config(&config, saved.position)?;
        let palette = Palette::new(config.led_intensity);
        tracing::debug!(north = saved.north, position = saved.position, "resumed");
        Ok(Self {
            tracker,
            stepper: Stepper::new(coils),
            indicator: Indicator::new(ring, palette),
            store,
            clock,
            north: saved.north_cell(),
            config,
        })
    }

    pub fn is_calibrated(&self) -> bool {
        self.north.is_some()
    }

    pub fn north(&self) -> Option<usize> {
        self.north
    }

    pub fn position(&self) -> u32 {
        self.tracker.position()
    }

    pub fn coils(&self) -> &C {
        self.stepper.coils()
    }

    pub fn ring(&self) -> &R {
        self.indicator.ring()
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn saved(&self) -> SavedPosition {
        match self.north {
            Some(north) => SavedPosition::calibrated(north, self.tracker.position()),
            None => SavedPosition::uncalibrated(),
        }
    }

    /// Spin the ring, then calibrate if no north has ever been recorded.
    pub fn startup<S: OperatorSignal>(&mut self, signal: &mut S) -> Result<()> {
        self.indicator
            .spin(&self.clock, self.config.calibration_poll())?;
        if !self.is_calibrated() {
            tracing::info!("no calibration on record");
            self.calibrate(signal)?;
        }
        self.indicator.clear()?;
        self.stepper.off()
    }

    /// Run both operator procedures: pick the north cell, then turn the model
    /// to north and take that orientation as position zero.
    pub fn calibrate<S: OperatorSignal>(&mut self, signal: &mut S) -> Result<Calibrated> {
        let timing = CalibrationTiming {
            idle: self.config.calibration_idle(),
            poll: self.config.calibration_poll(),
        };
        let north = calibration::calibrate_ring(&mut self.indicator, signal, &self.clock, timing)?;
        calibration::calibrate_actuator(
            &mut self.stepper,
            signal,
            &self.clock,
            timing,
            self.config.calibration_jog_steps,
            self.config.step_delay(),
        )?;
        self.zero_at(north)
    }

    /// Record `north` directly and take the model's current orientation as
    /// zero, skipping the operator procedures.
    pub fn set_north(&mut self, north: usize) -> Result<Calibrated> {
        if north >= self.indicator.len() {
            return Err(PointerError::InvalidConfig(format!(
                "north cell {north} is outside a ring of {} cells",
                self.indicator.len()
            )));
        }
        self.zero_at(north)
    }

    fn zero_at(&mut self, north: usize) -> Result<Calibrated> {
        self.tracker.set_zero();
        self.north = Some(north);
        let persisted = self.persist();
        Ok(Calibrated { north, persisted })
    }

    /// One tracking cycle: point the ring at the bearing, turn the model to
    /// the heading, then record the new position.
    pub fn update(&mut self, fix: &Fix) -> Result<Update> {
        let north = self.north.ok_or(PointerError::Uncalibrated)?;
        let cell = self.indicator.indicate(fix.bearing, north)?;
        let movement = match self
            .tracker
            .track(fix.heading(), &mut self.stepper, &self.clock)
        {
            Ok(movement) => movement,
            Err(e) => {
                // keep the steps that did complete
                self.persist();
                return Err(e);
            }
        };
        let persisted = self.persist();
        tracing::info!(
            bearing = fix.bearing,
            heading = fix.heading(),
            cell,
            steps = movement.steps,
            clockwise = movement.clockwise,
            position = self.tracker.position(),
            "tracked"
        );
        Ok(Update {
            cell,
            movement,
            position: self.tracker.position(),
            persisted,
        })
    }

    /// Nothing to track: dark ring, coils off.
    pub fn blank(&mut self) -> Result<()> {
        self.indicator.clear()?;
        self.stepper.off()
    }

    /// Leave the hardware safe. Called after the last move has finished.
    pub fn shutdown(&mut self) -> Result<()> {
        self.blank()?;
        tracing::info!(position = self.tracker.position(), "pointer shut down");
        Ok(())
    }

    fn persist(&self) -> bool {
        match self.store.save(&self.saved()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "could not save position, continuing with in-memory state");
                false
            }
        }
    }
}
