//! Operator-guided calibration.
//!
//! Two small state machines, both fed "button state seen at time t". They
//! hold no hardware and never sleep, so they can be tested without real
//! time passing. The `calibrate_*` drivers poll the button, render the
//! result, and sleep between polls.

use crate::error::Result;
use crate::hardware::{Clock, CoilDriver, LightRing, OperatorSignal};
use crate::ring::Indicator;
use crate::stepper::Stepper;
use serde::Serialize;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Ring calibration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RingState {
    Idle,
    AwaitingPress,
    Scanning { cell: usize, last_press: Duration },
    Confirmed { cell: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingEvent {
    Unchanged,
    /// Light this cell as the current candidate.
    Show(usize),
    /// This cell is north.
    Confirmed(usize),
}

#[derive(Debug, Clone)]
pub struct RingCalibration {
    state: RingState,
    ring_size: usize,
    idle: Duration,
}

impl RingCalibration {
    pub fn new(ring_size: usize, idle: Duration) -> Self {
        Self {
            state: RingState::Idle,
            ring_size: ring_size.max(1),
            idle,
        }
    }

    pub fn start(&mut self) {
        self.state = RingState::AwaitingPress;
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    pub fn confirmed(&self) -> Option<usize> {
        match self.state {
            RingState::Confirmed { cell } => Some(cell),
            _ => None,
        }
    }

    pub fn observe(&mut self, pressed: bool, now: Duration) -> RingEvent {
        match self.state {
            RingState::Idle => RingEvent::Unchanged,
            RingState::AwaitingPress if pressed => {
                self.state = RingState::Scanning {
                    cell: 0,
                    last_press: now,
                };
                RingEvent::Show(0)
            }
            RingState::AwaitingPress => RingEvent::Unchanged,
            RingState::Scanning { cell, .. } if pressed => {
                let cell = (cell + 1) % self.ring_size;
                self.state = RingState::Scanning {
                    cell,
                    last_press: now,
                };
                RingEvent::Show(cell)
            }
            RingState::Scanning { cell, last_press } => {
                if now.saturating_sub(last_press) >= self.idle {
                    self.state = RingState::Confirmed { cell };
                    RingEvent::Confirmed(cell)
                } else {
                    RingEvent::Unchanged
                }
            }
            RingState::Confirmed { cell } => RingEvent::Confirmed(cell),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator calibration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActuatorState {
    Idle,
    AwaitingPress,
    Rotating { last_press: Duration },
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    Unchanged,
    /// Turn the model a little further clockwise.
    Jog,
    /// The model points north; its current orientation is zero.
    Confirmed,
}

#[derive(Debug, Clone)]
pub struct ActuatorCalibration {
    state: ActuatorState,
    idle: Duration,
}

impl ActuatorCalibration {
    pub fn new(idle: Duration) -> Self {
        Self {
            state: ActuatorState::Idle,
            idle,
        }
    }

    pub fn start(&mut self) {
        self.state = ActuatorState::AwaitingPress;
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn observe(&mut self, pressed: bool, now: Duration) -> ActuatorEvent {
        match self.state {
            ActuatorState::Idle => ActuatorEvent::Unchanged,
            ActuatorState::AwaitingPress | ActuatorState::Rotating { .. } if pressed => {
                self.state = ActuatorState::Rotating { last_press: now };
                ActuatorEvent::Jog
            }
            ActuatorState::AwaitingPress => ActuatorEvent::Unchanged,
            ActuatorState::Rotating { last_press } => {
                if now.saturating_sub(last_press) >= self.idle {
                    self.state = ActuatorState::Confirmed;
                    ActuatorEvent::Confirmed
                } else {
                    ActuatorEvent::Unchanged
                }
            }
            ActuatorState::Confirmed => ActuatorEvent::Confirmed,
        }
    }

    /// Restart the idle window once a jog has finished turning.
    pub fn jogged(&mut self, now: Duration) {
        if let ActuatorState::Rotating { .. } = self.state {
            self.state = ActuatorState::Rotating { last_press: now };
        }
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CalibrationTiming {
    pub idle: Duration,
    pub poll: Duration,
}

/// Let the operator walk a lit cell round the ring until it faces north.
/// Returns the chosen cell, left lit in the confirmation colour.
pub fn calibrate_ring<R, S, K>(
    indicator: &mut Indicator<R>,
    signal: &mut S,
    clock: &K,
    timing: CalibrationTiming,
) -> Result<usize>
where
    R: LightRing,
    S: OperatorSignal,
    K: Clock,
{
    let palette = indicator.palette();
    let mut cal = RingCalibration::new(indicator.len(), timing.idle);
    cal.start();
    indicator.clear()?;
    tracing::info!("ring calibration: hold the button until the cell facing north is lit");

    loop {
        let pressed = signal.is_pressed()?;
        match cal.observe(pressed, clock.now()) {
            RingEvent::Show(cell) => indicator.light(cell, palette.scanning())?,
            RingEvent::Confirmed(cell) => {
                indicator.light(cell, palette.confirmed())?;
                tracing::info!(north = cell, "ring calibration confirmed");
                return Ok(cell);
            }
            RingEvent::Unchanged => {}
        }
        clock.sleep(timing.poll);
    }
}

/// Let the operator nudge the model clockwise until it points north.
/// Returns once the button has been left alone for the idle window.
pub fn calibrate_actuator<C, S, K>(
    stepper: &mut Stepper<C>,
    signal: &mut S,
    clock: &K,
    timing: CalibrationTiming,
    jog_steps: u32,
    step_delay: Duration,
) -> Result<()>
where
    C: CoilDriver,
    S: OperatorSignal,
    K: Clock,
{
    let mut cal = ActuatorCalibration::new(timing.idle);
    cal.start();
    tracing::info!("actuator calibration: hold the button until the model points north");

    loop {
        let pressed = signal.is_pressed()?;
        match cal.observe(pressed, clock.now()) {
            ActuatorEvent::Jog => {
                stepper.rotate(jog_steps, true, step_delay, clock)?;
                cal.jogged(clock.now());
            }
            ActuatorEvent::Confirmed => {
                tracing::info!("actuator calibration confirmed");
                return Ok(());
            }
            ActuatorEvent::Unchanged => {}
        }
        clock.sleep(timing.poll);
    }
}
