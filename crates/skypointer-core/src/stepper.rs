//! Four-coil unipolar stepper sequencing (28BYJ-48 style, full-step).

use crate::error::Result;
use crate::hardware::{Clock, CoilDriver};
use std::time::Duration;

/// Coil activation sequence. Walking forward through the table turns the
/// motor clockwise.
pub const PHASES: [[bool; 4]; 4] = [
    [true, true, false, false],
    [false, true, true, false],
    [false, false, true, true],
    [true, false, false, true],
];

pub const ALL_OFF: [bool; 4] = [false; 4];

#[derive(Debug)]
pub struct Stepper<C> {
    coils: C,
    current_step: usize,
}

impl<C: CoilDriver> Stepper<C> {
    pub fn new(coils: C) -> Self {
        Self {
            coils,
            current_step: 0,
        }
    }

    /// Advance exactly one step. The phase index only moves once the coil
    /// write has succeeded.
    pub fn step(&mut self, clockwise: bool) -> Result<()> {
        let next = if clockwise {
            (self.current_step + 1) % PHASES.len()
        } else {
            (self.current_step + PHASES.len() - 1) % PHASES.len()
        };
        self.coils.energize(PHASES[next])?;
        self.current_step = next;
        Ok(())
    }

    /// De-energize all coils. No holding torque is needed between moves.
    pub fn off(&mut self) -> Result<()> {
        self.coils.energize(ALL_OFF)
    }

    /// Turn `count` steps with `delay` after each one, then switch off.
    /// Used for jogging; tracked moves go through the position tracker.
    pub fn rotate(
        &mut self,
        count: u32,
        clockwise: bool,
        delay: Duration,
        clock: &impl Clock,
    ) -> Result<()> {
        for _ in 0..count {
            self.step(clockwise)?;
            clock.sleep(delay);
        }
        self.off()
    }

    pub fn phase(&self) -> usize {
        self.current_step
    }

    pub fn coils(&self) -> &C {
        &self.coils
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualClock, RecordingCoils};

    #[test]
    fn clockwise_walks_the_sequence_forward() {
        let mut stepper = Stepper::new(RecordingCoils::new());
        for _ in 0..5 {
            stepper.step(true).unwrap();
        }
        assert_eq!(
            stepper.coils().history,
            vec![PHASES[1], PHASES[2], PHASES[3], PHASES[0], PHASES[1]]
        );
        assert_eq!(stepper.phase(), 1);
    }

    #[test]
    fn counter_clockwise_walks_backward_and_wraps() {
        let mut stepper = Stepper::new(RecordingCoils::new());
        stepper.step(false).unwrap();
        stepper.step(false).unwrap();
        assert_eq!(stepper.coils().history, vec![PHASES[3], PHASES[2]]);
    }

    #[test]
    fn direction_reversal_returns_to_previous_phase() {
        let mut stepper = Stepper::new(RecordingCoils::new());
        stepper.step(true).unwrap();
        stepper.step(false).unwrap();
        assert_eq!(stepper.phase(), 0);
        assert_eq!(stepper.coils().last(), Some(PHASES[0]));
    }

    #[test]
    fn every_phase_energizes_two_adjacent_coils() {
        for phase in PHASES {
            assert_eq!(phase.iter().filter(|c| **c).count(), 2);
        }
    }

    #[test]
    fn rotate_sleeps_per_step_and_switches_off() {
        let clock = ManualClock::new();
        let mut stepper = Stepper::new(RecordingCoils::new());
        stepper
            .rotate(4, true, Duration::from_millis(10), &clock)
            .unwrap();
        assert_eq!(stepper.coils().steps(), 4);
        assert_eq!(stepper.coils().last(), Some(ALL_OFF));
        assert_eq!(clock.slept(), Duration::from_millis(40));
    }

    #[test]
    fn failed_write_keeps_phase() {
        let mut stepper = Stepper::new(RecordingCoils::failing_after(1));
        stepper.step(true).unwrap();
        assert!(stepper.step(true).is_err());
        assert_eq!(stepper.phase(), 1);
    }
}
