//! Absolute position tracking for the model.
//!
//! The tracker owns the motor's logical position (steps from the calibrated
//! zero, modulo one revolution) and the running sub-step error left over by
//! truncating each target to whole steps. Every target is reached by the
//! shorter way round.

use crate::config::Config;
use crate::error::{PointerError, Result};
use crate::hardware::{Clock, CoilDriver};
use crate::stepper::Stepper;
use serde::Serialize;
use std::time::Duration;

/// A planned or executed rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub steps: u32,
    pub clockwise: bool,
}

impl Move {
    pub const NONE: Move = Move {
        steps: 0,
        clockwise: false,
    };
}

#[derive(Debug, Clone)]
pub struct PositionTracker {
    revolution: u32,
    steps_per_degree: f64,
    position: u32,
    accumulated_error: f64,
    step_delay: Duration,
}

impl PositionTracker {
    pub fn new(revolution: u32, position: u32, step_delay: Duration) -> Result<Self> {
        if revolution == 0 {
            return Err(PointerError::InvalidConfig(
                "revolution must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            revolution,
            steps_per_degree: f64::from(revolution) / 360.0,
            position: position % revolution,
            accumulated_error: 0.0,
            step_delay,
        })
    }

    pub fn from_config(config: &Config, position: u32) -> Result<Self> {
        Self::new(config.revolution, position, config.step_delay())
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn accumulated_error(&self) -> f64 {
        self.accumulated_error
    }

    pub fn revolution(&self) -> u32 {
        self.revolution
    }

    pub fn steps_per_degree(&self) -> f64 {
        self.steps_per_degree
    }

    /// Declare the current physical orientation to be zero.
    pub fn set_zero(&mut self) {
        self.position = 0;
        self.accumulated_error = 0.0;
    }

    /// Work out the move that brings the model to `target_degrees` and carry
    /// the truncation remainder into the accumulated error.
    ///
    /// `target_degrees` must already be in `[0, 360)`.
    pub fn next_move(&mut self, target_degrees: f64) -> Move {
        debug_assert!(target_degrees.is_finite(), "bearing must be finite");

        let d = target_degrees * self.steps_per_degree - f64::from(self.position);
        let mut delta = d.trunc() as i64;

        self.accumulated_error += d - delta as f64;
        if self.accumulated_error.abs() >= 1.0 {
            let fix = self.accumulated_error.trunc();
            delta += fix as i64;
            self.accumulated_error -= fix;
        }

        let mut clockwise = delta > 0;
        let mut steps = delta.unsigned_abs() % u64::from(self.revolution);
        if steps as f64 > f64::from(self.revolution) / 2.0 {
            steps = u64::from(self.revolution) - steps;
            clockwise = !clockwise;
        }

        Move {
            // steps <= revolution / 2 here
            steps: steps as u32,
            clockwise,
        }
    }

    /// The move [`PositionTracker::track`] would issue, without touching any state.
    pub fn preview(&self, target_degrees: f64) -> Move {
        self.clone().next_move(target_degrees)
    }

    /// Turn the model to `target_degrees`, one step at a time with the
    /// configured delay, then de-energize.
    ///
    /// The position follows each completed step, so after a hardware fault it
    /// still matches the physical orientation.
    pub fn track<C: CoilDriver>(
        &mut self,
        target_degrees: f64,
        stepper: &mut Stepper<C>,
        clock: &impl Clock,
    ) -> Result<Move> {
        let mv = self.next_move(target_degrees);
        for _ in 0..mv.steps {
            if let Err(e) = stepper.step(mv.clockwise) {
                if let Err(off) = stepper.off() {
                    tracing::debug!(error = %off, "could not de-energize after step failure");
                }
                return Err(e);
            }
            self.advance(mv.clockwise);
            clock.sleep(self.step_delay);
        }
        stepper.off()?;
        tracing::debug!(
            target = target_degrees,
            steps = mv.steps,
            clockwise = mv.clockwise,
            position = self.position,
            error = self.accumulated_error,
            "tracked"
        );
        Ok(mv)
    }

    fn advance(&mut self, clockwise: bool) {
        self.position = if clockwise {
            (self.position + 1) % self.revolution
        } else {
            (self.position + self.revolution - 1) % self.revolution
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualClock, RecordingCoils};
    use crate::stepper::ALL_OFF;

    const REV: u32 = 2038;

    fn tracker(position: u32) -> PositionTracker {
        PositionTracker::new(REV, position, Duration::from_millis(10)).unwrap()
    }

    /// Distance between two step positions going the shorter way round.
    fn circular_distance(a: f64, b: f64, revolution: u32) -> f64 {
        let rev = f64::from(revolution);
        let d = (a - b).rem_euclid(rev);
        d.min(rev - d)
    }

    #[test]
    fn zero_revolution_rejected() {
        assert!(PositionTracker::new(0, 0, Duration::ZERO).is_err());
    }

    #[test]
    fn initial_position_wraps() {
        assert_eq!(tracker(REV + 5).position(), 5);
    }

    #[test]
    fn half_turn_from_zero() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let clock = ManualClock::new();
        let mv = t.track(180.0, &mut stepper, &clock).unwrap();
        assert_eq!(
            mv,
            Move {
                steps: 1019,
                clockwise: true
            }
        );
        assert_eq!(t.position(), 1019);
    }

    #[test]
    fn half_turn_back_goes_the_other_way() {
        let mut t = tracker(1019);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let clock = ManualClock::new();
        let mv = t.track(0.0, &mut stepper, &clock).unwrap();
        assert_eq!(
            mv,
            Move {
                steps: 1019,
                clockwise: false
            }
        );
        assert_eq!(t.position(), 0);
    }

    #[test]
    fn degree_by_degree_full_turn_does_not_drift() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let clock = ManualClock::new();
        for k in 1..=360u32 {
            t.track(f64::from(k % 360), &mut stepper, &clock).unwrap();
            assert!(t.accumulated_error().abs() < 1.0);
        }
        assert!(circular_distance(f64::from(t.position()), 0.0, REV) <= 1.0);
    }

    #[test]
    fn wrapping_past_zero_takes_short_way() {
        let mut t = tracker(REV - 1);
        let mv = t.next_move(0.2);
        assert_eq!(
            mv,
            Move {
                steps: 3,
                clockwise: true
            }
        );
    }

    #[test]
    fn never_more_than_half_a_turn() {
        for position in (0..REV).step_by(13) {
            for tenth in (0..3600).step_by(7) {
                let target = f64::from(tenth) / 10.0;
                let mv = tracker(position).next_move(target);
                assert!(
                    f64::from(mv.steps) <= f64::from(REV) / 2.0,
                    "position {position} target {target} -> {mv:?}"
                );
            }
        }
    }

    #[test]
    fn direction_follows_shortest_signed_difference() {
        let rev = f64::from(REV);
        for position in (0..REV).step_by(17) {
            for degrees in (0..360).step_by(3) {
                let target = f64::from(degrees);
                let ideal = target * rev / 360.0;
                let mut diff = (ideal - f64::from(position)).rem_euclid(rev);
                if diff > rev / 2.0 {
                    diff -= rev;
                }
                let mv = tracker(position).next_move(target);
                // stay clear of the half-turn tie and sub-step noise
                if diff > 1.0 && diff < rev / 2.0 - 1.0 {
                    assert!(mv.clockwise, "position {position} target {target}");
                } else if diff < -1.0 && diff > -rev / 2.0 + 1.0 {
                    assert!(!mv.clockwise, "position {position} target {target}");
                }
            }
        }
    }

    #[test]
    fn error_stays_bounded_and_position_stays_within_a_step() {
        let mut t = tracker(0);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..5000 {
            // xorshift, deterministic
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let target = (seed % 360_000) as f64 / 1000.0;
            let mv = t.next_move(target);
            t.position = if mv.clockwise {
                (t.position + mv.steps) % REV
            } else {
                (t.position + REV - mv.steps % REV) % REV
            };
            assert!(t.accumulated_error().abs() < 1.0);
            let ideal = target * t.steps_per_degree();
            assert!(circular_distance(f64::from(t.position()), ideal, REV) < 1.0 + 1e-9);
        }
    }

    #[test]
    fn repeated_target_settles() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let clock = ManualClock::new();
        t.track(123.4, &mut stepper, &clock).unwrap();
        let settled = t.position();
        for _ in 0..50 {
            let mv = t.track(123.4, &mut stepper, &clock).unwrap();
            assert!(mv.steps <= 1);
            assert!(t.position().abs_diff(settled) <= 1);
        }
        let ideal = 123.4 * t.steps_per_degree();
        assert!((f64::from(t.position()) - ideal).abs() <= 1.0);
    }

    #[test]
    fn track_drives_stepper_with_delay_and_switches_off() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let clock = ManualClock::new();
        let mv = t.track(10.0, &mut stepper, &clock).unwrap();
        assert_eq!(mv.steps, 56);
        assert_eq!(stepper.coils().steps(), 56);
        assert_eq!(stepper.coils().last(), Some(ALL_OFF));
        assert_eq!(clock.slept(), Duration::from_millis(10) * 56);
    }

    #[test]
    fn zero_step_move_still_switches_off() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::new());
        let mv = t.track(0.0, &mut stepper, &ManualClock::new()).unwrap();
        assert_eq!(mv.steps, 0);
        assert_eq!(stepper.coils().history, vec![ALL_OFF]);
    }

    #[test]
    fn hardware_fault_keeps_completed_steps() {
        let mut t = tracker(0);
        let mut stepper = Stepper::new(RecordingCoils::failing_after(3));
        let err = t.track(90.0, &mut stepper, &ManualClock::new()).unwrap_err();
        assert!(matches!(err, PointerError::Hardware(_)));
        assert_eq!(t.position(), 3);
    }

    #[test]
    fn preview_leaves_state_alone() {
        let t = tracker(100);
        let first = t.preview(45.0);
        let second = t.preview(45.0);
        assert_eq!(first, second);
        assert_eq!(t.position(), 100);
        assert_eq!(t.accumulated_error(), 0.0);
    }

    #[test]
    fn other_step_counts_supported() {
        let mut t = PositionTracker::new(3600, 0, Duration::ZERO).unwrap();
        let mv = t.next_move(270.0);
        assert_eq!(
            mv,
            Move {
                steps: 900,
                clockwise: false
            }
        );
    }

    #[test]
    fn set_zero_clears_error() {
        let mut t = tracker(500);
        t.next_move(33.3);
        t.set_zero();
        assert_eq!(t.position(), 0);
        assert_eq!(t.accumulated_error(), 0.0);
    }
}
