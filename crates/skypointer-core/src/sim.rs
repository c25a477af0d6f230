//! In-memory hardware used by the tests and by `skypointer --simulate`.

use crate::error::{PointerError, Result};
use crate::hardware::{Clock, CoilDriver, LightRing, OperatorSignal, Rgb};
use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

// ---------------------------------------------------------------------------
// RecordingCoils
// ---------------------------------------------------------------------------

/// Records every coil pattern written. Can be told to fail after a number of
/// writes to exercise hardware error paths.
#[derive(Debug, Default)]
pub struct RecordingCoils {
    pub history: Vec<[bool; 4]>,
    fail_after: Option<usize>,
}

impl RecordingCoils {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(writes: usize) -> Self {
        Self {
            history: Vec::new(),
            fail_after: Some(writes),
        }
    }

    pub fn last(&self) -> Option<[bool; 4]> {
        self.history.last().copied()
    }

    /// Number of writes that energized at least one coil.
    pub fn steps(&self) -> usize {
        self.history
            .iter()
            .filter(|c| c.iter().any(|on| *on))
            .count()
    }
}

impl CoilDriver for RecordingCoils {
    fn energize(&mut self, coils: [bool; 4]) -> Result<()> {
        if self.fail_after == Some(self.history.len()) {
            return Err(PointerError::Hardware("simulated coil driver fault".into()));
        }
        tracing::trace!(?coils, "coils");
        self.history.push(coils);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingRing
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RecordingRing {
    size: usize,
    pub frames: Vec<Vec<Rgb>>,
}

impl RecordingRing {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            frames: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&[Rgb]> {
        self.frames.last().map(|f| f.as_slice())
    }

    /// Indices of the cells lit in the most recent frame.
    pub fn lit(&self) -> Vec<usize> {
        self.last()
            .map(|frame| {
                frame
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.is_off())
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl LightRing for RecordingRing {
    fn len(&self) -> usize {
        self.size
    }

    fn show(&mut self, cells: &[Rgb]) -> Result<()> {
        if cells.len() != self.size {
            return Err(PointerError::Hardware(format!(
                "frame has {} cells, ring has {}",
                cells.len(),
                self.size
            )));
        }
        self.frames.push(cells.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedSignal
// ---------------------------------------------------------------------------

/// Replays a fixed sequence of button readings, one per poll, then repeats
/// `then` forever.
#[derive(Debug, Clone)]
pub struct ScriptedSignal {
    script: VecDeque<bool>,
    then: bool,
}

impl ScriptedSignal {
    pub fn new(script: impl IntoIterator<Item = bool>, then: bool) -> Self {
        Self {
            script: script.into_iter().collect(),
            then,
        }
    }

    /// A single short press, then released for good.
    pub fn tap() -> Self {
        Self::new([true], false)
    }

    /// `released` idle polls, then `held` pressed polls, then released.
    pub fn hold(released: usize, held: usize) -> Self {
        let script = std::iter::repeat(false)
            .take(released)
            .chain(std::iter::repeat(true).take(held));
        Self::new(script, false)
    }
}

impl OperatorSignal for ScriptedSignal {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(self.script.pop_front().unwrap_or(self.then))
    }
}

// ---------------------------------------------------------------------------
// PeriodicSignal
// ---------------------------------------------------------------------------

/// Presses on the first poll and then once every `every` polls. With a
/// period longer than the calibration idle window, each calibration step
/// sees exactly one press and then confirms, so startup runs unattended.
#[derive(Debug, Clone)]
pub struct PeriodicSignal {
    every: usize,
    polls: usize,
}

impl PeriodicSignal {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            polls: 0,
        }
    }

    /// A period that outlasts `idle` when polled every `poll`.
    pub fn outlasting(idle: Duration, poll: Duration) -> Self {
        let polls = if poll.is_zero() {
            0.0
        } else {
            idle.as_secs_f64() / poll.as_secs_f64()
        };
        Self::new(polls.ceil() as usize + 2)
    }
}

impl OperatorSignal for PeriodicSignal {
    fn is_pressed(&mut self) -> Result<bool> {
        let pressed = self.polls % self.every == 0;
        self.polls += 1;
        Ok(pressed)
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// A clock that only moves when slept on. Makes timing deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Total time spent in `sleep`.
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.slept.set(self.slept.get() + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coils_fail_on_schedule() {
        let mut coils = RecordingCoils::failing_after(2);
        coils.energize([true, false, false, false]).unwrap();
        coils.energize([false; 4]).unwrap();
        assert!(matches!(
            coils.energize([true; 4]),
            Err(PointerError::Hardware(_))
        ));
        assert_eq!(coils.history.len(), 2);
        assert_eq!(coils.steps(), 1);
    }

    #[test]
    fn ring_rejects_wrong_frame_size() {
        let mut ring = RecordingRing::new(4);
        assert!(ring.show(&[Rgb::OFF; 3]).is_err());
        ring.show(&[Rgb::OFF, Rgb(1, 0, 0), Rgb::OFF, Rgb::OFF]).unwrap();
        assert_eq!(ring.lit(), vec![1]);
    }

    #[test]
    fn scripted_signal_replays_then_holds() {
        let mut s = ScriptedSignal::hold(1, 2);
        let reads: Vec<bool> = (0..5).map(|_| s.is_pressed().unwrap()).collect();
        assert_eq!(reads, vec![false, true, true, false, false]);
    }

    #[test]
    fn periodic_signal_presses_on_schedule() {
        let mut s = PeriodicSignal::new(3);
        let reads: Vec<bool> = (0..7).map(|_| s.is_pressed().unwrap()).collect();
        assert_eq!(reads, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn periodic_signal_outlasts_idle_window() {
        let s = PeriodicSignal::outlasting(Duration::from_secs(5), Duration::from_millis(100));
        assert_eq!(s.every, 52);
    }

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(10));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(15));
        assert_eq!(clock.slept(), Duration::from_millis(10));
    }
}
