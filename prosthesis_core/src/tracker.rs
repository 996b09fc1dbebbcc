//! Quadrature position tracking and the interrupt-side stop.
//!
//! `DriveShared` is the only state touched from interrupt context. Every
//! field is a single-word atomic, so the tick side can read position without
//! locking; read-modify-write sequences run inside `critical_section::with`
//! so an edge never interleaves with `set_position` or a seek setup.
//!
//! Write ownership:
//! - position: edge handler (and `set_position` for calibration bootstrap)
//! - seeking = false on arrival: edge handler
//! - target, seeking = true, direction, non-zero duty: tick side

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};

use prosthesis_traits::PwmChannel;

use crate::types::{Direction, TravelLimits};

#[derive(Debug)]
pub struct DriveShared {
    limits: TravelLimits,
    position: AtomicU16,
    target: AtomicU16,
    seeking: AtomicBool,
    duty: AtomicU8,
    closing: AtomicBool,
    last_a: AtomicBool,
}

impl DriveShared {
    pub fn new(limits: TravelLimits) -> Self {
        Self {
            limits,
            position: AtomicU16::new(limits.min),
            target: AtomicU16::new(limits.min),
            seeking: AtomicBool::new(false),
            duty: AtomicU8::new(0),
            closing: AtomicBool::new(false),
            last_a: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn limits(&self) -> TravelLimits {
        self.limits
    }

    #[inline]
    pub fn position(&self) -> u16 {
        self.position.load(Ordering::Acquire)
    }

    #[inline]
    pub fn seeking(&self) -> bool {
        self.seeking.load(Ordering::Acquire)
    }

    #[inline]
    pub fn target(&self) -> u16 {
        self.target.load(Ordering::Acquire)
    }

    #[inline]
    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Acquire)
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::from_phase_level(self.closing.load(Ordering::Acquire))
    }

    pub(crate) fn store_position(&self, p: u16) {
        self.position.store(self.limits.clamp(p), Ordering::Release);
    }

    pub(crate) fn store_duty(&self, duty: u8) {
        self.duty.store(duty, Ordering::Release);
    }

    pub(crate) fn store_direction(&self, direction: Direction) {
        self.closing
            .store(direction.phase_level(), Ordering::Release);
    }

    pub(crate) fn arm_seek(&self, target: u16) {
        self.target.store(target, Ordering::Release);
        self.seeking.store(true, Ordering::Release);
    }

    pub(crate) fn disarm_seek(&self) {
        self.seeking.store(false, Ordering::Release);
    }
}

/// Edge-handler half of the motor: counts encoder steps and halts the motor
/// the moment a seek target is reached.
///
/// Cheap to clone; the interrupt registration owns one clone and the
/// orchestrator another.
#[derive(Clone)]
pub struct PositionTracker {
    shared: Arc<DriveShared>,
    pwm: Arc<dyn PwmChannel>,
}

impl core::fmt::Debug for PositionTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionTracker")
            .field("position", &self.shared.position())
            .field("seeking", &self.shared.seeking())
            .finish()
    }
}

impl PositionTracker {
    pub fn new(shared: Arc<DriveShared>, pwm: Arc<dyn PwmChannel>) -> Self {
        Self { shared, pwm }
    }

    /// Record the current level of channel A without counting a step.
    pub fn prime(&self, a: bool) {
        self.shared.last_a.store(a, Ordering::Release);
    }

    /// Encoder edge handler. Runs in interrupt context: bounded, no blocking,
    /// no allocation. Returns the position after the edge.
    pub fn on_edge(&self, a: bool, b: bool) -> u16 {
        critical_section::with(|_| {
            let s = &*self.shared;
            let mut pos = s.position.load(Ordering::Relaxed);
            if a != s.last_a.load(Ordering::Relaxed) {
                pos = if a == b {
                    pos.saturating_add(1)
                } else {
                    pos.saturating_sub(1)
                };
                pos = s.limits.clamp(pos);
                s.position.store(pos, Ordering::Release);
            }
            s.last_a.store(a, Ordering::Relaxed);

            if s.seeking.load(Ordering::Acquire) && pos == s.target.load(Ordering::Acquire) {
                s.seeking.store(false, Ordering::Release);
                s.duty.store(0, Ordering::Release);
                if let Err(e) = self.pwm.set_duty(0) {
                    tracing::warn!(error = %e, position = pos, "pwm stop failed at seek target");
                }
            }
            pos
        })
    }

    #[inline]
    pub fn read_position(&self) -> u16 {
        self.shared.position()
    }

    /// Overwrite the position (calibration bootstrap). Clamped to the limits
    /// and fenced against the edge handler.
    pub fn set_position(&self, p: u16) {
        critical_section::with(|_| self.shared.store_position(p));
    }

    pub fn shared(&self) -> &Arc<DriveShared> {
        &self.shared
    }

    pub(crate) fn pwm(&self) -> &Arc<dyn PwmChannel> {
        &self.pwm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prosthesis_hardware::{QuadratureSim, SimulatedPwm};

    fn tracker(min: u16, max: u16) -> (PositionTracker, Arc<SimulatedPwm>) {
        let pwm = Arc::new(SimulatedPwm::new());
        let shared = Arc::new(DriveShared::new(TravelLimits::new(min, max)));
        (PositionTracker::new(shared, pwm.clone()), pwm)
    }

    #[test]
    fn counts_up_when_channels_match_and_down_when_they_differ() {
        let (t, _) = tracker(0, 100);
        let mut q = QuadratureSim::new();
        for _ in 0..5 {
            let (a, b) = q.step(true);
            t.on_edge(a, b);
        }
        assert_eq!(t.read_position(), 5);
        let (a, b) = q.step(false);
        t.on_edge(a, b);
        assert_eq!(t.read_position(), 4);
    }

    #[test]
    fn repeated_level_is_not_a_step() {
        let (t, _) = tracker(0, 100);
        t.on_edge(true, true);
        t.on_edge(true, true);
        t.on_edge(true, false);
        assert_eq!(t.read_position(), 1);
    }

    #[test]
    fn clamps_at_both_limits() {
        let (t, _) = tracker(10, 12);
        t.set_position(10);
        let mut q = QuadratureSim::new();
        for _ in 0..3 {
            let (a, b) = q.step(false);
            t.on_edge(a, b);
        }
        assert_eq!(t.read_position(), 10);
        for _ in 0..10 {
            let (a, b) = q.step(true);
            t.on_edge(a, b);
        }
        assert_eq!(t.read_position(), 12);
    }

    #[test]
    fn set_position_clamps() {
        let (t, _) = tracker(0, 4230);
        t.set_position(9000);
        assert_eq!(t.read_position(), 4230);
    }

    #[test]
    fn edge_at_target_clears_seek_and_zeroes_pwm() {
        let (t, pwm) = tracker(0, 100);
        t.set_position(3);
        t.shared().store_duty(200);
        t.shared().arm_seek(1);
        let mut q = QuadratureSim::new();
        let (a, b) = q.step(false);
        t.on_edge(a, b);
        assert!(t.shared().seeking());
        let (a, b) = q.step(false);
        t.on_edge(a, b);
        assert!(!t.shared().seeking());
        assert_eq!(t.shared().duty(), 0);
        assert_eq!(pwm.duty(), 0);
    }
}
