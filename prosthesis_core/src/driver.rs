//! Bounded bidirectional motor drive.
//!
//! The tick side decides direction and duty; the encoder edge handler in
//! `tracker` decides when a seek is finished. Decisions that read position and
//! then write duty are made inside a critical section so an edge cannot land
//! between the check and the write.

use eyre::WrapErr;
use prosthesis_traits::DriverPins;

use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::tracker::PositionTracker;
use crate::types::{Direction, DriveState, TravelLimits};

pub struct MotorDriver {
    tracker: PositionTracker,
    pins: Box<dyn DriverPins>,
    sleeping: bool,
}

impl core::fmt::Debug for MotorDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorDriver")
            .field("state", &self.drive_state())
            .finish()
    }
}

impl MotorDriver {
    /// Wrap a tracker and the driver's digital outputs. The driver starts
    /// stopped and is considered asleep until `set_sleep(false)`.
    pub fn new(tracker: PositionTracker, pins: Box<dyn DriverPins>) -> Self {
        Self {
            tracker,
            pins,
            sleeping: true,
        }
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn limits(&self) -> TravelLimits {
        self.tracker.shared().limits()
    }

    #[inline]
    pub fn read_position(&self) -> u16 {
        self.tracker.read_position()
    }

    pub fn set_position(&self, p: u16) {
        self.tracker.set_position(p);
    }

    pub fn drive_state(&self) -> DriveState {
        let s = self.tracker.shared();
        let seeking = s.seeking();
        DriveState {
            direction: s.direction(),
            duty: s.duty(),
            sleeping: self.sleeping,
            target: seeking.then(|| s.target()),
            seeking,
        }
    }

    /// Rotate toward the limit implied by `direction`.
    ///
    /// Returns `true` (and leaves the motor stopped) when the hand is already
    /// at that limit. A sleeping driver holds: duty 0, no seek, `false`.
    pub fn start_rotation(&mut self, direction: Direction, speed: u8) -> Result<bool> {
        critical_section::with(|_| {
            let r = self.rotate_locked(direction, speed);
            self.fail_safe(r)
        })
    }

    /// Rotate toward `target` and let the edge handler stop exactly there.
    ///
    /// Returns `true` when the target is already satisfied (at or past it in
    /// `direction`), otherwise the limit result of `start_rotation`.
    pub fn start_until(&mut self, direction: Direction, target: u16, speed: u8) -> Result<bool> {
        let target = self.limits().clamp(target);
        critical_section::with(|_| {
            let shared = self.tracker.shared().clone();
            shared.arm_seek(target);
            let pos = shared.position();
            let satisfied = match direction {
                Direction::Open => pos <= target,
                Direction::Close => pos >= target,
            };
            let r = if satisfied {
                shared.disarm_seek();
                self.write_duty(0).map(|()| true)
            } else {
                self.rotate_locked(direction, speed)
            };
            self.fail_safe(r)
        })
    }

    /// Stop now. Idempotent; safe to call at any time.
    pub fn stop_rotation(&mut self) -> Result<()> {
        critical_section::with(|_| {
            self.tracker.shared().disarm_seek();
            self.write_duty(0)
        })
    }

    /// Drive the H-bridge sleep line. Going to sleep stops the motor first.
    pub fn set_sleep(&mut self, asleep: bool) -> Result<()> {
        if asleep {
            self.stop_rotation()?;
        }
        self.pins
            .set_sleep(asleep)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("driver set_sleep")?;
        self.sleeping = asleep;
        tracing::debug!(asleep, "motor driver sleep");
        Ok(())
    }

    fn rotate_locked(&mut self, direction: Direction, speed: u8) -> Result<bool> {
        let shared = self.tracker.shared().clone();
        let pos = shared.position();
        if self.sleeping {
            shared.disarm_seek();
            self.write_duty(0)?;
            tracing::debug!(?direction, "motion request ignored while driver asleep");
            return Ok(false);
        }
        let limit = shared.limits().limit_for(direction);
        let at_limit = match direction {
            Direction::Open => pos <= limit,
            Direction::Close => pos >= limit,
        };
        if at_limit {
            shared.disarm_seek();
            self.write_duty(0)?;
            return Ok(true);
        }
        shared.store_direction(direction);
        self.pins
            .set_phase(direction.phase_level())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("driver set_phase")?;
        self.write_duty(speed)?;
        Ok(false)
    }

    fn write_duty(&self, duty: u8) -> Result<()> {
        let shared = self.tracker.shared();
        shared.store_duty(duty);
        self.tracker
            .pwm()
            .set_duty(duty)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("pwm set_duty")
    }

    /// On any hardware failure leave the motor commanded off.
    fn fail_safe<T>(&self, r: Result<T>) -> Result<T> {
        if r.is_err() {
            let shared = self.tracker.shared();
            shared.disarm_seek();
            shared.store_duty(0);
            if let Err(e) = self.tracker.pwm().set_duty(0) {
                tracing::warn!(error = %e, "pwm stop failed after drive error");
            }
        }
        r
    }
}
