//! Per-tick actuation: state machine → motor command → published status.

use crate::config::MotorCfg;
use crate::driver::MotorDriver;
use crate::error::Result;
use crate::interpreter::interpret;
use crate::pressure::PressureDetector;
use crate::safety::{SafetyEvent, SafetyReadings, SafetySupervisor};
use crate::state::{Mode, Phase, StateMachine};
use crate::status::TickReport;
use crate::tracker::PositionTracker;
use crate::types::{Direction, MotorCommand};

/// Owns the motor driver and the mode/phase machine; collaborators talk to
/// the hand through it.
///
/// Built with [`crate::ActuatorBuilder`].
pub struct Actuator {
    pub(crate) driver: MotorDriver,
    pub(crate) machine: StateMachine,
    pub(crate) pressure: PressureDetector,
    pub(crate) supervisor: SafetySupervisor,
    pub(crate) motor: MotorCfg,
    pub(crate) last: TickReport,
}

impl core::fmt::Debug for Actuator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Actuator")
            .field("machine", &self.machine)
            .field("drive", &self.driver.drive_state())
            .field("last", &self.last)
            .finish()
    }
}

impl Actuator {
    /// One actuation step.
    ///
    /// Hardware write failures are returned after the motor has been
    /// commanded off; the state machine is left untouched in that case.
    pub fn tick(&mut self) -> Result<TickReport> {
        let mode = self.machine.mode();
        let phase = self.machine.phase();
        let speed = if mode.is_calibration() {
            self.motor.calibration_duty()
        } else {
            self.motor.nominal_duty()
        };
        let limits = self.driver.limits();

        let command = interpret(mode, phase).command();
        let arrived = match command {
            MotorCommand::Open => {
                self.pressure.reset();
                self.driver.start_until(Direction::Open, limits.min, speed)?
            }
            MotorCommand::Close => {
                let at_limit = self.driver.start_until(Direction::Close, limits.max, speed)?;
                let gripped = if mode == Mode::Normal {
                    self.pressure.check(self.driver.read_position())
                } else {
                    self.pressure.reset();
                    false
                };
                at_limit || gripped
            }
            MotorCommand::Hold => {
                self.pressure.reset();
                self.driver.stop_rotation()?;
                false
            }
        };

        if mode == Mode::CalibrateMotors {
            self.calibration_bootstrap(phase);
        }

        let report = TickReport {
            arrived,
            position: self.driver.read_position(),
            mode: self.machine.mode(),
            phase: self.machine.phase(),
            fault: self.machine.fault(),
            command,
            duty: self.driver.drive_state().duty,
        };
        tracing::trace!(
            arrived = report.arrived,
            position = report.position,
            mode = %report.mode,
            phase = %report.phase,
            command = ?report.command,
            duty = report.duty,
            "tick"
        );
        self.last = report;
        Ok(report)
    }

    /// While jogging, hold the counter at mid-travel so both directions stay
    /// free; on the terminal phase the physical position becomes zero.
    fn calibration_bootstrap(&mut self, phase: Phase) {
        if phase == Phase::Four {
            self.driver.set_position(0);
            self.machine.change_mode(Mode::Normal);
            tracing::debug!("motor calibration complete; position zeroed");
        } else {
            self.driver.set_position(self.driver.limits().midpoint());
        }
    }

    /// Request a mode change from a collaborator. Rejected while a fault is
    /// latched; only the safety supervisor moves the machine then.
    pub fn request_mode(&mut self, mode: Mode) -> bool {
        let fault = self.machine.fault();
        if fault.is_active() {
            tracing::warn!(%mode, %fault, "mode request rejected while fault latched");
            return false;
        }
        self.machine.change_mode(mode);
        true
    }

    /// Request a phase change within the current mode. Same gating as
    /// `request_mode`.
    pub fn request_phase(&mut self, phase: Phase) -> bool {
        let fault = self.machine.fault();
        if fault.is_active() {
            tracing::warn!(%phase, %fault, "phase request rejected while fault latched");
            return false;
        }
        self.machine.change_phase(phase);
        true
    }

    /// Run one safety pass against fresh readings.
    pub fn supervise(&mut self, readings: &SafetyReadings) -> SafetyEvent {
        self.supervisor.supervise(&mut self.machine, readings)
    }

    /// Stop the motor (best-effort).
    pub fn stop(&mut self) -> Result<()> {
        self.driver.stop_rotation()
    }

    /// Put the H-bridge to sleep or wake it.
    pub fn set_sleep(&mut self, asleep: bool) -> Result<()> {
        self.driver.set_sleep(asleep)
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last
    }

    pub fn state(&self) -> &StateMachine {
        &self.machine
    }

    /// Handle for the encoder interrupt registration.
    pub fn tracker(&self) -> PositionTracker {
        self.driver.tracker().clone()
    }

    pub fn driver(&self) -> &MotorDriver {
        &self.driver
    }

    pub fn motor_cfg(&self) -> &MotorCfg {
        &self.motor
    }
}
