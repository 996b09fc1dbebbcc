//! Hardware seams shared by the actuation core and its hardware back-ends.
//!
//! The core never touches GPIO or PWM peripherals directly; it talks to these
//! traits so the same control code runs against the simulated hand in tests
//! and against real pins on the device.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type crossing the hardware trait boundary.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// PWM channel feeding the motor driver's enable input.
///
/// Takes `&self` because the encoder edge handler writes duty 0 from
/// interrupt context while the tick side also owns a handle. Implementations
/// must not block.
pub trait PwmChannel: Send + Sync {
    /// Write an 8-bit duty (0 = stopped, 255 = full drive).
    fn set_duty(&self, duty: u8) -> HwResult<()>;
}

/// Digital outputs of the H-bridge driver besides PWM.
pub trait DriverPins: Send {
    /// Direction-phase output: low opens the hand, high closes it.
    fn set_phase(&mut self, high: bool) -> HwResult<()>;
    /// Driver sleep output: `true` puts the driver into low-power sleep.
    fn set_sleep(&mut self, asleep: bool) -> HwResult<()>;
}

impl<P: PwmChannel + ?Sized> PwmChannel for std::sync::Arc<P> {
    fn set_duty(&self, duty: u8) -> HwResult<()> {
        (**self).set_duty(duty)
    }
}

impl<D: DriverPins + ?Sized> DriverPins for Box<D> {
    fn set_phase(&mut self, high: bool) -> HwResult<()> {
        (**self).set_phase(high)
    }
    fn set_sleep(&mut self, asleep: bool) -> HwResult<()> {
        (**self).set_sleep(asleep)
    }
}
