//! Raspberry Pi GPIO back-ends (`rppal`).
//!
//! PWM runs as software PWM on the enable pin; the encoder uses rppal's
//! asynchronous interrupt thread, which calls the edge handler on both edges
//! of channel A.

use std::sync::Mutex;

use prosthesis_traits::{DriverPins, HwResult, PwmChannel};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tracing::debug;

use crate::error::{HwError, Result};

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Software PWM on the driver's enable input.
pub struct GpioPwm {
    pin: Mutex<OutputPin>,
    frequency_hz: f64,
}

impl GpioPwm {
    pub fn new(pin: u8, frequency_hz: u32) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mut out = gpio.get(pin).map_err(gpio_err)?.into_output();
        out.set_low();
        Ok(Self {
            pin: Mutex::new(out),
            frequency_hz: f64::from(frequency_hz),
        })
    }
}

impl PwmChannel for GpioPwm {
    fn set_duty(&self, duty: u8) -> HwResult<()> {
        let mut pin = self
            .pin
            .lock()
            .map_err(|_| HwError::Pwm("pwm pin lock poisoned".into()))?;
        if duty == 0 {
            pin.clear_pwm()
                .map_err(|e| HwError::Pwm(e.to_string()))?;
            pin.set_low();
        } else {
            pin.set_pwm_frequency(self.frequency_hz, f64::from(duty) / 255.0)
                .map_err(|e| HwError::Pwm(e.to_string()))?;
        }
        Ok(())
    }
}

/// Phase and sleep lines of the H-bridge. The sleep input is active low.
pub struct GpioDriverPins {
    phase: OutputPin,
    sleep: OutputPin,
}

impl GpioDriverPins {
    pub fn new(phase_pin: u8, sleep_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mut phase = gpio.get(phase_pin).map_err(gpio_err)?.into_output();
        let mut sleep = gpio.get(sleep_pin).map_err(gpio_err)?.into_output();
        phase.set_low();
        sleep.set_low();
        Ok(Self { phase, sleep })
    }
}

impl DriverPins for GpioDriverPins {
    fn set_phase(&mut self, high: bool) -> HwResult<()> {
        self.phase.write(Level::from(high));
        Ok(())
    }

    fn set_sleep(&mut self, asleep: bool) -> HwResult<()> {
        self.sleep.write(Level::from(!asleep));
        Ok(())
    }
}

/// Keeps the encoder interrupt registered; dropping it detaches the handler.
pub struct EncoderInterrupt {
    _a: InputPin,
}

/// Register `on_edge(a, b)` on both edges of encoder channel A.
///
/// Channel B is sampled inside the callback so the handler sees both levels
/// of the same edge.
pub fn attach_encoder(
    a_pin: u8,
    b_pin: u8,
    mut on_edge: impl FnMut(bool, bool) + Send + 'static,
) -> Result<EncoderInterrupt> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let mut a = gpio.get(a_pin).map_err(gpio_err)?.into_input_pullup();
    let b = gpio.get(b_pin).map_err(gpio_err)?.into_input_pullup();
    a.set_async_interrupt(Trigger::Both, move |level: Level| {
        on_edge(level == Level::High, b.is_high());
    })
    .map_err(gpio_err)?;
    debug!(a_pin, b_pin, "encoder interrupt attached");
    Ok(EncoderInterrupt { _a: a })
}
