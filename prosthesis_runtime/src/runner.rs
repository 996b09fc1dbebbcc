//! Fixed-rate tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::Receiver;
use eyre::WrapErr;
use prosthesis_core::util::period_us;
use prosthesis_core::{Actuator, TickReport};
use prosthesis_traits::Clock;
use tracing::{debug, info, warn};

use crate::requests::{Request, apply};

pub struct Runner {
    actuator: Actuator,
    requests: Receiver<Request>,
    clock: Arc<dyn Clock + Send + Sync>,
    period: Duration,
    running: Arc<AtomicBool>,
    ticks: u64,
    arrived: bool,
}

impl Runner {
    pub fn new(
        actuator: Actuator,
        requests: Receiver<Request>,
        clock: Arc<dyn Clock + Send + Sync>,
        rt: &prosthesis_config::RuntimeCfg,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            actuator,
            requests,
            clock,
            period: Duration::from_micros(period_us(rt.tick_hz)),
            running,
            ticks: 0,
            arrived: false,
        }
    }

    pub fn actuator(&self) -> &Actuator {
        &self.actuator
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Drain pending requests, then tick once. A failed tick has already
    /// left the motor commanded off; the loop keeps going.
    pub fn step(&mut self) -> Option<TickReport> {
        for req in self.requests.try_iter() {
            if !apply(&mut self.actuator, req) {
                self.running.store(false, Ordering::Relaxed);
            }
        }
        self.ticks += 1;
        match self.actuator.tick() {
            Ok(report) => {
                if report.arrived && !self.arrived {
                    debug!(position = report.position, mode = %report.mode, "arrived");
                }
                self.arrived = report.arrived;
                Some(report)
            }
            Err(e) => {
                warn!(error = ?e, "tick failed; motor commanded off");
                None
            }
        }
    }

    /// Tick at the configured rate until the running flag drops, then stop
    /// the motor.
    pub fn run(&mut self) -> eyre::Result<u64> {
        let period_us = u64::try_from(self.period.as_micros()).unwrap_or(u64::MAX);
        info!(period_us, "tick loop started");
        let mut next = self.clock.now();
        while self.running.load(Ordering::Relaxed) {
            self.step();
            next += self.period;
            let now = self.clock.now();
            if next > now {
                self.clock.sleep(next - now);
            } else {
                next = now;
            }
        }
        self.actuator.stop().wrap_err("final motor stop")?;
        info!(ticks = self.ticks, "tick loop stopped");
        Ok(self.ticks)
    }
}
