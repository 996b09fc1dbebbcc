//! Grip-pressure detection from a stalled close.
//!
//! A hand that stops moving while still commanded to close has met an object.
//! The detector watches successive positions and reports once per continuous
//! hold window spent inside the tolerance band.

use std::sync::Arc;
use std::time::{Duration, Instant};

use prosthesis_traits::Clock;

use crate::config::PressureCfg;

pub struct PressureDetector {
    cfg: PressureCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    previous_position: u16,
    since: Option<Instant>,
}

impl core::fmt::Debug for PressureDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PressureDetector")
            .field("previous_position", &self.previous_position)
            .field("timing", &self.since.is_some())
            .finish()
    }
}

impl PressureDetector {
    /// `previous_position` starts at 0 (fully open).
    pub fn new(cfg: PressureCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            cfg,
            clock,
            previous_position: 0,
            since: None,
        }
    }

    /// Feed the current position; returns `true` once per completed window.
    pub fn check(&mut self, position: u16) -> bool {
        let tol = self.cfg.tolerance_steps;
        let lo = self.previous_position.saturating_sub(tol);
        let hi = self.previous_position.saturating_add(tol);
        self.previous_position = position;

        if !(lo..=hi).contains(&position) {
            self.since = None;
            return false;
        }

        let now = self.clock.now();
        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(start)
                if now.saturating_duration_since(start)
                    >= Duration::from_millis(self.cfg.hold_ms) =>
            {
                self.since = None;
                tracing::debug!(position, hold_ms = self.cfg.hold_ms, "grip pressure detected");
                true
            }
            Some(_) => false,
        }
    }

    /// Drop any running window.
    pub fn reset(&mut self) {
        self.since = None;
    }

    pub fn is_timing(&self) -> bool {
        self.since.is_some()
    }
}
