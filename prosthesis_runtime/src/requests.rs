//! Messages collaborators send to the actuation loop.

use std::io::BufRead;
use std::str::SplitWhitespace;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use prosthesis_core::{Actuator, Mode, Phase, SafetyEvent, SafetyReadings};
use prosthesis_traits::Clock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Mode(Mode),
    Phase(Phase),
    /// Fresh sensor values for the safety supervisor.
    Readings(SafetyReadings),
    Sleep(bool),
    Shutdown,
}

/// Apply one request. Returns `false` once shutdown was requested.
pub fn apply(act: &mut Actuator, req: Request) -> bool {
    match req {
        Request::Mode(mode) => {
            if act.request_mode(mode) {
                debug!(%mode, "mode request accepted");
            }
        }
        Request::Phase(phase) => {
            if act.request_phase(phase) {
                debug!(%phase, "phase request accepted");
            }
        }
        Request::Readings(readings) => match act.supervise(&readings) {
            SafetyEvent::Entered(cause) => warn!(%cause, "safety fault latched"),
            SafetyEvent::Resolved(cause) => info!(%cause, "safety fault cleared"),
            SafetyEvent::Clear | SafetyEvent::Holding(_) => {}
        },
        Request::Sleep(asleep) => {
            if let Err(e) = act.set_sleep(asleep) {
                warn!(error = ?e, asleep, "driver sleep request failed");
            }
        }
        Request::Shutdown => return false,
    }
    true
}

fn parse_mode(s: &str) -> eyre::Result<Mode> {
    Ok(match s {
        "normal" => Mode::Normal,
        "calibrate_motors" => Mode::CalibrateMotors,
        "calibrate_thresholds" => Mode::CalibrateThresholds,
        "safety" => Mode::Safety,
        "rest" => Mode::Rest,
        other => eyre::bail!("unknown mode {other:?}"),
    })
}

fn parse_flag(s: &str) -> eyre::Result<bool> {
    Ok(match s {
        "1" | "on" | "true" => true,
        "0" | "off" | "false" => false,
        other => eyre::bail!("expected on/off, got {other:?}"),
    })
}

fn parse_readings<'a>(fields: impl Iterator<Item = &'a str>) -> eyre::Result<SafetyReadings> {
    let mut r = SafetyReadings::default();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| eyre::eyre!("expected key=value, got {field:?}"))?;
        let num = || {
            value
                .parse::<f32>()
                .map_err(|e| eyre::eyre!("{key}: {e}"))
        };
        match key {
            "current" => r.current_a = num()?,
            "temp" => r.temperature_c = num()?,
            "speed" => r.speed_steps_per_s = num()?,
            "force" => r.force_n = num()?,
            "sensor" => r.sensor_alive = parse_flag(value)?,
            "encoder" => r.encoder_alive = parse_flag(value)?,
            other => eyre::bail!("unknown reading {other:?}"),
        }
    }
    Ok(r)
}

fn next_arg<'a>(fields: &mut SplitWhitespace<'a>, verb: &str) -> eyre::Result<&'a str> {
    fields
        .next()
        .ok_or_else(|| eyre::eyre!("{verb}: missing argument"))
}

/// Parse one line of the text request protocol.
///
/// ```text
/// mode normal
/// phase 3
/// readings current=1.2 temp=41 speed=800 force=12 sensor=1 encoder=1
/// sleep on
/// shutdown
/// ```
///
/// Blank lines and `#` comments yield `None`. Readings not named keep their
/// healthy defaults.
pub fn parse_line(line: &str) -> eyre::Result<Option<Request>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split_whitespace();
    let verb = fields.next().unwrap_or_default();
    let req = match verb {
        "mode" => Request::Mode(parse_mode(next_arg(&mut fields, verb)?)?),
        "phase" => {
            let raw = next_arg(&mut fields, verb)?;
            let phase = raw
                .parse::<u8>()
                .ok()
                .and_then(Phase::from_index)
                .ok_or_else(|| eyre::eyre!("phase must be 1..=5, got {raw:?}"))?;
            Request::Phase(phase)
        }
        "sleep" => Request::Sleep(parse_flag(next_arg(&mut fields, verb)?)?),
        "readings" => Request::Readings(parse_readings(fields)?),
        "shutdown" => Request::Shutdown,
        other => eyre::bail!("unknown request {other:?}"),
    };
    Ok(Some(req))
}

/// Forward requests read line by line from `input` (stdin on the device)
/// until end of input or until the loop stops listening. Malformed lines
/// are logged and skipped.
pub fn spawn_line_reader<R>(
    input: R,
    tx: Sender<Request>,
    running: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("request-reader".into())
        .spawn(move || {
            for line in input.lines() {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "request input failed");
                        break;
                    }
                };
                match parse_line(&line) {
                    Ok(Some(req)) => {
                        if tx.send(req).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, line = %line, "malformed request"),
                }
            }
            debug!("request reader finished");
        })
}

/// Open/close cycle standing in for the classifier when running against the
/// simulated hand.
pub const CYCLE: [(Phase, Duration); 4] = [
    (Phase::Three, Duration::from_millis(1500)),
    (Phase::One, Duration::from_millis(500)),
    (Phase::Two, Duration::from_millis(1500)),
    (Phase::One, Duration::from_millis(500)),
];

pub fn spawn_cycle_script(
    tx: Sender<Request>,
    clock: Arc<dyn Clock + Send + Sync>,
    running: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("cycle-script".into())
        .spawn(move || {
            'outer: while running.load(Ordering::Relaxed) {
                for (phase, hold) in CYCLE {
                    if tx.send(Request::Phase(phase)).is_err() {
                        break 'outer;
                    }
                    clock.sleep(hold);
                    if !running.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                }
            }
            debug!("cycle script finished");
        })
}
