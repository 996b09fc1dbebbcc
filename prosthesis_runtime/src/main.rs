//! Device entry point.
//!
//! On the bench (default build) a scripted open/close cycle drives the
//! simulated hand. With the `hardware` feature, collaborators (classifier,
//! sensor acquisition) feed requests as text lines on stdin; see
//! `requests::parse_line` for the protocol.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use prosthesis_runtime::runner::Runner;
use prosthesis_runtime::{logging, wiring};
use prosthesis_traits::{Clock, MonotonicClock};
use tracing::info;

const DEFAULT_CONFIG: &str = "etc/prosthesis.toml";

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let path = env::var_os("PROSTHESIS_CONFIG").map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let cfg = prosthesis_config::load_file(&path)
        .wrap_err_with(|| format!("load config {}", path.display()))?;
    logging::init(&cfg.logging)?;
    info!(config = %path.display(), tick_hz = cfg.runtime.tick_hz, "prosthesis runtime starting");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let (tx, rx) = crossbeam_channel::bounded(64);
    let wiring::Wiring {
        actuator,
        workers,
        keep_alive,
    } = wiring::wire(&cfg, clock.clone(), running.clone())?;

    // No classifier on the bench: cycle the simulated hand open and closed.
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let workers = {
        let mut workers = workers;
        workers.push(prosthesis_runtime::requests::spawn_cycle_script(
            tx.clone(),
            clock.clone(),
            running.clone(),
        )?);
        workers
    };

    // Blocks on stdin, so it is left detached rather than joined at exit.
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let _reader = prosthesis_runtime::requests::spawn_line_reader(
        std::io::BufReader::new(std::io::stdin()),
        tx.clone(),
        running.clone(),
    )?;

    let mut runner = Runner::new(actuator, rx, clock, &cfg.runtime, running.clone());
    let result = runner.run();

    running.store(false, Ordering::Relaxed);
    drop(tx);
    for w in workers {
        let _ = w.join();
    }
    drop(keep_alive);
    result.map(|_| ())
}
