//! Device process for the prosthetic hand: configuration, logging, hardware
//! wiring and the fixed-rate actuation loop.

pub mod logging;
pub mod requests;
pub mod runner;
pub mod wiring;
