//! Maps `Box<dyn Error>` from trait boundaries to typed `ProsthesisError`.
//!
//! The traits in `prosthesis_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `prosthesis_hardware::HwError` downcasting.

use crate::error::ProsthesisError;

/// Map a trait-boundary error to a typed `ProsthesisError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ProsthesisError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<prosthesis_hardware::error::HwError>() {
            return ProsthesisError::HardwareFault(hw.to_string());
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ProsthesisError::Timeout
    } else {
        ProsthesisError::Hardware(s)
    }
}
