//! Availability registry and window validation

pub mod registry;
pub mod validation;

pub use registry::{AvailabilityRegistry, WindowInput};
pub use validation::{find_overlap, validate_window, windows_overlap};
