//! Profile store
//!
//! Registration, profile edits and deactivation. Commendation counters on a
//! profile are owned by the rating processor.

pub mod service;
pub mod validation;

pub use service::ProfileService;
pub use validation::{NewProfile, ProfileChanges};
