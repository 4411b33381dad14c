//! Session lifecycle: hosting, queue matching and leaving

pub mod lifecycle;
pub mod matching;
pub mod validation;

pub use lifecycle::{pending_participation, LeaveSummary, QueueTicket, SessionManager, SessionView};
pub use matching::{Candidate, MatchingResult, PreferenceMatcher, SessionMatcher};
pub use validation::{session_fits_window, validate_schedule, SessionRequest};
