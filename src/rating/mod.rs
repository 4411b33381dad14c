//! Post-session ratings, commendations and reports

pub mod processor;
pub mod validation;

pub use processor::{RatingOutcome, RatingProcessor};
pub use validation::{validate_submission, ParticipantFeedback, RatingSubmission};
