//! Pure checks for post-session ratings

use crate::error::{MeshwellError, Result};
use crate::types::{Commend, ProfileId, SessionProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAX_RATING: u8 = 5;

/// Feedback about one other participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantFeedback {
    pub profile_id: ProfileId,
    #[serde(default)]
    pub commends: Vec<Commend>,
    /// Flag the participant as toxic
    #[serde(default)]
    pub report: bool,
}

/// A participant's rating of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSubmission {
    /// 0-5
    pub rating: u8,
    #[serde(default)]
    pub feedback: Vec<ParticipantFeedback>,
}

/// Check a submission against the session's participants
///
/// Feedback may only name participants other than the submitter, each at
/// most once, with each commendation kind at most once.
pub fn validate_submission(
    submission: &RatingSubmission,
    submitter: ProfileId,
    participants: &[SessionProfile],
) -> Result<()> {
    if submission.rating > MAX_RATING {
        return Err(MeshwellError::validation(format!(
            "Rating must be between 0 and {}",
            MAX_RATING
        ))
        .into());
    }

    let mut seen = HashSet::new();
    for feedback in &submission.feedback {
        if feedback.profile_id == submitter {
            return Err(MeshwellError::validation("You cannot commend or report yourself").into());
        }
        if !participants.iter().any(|p| p.profile_id == feedback.profile_id) {
            return Err(MeshwellError::validation(format!(
                "Profile {} did not take part in this session",
                feedback.profile_id
            ))
            .into());
        }
        if !seen.insert(feedback.profile_id) {
            return Err(MeshwellError::validation(format!(
                "Feedback for profile {} was given more than once",
                feedback.profile_id
            ))
            .into());
        }

        let mut kinds = HashSet::new();
        if let Some(repeated) = feedback.commends.iter().find(|c| !kinds.insert(**c)) {
            return Err(MeshwellError::validation(format!(
                "Commendation '{}' was given more than once to the same player",
                repeated
            ))
            .into());
        }
    }

    Ok(())
}
