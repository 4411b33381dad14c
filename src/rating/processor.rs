//! Rating and commendation processor
//!
//! Applies a participant's post-session rating: records the rating, credits
//! commendations and reports to the other participants, counts the rating
//! against each of them and completes the session.

use crate::error::{MeshwellError, Result};
use crate::events::{EventPublisher, SessionRated};
use crate::metrics::MetricsCollector;
use crate::rating::validation::{validate_submission, RatingSubmission};
use crate::store::{require_active_profile, require_profile, require_session, Repository};
use crate::types::{Commend, Report, ReportReason, RequestContext, SessionId};
use crate::utils::generate_id;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What a rating submission changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingOutcome {
    pub session_id: SessionId,
    pub rating: u8,
    /// Participants whose received-rating count went up
    pub rated_participants: usize,
    /// Every commendation awarded, one entry per increment
    pub commendations: Vec<Commend>,
    pub reports: Vec<Report>,
}

#[derive(Clone)]
pub struct RatingProcessor {
    repository: Arc<dyn Repository>,
    event_publisher: Arc<dyn EventPublisher>,
    metrics: Arc<MetricsCollector>,
}

impl RatingProcessor {
    pub fn new(
        repository: Arc<dyn Repository>,
        event_publisher: Arc<dyn EventPublisher>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
            metrics,
        }
    }

    /// Submit the requesting profile's rating for a session it played in
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        session_id: SessionId,
        submission: RatingSubmission,
    ) -> Result<RatingOutcome> {
        info!(
            "Profile {} rating session {} with {}",
            ctx.profile_id, session_id, submission.rating
        );

        let timer = self.metrics.start_timer();
        let result = self.apply(ctx, session_id, &submission);
        self.metrics.record_operation("rate_session", &result, timer.stop());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    "Rating from profile {} for session {} rejected: {}",
                    ctx.profile_id, session_id, error
                );
                return Err(error);
            }
        };

        self.metrics.record_rating(
            outcome.rating,
            &outcome.commendations,
            outcome.reports.len(),
        );
        info!(
            "Session {} rated by {}: {} commendation(s), {} report(s)",
            session_id,
            ctx.profile_id,
            outcome.commendations.len(),
            outcome.reports.len()
        );

        let event = SessionRated {
            session_id,
            rated_by: ctx.profile_id,
            rating: outcome.rating,
            commendations: outcome.commendations.len(),
            reports: outcome.reports.len(),
            timestamp: ctx.now,
        };
        if let Err(error) = self.event_publisher.publish_session_rated(event).await {
            warn!("Failed to publish SessionRated event: {}", error);
        }

        Ok(outcome)
    }

    fn apply(
        &self,
        ctx: &RequestContext,
        session_id: SessionId,
        submission: &RatingSubmission,
    ) -> Result<RatingOutcome> {
        self.repository.transaction(|data| {
            let mut submitter = require_active_profile(data, ctx.profile_id)?;
            let mut session = require_session(data, session_id)?;

            if !session.has_ended(ctx.now) {
                return Err(MeshwellError::validation(
                    "You can only rate a session after it has ended",
                )
                .into());
            }

            let participants = data.session_profiles_for_session(session_id)?;
            let mut own_row = participants
                .iter()
                .find(|p| p.profile_id == ctx.profile_id)
                .cloned()
                .ok_or_else(|| MeshwellError::validation("You did not take part in this session"))?;

            if own_row.rating.is_some() {
                return Err(
                    MeshwellError::conflict("You have already rated this session").into(),
                );
            }

            validate_submission(submission, ctx.profile_id, &participants)?;

            own_row.rating = Some(submission.rating);
            data.put_session_profile(own_row)?;

            let mut outcome = RatingOutcome {
                session_id,
                rating: submission.rating,
                rated_participants: 0,
                commendations: Vec::new(),
                reports: Vec::new(),
            };

            for participant in participants.iter().filter(|p| p.profile_id != ctx.profile_id) {
                let mut profile = require_profile(data, participant.profile_id)?;
                profile.received_ratings += 1;
                outcome.rated_participants += 1;

                let feedback = submission
                    .feedback
                    .iter()
                    .find(|f| f.profile_id == participant.profile_id);

                if let Some(feedback) = feedback {
                    for commend in &feedback.commends {
                        profile.commends.increment(*commend);
                        outcome.commendations.push(*commend);
                    }

                    if feedback.report {
                        let report = Report {
                            id: generate_id(),
                            session_id,
                            user_reported: participant.profile_id,
                            sent_by: ctx.profile_id,
                            reason: ReportReason::Toxic,
                            created_at: ctx.now,
                        };
                        data.put_report(report.clone())?;
                        outcome.reports.push(report);
                    }
                }

                data.put_profile(profile)?;
            }

            submitter.sessions_played += 1;
            data.put_profile(submitter)?;

            if session.completed_at.is_none() {
                session.completed_at = Some(ctx.now);
                data.put_session(session)?;
            }

            Ok(outcome)
        })
    }
}
