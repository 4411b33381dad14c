//! Session lifecycle manager
//!
//! This module provides the SessionManager that hosts sessions, places
//! queueing profiles into compatible open sessions (or creates one for them)
//! and removes them from the queue again. Every check that guards a write
//! runs in the same repository transaction as the write.

use crate::config::MatchmakingSettings;
use crate::error::{MeshwellError, Result};
use crate::events::{EventPublisher, PlayerJoinedSession, PlayerLeftSession, SessionCreated};
use crate::metrics::{MetricsCollector, QueueOutcome};
use crate::preferences::effective_game;
use crate::session::matching::{Candidate, MatchingResult, SessionMatcher};
use crate::session::validation::{
    session_fits_window, validate_schedule, window_fits_session, SessionRequest,
};
use crate::store::{require_active_profile, require_game, require_profile, require_session};
use crate::store::{DataAccess, Repository};
use crate::types::*;
use crate::utils::{at_time, generate_id, next_occurrence};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A session with its participants and derived state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session: Session,
    pub participants: Vec<SessionProfile>,
    pub state: SessionState,
}

impl SessionView {
    fn load(data: &dyn DataAccess, session: Session) -> Result<Self> {
        let participants = data.session_profiles_for_session(session.id)?;
        let state = session.state(participants.len());
        Ok(Self {
            session,
            participants,
            state,
        })
    }
}

/// Outcome of a successful queue join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueTicket {
    /// The pending participation created for the profile
    pub session_profile: SessionProfile,
    pub session: SessionView,
    /// True when no open session fit and one was created
    pub created: bool,
}

/// Outcome of leaving the queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveSummary {
    pub left: Vec<SessionId>,
    /// Sessions deleted because nobody was left in them
    pub removed: Vec<SessionId>,
}

/// The main session lifecycle manager
#[derive(Clone)]
pub struct SessionManager {
    repository: Arc<dyn Repository>,
    /// Session matcher for picking a queue candidate
    matcher: Arc<dyn SessionMatcher>,
    /// Event publisher for session events
    event_publisher: Arc<dyn EventPublisher>,
    /// Metrics collector for recording performance data
    metrics: Arc<MetricsCollector>,
    settings: MatchmakingSettings,
}

impl SessionManager {
    pub fn new(
        repository: Arc<dyn Repository>,
        matcher: Arc<dyn SessionMatcher>,
        event_publisher: Arc<dyn EventPublisher>,
        metrics: Arc<MetricsCollector>,
        settings: MatchmakingSettings,
    ) -> Self {
        Self {
            repository,
            matcher,
            event_publisher,
            metrics,
            settings,
        }
    }

    /// Host a new session; the host becomes its first participant
    pub async fn create_session(
        &self,
        ctx: &RequestContext,
        request: SessionRequest,
    ) -> Result<SessionView> {
        info!(
            "Profile {} hosting session for game {} on {} {}-{}",
            ctx.profile_id, request.game_id, request.date, request.start_time, request.end_time
        );

        let timer = self.metrics.start_timer();
        let result = self.create_session_inner(ctx, request);
        self.metrics
            .record_operation("create_session", &result, timer.stop());
        let view = result?;

        self.metrics.record_session_created(true);
        info!(
            "Created session {} starting {}",
            view.session.id, view.session.start
        );
        self.announce_created(&view.session, ctx.profile_id, true, ctx)
            .await;
        Ok(view)
    }

    fn create_session_inner(
        &self,
        ctx: &RequestContext,
        request: SessionRequest,
    ) -> Result<SessionView> {
        let (start, end_time) = validate_schedule(
            request.date,
            request.start_time,
            request.end_time,
            ctx.now,
            self.settings.min_session_length(),
        )?;

        self.repository.transaction(|data| {
            require_active_profile(data, ctx.profile_id)?;
            let game = require_game(data, request.game_id)?;

            let accounts = data.accounts_for_profile(ctx.profile_id)?;
            if !accounts.iter().any(|a| a.game_id == game.id) {
                warn!(
                    "Profile {} has no account connected for {}",
                    ctx.profile_id, game.name
                );
                return Err(MeshwellError::validation(format!(
                    "Connect a {} account before hosting a session",
                    game.name
                ))
                .into());
            }

            let session = Session {
                id: generate_id(),
                game_id: game.id,
                start,
                end_time,
                competitive: request.competitive,
                capacity: self.settings.session_capacity,
                created_at: ctx.now,
                completed_at: None,
            };
            data.put_session(session.clone())?;
            data.put_session_profile(SessionProfile {
                id: generate_id(),
                session_id: session.id,
                profile_id: ctx.profile_id,
                rating: None,
                joined_at: ctx.now,
            })?;

            SessionView::load(data, session)
        })
    }

    /// Place the requesting profile into a compatible open session
    ///
    /// Falls back to creating a session at the profile's earliest upcoming
    /// availability window when no open session fits.
    pub async fn join_queue(&self, ctx: &RequestContext) -> Result<QueueTicket> {
        info!("Processing queue request for profile {}...", ctx.profile_id);

        let timer = self.metrics.start_timer();
        let result = self.join_queue_inner(ctx);
        self.metrics
            .record_operation("join_queue", &result, timer.stop());

        let ticket = match result {
            Ok(ticket) => ticket,
            Err(error) => {
                warn!("Queue request for profile {} failed: {}", ctx.profile_id, error);
                return Err(error);
            }
        };

        let participants = ticket.session.participants.len();
        if ticket.created {
            self.metrics
                .record_queue_join(QueueOutcome::Created, participants);
            self.metrics.record_session_created(false);
            info!(
                "No open session fit profile {}, created session {} at {}",
                ctx.profile_id, ticket.session.session.id, ticket.session.session.start
            );
            self.announce_created(&ticket.session.session, ctx.profile_id, false, ctx)
                .await;
        } else {
            self.metrics
                .record_queue_join(QueueOutcome::Matched, participants);
            info!(
                "Profile {} joined session {} ({}/{})",
                ctx.profile_id,
                ticket.session.session.id,
                participants,
                ticket.session.session.capacity
            );
            let event = PlayerJoinedSession {
                session_id: ticket.session.session.id,
                profile_id: ctx.profile_id,
                participants,
                capacity: ticket.session.session.capacity,
                timestamp: ctx.now,
            };
            if let Err(error) = self.event_publisher.publish_player_joined(event).await {
                warn!("Failed to publish PlayerJoinedSession event: {}", error);
            }
        }

        Ok(ticket)
    }

    fn join_queue_inner(&self, ctx: &RequestContext) -> Result<QueueTicket> {
        self.repository.transaction(|data| {
            let profile = require_active_profile(data, ctx.profile_id)?;

            let windows = data.availabilities_for_profile(profile.id)?;
            if windows.is_empty() {
                return Err(MeshwellError::validation(
                    "Add an availability window before joining the queue",
                )
                .into());
            }

            if pending_participation(data, profile.id, ctx.now)?.is_some() {
                return Err(MeshwellError::conflict("You are already queued for a session").into());
            }

            let accounts = data.accounts_for_profile(profile.id)?;
            let game_id = effective_game(&profile, &accounts).ok_or_else(|| {
                MeshwellError::validation("Connect a game account before joining the queue")
            })?;

            let candidates = self.collect_candidates(data, &profile, game_id, &windows, ctx)?;
            debug!(
                "Found {} candidate sessions for profile {}",
                candidates.len(),
                profile.id
            );

            let timer = self.metrics.start_timer();
            let decision = self.matcher.find_session_for_profile(&profile, &candidates)?;
            self.metrics.record_matching(timer.stop());

            let (session, created) = match decision {
                MatchingResult::MatchedToSession(session_id) => {
                    let session = require_session(data, session_id)?;
                    // Capacity is re-checked under the same lock as the insert
                    let participants = data.session_profiles_for_session(session_id)?;
                    if participants.len() >= session.capacity {
                        return Err(MeshwellError::conflict("Session is already full").into());
                    }
                    (session, false)
                }
                MatchingResult::CreateNewSession => {
                    let session = self.anchor_session(game_id, &windows, ctx)?;
                    data.put_session(session.clone())?;
                    (session, true)
                }
            };

            let session_profile = SessionProfile {
                id: generate_id(),
                session_id: session.id,
                profile_id: profile.id,
                rating: None,
                joined_at: ctx.now,
            };
            data.put_session_profile(session_profile.clone())?;

            Ok(QueueTicket {
                session_profile,
                session: SessionView::load(data, session)?,
                created,
            })
        })
    }

    fn collect_candidates(
        &self,
        data: &dyn DataAccess,
        profile: &Profile,
        game_id: GameId,
        windows: &[Availability],
        ctx: &RequestContext,
    ) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();

        for session in data.list_sessions()? {
            if session.is_completed() || session.game_id != game_id || session.start <= ctx.now {
                continue;
            }
            if !windows.iter().any(|w| session_fits_window(&session, w)) {
                continue;
            }

            let rows = data.session_profiles_for_session(session.id)?;
            if rows.len() >= session.capacity || rows.iter().any(|r| r.profile_id == profile.id) {
                continue;
            }

            let mut participants = Vec::with_capacity(rows.len());
            for row in &rows {
                participants.push(require_profile(data, row.profile_id)?);
            }
            candidates.push(Candidate {
                session,
                participants,
            });
        }

        Ok(candidates)
    }

    /// New session at the earliest upcoming window long enough to host one
    fn anchor_session(
        &self,
        game_id: GameId,
        windows: &[Availability],
        ctx: &RequestContext,
    ) -> Result<Session> {
        let min_length = self.settings.min_session_length();

        let anchor = windows
            .iter()
            .filter(|w| window_fits_session(w, min_length))
            .map(|w| (next_occurrence(w.day, w.start_time, ctx.now), w))
            .min_by_key(|(start, _)| *start);

        let (start, window) = anchor.ok_or_else(|| {
            MeshwellError::validation(format!(
                "None of your availability windows is at least {} minutes long",
                min_length.num_minutes()
            ))
        })?;

        Ok(Session {
            id: generate_id(),
            game_id,
            start,
            end_time: at_time(start.date_naive(), window.end_time),
            competitive: window.competitive,
            capacity: self.settings.session_capacity,
            created_at: ctx.now,
            completed_at: None,
        })
    }

    /// Remove the requesting profile from every session still ahead of it
    ///
    /// Sessions that are completed or already over keep their participants
    /// so they can still be rated.
    pub async fn leave_queue(&self, ctx: &RequestContext) -> Result<LeaveSummary> {
        info!("Removing profile {} from the queue", ctx.profile_id);

        let timer = self.metrics.start_timer();
        let result = self.leave_queue_inner(ctx);
        self.metrics
            .record_operation("leave_queue", &result, timer.stop());
        let summary = result?;

        self.metrics.record_queue_leave(summary.removed.len());
        info!(
            "Profile {} left {} session(s), {} removed",
            ctx.profile_id,
            summary.left.len(),
            summary.removed.len()
        );

        let event = PlayerLeftSession {
            profile_id: ctx.profile_id,
            sessions: summary.left.clone(),
            removed_sessions: summary.removed.clone(),
            timestamp: ctx.now,
        };
        if let Err(error) = self.event_publisher.publish_player_left(event).await {
            warn!("Failed to publish PlayerLeftSession event: {}", error);
        }

        Ok(summary)
    }

    fn leave_queue_inner(&self, ctx: &RequestContext) -> Result<LeaveSummary> {
        self.repository.transaction(|data| {
            require_profile(data, ctx.profile_id)?;

            let mut summary = LeaveSummary {
                left: Vec::new(),
                removed: Vec::new(),
            };

            for row in data.session_profiles_for_profile(ctx.profile_id)? {
                let session = data.get_session(row.session_id)?;
                if session
                    .as_ref()
                    .is_some_and(|s| s.is_completed() || s.has_ended(ctx.now))
                {
                    continue;
                }

                data.delete_session_profile(row.id)?;
                summary.left.push(row.session_id);

                if session.is_some() && data.session_profiles_for_session(row.session_id)?.is_empty()
                {
                    data.delete_session(row.session_id)?;
                    summary.removed.push(row.session_id);
                }
            }

            if summary.left.is_empty() {
                return Err(MeshwellError::not_found("Queue entry", ctx.profile_id).into());
            }
            Ok(summary)
        })
    }

    /// The requesting profile's pending participation, if any
    pub async fn current_queue(&self, ctx: &RequestContext) -> Result<Option<SessionProfile>> {
        self.repository
            .read(|data| pending_participation(data, ctx.profile_id, ctx.now))
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<SessionView> {
        debug!("Looking up session {}", session_id);
        self.repository.read(|data| {
            let session = require_session(data, session_id)?;
            SessionView::load(data, session)
        })
    }

    async fn announce_created(
        &self,
        session: &Session,
        host: ProfileId,
        hosted: bool,
        ctx: &RequestContext,
    ) {
        let event = SessionCreated {
            session_id: session.id,
            game_id: session.game_id,
            host,
            start: session.start,
            end_time: session.end_time,
            competitive: session.competitive,
            hosted,
            timestamp: ctx.now,
        };
        if let Err(error) = self.event_publisher.publish_session_created(event).await {
            warn!("Failed to publish SessionCreated event: {}", error);
        }
    }
}

/// Participation of `profile_id` in a session that is neither completed nor
/// over at `now`
pub fn pending_participation(
    data: &dyn DataAccess,
    profile_id: ProfileId,
    now: DateTime<Utc>,
) -> Result<Option<SessionProfile>> {
    for row in data.session_profiles_for_profile(profile_id)? {
        match data.get_session(row.session_id)? {
            Some(session) if !session.is_completed() && !session.has_ended(now) => {
                return Ok(Some(row))
            }
            _ => {}
        }
    }
    Ok(None)
}
