//! Matchmaking preference resolver
//!
//! Owns the commendation priority order, the preferred game and the
//! matchmaking-ignore flag of a profile, and resolves the game a profile
//! queues for.

use crate::error::{MeshwellError, Result};
use crate::metrics::MetricsCollector;
use crate::store::{require_active_profile, Repository};
use crate::types::{Commend, ConnectedAccount, GameId, Profile, RequestContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Submitted matchmaking preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchmakingPreferences {
    /// Highest priority first
    pub commend_priorities: [Commend; 4],
    #[serde(default)]
    pub ignore_matchmaking: bool,
    #[serde(default)]
    pub pref_game: Option<GameId>,
}

impl MatchmakingPreferences {
    pub fn of(profile: &Profile) -> Self {
        Self {
            commend_priorities: profile.commend_priorities,
            ignore_matchmaking: profile.ignore_matchmaking,
            pref_game: profile.pref_game,
        }
    }
}

/// Reject priority orders that repeat a commendation, naming every clashing pair of slots
pub fn validate_priorities(priorities: &[Commend; 4]) -> Result<()> {
    let mut clashes = Vec::new();
    for first in 0..priorities.len() {
        for second in (first + 1)..priorities.len() {
            if priorities[first] == priorities[second] {
                clashes.push(format!(
                    "commend_priority_{} and commend_priority_{}",
                    first + 1,
                    second + 1
                ));
            }
        }
    }

    if clashes.is_empty() {
        Ok(())
    } else {
        Err(MeshwellError::validation(format!(
            "You cannot have duplicate priorities ({})",
            clashes.join(", ")
        ))
        .into())
    }
}

/// Preferred game to store, given the request and the profile's connected accounts
///
/// An explicit game must be connected. Without one the first connected
/// account's game is used, or nothing when no account is connected.
pub fn resolve_pref_game(
    requested: Option<GameId>,
    accounts: &[ConnectedAccount],
) -> Result<Option<GameId>> {
    match requested {
        Some(game_id) => {
            if accounts.iter().any(|a| a.game_id == game_id) {
                Ok(Some(game_id))
            } else {
                Err(MeshwellError::validation(
                    "You can only prefer a game you have connected an account for",
                )
                .into())
            }
        }
        None => Ok(accounts.first().map(|a| a.game_id)),
    }
}

/// Game a profile queues for: its preferred game, else its first connected game
pub fn effective_game(profile: &Profile, accounts: &[ConnectedAccount]) -> Option<GameId> {
    profile
        .pref_game
        .or_else(|| accounts.first().map(|a| a.game_id))
}

#[derive(Clone)]
pub struct PreferenceResolver {
    repository: Arc<dyn Repository>,
    metrics: Arc<MetricsCollector>,
}

impl PreferenceResolver {
    pub fn new(repository: Arc<dyn Repository>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Current preferences of the requesting profile
    pub async fn get(&self, ctx: &RequestContext) -> Result<MatchmakingPreferences> {
        self.repository.read(|data| {
            let profile = require_active_profile(data, ctx.profile_id)?;
            Ok(MatchmakingPreferences::of(&profile))
        })
    }

    /// Validate and store preferences for the requesting profile
    pub async fn save(
        &self,
        ctx: &RequestContext,
        preferences: MatchmakingPreferences,
    ) -> Result<MatchmakingPreferences> {
        let timer = self.metrics.start_timer();
        let result = self.save_inner(ctx, preferences);
        self.metrics
            .record_operation("save_preferences", &result, timer.stop());

        let saved = result?;
        self.metrics.record_preference_update();
        info!(
            "Saved preferences for profile {}: priorities {:?}, ignore {}, game {:?}",
            ctx.profile_id, saved.commend_priorities, saved.ignore_matchmaking, saved.pref_game
        );
        Ok(saved)
    }

    fn save_inner(
        &self,
        ctx: &RequestContext,
        preferences: MatchmakingPreferences,
    ) -> Result<MatchmakingPreferences> {
        if let Err(error) = validate_priorities(&preferences.commend_priorities) {
            warn!("Rejected priorities for profile {}: {}", ctx.profile_id, error);
            return Err(error);
        }

        self.repository.transaction(|data| {
            let mut profile = require_active_profile(data, ctx.profile_id)?;
            let accounts = data.accounts_for_profile(ctx.profile_id)?;

            profile.commend_priorities = preferences.commend_priorities;
            profile.ignore_matchmaking = preferences.ignore_matchmaking;
            profile.pref_game = resolve_pref_game(preferences.pref_game, &accounts)?;
            data.put_profile(profile.clone())?;

            Ok(MatchmakingPreferences::of(&profile))
        })
    }
}
