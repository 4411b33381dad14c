//! Profile registration and account management

use crate::error::{MeshwellError, Result};
use crate::metrics::MetricsCollector;
use crate::profile::validation::{validate_changes, validate_new_profile, NewProfile, ProfileChanges};
use crate::store::{require_active_profile, require_profile, Repository};
use crate::types::{Commend, CommendCounters, Profile, ProfileId, RequestContext};
use crate::utils::generate_id;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owner of profile records
#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn Repository>,
    metrics: Arc<MetricsCollector>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn Repository>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Create a profile with default priorities and zeroed counters
    pub async fn register(&self, input: NewProfile, now: DateTime<Utc>) -> Result<Profile> {
        let timer = self.metrics.start_timer();
        let result = self.register_inner(input, now);
        self.metrics
            .record_operation("register_profile", &result, timer.stop());
        result
    }

    fn register_inner(&self, input: NewProfile, now: DateTime<Utc>) -> Result<Profile> {
        validate_new_profile(&input)?;

        let profile = self.repository.transaction(|data| {
            if data.find_profile_by_username(&input.username)?.is_some() {
                warn!("Username '{}' is already taken", input.username);
                return Err(MeshwellError::conflict("A user with that username already exists").into());
            }

            let profile = Profile {
                id: generate_id(),
                username: input.username.clone(),
                email: input.email.clone(),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                is_active: true,
                birth_date: input.birth_date,
                pref_server: input.pref_server,
                commends: CommendCounters::default(),
                received_ratings: 0,
                sessions_played: 0,
                commend_priorities: Commend::ALL,
                ignore_matchmaking: false,
                pref_game: None,
                created_at: now,
            };
            data.put_profile(profile.clone())?;
            Ok(profile)
        })?;

        self.metrics.record_profile_registered();
        info!("Registered profile '{}' ({})", profile.username, profile.id);
        Ok(profile)
    }

    pub async fn get(&self, profile_id: ProfileId) -> Result<Profile> {
        debug!("Looking up profile {}", profile_id);
        self.repository
            .read(|data| require_profile(data, profile_id))
    }

    /// Apply profile edits for the requesting profile
    pub async fn edit(&self, ctx: &RequestContext, changes: ProfileChanges) -> Result<Profile> {
        let timer = self.metrics.start_timer();
        let result = self.edit_inner(ctx, changes);
        self.metrics.record_operation("edit_profile", &result, timer.stop());
        result
    }

    fn edit_inner(&self, ctx: &RequestContext, changes: ProfileChanges) -> Result<Profile> {
        validate_changes(&changes)?;

        let profile = self.repository.transaction(|data| {
            let mut profile = require_active_profile(data, ctx.profile_id)?;
            if let Some(email) = changes.email {
                profile.email = email;
            }
            if let Some(first_name) = changes.first_name {
                profile.first_name = first_name;
            }
            if let Some(last_name) = changes.last_name {
                profile.last_name = last_name;
            }
            if let Some(birth_date) = changes.birth_date {
                profile.birth_date = birth_date;
            }
            if let Some(pref_server) = changes.pref_server {
                profile.pref_server = pref_server;
            }
            data.put_profile(profile.clone())?;
            Ok(profile)
        })?;

        info!("Updated profile {}", profile.id);
        Ok(profile)
    }

    /// Mark the requesting profile inactive; the record itself is kept
    pub async fn deactivate(&self, ctx: &RequestContext) -> Result<Profile> {
        let profile = self.repository.transaction(|data| {
            let mut profile = require_profile(data, ctx.profile_id)?;
            profile.is_active = false;
            data.put_profile(profile.clone())?;
            Ok(profile)
        })?;

        self.metrics.record_profile_deactivated();
        info!("Deactivated profile '{}' ({})", profile.username, profile.id);
        Ok(profile)
    }
}
