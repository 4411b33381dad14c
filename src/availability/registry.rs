//! Availability registry
//!
//! Stores the recurring weekly windows a profile is willing to play in. The
//! overlap check runs in the same write transaction as the insert it guards.

use crate::availability::validation::{find_overlap, validate_window};
use crate::error::{MeshwellError, Result};
use crate::metrics::MetricsCollector;
use crate::store::{require_active_profile, Repository};
use crate::types::{Availability, AvailabilityId, Day, RequestContext};
use crate::utils::generate_id;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A proposed availability window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInput {
    pub day: Day,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub competitive: bool,
}

#[derive(Clone)]
pub struct AvailabilityRegistry {
    repository: Arc<dyn Repository>,
    metrics: Arc<MetricsCollector>,
}

impl AvailabilityRegistry {
    pub fn new(repository: Arc<dyn Repository>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Add a window for the requesting profile
    pub async fn add(&self, ctx: &RequestContext, input: WindowInput) -> Result<Availability> {
        let timer = self.metrics.start_timer();
        let result = self.store_window(ctx, None, input);
        self.metrics
            .record_operation("add_availability", &result, timer.stop());

        let window = result?;
        self.metrics.record_availability_change("added");
        info!(
            "Profile {} is available {} {}-{} (competitive: {})",
            ctx.profile_id, window.day, window.start_time, window.end_time, window.competitive
        );
        Ok(window)
    }

    /// Replace one of the requesting profile's windows
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        id: AvailabilityId,
        input: WindowInput,
    ) -> Result<Availability> {
        let timer = self.metrics.start_timer();
        let result = self.store_window(ctx, Some(id), input);
        self.metrics
            .record_operation("edit_availability", &result, timer.stop());

        let window = result?;
        self.metrics.record_availability_change("edited");
        info!("Profile {} updated availability {}", ctx.profile_id, id);
        Ok(window)
    }

    /// Delete one of the requesting profile's windows
    pub async fn remove(&self, ctx: &RequestContext, id: AvailabilityId) -> Result<()> {
        self.repository.transaction(|data| {
            require_active_profile(data, ctx.profile_id)?;
            match data.get_availability(id)? {
                Some(window) if window.profile_id == ctx.profile_id => {
                    data.delete_availability(id)?;
                    Ok(())
                }
                _ => Err(MeshwellError::not_found("Availability", id).into()),
            }
        })?;

        self.metrics.record_availability_change("removed");
        info!("Profile {} removed availability {}", ctx.profile_id, id);
        Ok(())
    }

    /// The requesting profile's windows, ordered by day then start
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Availability>> {
        debug!("Listing availability for profile {}", ctx.profile_id);
        self.repository
            .read(|data| data.availabilities_for_profile(ctx.profile_id))
    }

    fn store_window(
        &self,
        ctx: &RequestContext,
        editing: Option<AvailabilityId>,
        input: WindowInput,
    ) -> Result<Availability> {
        validate_window(input.start_time, input.end_time)?;

        self.repository.transaction(|data| {
            require_active_profile(data, ctx.profile_id)?;

            if let Some(id) = editing {
                match data.get_availability(id)? {
                    Some(window) if window.profile_id == ctx.profile_id => {}
                    _ => return Err(MeshwellError::not_found("Availability", id).into()),
                }
            }

            let existing = data.availabilities_for_profile(ctx.profile_id)?;
            if let Some(clash) = find_overlap(
                &existing,
                input.day,
                input.start_time,
                input.end_time,
                editing,
            ) {
                warn!(
                    "Window {} {}-{} for profile {} overlaps {}",
                    input.day, input.start_time, input.end_time, ctx.profile_id, clash.id
                );
                return Err(MeshwellError::conflict(
                    "An availability already exists for this time and day, or you are overlapping.",
                )
                .into());
            }

            let window = Availability {
                id: editing.unwrap_or_else(generate_id),
                profile_id: ctx.profile_id,
                day: input.day,
                start_time: input.start_time,
                end_time: input.end_time,
                competitive: input.competitive,
            };
            data.put_availability(window.clone())?;
            Ok(window)
        })
    }
}
