//! Repository interface for persisted records
//!
//! [`DataAccess`] is the typed table API every operation works against.
//! [`Repository`] hands out read and write scopes over it; a write scope is
//! all-or-nothing, so checks and the writes they guard commit together.

use crate::error::{MeshwellError, Result};
use crate::types::*;
use serde::Serialize;

/// Record counts, used for health reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub profiles: usize,
    pub games: usize,
    pub availabilities: usize,
    pub sessions: usize,
    pub open_sessions: usize,
    pub session_profiles: usize,
    pub reports: usize,
    pub connected_accounts: usize,
}

/// Typed lookups and writes over every table
pub trait DataAccess {
    // Profiles
    fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>>;
    fn find_profile_by_username(&self, username: &str) -> Result<Option<Profile>>;
    /// Insert or replace
    fn put_profile(&mut self, profile: Profile) -> Result<()>;

    // Games
    fn get_game(&self, id: GameId) -> Result<Option<Game>>;
    fn find_game_by_name(&self, name: &str) -> Result<Option<Game>>;
    fn list_games(&self) -> Result<Vec<Game>>;
    fn put_game(&mut self, game: Game) -> Result<()>;

    // Availability windows
    fn get_availability(&self, id: AvailabilityId) -> Result<Option<Availability>>;
    /// Ordered by day, then start time
    fn availabilities_for_profile(&self, profile_id: ProfileId) -> Result<Vec<Availability>>;
    fn put_availability(&mut self, availability: Availability) -> Result<()>;
    fn delete_availability(&mut self, id: AvailabilityId) -> Result<bool>;

    // Sessions
    fn get_session(&self, id: SessionId) -> Result<Option<Session>>;
    /// Ordered by start time, then creation order
    fn list_sessions(&self) -> Result<Vec<Session>>;
    fn put_session(&mut self, session: Session) -> Result<()>;
    fn delete_session(&mut self, id: SessionId) -> Result<bool>;

    // Session participation
    /// In join order
    fn session_profiles_for_session(&self, session_id: SessionId) -> Result<Vec<SessionProfile>>;
    fn session_profiles_for_profile(&self, profile_id: ProfileId) -> Result<Vec<SessionProfile>>;
    fn put_session_profile(&mut self, session_profile: SessionProfile) -> Result<()>;
    fn delete_session_profile(&mut self, id: SessionProfileId) -> Result<bool>;

    // Reports
    fn reports_for_session(&self, session_id: SessionId) -> Result<Vec<Report>>;
    fn put_report(&mut self, report: Report) -> Result<()>;

    // Connected game accounts
    fn get_account(&self, id: AccountId) -> Result<Option<ConnectedAccount>>;
    /// In connection order
    fn accounts_for_profile(&self, profile_id: ProfileId) -> Result<Vec<ConnectedAccount>>;
    fn find_account_by_tag(&self, tag: &str) -> Result<Option<ConnectedAccount>>;
    fn put_account(&mut self, account: ConnectedAccount) -> Result<()>;
    fn delete_account(&mut self, id: AccountId) -> Result<bool>;

    fn stats(&self) -> Result<StoreStats>;
}

/// Transactional boundary over a [`DataAccess`] implementation
pub trait Repository: Send + Sync {
    /// Run `f` against a consistent view of the data
    fn read_scope(&self, f: &mut dyn FnMut(&dyn DataAccess) -> Result<()>) -> Result<()>;

    /// Run `f` with exclusive write access; nothing is kept if `f` fails
    fn write_scope(&self, f: &mut dyn FnMut(&mut dyn DataAccess) -> Result<()>) -> Result<()>;
}

impl<'a> dyn Repository + 'a {
    /// Read scope returning a value
    pub fn read<R>(&self, f: impl FnOnce(&dyn DataAccess) -> Result<R>) -> Result<R> {
        let mut f = Some(f);
        let mut output = None;
        self.read_scope(&mut |data| {
            let f = f
                .take()
                .ok_or_else(|| MeshwellError::internal("read scope entered twice"))?;
            output = Some(f(data)?);
            Ok(())
        })?;
        output.ok_or_else(|| MeshwellError::internal("read scope produced no value").into())
    }

    /// Write scope returning a value
    pub fn transaction<R>(&self, f: impl FnOnce(&mut dyn DataAccess) -> Result<R>) -> Result<R> {
        let mut f = Some(f);
        let mut output = None;
        self.write_scope(&mut |data| {
            let f = f
                .take()
                .ok_or_else(|| MeshwellError::internal("write scope entered twice"))?;
            output = Some(f(data)?);
            Ok(())
        })?;
        output.ok_or_else(|| MeshwellError::internal("write scope produced no value").into())
    }
}

/// Fetch a profile or fail with NotFound
pub fn require_profile(data: &dyn DataAccess, id: ProfileId) -> Result<Profile> {
    data.get_profile(id)?
        .ok_or_else(|| MeshwellError::not_found("Profile", id).into())
}

/// Fetch an active profile; inactive accounts cannot act
pub fn require_active_profile(data: &dyn DataAccess, id: ProfileId) -> Result<Profile> {
    let profile = require_profile(data, id)?;
    if !profile.is_active {
        return Err(MeshwellError::validation("This account is either banned or deactivated").into());
    }
    Ok(profile)
}

pub fn require_session(data: &dyn DataAccess, id: SessionId) -> Result<Session> {
    data.get_session(id)?
        .ok_or_else(|| MeshwellError::not_found("Session", id).into())
}

pub fn require_game(data: &dyn DataAccess, id: GameId) -> Result<Game> {
    data.get_game(id)?
        .ok_or_else(|| MeshwellError::not_found("Game", id).into())
}
