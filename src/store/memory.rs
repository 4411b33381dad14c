//! In-memory repository implementation
//!
//! All tables live behind one `RwLock`. Write scopes run against a staged
//! copy of the tables which replaces the live copy only when the closure
//! succeeds.

use crate::error::{MeshwellError, Result};
use crate::store::repository::{DataAccess, Repository, StoreStats};
use crate::types::*;
use std::collections::HashMap;
use std::sync::RwLock;

/// Table contents of the in-memory repository
///
/// Tables where insertion order matters (participation, accounts, reports)
/// are kept as vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    profiles: HashMap<ProfileId, Profile>,
    games: HashMap<GameId, Game>,
    availabilities: HashMap<AvailabilityId, Availability>,
    sessions: Vec<Session>,
    session_profiles: Vec<SessionProfile>,
    reports: Vec<Report>,
    accounts: Vec<ConnectedAccount>,
}

impl DataAccess for MemoryTables {
    fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.profiles.get(&id).cloned())
    }

    fn find_profile_by_username(&self, username: &str) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .values()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    fn put_profile(&mut self, profile: Profile) -> Result<()> {
        self.profiles.insert(profile.id, profile);
        Ok(())
    }

    fn get_game(&self, id: GameId) -> Result<Option<Game>> {
        Ok(self.games.get(&id).cloned())
    }

    fn find_game_by_name(&self, name: &str) -> Result<Option<Game>> {
        Ok(self.games.values().find(|g| g.name == name).cloned())
    }

    fn list_games(&self) -> Result<Vec<Game>> {
        let mut games: Vec<Game> = self.games.values().cloned().collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games)
    }

    fn put_game(&mut self, game: Game) -> Result<()> {
        self.games.insert(game.id, game);
        Ok(())
    }

    fn get_availability(&self, id: AvailabilityId) -> Result<Option<Availability>> {
        Ok(self.availabilities.get(&id).cloned())
    }

    fn availabilities_for_profile(&self, profile_id: ProfileId) -> Result<Vec<Availability>> {
        let mut windows: Vec<Availability> = self
            .availabilities
            .values()
            .filter(|a| a.profile_id == profile_id)
            .cloned()
            .collect();
        windows.sort_by(|a, b| (a.day, a.start_time).cmp(&(b.day, b.start_time)));
        Ok(windows)
    }

    fn put_availability(&mut self, availability: Availability) -> Result<()> {
        self.availabilities.insert(availability.id, availability);
        Ok(())
    }

    fn delete_availability(&mut self, id: AvailabilityId) -> Result<bool> {
        Ok(self.availabilities.remove(&id).is_some())
    }

    fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.iter().find(|s| s.id == id).cloned())
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions = self.sessions.clone();
        // Stable sort keeps creation order among equal starts
        sessions.sort_by_key(|s| s.start);
        Ok(sessions)
    }

    fn put_session(&mut self, session: Session) -> Result<()> {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
        Ok(())
    }

    fn delete_session(&mut self, id: SessionId) -> Result<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        Ok(self.sessions.len() != before)
    }

    fn session_profiles_for_session(&self, session_id: SessionId) -> Result<Vec<SessionProfile>> {
        Ok(self
            .session_profiles
            .iter()
            .filter(|sp| sp.session_id == session_id)
            .cloned()
            .collect())
    }

    fn session_profiles_for_profile(&self, profile_id: ProfileId) -> Result<Vec<SessionProfile>> {
        Ok(self
            .session_profiles
            .iter()
            .filter(|sp| sp.profile_id == profile_id)
            .cloned()
            .collect())
    }

    fn put_session_profile(&mut self, session_profile: SessionProfile) -> Result<()> {
        if let Some(existing) = self
            .session_profiles
            .iter_mut()
            .find(|sp| sp.id == session_profile.id)
        {
            *existing = session_profile;
            return Ok(());
        }

        if self.session_profiles.iter().any(|sp| {
            sp.session_id == session_profile.session_id
                && sp.profile_id == session_profile.profile_id
        }) {
            return Err(MeshwellError::conflict("Profile already participates in this session").into());
        }

        self.session_profiles.push(session_profile);
        Ok(())
    }

    fn delete_session_profile(&mut self, id: SessionProfileId) -> Result<bool> {
        let before = self.session_profiles.len();
        self.session_profiles.retain(|sp| sp.id != id);
        Ok(self.session_profiles.len() != before)
    }

    fn reports_for_session(&self, session_id: SessionId) -> Result<Vec<Report>> {
        Ok(self
            .reports
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    fn put_report(&mut self, report: Report) -> Result<()> {
        self.reports.push(report);
        Ok(())
    }

    fn get_account(&self, id: AccountId) -> Result<Option<ConnectedAccount>> {
        Ok(self.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn accounts_for_profile(&self, profile_id: ProfileId) -> Result<Vec<ConnectedAccount>> {
        Ok(self
            .accounts
            .iter()
            .filter(|a| a.profile_id == profile_id)
            .cloned()
            .collect())
    }

    fn find_account_by_tag(&self, tag: &str) -> Result<Option<ConnectedAccount>> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.game_player_tag == tag)
            .cloned())
    }

    fn put_account(&mut self, account: ConnectedAccount) -> Result<()> {
        match self.accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
        Ok(())
    }

    fn delete_account(&mut self, id: AccountId) -> Result<bool> {
        let before = self.accounts.len();
        self.accounts.retain(|a| a.id != id);
        Ok(self.accounts.len() != before)
    }

    fn stats(&self) -> Result<StoreStats> {
        let open_sessions = self
            .sessions
            .iter()
            .filter(|s| {
                let participants = self
                    .session_profiles
                    .iter()
                    .filter(|sp| sp.session_id == s.id)
                    .count();
                s.state(participants) == SessionState::Open
            })
            .count();

        Ok(StoreStats {
            profiles: self.profiles.len(),
            games: self.games.len(),
            availabilities: self.availabilities.len(),
            sessions: self.sessions.len(),
            open_sessions,
            session_profiles: self.session_profiles.len(),
            reports: self.reports.len(),
            connected_accounts: self.accounts.len(),
        })
    }
}

/// Repository keeping every table in process memory
///
/// Writes run against a full copy of the tables that replaces the live set
/// only when the closure succeeds, so each write costs time proportional to
/// the whole store. Suited to development and tests, not large datasets.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for InMemoryRepository {
    fn read_scope(&self, f: &mut dyn FnMut(&dyn DataAccess) -> Result<()>) -> Result<()> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MeshwellError::internal("Failed to acquire repository read lock"))?;
        f(&*tables)
    }

    fn write_scope(&self, f: &mut dyn FnMut(&mut dyn DataAccess) -> Result<()>) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| MeshwellError::internal("Failed to acquire repository write lock"))?;

        let mut staged = tables.clone();
        f(&mut staged)?;
        *tables = staged;
        Ok(())
    }
}
