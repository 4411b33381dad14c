//! Common types used throughout the matchmaking service

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for profiles
pub type ProfileId = Uuid;

/// Unique identifier for games
pub type GameId = Uuid;

/// Unique identifier for availability windows
pub type AvailabilityId = Uuid;

/// Unique identifier for sessions
pub type SessionId = Uuid;

/// Unique identifier for a profile's participation in a session
pub type SessionProfileId = Uuid;

/// Unique identifier for reports
pub type ReportId = Uuid;

/// Unique identifier for connected game accounts
pub type AccountId = Uuid;

/// Day of the week an availability window recurs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Days since Monday (0..=6)
    pub fn index(&self) -> u32 {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
            Day::Sunday => 6,
        }
    }
}

impl From<chrono::Weekday> for Day {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Day::Monday,
            chrono::Weekday::Tue => Day::Tuesday,
            chrono::Weekday::Wed => Day::Wednesday,
            chrono::Weekday::Thu => Day::Thursday,
            chrono::Weekday::Fri => Day::Friday,
            chrono::Weekday::Sat => Day::Saturday,
            chrono::Weekday::Sun => Day::Sunday,
        }
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// Positive tag one participant gives another after a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commend {
    Teamwork,
    Sportsmanship,
    Skill,
    Communication,
}

impl Commend {
    pub const ALL: [Commend; 4] = [
        Commend::Teamwork,
        Commend::Sportsmanship,
        Commend::Skill,
        Commend::Communication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Commend::Teamwork => "teamwork",
            Commend::Sportsmanship => "sportsmanship",
            Commend::Skill => "skill",
            Commend::Communication => "communication",
        }
    }
}

impl std::fmt::Display for Commend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferred game server a profile plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefServer {
    /// Oceania
    Oce,
    /// Asia
    As,
    /// Middle East
    Me,
    /// South Africa
    Saf,
    /// US West
    Usw,
    /// US East
    Use,
    /// Europe
    Eu,
}

impl PrefServer {
    /// Ranking region a server belongs to
    pub fn region(&self) -> Region {
        match self {
            PrefServer::Oce | PrefServer::As | PrefServer::Me => Region::Apac,
            PrefServer::Usw | PrefServer::Use => Region::Ncsa,
            PrefServer::Eu | PrefServer::Saf => Region::Emea,
        }
    }
}

/// Region used by external rank services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Apac,
    Ncsa,
    Emea,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Apac => write!(f, "apac"),
            Region::Ncsa => write!(f, "ncsa"),
            Region::Emea => write!(f, "emea"),
        }
    }
}

/// Platform a game account lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Uplay,
    Psn,
    Xbl,
}

/// Reason attached to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Toxic,
}

/// Aggregate commendation counters of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommendCounters {
    pub teamwork: u64,
    pub sportsmanship: u64,
    pub skill: u64,
    pub communication: u64,
}

impl CommendCounters {
    pub fn get(&self, commend: Commend) -> u64 {
        match commend {
            Commend::Teamwork => self.teamwork,
            Commend::Sportsmanship => self.sportsmanship,
            Commend::Skill => self.skill,
            Commend::Communication => self.communication,
        }
    }

    pub fn increment(&mut self, commend: Commend) {
        match commend {
            Commend::Teamwork => self.teamwork += 1,
            Commend::Sportsmanship => self.sportsmanship += 1,
            Commend::Skill => self.skill += 1,
            Commend::Communication => self.communication += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.teamwork + self.sportsmanship + self.skill + self.communication
    }
}

/// Application-level user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Cleared on deactivation; profiles are never deleted
    pub is_active: bool,
    pub birth_date: NaiveDate,
    pub pref_server: PrefServer,
    pub commends: CommendCounters,
    pub received_ratings: u64,
    pub sessions_played: u64,
    /// Pairwise distinct, highest priority first
    pub commend_priorities: [Commend; 4],
    pub ignore_matchmaking: bool,
    pub pref_game: Option<GameId>,
    pub created_at: DateTime<Utc>,
}

/// A game sessions can be played in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub description: String,
}

/// A recurring weekly window a profile is willing to play in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub id: AvailabilityId,
    pub profile_id: ProfileId,
    pub day: Day,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub competitive: bool,
}

/// A scheduled multiplayer play period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub game_id: GameId,
    pub start: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub competitive: bool,
    pub capacity: usize,
    pub created_at: DateTime<Utc>,
    /// Set when the first rating is submitted
    pub completed_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a session, derived from its data and participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Full,
    Completed,
}

impl Session {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn state(&self, participant_count: usize) -> SessionState {
        if self.is_completed() {
            SessionState::Completed
        } else if participant_count >= self.capacity {
            SessionState::Full
        } else {
            SessionState::Open
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }
}

/// A profile's participation in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub id: SessionProfileId,
    pub session_id: SessionId,
    pub profile_id: ProfileId,
    /// Post-session rating given by this profile (0-5)
    pub rating: Option<u8>,
    pub joined_at: DateTime<Utc>,
}

/// Misconduct flag raised against a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub session_id: SessionId,
    pub user_reported: ProfileId,
    pub sent_by: ProfileId,
    pub reason: ReportReason,
    pub created_at: DateTime<Utc>,
}

/// Ranks resolved for an external game identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranks {
    pub casual: String,
    pub competitive: String,
}

/// External game identity linked to a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: AccountId,
    pub profile_id: ProfileId,
    pub game_id: GameId,
    pub platform: Platform,
    pub game_player_tag: String,
    pub cas_rank: String,
    pub comp_rank: String,
    pub connected_at: DateTime<Utc>,
}

/// Identity and time of the request an operation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub profile_id: ProfileId,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            now: Utc::now(),
        }
    }

    /// Pin the request time (tests, replays)
    pub fn at(profile_id: ProfileId, now: DateTime<Utc>) -> Self {
        Self { profile_id, now }
    }
}
