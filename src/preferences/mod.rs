//! Matchmaking preferences

pub mod resolver;

pub use resolver::{
    effective_game, resolve_pref_game, validate_priorities, MatchmakingPreferences,
    PreferenceResolver,
};
