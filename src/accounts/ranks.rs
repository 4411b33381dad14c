//! Rank lookup for connected game accounts
//!
//! Each supported game has a [`RankProvider`]; [`RankLookup`] maps game names
//! to providers. [`StaticRankProvider`] serves a fixed rank table.

use crate::config::AppConfig;
use crate::error::Result;
use crate::types::{Platform, Ranks, Region};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identity whose ranks are being looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankQuery {
    pub tag: String,
    pub platform: Platform,
    pub region: Region,
}

/// Source of ranks for one game
#[async_trait]
pub trait RankProvider: Send + Sync {
    /// Ranks for the identity, or `None` when the service does not know it
    async fn lookup(&self, query: &RankQuery) -> Result<Option<Ranks>>;
}

/// Rank table held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRankProvider {
    ranks: HashMap<String, Ranks>,
}

impl StaticRankProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank(mut self, tag: impl Into<String>, ranks: Ranks) -> Self {
        self.insert(tag, ranks);
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>, ranks: Ranks) {
        self.ranks.insert(tag.into(), ranks);
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

#[async_trait]
impl RankProvider for StaticRankProvider {
    async fn lookup(&self, query: &RankQuery) -> Result<Option<Ranks>> {
        debug!(
            "Static rank lookup for '{}' on {:?} ({})",
            query.tag, query.platform, query.region
        );
        Ok(self.ranks.get(&query.tag).cloned())
    }
}

/// Registry of rank providers keyed by game name
#[derive(Clone, Default)]
pub struct RankLookup {
    providers: HashMap<String, Arc<dyn RankProvider>>,
}

impl RankLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static providers for every configured game with rank lookup enabled
    pub fn from_config(config: &AppConfig) -> Self {
        let mut lookup = Self::new();
        for game in config.games.iter().filter(|g| g.rank_lookup) {
            let mut provider = StaticRankProvider::new();
            for entry in config.ranks.iter().filter(|r| r.game == game.name) {
                provider.insert(
                    entry.tag.clone(),
                    Ranks {
                        casual: entry.casual.clone(),
                        competitive: entry.competitive.clone(),
                    },
                );
            }
            debug!(
                "Registered static rank provider for {} with {} entries",
                game.name,
                provider.len()
            );
            lookup.register(game.name.clone(), Arc::new(provider));
        }
        lookup
    }

    pub fn register(&mut self, game: impl Into<String>, provider: Arc<dyn RankProvider>) {
        self.providers.insert(game.into(), provider);
    }

    pub fn provider_for(&self, game: &str) -> Option<Arc<dyn RankProvider>> {
        self.providers.get(game).cloned()
    }

    pub fn supported_games(&self) -> Vec<String> {
        let mut games: Vec<String> = self.providers.keys().cloned().collect();
        games.sort();
        games
    }
}
