//! Connecting external game accounts to profiles

use crate::accounts::ranks::{RankLookup, RankQuery};
use crate::error::{MeshwellError, Result};
use crate::metrics::MetricsCollector;
use crate::store::{require_active_profile, require_game, DataAccess, Repository};
use crate::types::{
    AccountId, ConnectedAccount, GameId, Platform, ProfileId, Ranks, RequestContext,
};
use crate::utils::generate_id;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An account a profile wants to connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRequest {
    pub game_id: GameId,
    pub platform: Platform,
    pub game_player_tag: String,
}

/// Tag and per-game uniqueness of a new connection
fn check_unclaimed(
    data: &dyn DataAccess,
    profile_id: ProfileId,
    game_id: GameId,
    tag: &str,
) -> Result<()> {
    if data.find_account_by_tag(tag)?.is_some() {
        return Err(
            MeshwellError::conflict("This account is already connected to another user!").into(),
        );
    }
    if data
        .accounts_for_profile(profile_id)?
        .iter()
        .any(|a| a.game_id == game_id)
    {
        return Err(
            MeshwellError::conflict("This account already has this game connected.").into(),
        );
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    repository: Arc<dyn Repository>,
    ranks: Arc<RankLookup>,
    metrics: Arc<MetricsCollector>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn Repository>,
        ranks: Arc<RankLookup>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            repository,
            ranks,
            metrics,
        }
    }

    /// Connect a game account, resolving its ranks first
    pub async fn connect(
        &self,
        ctx: &RequestContext,
        request: AccountRequest,
    ) -> Result<ConnectedAccount> {
        let timer = self.metrics.start_timer();
        let result = self.connect_inner(ctx, request).await;
        self.metrics
            .record_operation("connect_account", &result, timer.stop());
        self.metrics.record_account_connection(result.is_ok());

        let account = result?;
        info!(
            "Profile {} connected '{}' ({:?}) for game {}",
            ctx.profile_id, account.game_player_tag, account.platform, account.game_id
        );
        Ok(account)
    }

    async fn connect_inner(
        &self,
        ctx: &RequestContext,
        request: AccountRequest,
    ) -> Result<ConnectedAccount> {
        let tag = request.game_player_tag.trim().to_string();
        if tag.is_empty() {
            return Err(MeshwellError::validation("A player tag is required").into());
        }

        let (profile, game) = self.repository.read(|data| {
            let profile = require_active_profile(data, ctx.profile_id)?;
            let game = require_game(data, request.game_id)?;
            check_unclaimed(data, profile.id, game.id, &tag)?;
            Ok((profile, game))
        })?;

        let provider = self.ranks.provider_for(&game.name).ok_or_else(|| {
            MeshwellError::validation(format!("{} isn't a supported game", game.name))
        })?;

        let query = RankQuery {
            tag: tag.clone(),
            platform: request.platform,
            region: profile.pref_server.region(),
        };
        debug!("Looking up ranks for '{}' in {}", query.tag, query.region);

        let ranks: Ranks = match provider.lookup(&query).await {
            Ok(Some(ranks)) => ranks,
            Ok(None) => {
                warn!("No ranks known for '{}' in {}", tag, game.name);
                return Err(MeshwellError::external("Ranks not found for this account.").into());
            }
            Err(error) => {
                warn!("Rank lookup for '{}' failed: {}", tag, error);
                return Err(MeshwellError::external("Ranks not found for this account.").into());
            }
        };

        // The lookup ran outside the lock, so uniqueness is checked again
        self.repository.transaction(|data| {
            require_active_profile(data, ctx.profile_id)?;
            check_unclaimed(data, ctx.profile_id, game.id, &tag)?;

            let account = ConnectedAccount {
                id: generate_id(),
                profile_id: ctx.profile_id,
                game_id: game.id,
                platform: request.platform,
                game_player_tag: tag.clone(),
                cas_rank: ranks.casual.clone(),
                comp_rank: ranks.competitive.clone(),
                connected_at: ctx.now,
            };
            data.put_account(account.clone())?;
            Ok(account)
        })
    }

    /// Remove one of the requesting profile's accounts
    ///
    /// A preferred game pointing at the removed account's game is cleared.
    pub async fn disconnect(&self, ctx: &RequestContext, account_id: AccountId) -> Result<()> {
        self.repository.transaction(|data| {
            let mut profile = require_active_profile(data, ctx.profile_id)?;
            let account = match data.get_account(account_id)? {
                Some(account) if account.profile_id == ctx.profile_id => account,
                _ => return Err(MeshwellError::not_found("Connected account", account_id).into()),
            };

            data.delete_account(account.id)?;
            if profile.pref_game == Some(account.game_id) {
                profile.pref_game = None;
                data.put_profile(profile)?;
            }
            Ok(())
        })?;

        info!("Profile {} disconnected account {}", ctx.profile_id, account_id);
        Ok(())
    }

    /// The requesting profile's accounts in connection order
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<ConnectedAccount>> {
        self.repository
            .read(|data| data.accounts_for_profile(ctx.profile_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::ranks::{RankProvider, StaticRankProvider};
    use crate::error::{error_kind, ErrorKind};
    use crate::store::InMemoryRepository;
    use crate::types::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};

    struct FailingProvider;

    #[async_trait]
    impl RankProvider for FailingProvider {
        async fn lookup(&self, _query: &RankQuery) -> Result<Option<Ranks>> {
            Err(anyhow::anyhow!("rank service unavailable"))
        }
    }

    struct Setup {
        repository: Arc<dyn Repository>,
        service: AccountService,
        siege: Game,
        broken: Game,
    }

    fn setup() -> Setup {
        let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
        let siege = Game {
            id: generate_id(),
            name: "Rainbow Six Siege".to_string(),
            description: String::new(),
        };
        let broken = Game {
            id: generate_id(),
            name: "Broken Game".to_string(),
            description: String::new(),
        };
        let unsupported = Game {
            id: generate_id(),
            name: "Chess".to_string(),
            description: String::new(),
        };
        repository
            .transaction(|data| {
                data.put_game(siege.clone())?;
                data.put_game(broken.clone())?;
                data.put_game(unsupported.clone())
            })
            .unwrap();

        let rank = |tier: &str| Ranks {
            casual: tier.to_string(),
            competitive: tier.to_string(),
        };
        let mut lookup = RankLookup::new();
        lookup.register(
            "Rainbow Six Siege",
            Arc::new(
                StaticRankProvider::new()
                    .with_rank("Ash.Main", rank("Gold"))
                    .with_rank("Thatcher.EMP", rank("Silver")),
            ),
        );
        lookup.register("Broken Game", Arc::new(FailingProvider));

        let service = AccountService::new(
            repository.clone(),
            Arc::new(lookup),
            Arc::new(MetricsCollector::new().unwrap()),
        );
        Setup {
            repository,
            service,
            siege,
            broken,
        }
    }

    fn register(repository: &Arc<dyn Repository>, name: &str) -> RequestContext {
        let profile = Profile {
            id: generate_id(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            pref_server: PrefServer::Saf,
            commends: CommendCounters::default(),
            received_ratings: 0,
            sessions_played: 0,
            commend_priorities: Commend::ALL,
            ignore_matchmaking: false,
            pref_game: None,
            created_at: Utc::now(),
        };
        let id = profile.id;
        repository
            .transaction(|data| data.put_profile(profile.clone()))
            .unwrap();
        RequestContext::new(id)
    }

    fn request(game_id: GameId, tag: &str) -> AccountRequest {
        AccountRequest {
            game_id,
            platform: Platform::Uplay,
            game_player_tag: tag.to_string(),
        }
    }

    #[tokio::test]
    async fn test_connect_stores_ranks() {
        let setup = setup();
        let ctx = register(&setup.repository, "ash");

        let account = setup
            .service
            .connect(&ctx, request(setup.siege.id, "Ash.Main"))
            .await
            .unwrap();
        assert_eq!(account.cas_rank, "Gold");
        assert_eq!(setup.service.list(&ctx).await.unwrap(), vec![account]);
    }

    #[tokio::test]
    async fn test_tag_claimed_by_another_profile_is_conflict() {
        let setup = setup();
        let first = register(&setup.repository, "first");
        let second = register(&setup.repository, "second");

        setup
            .service
            .connect(&first, request(setup.siege.id, "Ash.Main"))
            .await
            .unwrap();
        let err = setup
            .service
            .connect(&second, request(setup.siege.id, "Ash.Main"))
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::Conflict);
        assert!(err.to_string().contains("already connected to another user"));
    }

    #[tokio::test]
    async fn test_one_account_per_game() {
        let setup = setup();
        let ctx = register(&setup.repository, "greedy");

        setup
            .service
            .connect(&ctx, request(setup.siege.id, "Ash.Main"))
            .await
            .unwrap();
        let err = setup
            .service
            .connect(&ctx, request(setup.siege.id, "Thatcher.EMP"))
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_lookup_failures() {
        let setup = setup();
        let ctx = register(&setup.repository, "unlucky");

        let err = setup
            .service
            .connect(&ctx, request(setup.siege.id, "Unknown.Tag"))
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::ExternalService);

        let err = setup
            .service
            .connect(&ctx, request(setup.broken.id, "Ash.Main"))
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::ExternalService);

        let chess = setup
            .repository
            .read(|data| data.find_game_by_name("Chess"))
            .unwrap()
            .unwrap();
        let err = setup
            .service
            .connect(&ctx, request(chess.id, "Ash.Main"))
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::Validation);
        assert!(err.to_string().contains("isn't a supported game"));

        assert!(setup.service.list(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_clears_preferred_game() {
        let setup = setup();
        let ctx = register(&setup.repository, "leaver");
        let account = setup
            .service
            .connect(&ctx, request(setup.siege.id, "Ash.Main"))
            .await
            .unwrap();

        let siege_id = setup.siege.id;
        setup
            .repository
            .transaction(|data| {
                let mut profile = require_active_profile(data, ctx.profile_id)?;
                profile.pref_game = Some(siege_id);
                data.put_profile(profile)
            })
            .unwrap();

        setup.service.disconnect(&ctx, account.id).await.unwrap();
        let profile = setup
            .repository
            .read(|data| require_active_profile(data, ctx.profile_id))
            .unwrap();
        assert_eq!(profile.pref_game, None);

        let err = setup
            .service
            .disconnect(&ctx, account.id)
            .await
            .unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::NotFound);
    }
}
