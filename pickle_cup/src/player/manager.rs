//! Player search and statistics.

use std::sync::Arc;
use std::time::Duration;

use super::{
    errors::{PlayerError, PlayerResult},
    models::{Player, PlayerId, PlayerSummary},
};
use crate::db::{DEFAULT_QUERY_TIMEOUT, PlayerRepository, StatsRepository, with_timeout};
use crate::stats::PlayerStats;

/// Upper bound on search results
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Queries shorter than this return nothing without touching the store
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// Player manager
#[derive(Clone)]
pub struct PlayerManager {
    players: Arc<dyn PlayerRepository>,
    stats: Arc<dyn StatsRepository>,
    min_query_len: usize,
    search_limit: usize,
    timeout: Duration,
}

impl PlayerManager {
    /// Create a new player manager
    ///
    /// # Arguments
    ///
    /// * `players` - Player lookups
    /// * `stats` - Stats aggregation procedure
    pub fn new(players: Arc<dyn PlayerRepository>, stats: Arc<dyn StatsRepository>) -> Self {
        Self {
            players,
            stats,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            search_limit: MAX_SEARCH_RESULTS,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Minimum query length, in characters
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    /// Result limit, capped at [`MAX_SEARCH_RESULTS`]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.min(MAX_SEARCH_RESULTS);
        self
    }

    /// Timeout applied to every store call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn min_query_len(&self) -> usize {
        self.min_query_len
    }

    /// Search players by first or last name
    ///
    /// # Errors
    ///
    /// * `PlayerError::EmptyQuery` - Query is blank
    pub async fn search(&self, query: &str) -> PlayerResult<Vec<PlayerSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PlayerError::EmptyQuery);
        }
        if query.chars().count() < self.min_query_len {
            return Ok(Vec::new());
        }

        let found = with_timeout(
            self.timeout,
            self.players.search_players(query, self.search_limit),
        )
        .await?;
        log::debug!("Player search '{}' matched {}", query, found.len());
        Ok(found)
    }

    /// Get a player by ID
    pub async fn get_player(&self, player_id: PlayerId) -> PlayerResult<Player> {
        with_timeout(self.timeout, self.players.find_player(player_id))
            .await?
            .ok_or(PlayerError::NotFound(player_id))
    }

    /// Win/loss record and common teammates of an existing player
    ///
    /// # Errors
    ///
    /// * `PlayerError::NotFound` - No such player
    /// * `PlayerError::Store` - Stats procedure failed or returned malformed data
    pub async fn player_stats(
        &self,
        player_id: PlayerId,
    ) -> PlayerResult<(PlayerSummary, PlayerStats)> {
        let player = self.get_player(player_id).await?;
        let stats = with_timeout(self.timeout, self.stats.player_stats(player_id)).await?;
        Ok((PlayerSummary::from(player), stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreError};
    use uuid::Uuid;

    fn manager(store: &Arc<MemoryStore>) -> PlayerManager {
        PlayerManager::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = manager(&store).search("   ").await.unwrap_err();
        assert!(matches!(err, PlayerError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_short_query_skips_store() {
        let store = Arc::new(MemoryStore::new());
        store.seed_player("A", None, None);
        // Any store call would hit the timeout
        store.set_latency(Duration::from_secs(5));
        let players = manager(&store).with_timeout(Duration::from_millis(10));

        let found = players.search("a").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_search_limit_is_capped() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..15 {
            store.seed_player(&format!("Jordan{i:02}"), None, None);
        }

        let found = manager(&store)
            .with_search_limit(50)
            .search("jordan")
            .await
            .unwrap();
        assert_eq!(found.len(), MAX_SEARCH_RESULTS);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_player() {
        let store = Arc::new(MemoryStore::new());
        let err = manager(&store)
            .player_stats(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_slow_store_surfaces_timeout() {
        let store = Arc::new(MemoryStore::new());
        let player = store.seed_player("Riley", None, None);
        store.set_latency(Duration::from_millis(200));

        let err = manager(&store)
            .with_timeout(Duration::from_millis(10))
            .get_player(player.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::Store(StoreError::Timeout(_))));
    }
}
