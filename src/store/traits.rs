use crate::catalog::Item;
use crate::game::{Game, GameRound};
use crate::pcf::PcfState;
use crate::session::{PrefixRating, Selection};
use crate::Timestamp;

/// persisted shape of the `sessions` collection (spec §6): PCF state plus
/// its append-only selection and rating logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub state: PcfState,
    pub selections: Vec<Selection>,
    pub prefix_ratings: Vec<PrefixRating>,
    pub created_at: Timestamp,
}

/// catalog storage: `products` (spec §6), keyed by category then item id.
#[async_trait::async_trait]
pub trait ProductCatalogStore: Send + Sync {
    async fn put_items(&self, category: &str, items: Vec<Item>) -> crate::Result<()>;
    async fn items(&self, category: &str) -> crate::Result<Vec<Item>>;
    async fn item(&self, category: &str, item_id: &str) -> crate::Result<Option<Item>>;
    async fn item_count(&self, category: &str) -> crate::Result<usize>;
}

/// learning-session storage: `sessions`, `selections`, `prefix_ratings`
/// (spec §6). A session's state and logs are written together; callers
/// are responsible for the at-most-one-partial-write ordering in §5.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> crate::Result<Option<SessionRecord>>;
    async fn save(&self, record: SessionRecord) -> crate::Result<()>;
    async fn append_selection(&self, session_id: &str, selection: Selection) -> crate::Result<()>;
    async fn append_rating(&self, session_id: &str, rating: PrefixRating) -> crate::Result<()>;
    /// all rating observations across every session, for PBCF training
    /// (spec §4.4). `user_id` is the owning session id.
    async fn all_rating_observations(
        &self,
    ) -> crate::Result<Vec<crate::pbcf::RatingObservation>>;
}

/// game storage: `games`, `game_rounds` (spec §6).
#[async_trait::async_trait]
pub trait GameStore: Send + Sync {
    async fn create(&self, game: Game) -> crate::Result<()>;
    async fn get(&self, game_id: &str) -> crate::Result<Option<Game>>;
    async fn update(&self, game: Game) -> crate::Result<()>;

    async fn put_round(&self, round: GameRound) -> crate::Result<()>;
    async fn round(&self, game_id: &str, round_number: u32) -> crate::Result<Option<GameRound>>;
    async fn rounds(&self, game_id: &str) -> crate::Result<Vec<GameRound>>;

    /// at-most-once completion: succeeds only on the `false -> true`
    /// transition of `round.completed` (spec §5).
    async fn complete_round_once(&self, game_id: &str, round_number: u32) -> crate::Result<bool>;

    async fn leaderboard(&self, limit: usize) -> crate::Result<Vec<Game>>;
    async fn player_history(&self, player_name: &str, limit: usize) -> crate::Result<Vec<Game>>;
}
