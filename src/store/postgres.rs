use super::traits::{GameStore, ProductCatalogStore, SessionRecord, SessionStore};
use crate::catalog::Item;
use crate::game::{Game, GameRound};
use crate::pbcf::RatingObservation;
use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::NoTls;

/// `tokio_postgres`-backed store (feature `postgres`), grounded in the
/// teacher's `save::postgres::connect::db()` connect-then-migrate shape
/// (spec §4.7). JSONB columns stand in for the document store's flexible
/// per-category schema rather than a fixed relational column set --
/// `products`/`sessions`/`games`/`game_rounds` each keep one JSONB payload
/// column alongside the keys the unique indices in spec §6 need.
pub struct PostgresStore {
    client: Arc<Client>,
}

impl PostgresStore {
    /// connects, runs migrations, and returns a ready store. Mirrors the
    /// teacher's `db()`: `DB_URL`-style connect, then one `batch_execute`
    /// per table's `CREATE TABLE IF NOT EXISTS`.
    pub async fn connect(database_url: &str) -> crate::Result<Self> {
        log::info!("connecting to database");
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| crate::Error::transient(format!("database connection failed: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::warn!("postgres connection closed: {e}");
            }
        });
        client
            .batch_execute(SCHEMA)
            .await
            .map_err(|e| crate::Error::transient(format!("schema migration failed: {e}")))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    category TEXT NOT NULL,
    item_id  TEXT NOT NULL,
    payload  JSONB NOT NULL,
    PRIMARY KEY (category, item_id)
);
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    payload    JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS games (
    id      TEXT PRIMARY KEY,
    payload JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS game_rounds (
    game_id      TEXT NOT NULL,
    round_number INTEGER NOT NULL,
    payload      JSONB NOT NULL,
    PRIMARY KEY (game_id, round_number)
);
";

fn transient(e: tokio_postgres::Error) -> crate::Error {
    crate::Error::transient(e.to_string())
}

#[async_trait::async_trait]
impl ProductCatalogStore for PostgresStore {
    async fn put_items(&self, category: &str, items: Vec<Item>) -> crate::Result<()> {
        for item in items {
            let payload =
                serde_json::to_value(&item).map_err(|e| crate::Error::validation(e.to_string()))?;
            self.client
                .execute(
                    "INSERT INTO products (category, item_id, payload) VALUES ($1, $2, $3)
                     ON CONFLICT (category, item_id) DO UPDATE SET payload = EXCLUDED.payload",
                    &[&category, &item.id, &payload],
                )
                .await
                .map_err(transient)?;
        }
        Ok(())
    }

    async fn items(&self, category: &str) -> crate::Result<Vec<Item>> {
        let rows = self
            .client
            .query(
                "SELECT payload FROM products WHERE category = $1",
                &[&category],
            )
            .await
            .map_err(transient)?;
        rows.iter()
            .map(|row| {
                let payload: serde_json::Value = row.get("payload");
                serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
            })
            .collect()
    }

    async fn item(&self, category: &str, item_id: &str) -> crate::Result<Option<Item>> {
        let row = self
            .client
            .query_opt(
                "SELECT payload FROM products WHERE category = $1 AND item_id = $2",
                &[&category, &item_id],
            )
            .await
            .map_err(transient)?;
        row.map(|row| {
            let payload: serde_json::Value = row.get("payload");
            serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
        })
        .transpose()
    }

    async fn item_count(&self, category: &str) -> crate::Result<usize> {
        let row = self
            .client
            .query_one(
                "SELECT COUNT(*) FROM products WHERE category = $1",
                &[&category],
            )
            .await
            .map_err(transient)?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }
}

#[async_trait::async_trait]
impl SessionStore for PostgresStore {
    async fn load(&self, session_id: &str) -> crate::Result<Option<SessionRecord>> {
        let row = self
            .client
            .query_opt(
                "SELECT payload FROM sessions WHERE session_id = $1",
                &[&session_id],
            )
            .await
            .map_err(transient)?;
        row.map(|row| {
            let payload: serde_json::Value = row.get("payload");
            serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
        })
        .transpose()
    }

    async fn save(&self, record: SessionRecord) -> crate::Result<()> {
        let payload =
            serde_json::to_value(&record).map_err(|e| crate::Error::validation(e.to_string()))?;
        self.client
            .execute(
                "INSERT INTO sessions (session_id, payload) VALUES ($1, $2)
                 ON CONFLICT (session_id) DO UPDATE SET payload = EXCLUDED.payload",
                &[&record.session_id, &payload],
            )
            .await
            .map_err(transient)?;
        Ok(())
    }

    async fn append_selection(
        &self,
        session_id: &str,
        selection: crate::session::Selection,
    ) -> crate::Result<()> {
        let mut record = self
            .load(session_id)
            .await?
            .ok_or_else(|| crate::Error::not_found(format!("session {session_id}")))?;
        record.selections.push(selection);
        self.save(record).await
    }

    async fn append_rating(
        &self,
        session_id: &str,
        rating: crate::session::PrefixRating,
    ) -> crate::Result<()> {
        let mut record = self
            .load(session_id)
            .await?
            .ok_or_else(|| crate::Error::not_found(format!("session {session_id}")))?;
        record.prefix_ratings.push(rating);
        self.save(record).await
    }

    async fn all_rating_observations(&self) -> crate::Result<Vec<RatingObservation>> {
        let rows = self
            .client
            .query("SELECT payload FROM sessions", &[])
            .await
            .map_err(transient)?;
        let mut observations = Vec::new();
        for row in rows {
            let payload: serde_json::Value = row.get("payload");
            let record: SessionRecord =
                serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))?;
            for rating in &record.prefix_ratings {
                let prefix = crate::session::prefix_key(&record.selections, rating.timestamp);
                if prefix.is_empty() {
                    continue;
                }
                observations.push(RatingObservation {
                    prefix_key: prefix,
                    user_id: record.session_id.clone(),
                    rating: rating.rating as f32,
                    timestamp: rating.timestamp,
                });
            }
        }
        Ok(observations)
    }
}

#[async_trait::async_trait]
impl GameStore for PostgresStore {
    async fn create(&self, game: Game) -> crate::Result<()> {
        self.update(game).await
    }

    async fn get(&self, game_id: &str) -> crate::Result<Option<Game>> {
        let row = self
            .client
            .query_opt("SELECT payload FROM games WHERE id = $1", &[&game_id])
            .await
            .map_err(transient)?;
        row.map(|row| {
            let payload: serde_json::Value = row.get("payload");
            serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
        })
        .transpose()
    }

    async fn update(&self, game: Game) -> crate::Result<()> {
        let payload =
            serde_json::to_value(&game).map_err(|e| crate::Error::validation(e.to_string()))?;
        self.client
            .execute(
                "INSERT INTO games (id, payload) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE SET payload = EXCLUDED.payload",
                &[&game.id, &payload],
            )
            .await
            .map_err(transient)?;
        Ok(())
    }

    async fn put_round(&self, round: GameRound) -> crate::Result<()> {
        let payload =
            serde_json::to_value(&round).map_err(|e| crate::Error::validation(e.to_string()))?;
        let round_number = round.round_number as i32;
        self.client
            .execute(
                "INSERT INTO game_rounds (game_id, round_number, payload) VALUES ($1, $2, $3)
                 ON CONFLICT (game_id, round_number) DO UPDATE SET payload = EXCLUDED.payload",
                &[&round.game_id, &round_number, &payload],
            )
            .await
            .map_err(transient)?;
        Ok(())
    }

    async fn round(&self, game_id: &str, round_number: u32) -> crate::Result<Option<GameRound>> {
        let round_number = round_number as i32;
        let row = self
            .client
            .query_opt(
                "SELECT payload FROM game_rounds WHERE game_id = $1 AND round_number = $2",
                &[&game_id, &round_number],
            )
            .await
            .map_err(transient)?;
        row.map(|row| {
            let payload: serde_json::Value = row.get("payload");
            serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
        })
        .transpose()
    }

    async fn rounds(&self, game_id: &str) -> crate::Result<Vec<GameRound>> {
        let rows = self
            .client
            .query(
                "SELECT payload FROM game_rounds WHERE game_id = $1 ORDER BY round_number",
                &[&game_id],
            )
            .await
            .map_err(transient)?;
        rows.iter()
            .map(|row| {
                let payload: serde_json::Value = row.get("payload");
                serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
            })
            .collect()
    }

    /// at-most-once completion via a conditional `UPDATE`: the `payload->
    /// 'completed' = false` guard means only the first racing writer's
    /// statement matches a row (spec §5).
    async fn complete_round_once(&self, game_id: &str, round_number: u32) -> crate::Result<bool> {
        let round_number = round_number as i32;
        let rows = self
            .client
            .execute(
                "UPDATE game_rounds
                 SET payload = jsonb_set(payload, '{completed}', 'true')
                 WHERE game_id = $1 AND round_number = $2
                   AND (payload->>'completed')::bool = false",
                &[&game_id, &round_number],
            )
            .await
            .map_err(transient)?;
        Ok(rows == 1)
    }

    async fn leaderboard(&self, limit: usize) -> crate::Result<Vec<Game>> {
        let rows = self
            .client
            .query("SELECT payload FROM games", &[])
            .await
            .map_err(transient)?;
        let mut games: Vec<Game> = rows
            .iter()
            .map(|row| {
                let payload: serde_json::Value = row.get("payload");
                serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
            })
            .collect::<crate::Result<_>>()?;
        games.sort_by(|a, b| {
            b.ai_score
                .cmp(&a.ai_score)
                .then_with(|| b.human_score.cmp(&a.human_score))
                .then_with(|| a.id.cmp(&b.id))
        });
        games.truncate(limit);
        Ok(games)
    }

    async fn player_history(&self, player_name: &str, limit: usize) -> crate::Result<Vec<Game>> {
        let rows = self
            .client
            .query(
                "SELECT payload FROM games WHERE payload->>'player_name' = $1",
                &[&player_name],
            )
            .await
            .map_err(transient)?;
        let mut games: Vec<Game> = rows
            .iter()
            .map(|row| {
                let payload: serde_json::Value = row.get("payload");
                serde_json::from_value(payload).map_err(|e| crate::Error::schema(e.to_string()))
            })
            .collect::<crate::Result<_>>()?;
        games.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        games.truncate(limit);
        Ok(games)
    }
}
