use super::traits::{GameStore, ProductCatalogStore, SessionRecord, SessionStore};
use crate::catalog::Item;
use crate::game::{Game, GameRound};
use crate::pbcf::RatingObservation;
use crate::session::{PrefixRating, Selection};
use std::collections::HashMap;
use std::sync::Mutex;

/// in-process, `HashMap`-backed implementation of the three store traits.
/// Used by default and by tests; no document store is part of this core
/// (spec §1, §4.7 -- the real store is an external collaborator).
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, HashMap<String, Item>>>,
    sessions: Mutex<HashMap<String, SessionRecord>>,
    games: Mutex<HashMap<String, Game>>,
    rounds: Mutex<HashMap<(String, u32), GameRound>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProductCatalogStore for MemoryStore {
    async fn put_items(&self, category: &str, items: Vec<Item>) -> crate::Result<()> {
        let mut guard = self.items.lock().unwrap();
        let bucket = guard.entry(category.to_string()).or_default();
        for item in items {
            bucket.insert(item.id.clone(), item);
        }
        Ok(())
    }

    async fn items(&self, category: &str) -> crate::Result<Vec<Item>> {
        let guard = self.items.lock().unwrap();
        Ok(guard
            .get(category)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn item(&self, category: &str, item_id: &str) -> crate::Result<Option<Item>> {
        let guard = self.items.lock().unwrap();
        Ok(guard.get(category).and_then(|bucket| bucket.get(item_id)).cloned())
    }

    async fn item_count(&self, category: &str) -> crate::Result<usize> {
        let guard = self.items.lock().unwrap();
        Ok(guard.get(category).map(|b| b.len()).unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> crate::Result<Option<SessionRecord>> {
        let guard = self.sessions.lock().unwrap();
        Ok(guard.get(session_id).cloned())
    }

    async fn save(&self, record: SessionRecord) -> crate::Result<()> {
        let mut guard = self.sessions.lock().unwrap();
        guard.insert(record.session_id.clone(), record);
        Ok(())
    }

    async fn append_selection(&self, session_id: &str, selection: Selection) -> crate::Result<()> {
        let mut guard = self.sessions.lock().unwrap();
        let record = guard
            .get_mut(session_id)
            .ok_or_else(|| crate::Error::not_found(format!("session {session_id}")))?;
        record.selections.push(selection);
        Ok(())
    }

    async fn append_rating(&self, session_id: &str, rating: PrefixRating) -> crate::Result<()> {
        let mut guard = self.sessions.lock().unwrap();
        let record = guard
            .get_mut(session_id)
            .ok_or_else(|| crate::Error::not_found(format!("session {session_id}")))?;
        record.prefix_ratings.push(rating);
        Ok(())
    }

    async fn all_rating_observations(&self) -> crate::Result<Vec<RatingObservation>> {
        let guard = self.sessions.lock().unwrap();
        let mut observations = Vec::new();
        for record in guard.values() {
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
impl GameStore for MemoryStore {
    async fn create(&self, game: Game) -> crate::Result<()> {
        let mut guard = self.games.lock().unwrap();
        guard.insert(game.id.clone(), game);
        Ok(())
    }

    async fn get(&self, game_id: &str) -> crate::Result<Option<Game>> {
        let guard = self.games.lock().unwrap();
        Ok(guard.get(game_id).cloned())
    }

    async fn update(&self, game: Game) -> crate::Result<()> {
        let mut guard = self.games.lock().unwrap();
        guard.insert(game.id.clone(), game);
        Ok(())
    }

    async fn put_round(&self, round: GameRound) -> crate::Result<()> {
        let mut guard = self.rounds.lock().unwrap();
        guard.insert((round.game_id.clone(), round.round_number), round);
        Ok(())
    }

    async fn round(&self, game_id: &str, round_number: u32) -> crate::Result<Option<GameRound>> {
        let guard = self.rounds.lock().unwrap();
        Ok(guard.get(&(game_id.to_string(), round_number)).cloned())
    }

    async fn rounds(&self, game_id: &str) -> crate::Result<Vec<GameRound>> {
        let guard = self.rounds.lock().unwrap();
        let mut out: Vec<GameRound> = guard
            .values()
            .filter(|r| r.game_id == game_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.round_number);
        Ok(out)
    }

    async fn complete_round_once(&self, game_id: &str, round_number: u32) -> crate::Result<bool> {
        let mut guard = self.rounds.lock().unwrap();
        match guard.get_mut(&(game_id.to_string(), round_number)) {
            Some(round) if !round.completed => {
                round.completed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn leaderboard(&self, limit: usize) -> crate::Result<Vec<Game>> {
        let guard = self.games.lock().unwrap();
        let mut games: Vec<Game> = guard.values().cloned().collect();
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
        let guard = self.games.lock().unwrap();
        let mut games: Vec<Game> = guard
            .values()
            .filter(|g| g.player_name == player_name)
            .cloned()
            .collect();
        games.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        games.truncate(limit);
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;

    #[tokio::test]
    async fn round_completes_at_most_once() {
        let store = MemoryStore::new();
        store
            .put_round(GameRound::new("g1".into(), 1, vec!["a".into()]))
            .await
            .unwrap();
        assert!(store.complete_round_once("g1", 1).await.unwrap());
        assert!(!store.complete_round_once("g1", 1).await.unwrap());
    }

    #[tokio::test]
    async fn catalog_roundtrips_by_category() {
        let store = MemoryStore::new();
        let item = Item::new("p1", "fountain_pens");
        store.put_items("fountain_pens", vec![item.clone()]).await.unwrap();
        assert_eq!(store.item_count("fountain_pens").await.unwrap(), 1);
        assert_eq!(store.item("fountain_pens", "p1").await.unwrap(), Some(item));
    }
}
