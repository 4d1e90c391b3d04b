use crate::catalog;
use crate::game;
use crate::recommender::Recommender;
use crate::store::{GameStore, MemoryStore, ProductCatalogStore, SessionStore};
use crate::Config;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

/// process-lifetime service object the HTTP handlers share, mirroring the
/// teacher's `Casino` (`src/hosting/casino.rs`): one struct behind
/// `web::Data`, owning the stores and a per-category `Recommender` cache
/// behind a read-write lock so reads (scoring) run concurrently while a
/// `refresh()` is a single-writer operation (spec §5).
pub struct GameService {
    config: Config,
    catalog_store: Arc<dyn ProductCatalogStore>,
    session_store: Arc<dyn SessionStore>,
    game_store: Arc<dyn GameStore>,
    recommenders: RwLock<HashMap<String, Arc<RwLock<Recommender>>>>,
    game_counter: AtomicU64,
}

impl GameService {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            config,
            catalog_store: store.clone(),
            session_store: store.clone(),
            game_store: store,
            recommenders: RwLock::new(HashMap::new()),
            game_counter: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog_store(&self) -> &dyn ProductCatalogStore {
        self.catalog_store.as_ref()
    }

    pub fn session_store(&self) -> &dyn SessionStore {
        self.session_store.as_ref()
    }

    pub fn game_store(&self) -> &dyn GameStore {
        self.game_store.as_ref()
    }

    pub fn next_game_id(&self) -> String {
        let n = self.game_counter.fetch_add(1, Ordering::Relaxed);
        format!("game-{n}")
    }

    /// returns the live recommender for a category, building it from the
    /// catalog on first access and refreshing its PBCF fit against the
    /// latest rating observations on every access (a no-op unless the
    /// observed rating count changed, per spec §4.4's refresh policy).
    pub async fn recommender_for(&self, category: &str) -> crate::Result<Arc<RwLock<Recommender>>> {
        if let Some(existing) = self.recommenders.read().await.get(category).cloned() {
            self.refresh_pbcf(&existing).await?;
            return Ok(existing);
        }

        let mut guard = self.recommenders.write().await;
        if let Some(existing) = guard.get(category).cloned() {
            drop(guard);
            self.refresh_pbcf(&existing).await?;
            return Ok(existing);
        }

        let items = self.catalog_store.items(category).await?;
        if items.is_empty() {
            return Err(crate::Error::model_not_ready(format!(
                "no catalog loaded for category {category}"
            )));
        }
        let recommender = Arc::new(RwLock::new(Recommender::refresh(&items)?));
        guard.insert(category.to_string(), recommender.clone());
        drop(guard);
        self.refresh_pbcf(&recommender).await?;
        Ok(recommender)
    }

    /// forces a feature-space and PBCF rebuild for a category (versioned
    /// swap: readers already holding a clone of the old `Arc` keep seeing
    /// it; new lookups see the new one, per spec §5).
    pub async fn refresh_catalog(&self, category: &str) -> crate::Result<()> {
        let items = self.catalog_store.items(category).await?;
        if items.is_empty() {
            return Err(crate::Error::model_not_ready(format!(
                "no catalog loaded for category {category}"
            )));
        }
        let recommender = Arc::new(RwLock::new(Recommender::refresh(&items)?));
        self.refresh_pbcf(&recommender).await?;
        self.recommenders
            .write()
            .await
            .insert(category.to_string(), recommender);
        Ok(())
    }

    async fn refresh_pbcf(&self, recommender: &Arc<RwLock<Recommender>>) -> crate::Result<()> {
        let ratings = self.session_store.all_rating_observations().await?;
        recommender.write().await.refresh_pbcf(&ratings);
        Ok(())
    }

    pub async fn load_game(&self, game_id: &str) -> crate::Result<game::Game> {
        self.game_store
            .get(game_id)
            .await?
            .ok_or_else(|| crate::Error::not_found(format!("game {game_id}")))
    }

    pub fn default_category(&self) -> &str {
        &self.config.default_category
    }
}

/// resolves the category registered on an item's catalog, falling back to
/// the product default so callers never juggle an `Option` at the edges.
pub fn normalized_category(requested: Option<&str>) -> crate::Result<String> {
    catalog::normalize(requested)
}
