use crate::catalog::Item;
use crate::game::{Explanation, Game, GameRound, GameStatus, GameSummary, RoundMetrics};
use crate::pbcf::PbcfEngine;
use crate::recommender::ScoredItem;
use serde::Serialize;

/// wire shape of a catalog product (spec §6 `products`). `title` falls
/// back to the item id when the catalog never populated a display title.
#[derive(Debug, Serialize)]
pub struct ApiProduct {
    pub product_id: String,
    pub category: String,
    pub title: String,
    pub vendor: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl From<&Item> for ApiProduct {
    fn from(item: &Item) -> Self {
        let title = item
            .fields
            .get("title")
            .and_then(|v| v.as_text())
            .map(str::to_string)
            .unwrap_or_else(|| item.id.clone());
        Self {
            product_id: item.id.clone(),
            category: item.category.clone(),
            title,
            vendor: item.vendor.clone(),
            price_min: item.price_min,
            price_max: item.price_max,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiGame {
    pub id: String,
    pub player_name: String,
    pub category: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub human_score: i64,
    pub ai_score: i64,
}

impl From<&Game> for ApiGame {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            player_name: game.player_name.clone(),
            category: game.category.clone(),
            status: game.status,
            current_round: game.current_round,
            total_rounds: game.total_rounds,
            human_score: game.human_score,
            ai_score: game.ai_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiScoredProduct {
    pub product_id: String,
    pub score: f32,
}

impl From<&ScoredItem> for ApiScoredProduct {
    fn from(scored: &ScoredItem) -> Self {
        Self {
            product_id: scored.item_id.clone(),
            score: scored.score,
        }
    }
}

impl From<(&String, &f32)> for ApiScoredProduct {
    fn from((product_id, score): (&String, &f32)) -> Self {
        Self {
            product_id: product_id.clone(),
            score: *score,
        }
    }
}

/// `GET /api/game/{id}/onboarding`.
#[derive(Debug, Serialize)]
pub struct ApiOnboardingPool {
    pub pool_size: usize,
    pub products: Vec<ApiProduct>,
}

/// `POST /api/game/{id}/onboarding/submit`.
#[derive(Debug, Serialize)]
pub struct ApiOnboardingResult {
    pub accepted: bool,
    pub coherence_score: f32,
    pub predicted_prefix_rating: f32,
    pub next_round: bool,
}

/// `POST /api/game/{id}/round/start`.
#[derive(Debug, Serialize)]
pub struct ApiRoundStart {
    pub round_number: u32,
    pub candidates: Vec<ApiProduct>,
    pub pre_round_metrics: RoundMetrics,
}

/// AI explanation, rendered for the wire (spec §4.6).
#[derive(Debug, Serialize)]
pub struct ApiExplanation {
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub shared_features: Vec<String>,
    pub hidden_preferences: Vec<ApiHiddenPreference>,
}

#[derive(Debug, Serialize)]
pub struct ApiHiddenPreference {
    pub feature: String,
    pub latency: f32,
    pub weight: f32,
}

impl From<&Explanation> for ApiExplanation {
    fn from(explanation: &Explanation) -> Self {
        Self {
            likes: explanation.likes.clone(),
            dislikes: explanation.dislikes.clone(),
            shared_features: explanation.shared_features.clone(),
            hidden_preferences: explanation
                .hidden
                .iter()
                .map(|h| ApiHiddenPreference {
                    feature: h.feature.clone(),
                    latency: h.latency,
                    weight: h.weight,
                })
                .collect(),
        }
    }
}

/// `POST /api/game/{id}/round/{n}/pick` (spec §4.6).
#[derive(Debug, Serialize)]
pub struct ApiPickResult {
    pub round_number: u32,
    pub human_pick_id: String,
    pub ai_pick_id: String,
    pub ai_top_k: Vec<ApiScoredProduct>,
    pub ai_correct: bool,
    pub ai_exact: bool,
    pub ai_rank_of_pick: u32,
    pub human_points: i64,
    pub ai_points: i64,
    pub post_metrics: RoundMetrics,
    pub explanation: ApiExplanation,
}

impl ApiPickResult {
    pub fn from_round(round: &GameRound, explanation: &Explanation) -> Self {
        Self {
            round_number: round.round_number,
            human_pick_id: round.human_pick_id.clone().unwrap_or_default(),
            ai_pick_id: round.ai_pick_id.clone().unwrap_or_default(),
            ai_top_k: round
                .ai_top_k
                .iter()
                .map(|s| ApiScoredProduct {
                    product_id: s.item_id.clone(),
                    score: s.score,
                })
                .collect(),
            ai_correct: round.ai_correct.unwrap_or(false),
            ai_exact: round.ai_exact.unwrap_or(false),
            ai_rank_of_pick: round.ai_rank_of_pick.unwrap_or(0),
            human_points: round.human_points.unwrap_or(0),
            ai_points: round.ai_points.unwrap_or(0),
            post_metrics: round.post_metrics.unwrap_or(RoundMetrics {
                coherence_score: 0.0,
                predicted_prefix_rating: 3.0,
            }),
            explanation: explanation.into(),
        }
    }
}

/// `GET /api/game/{id}/summary`.
#[derive(Debug, Serialize)]
pub struct ApiSummary {
    pub rounds_played: u32,
    pub human_score: i64,
    pub ai_score: i64,
    pub top3_accuracy: f32,
    pub exact_accuracy: f32,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub top_recommendations: Vec<ApiScoredProduct>,
    pub hidden_gems: Vec<ApiScoredProduct>,
    pub narrative: String,
}

impl From<&GameSummary> for ApiSummary {
    fn from(summary: &GameSummary) -> Self {
        Self {
            rounds_played: summary.rounds_played,
            human_score: summary.human_score,
            ai_score: summary.ai_score,
            top3_accuracy: summary.top3_accuracy,
            exact_accuracy: summary.exact_accuracy,
            likes: summary.likes.clone(),
            dislikes: summary.dislikes.clone(),
            top_recommendations: summary.top_recommendations.iter().map(Into::into).collect(),
            hidden_gems: summary
                .hidden_gems
                .iter()
                .map(|(id, score)| (id, score).into())
                .collect(),
            narrative: summary.narrative.clone(),
        }
    }
}

/// `GET /api/debug/pbcf`.
#[derive(Debug, Serialize)]
pub struct ApiPbcfDebug {
    pub trained: bool,
    pub prefix_count: usize,
    pub user_count: usize,
    pub ratings_count: usize,
    pub missing_ratio: f32,
    pub latent_dim: usize,
}

impl From<&PbcfEngine> for ApiPbcfDebug {
    fn from(engine: &PbcfEngine) -> Self {
        Self {
            trained: engine.is_trained(),
            prefix_count: engine.prefix_count(),
            user_count: engine.user_count(),
            ratings_count: engine.last_rating_count(),
            missing_ratio: engine.missing_ratio(),
            latent_dim: engine.latent_dim(),
        }
    }
}
