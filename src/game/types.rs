use crate::pcf::PcfState;
use crate::Timestamp;

/// the state machine driving one game (spec §3, §4.6):
/// `onboarding -> ready -> playing -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Onboarding,
    Ready,
    Playing,
    Completed,
}

/// a snapshot of the two diagnostics `Recommender::recommend` returns,
/// stored alongside a round as its pre/post metrics (spec §3 `GameRound`).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct RoundMetrics {
    pub coherence_score: f32,
    pub predicted_prefix_rating: f32,
}

/// one item and the score the AI assigned it, used for `ai_top_k` (spec §4.6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScoredPick {
    pub item_id: String,
    pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub id: String,
    pub player_name: String,
    pub category: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub human_score: i64,
    pub ai_score: i64,
    pub learning_session_id: String,
    pub model_state_snapshot: Option<PcfState>,
    pub onboarding_pool_ids: Vec<String>,
    pub onboarding_selected_ids: Vec<String>,
    pub onboarding_rating: Option<u8>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Game {
    pub fn new(
        id: impl Into<String>,
        player_name: impl Into<String>,
        category: impl Into<String>,
        total_rounds: u32,
        learning_session_id: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            player_name: player_name.into(),
            category: category.into(),
            status: GameStatus::Onboarding,
            current_round: 0,
            total_rounds,
            human_score: 0,
            ai_score: 0,
            learning_session_id: learning_session_id.into(),
            model_state_snapshot: None,
            onboarding_pool_ids: Vec::new(),
            onboarding_selected_ids: Vec::new(),
            onboarding_rating: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameRound {
    pub game_id: String,
    pub round_number: u32,
    pub candidate_ids: Vec<String>,
    pub pre_metrics: RoundMetrics,
    pub human_pick_id: Option<String>,
    pub ai_pick_id: Option<String>,
    pub ai_top_k: Vec<ScoredPick>,
    pub ai_correct: Option<bool>,
    pub ai_exact: Option<bool>,
    pub ai_rank_of_pick: Option<u32>,
    pub human_points: Option<i64>,
    pub ai_points: Option<i64>,
    pub post_metrics: Option<RoundMetrics>,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
}

impl GameRound {
    pub fn new(game_id: String, round_number: u32, candidate_ids: Vec<String>) -> Self {
        Self {
            game_id,
            round_number,
            candidate_ids,
            pre_metrics: RoundMetrics {
                coherence_score: 0.0,
                predicted_prefix_rating: 3.0,
            },
            human_pick_id: None,
            ai_pick_id: None,
            ai_top_k: Vec::new(),
            ai_correct: None,
            ai_exact: None,
            ai_rank_of_pick: None,
            human_points: None,
            ai_points: None,
            post_metrics: None,
            completed: false,
            completed_at: None,
        }
    }
}
