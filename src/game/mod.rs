mod explain;
mod onboarding;
mod orchestrator;
mod round;
mod seed;
mod summary;
mod types;

pub use explain::{explain_round, shared_features, top_dimensions, Explanation};
pub use onboarding::build_onboarding_pool;
pub use orchestrator::{
    current_prefix, now_ms, onboarding_pool, start_game, start_round, submit_onboarding,
    submit_pick, summary as game_summary, OnboardingPool, OnboardingResult, PickResolution,
    RoundStart,
};
pub use round::{build_round_candidates, resolve_pick, PickOutcome};
pub use seed::derive_seed;
pub use summary::{build_summary, GameSummary};
pub use types::{Game, GameRound, GameStatus, RoundMetrics, ScoredPick};
