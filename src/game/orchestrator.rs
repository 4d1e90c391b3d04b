use super::explain::{explain_round, Explanation};
use super::onboarding;
use super::round;
use super::seed::derive_seed;
use super::summary::{build_summary, GameSummary};
use super::types::{Game, GameRound, GameStatus, RoundMetrics, ScoredPick};
use crate::catalog::{self, Item};
use crate::pcf::PcfState;
use crate::recommender::Recommender;
use crate::session::{self, Selection};
use crate::store::{GameStore, ProductCatalogStore, SessionRecord, SessionStore};
use crate::Timestamp;

/// guards every PCF state access against a feature-space rebuild that
/// changed its width (spec §5, §9 Open Question 3): a mismatch is surfaced
/// as `Error::ModelNotReady` rather than silently truncated or padded.
fn check_state_width(state: &PcfState, recommender: &Recommender) -> crate::Result<()> {
    let width = recommender.feature_space().width();
    if state.matches_width(width) {
        Ok(())
    } else {
        Err(crate::Error::model_not_ready(format!(
            "session state has width {} but the feature space now has width {width}; \
             re-onboard to rebuild it",
            state.user_vec.len()
        )))
    }
}

/// milliseconds since the epoch, in the teacher's own idiom
/// (`SystemTime::now().duration_since(UNIX_EPOCH)`, see `src/lib.rs`).
pub fn now_ms() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moved backwards")
        .as_millis() as Timestamp
}

/// the onboarding pool plus the items it refers to, for rendering.
pub struct OnboardingPool {
    pub pool_ids: Vec<String>,
    pub items: Vec<Item>,
}

/// the result of submitting onboarding picks (spec §4.6).
pub struct OnboardingResult {
    pub coherence_score: f32,
    pub predicted_prefix_rating: f32,
}

/// the result of starting a round.
pub struct RoundStart {
    pub round_number: u32,
    pub candidate_ids: Vec<String>,
    pub pre_metrics: RoundMetrics,
}

/// the full result of resolving a pick, bundling the round record with its
/// explanation (spec §4.6).
pub struct PickResolution {
    pub round: GameRound,
    pub explanation: Explanation,
}

/// `start_game`: creates the game document and its onboarding pool
/// (spec §4.6 state machine, entry state).
pub async fn start_game(
    catalog_store: &dyn ProductCatalogStore,
    game_store: &dyn GameStore,
    session_store: &dyn SessionStore,
    recommender: &Recommender,
    game_id: String,
    player_name: String,
    category: Option<&str>,
    total_rounds: u32,
) -> crate::Result<Game> {
    let category = catalog::normalize(category)?;
    let items = catalog_store.items(&category).await?;
    if items.is_empty() {
        return Err(crate::Error::state(format!(
            "catalog for category {category} is empty"
        )));
    }

    let pool_ids = onboarding::build_onboarding_pool(&items, &game_id);
    let now = now_ms();
    let session_id = format!("{game_id}:session");

    let mut game = Game::new(&game_id, player_name, &category, total_rounds, &session_id, now);
    game.onboarding_pool_ids = pool_ids;

    session_store
        .save(SessionRecord {
            session_id: session_id.clone(),
            state: recommender.init_state(),
            selections: Vec::new(),
            prefix_ratings: Vec::new(),
            created_at: now,
        })
        .await?;
    game_store.create(game.clone()).await?;
    Ok(game)
}

pub async fn onboarding_pool(
    catalog_store: &dyn ProductCatalogStore,
    game: &Game,
) -> crate::Result<OnboardingPool> {
    let mut items = Vec::with_capacity(game.onboarding_pool_ids.len());
    for id in &game.onboarding_pool_ids {
        if let Some(item) = catalog_store.item(&game.category, id).await? {
            items.push(item);
        }
    }
    Ok(OnboardingPool {
        pool_ids: game.onboarding_pool_ids.clone(),
        items,
    })
}

/// `onboarding -> ready` (spec §4.6).
pub async fn submit_onboarding(
    session_store: &dyn SessionStore,
    game_store: &dyn GameStore,
    recommender: &Recommender,
    mut game: Game,
    selected_ids: Vec<String>,
    rating: u8,
) -> crate::Result<OnboardingResult> {
    if game.status != GameStatus::Onboarding {
        return Err(crate::Error::state("game is not in onboarding"));
    }
    let mut record = session_store
        .load(&game.learning_session_id)
        .await?
        .ok_or_else(|| crate::Error::not_found("learning session"))?;
    check_state_width(&record.state, recommender)?;

    let (selections, prefix_rating) = onboarding::submit_onboarding(
        recommender,
        &mut record.state,
        &game.learning_session_id,
        &game.onboarding_pool_ids,
        &selected_ids,
        rating,
        now_ms(),
    )?;

    record.selections.extend(selections);
    record.prefix_ratings.push(prefix_rating);

    let coherence_score = recommender.coherence_score(&selected_ids);
    let predicted_prefix_rating = recommender.predict_prefix_rating(&record.state);

    session_store.save(record).await?;

    game.onboarding_selected_ids = selected_ids;
    game.onboarding_rating = Some(rating);
    game.status = GameStatus::Ready;
    game.updated_at = now_ms();
    game_store.update(game).await?;

    Ok(OnboardingResult {
        coherence_score,
        predicted_prefix_rating,
    })
}

/// `ready -> playing` / `playing -> playing` (spec §4.6).
pub async fn start_round(
    catalog_store: &dyn ProductCatalogStore,
    session_store: &dyn SessionStore,
    game_store: &dyn GameStore,
    recommender: &Recommender,
    mut game: Game,
) -> crate::Result<RoundStart> {
    if !matches!(game.status, GameStatus::Ready | GameStatus::Playing) {
        return Err(crate::Error::state("game is not ready for a round"));
    }
    if game.current_round >= game.total_rounds {
        return Err(crate::Error::state("all rounds already completed"));
    }

    let record = session_store
        .load(&game.learning_session_id)
        .await?
        .ok_or_else(|| crate::Error::not_found("learning session"))?;
    check_state_width(&record.state, recommender)?;

    let round_number = game.current_round + 1;
    let used: std::collections::HashSet<String> =
        record.selections.iter().map(|s| s.item_id.clone()).collect();
    let ranked = recommender.rank_unused(&record.state, &used);

    let vendor_seed = derive_seed(&game.id, round_number, "round_candidates");
    let catalog_items = catalog_store.items(&game.category).await?;
    let vendor_of: std::collections::HashMap<String, Option<String>> = catalog_items
        .into_iter()
        .map(|item| (item.id, item.vendor))
        .collect();
    let candidate_ids = round::build_round_candidates(&ranked, &vendor_of, vendor_seed);

    let pre_metrics = RoundMetrics {
        coherence_score: recommender.coherence_score(
            &record.selections.iter().map(|s| s.item_id.clone()).collect::<Vec<_>>(),
        ),
        predicted_prefix_rating: recommender.predict_prefix_rating(&record.state),
    };

    game_store
        .put_round(GameRound {
            pre_metrics,
            ..GameRound::new(game.id.clone(), round_number, candidate_ids.clone())
        })
        .await?;

    game.status = GameStatus::Playing;
    game.current_round = round_number;
    game.updated_at = now_ms();
    game_store.update(game).await?;

    Ok(RoundStart {
        round_number,
        candidate_ids,
        pre_metrics,
    })
}

/// `submit_pick` (spec §4.6): resolves the pick, absorbs it into PCF
/// *after* scoring, and persists everything.
#[allow(clippy::too_many_arguments)]
pub async fn submit_pick(
    session_store: &dyn SessionStore,
    game_store: &dyn GameStore,
    recommender: &Recommender,
    mut game: Game,
    round_number: u32,
    human_pick_id: String,
) -> crate::Result<PickResolution> {
    if game.status != GameStatus::Playing || game.current_round != round_number {
        return Err(crate::Error::state("round is not open"));
    }
    let mut round = game_store
        .round(&game.id, round_number)
        .await?
        .ok_or_else(|| crate::Error::not_found("round"))?;
    if round.completed {
        return Err(crate::Error::state("round already completed"));
    }
    // at-most-once gate (spec §5): claim the `false -> true` transition before
    // doing any work, so a concurrent second caller is rejected here rather
    // than racing the PCF-state update below.
    if !game_store.complete_round_once(&game.id, round_number).await? {
        return Err(crate::Error::state("round already completed"));
    }
    round.completed = true;

    let mut record = session_store
        .load(&game.learning_session_id)
        .await?
        .ok_or_else(|| crate::Error::not_found("learning session"))?;
    check_state_width(&record.state, recommender)?;

    let outcome = round::resolve_pick(recommender, &record.state, &round.candidate_ids, &human_pick_id)?;

    let profile = catalog::profile(&game.category)?;
    let selected_ids: Vec<String> = record.selections.iter().map(|s| s.item_id.clone()).collect();
    let explanation = explain_round(
        recommender,
        &profile,
        &record.state,
        &selected_ids,
        &human_pick_id,
        &outcome.ai_pick_id,
    );

    let timestamp = now_ms();
    recommender.update_with_selection(&mut record.state, &human_pick_id, false);
    record.selections.push(Selection {
        session_id: game.learning_session_id.clone(),
        item_id: human_pick_id.clone(),
        is_exception: false,
        timestamp,
    });

    let post_metrics = RoundMetrics {
        coherence_score: recommender.coherence_score(
            &record.selections.iter().map(|s| s.item_id.clone()).collect::<Vec<_>>(),
        ),
        predicted_prefix_rating: recommender.predict_prefix_rating(&record.state),
    };

    session_store.save(record).await?;

    round.human_pick_id = Some(human_pick_id);
    round.ai_pick_id = Some(outcome.ai_pick_id);
    round.ai_top_k = outcome
        .ai_top_k
        .into_iter()
        .map(|s| ScoredPick {
            item_id: s.item_id,
            score: s.score,
        })
        .collect();
    round.ai_correct = Some(outcome.ai_correct);
    round.ai_exact = Some(outcome.ai_exact);
    round.ai_rank_of_pick = Some(outcome.ai_rank_of_pick);
    round.human_points = Some(outcome.human_points);
    round.ai_points = Some(outcome.ai_points);
    round.post_metrics = Some(post_metrics);
    round.completed_at = Some(timestamp);
    game_store.put_round(round.clone()).await?;

    game.human_score += outcome.human_points;
    game.ai_score += outcome.ai_points;
    game.updated_at = timestamp;
    if game.current_round >= game.total_rounds {
        game.status = GameStatus::Completed;
    } else {
        game.status = GameStatus::Ready;
    }
    game_store.update(game).await?;

    Ok(PickResolution { round, explanation })
}

pub async fn summary(
    session_store: &dyn SessionStore,
    game_store: &dyn GameStore,
    recommender: &Recommender,
    game: &Game,
) -> crate::Result<GameSummary> {
    let record = session_store
        .load(&game.learning_session_id)
        .await?
        .ok_or_else(|| crate::Error::not_found("learning session"))?;
    check_state_width(&record.state, recommender)?;
    let rounds = game_store.rounds(&game.id).await?;
    let profile = catalog::profile(&game.category)?;
    let selected_ids: Vec<String> = record.selections.iter().map(|s| s.item_id.clone()).collect();

    Ok(build_summary(
        recommender,
        &profile,
        &record.state,
        &selected_ids,
        &rounds,
        game.human_score,
        game.ai_score,
    ))
}

/// resolves the current prefix key for a session at the current time, used
/// by the recommender's PBCF substitution (spec §4.4, §4.5).
pub fn current_prefix(selections: &[Selection]) -> String {
    session::prefix_key(selections, now_ms())
}
