use super::service::GameService;
use crate::dto::{
    ApiGame, ApiOnboardingPool, ApiOnboardingResult, ApiPbcfDebug, ApiPickResult, ApiProduct,
    ApiRoundStart, ApiSummary, LimitQuery, SubmitOnboarding, SubmitPick, StartGame,
};
use crate::game::{self, GameStatus};
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::Responder;

type Svc = web::Data<GameService>;

/// `POST /api/game/start`.
pub async fn start_game(svc: Svc, body: web::Json<StartGame>) -> crate::Result<impl Responder> {
    let category = super::service::normalized_category(body.category.as_deref())?;
    let recommender = svc.recommender_for(&category).await?;
    let recommender = recommender.read().await;

    let game_id = svc.next_game_id();
    let game = game::start_game(
        svc.catalog_store(),
        svc.game_store(),
        svc.session_store(),
        &recommender,
        game_id,
        body.player_name.clone(),
        Some(&category),
        crate::DEFAULT_TOTAL_ROUNDS,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiGame::from(&game)))
}

/// `GET /api/game/{id}/onboarding`.
pub async fn onboarding(svc: Svc, path: web::Path<String>) -> crate::Result<impl Responder> {
    let game = svc.load_game(&path).await?;
    let pool = game::onboarding_pool(svc.catalog_store(), &game).await?;
    let products: Vec<ApiProduct> = pool.items.iter().map(ApiProduct::from).collect();
    Ok(HttpResponse::Ok().json(ApiOnboardingPool {
        pool_size: pool.pool_ids.len(),
        products,
    }))
}

/// `POST /api/game/{id}/onboarding/submit`.
pub async fn submit_onboarding(
    svc: Svc,
    path: web::Path<String>,
    body: web::Json<SubmitOnboarding>,
) -> crate::Result<impl Responder> {
    let game = svc.load_game(&path).await?;
    let recommender = svc.recommender_for(&game.category).await?;
    let recommender = recommender.read().await;

    let result = game::submit_onboarding(
        svc.session_store(),
        svc.game_store(),
        &recommender,
        game,
        body.selected_product_ids.clone(),
        body.rating,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiOnboardingResult {
        accepted: true,
        coherence_score: result.coherence_score,
        predicted_prefix_rating: result.predicted_prefix_rating,
        next_round: true,
    }))
}

/// `POST /api/game/{id}/round/start`.
pub async fn start_round(svc: Svc, path: web::Path<String>) -> crate::Result<impl Responder> {
    let game = svc.load_game(&path).await?;
    let category = game.category.clone();
    let recommender = svc.recommender_for(&category).await?;
    let recommender = recommender.read().await;

    let start = game::start_round(
        svc.catalog_store(),
        svc.session_store(),
        svc.game_store(),
        &recommender,
        game,
    )
    .await?;

    let mut candidates = Vec::with_capacity(start.candidate_ids.len());
    for id in &start.candidate_ids {
        if let Some(item) = svc.catalog_store().item(&category, id).await.ok().flatten() {
            candidates.push(ApiProduct::from(&item));
        }
    }

    Ok(HttpResponse::Ok().json(ApiRoundStart {
        round_number: start.round_number,
        candidates,
        pre_round_metrics: start.pre_metrics,
    }))
}

/// `POST /api/game/{id}/round/{n}/pick`.
pub async fn submit_pick(
    svc: Svc,
    path: web::Path<(String, u32)>,
    body: web::Json<SubmitPick>,
) -> crate::Result<impl Responder> {
    let (game_id, round_number) = path.into_inner();
    let game = svc.load_game(&game_id).await?;
    let recommender = svc.recommender_for(&game.category).await?;
    let recommender = recommender.read().await;

    let resolution = game::submit_pick(
        svc.session_store(),
        svc.game_store(),
        &recommender,
        game,
        round_number,
        body.product_id.clone(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiPickResult::from_round(
        &resolution.round,
        &resolution.explanation,
    )))
}

/// `GET /api/game/{id}/status`.
pub async fn status(svc: Svc, path: web::Path<String>) -> crate::Result<impl Responder> {
    let game = svc.load_game(&path).await?;
    Ok(HttpResponse::Ok().json(ApiGame::from(&game)))
}

/// `GET /api/game/{id}/summary`.
pub async fn summary(svc: Svc, path: web::Path<String>) -> crate::Result<impl Responder> {
    let game = svc.load_game(&path).await?;
    if game.status != GameStatus::Completed {
        return Err(crate::Error::state("game is not completed"));
    }
    let recommender = svc.recommender_for(&game.category).await?;
    let recommender = recommender.read().await;
    let summary = game::game_summary(svc.session_store(), svc.game_store(), &recommender, &game).await?;
    Ok(HttpResponse::Ok().json(ApiSummary::from(&summary)))
}

/// `GET /api/game/leaderboard`.
pub async fn leaderboard(svc: Svc, query: web::Query<LimitQuery>) -> crate::Result<impl Responder> {
    let limit = query.limit.unwrap_or(10);
    let games = svc.game_store().leaderboard(limit).await?;
    let games: Vec<ApiGame> = games.iter().map(ApiGame::from).collect();
    Ok(HttpResponse::Ok().json(games))
}

/// `GET /api/game/player/{name}/history`.
pub async fn player_history(
    svc: Svc,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> crate::Result<impl Responder> {
    let limit = query.limit.unwrap_or(10);
    let games = svc.game_store().player_history(&path, limit).await?;
    let games: Vec<ApiGame> = games.iter().map(ApiGame::from).collect();
    Ok(HttpResponse::Ok().json(games))
}

/// `GET /api/debug/pbcf`.
pub async fn debug_pbcf(svc: Svc, query: web::Query<CategoryQuery>) -> crate::Result<impl Responder> {
    let category = query
        .category
        .clone()
        .unwrap_or_else(|| svc.default_category().to_string());
    let recommender = svc.recommender_for(&category).await?;
    let recommender = recommender.read().await;
    Ok(HttpResponse::Ok().json(ApiPbcfDebug::from(recommender.pbcf())))
}

#[derive(serde::Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}
