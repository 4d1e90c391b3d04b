//! end-to-end exercise of the game state machine over `MemoryStore`:
//! onboarding, every round, and the closing summary (spec §4.6).

use prefcraft::catalog::{Item, ItemValue};
use prefcraft::game::{
    game_summary, onboarding_pool, start_game, start_round, submit_onboarding, submit_pick,
    GameStatus,
};
use prefcraft::recommender::Recommender;
use prefcraft::store::{GameStore, MemoryStore, ProductCatalogStore, SessionStore};
use prefcraft::{ONBOARDING_POOL_SIZE, ROUND_CANDIDATE_COUNT};

fn pen(id: &str, vendor: &str, price: f64) -> Item {
    Item::new(id, "fountain_pens")
        .with_vendor(vendor)
        .with_price(price, price + 20.0)
        .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
        .with_field("nib_material", ItemValue::Text("steel".into()))
        .with_field(
            "tags",
            ItemValue::List(vec!["everyday".into(), "reliable".into()]),
        )
}

fn seed_catalog(count: usize) -> Vec<Item> {
    let vendors = ["Pilot", "Lamy", "TWSBI", "Sailor"];
    (0..count)
        .map(|i| pen(&format!("pen{i}"), vendors[i % vendors.len()], 30.0 + i as f64))
        .collect()
}

#[tokio::test]
async fn full_game_runs_onboarding_through_summary() {
    let store = MemoryStore::new();
    let items = seed_catalog(ONBOARDING_POOL_SIZE + 20);
    store.put_items("fountain_pens", items.clone()).await.unwrap();

    let recommender = Recommender::refresh(&items).unwrap();
    let total_rounds = 3;

    let game = start_game(
        &store,
        &store,
        &store,
        &recommender,
        "game-1".into(),
        "Ada".into(),
        Some("fountain_pens"),
        total_rounds,
    )
    .await
    .unwrap();
    assert_eq!(game.onboarding_pool_ids.len(), ONBOARDING_POOL_SIZE);

    let pool = onboarding_pool(&store, &game).await.unwrap();
    assert_eq!(pool.items.len(), ONBOARDING_POOL_SIZE);

    let selected_ids: Vec<String> = pool.pool_ids.iter().take(10).cloned().collect();
    let onboarding_result = submit_onboarding(
        &store,
        &store,
        &recommender,
        game.clone(),
        selected_ids.clone(),
        4,
    )
    .await
    .unwrap();
    assert!((1.0..=5.0).contains(&onboarding_result.predicted_prefix_rating));

    let mut game = store.get("game-1").await.unwrap().unwrap();
    assert_eq!(game.status, GameStatus::Ready);

    for round_number in 1..=total_rounds {
        let round_start = start_round(&store, &store, &store, &recommender, game.clone())
            .await
            .unwrap();
        assert_eq!(round_start.round_number, round_number);
        assert_eq!(round_start.candidate_ids.len(), ROUND_CANDIDATE_COUNT);

        game = store.get("game-1").await.unwrap().unwrap();
        assert_eq!(game.current_round, round_number);

        let human_pick_id = round_start.candidate_ids[0].clone();
        let resolution = submit_pick(
            &store,
            &store,
            &recommender,
            game.clone(),
            round_number,
            human_pick_id.clone(),
        )
        .await
        .unwrap();
        assert_eq!(resolution.round.human_pick_id.as_deref(), Some(human_pick_id.as_str()));
        assert!(resolution.round.ai_pick_id.is_some());
        assert!(resolution.round.completed);

        game = store.get("game-1").await.unwrap().unwrap();
    }

    assert_eq!(game.status, GameStatus::Completed);
    assert_eq!(game.current_round, total_rounds);

    let summary = game_summary(&store, &store, &recommender, &game)
        .await
        .unwrap();
    assert_eq!(summary.human_score, game.human_score);
    assert_eq!(summary.ai_score, game.ai_score);
}

#[tokio::test]
async fn round_cannot_be_resolved_twice() {
    let store = MemoryStore::new();
    let items = seed_catalog(ONBOARDING_POOL_SIZE + 20);
    store.put_items("fountain_pens", items.clone()).await.unwrap();
    let recommender = Recommender::refresh(&items).unwrap();

    let game = start_game(
        &store,
        &store,
        &store,
        &recommender,
        "game-2".into(),
        "Grace".into(),
        None,
        1,
    )
    .await
    .unwrap();
    let pool = onboarding_pool(&store, &game).await.unwrap();
    submit_onboarding(
        &store,
        &store,
        &recommender,
        game.clone(),
        pool.pool_ids.iter().take(10).cloned().collect(),
        3,
    )
    .await
    .unwrap();

    let game = store.get("game-2").await.unwrap().unwrap();
    let round_start = start_round(&store, &store, &store, &recommender, game.clone())
        .await
        .unwrap();
    let pick = round_start.candidate_ids[0].clone();

    let game = store.get("game-2").await.unwrap().unwrap();
    submit_pick(&store, &store, &recommender, game.clone(), 1, pick.clone())
        .await
        .unwrap();

    let game = store.get("game-2").await.unwrap().unwrap();
    let err = submit_pick(&store, &store, &recommender, game, 1, pick)
        .await
        .unwrap_err();
    assert!(matches!(err, prefcraft::Error::State(_)));
}

/// spec §5/§8 scenario 5: two concurrent `submit_pick` calls for the same
/// `(game_id, round_number)` must yield exactly one acceptance and one
/// `StateError` rejection, never both succeeding.
#[tokio::test]
async fn concurrent_picks_for_same_round_resolve_exactly_once() {
    use std::sync::Arc;

    let store = Arc::new(MemoryStore::new());
    let items = seed_catalog(ONBOARDING_POOL_SIZE + 20);
    store.put_items("fountain_pens", items.clone()).await.unwrap();
    let recommender = Arc::new(Recommender::refresh(&items).unwrap());

    let game = start_game(
        store.as_ref(),
        store.as_ref(),
        store.as_ref(),
        recommender.as_ref(),
        "game-3".into(),
        "Rin".into(),
        None,
        1,
    )
    .await
    .unwrap();
    let pool = onboarding_pool(store.as_ref(), &game).await.unwrap();
    submit_onboarding(
        store.as_ref(),
        store.as_ref(),
        recommender.as_ref(),
        game.clone(),
        pool.pool_ids.iter().take(10).cloned().collect(),
        3,
    )
    .await
    .unwrap();

    let game = store.get("game-3").await.unwrap().unwrap();
    let round_start = start_round(store.as_ref(), store.as_ref(), store.as_ref(), recommender.as_ref(), game.clone())
        .await
        .unwrap();
    let pick = round_start.candidate_ids[0].clone();
    let game = store.get("game-3").await.unwrap().unwrap();

    let (store_a, recommender_a, game_a, pick_a) =
        (store.clone(), recommender.clone(), game.clone(), pick.clone());
    let (store_b, recommender_b, game_b, pick_b) =
        (store.clone(), recommender.clone(), game.clone(), pick.clone());

    let (result_a, result_b) = tokio::join!(
        submit_pick(store_a.as_ref(), store_a.as_ref(), recommender_a.as_ref(), game_a, 1, pick_a),
        submit_pick(store_b.as_ref(), store_b.as_ref(), recommender_b.as_ref(), game_b, 1, pick_b),
    );

    let oks = [result_a.is_ok(), result_b.is_ok()];
    assert_eq!(oks.iter().filter(|ok| **ok).count(), 1);
    match (result_a, result_b) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => assert!(matches!(e, prefcraft::Error::State(_))),
        _ => panic!("expected exactly one success and one rejection"),
    }
}
