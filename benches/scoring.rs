criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        building_feature_space,
        vectorizing_item,
        scoring_unused_items,
        updating_pcf_state,
        detecting_hidden_preferences,
        training_pbcf_engine,
        folding_in_pbcf_prediction,
        ranking_round_candidates,
}

fn catalog(count: usize) -> Vec<Item> {
    let vendors = ["Pilot", "Lamy", "TWSBI", "Sailor", "Pelikan"];
    (0..count)
        .map(|i| {
            Item::new(format!("p{i}"), "fountain_pens")
                .with_vendor(vendors[i % vendors.len()])
                .with_price(20.0 + i as f64, 40.0 + i as f64)
                .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
                .with_field("nib_material", ItemValue::Text("steel".into()))
                .with_field(
                    "tags",
                    ItemValue::List(vec!["everyday".into(), "reliable".into()]),
                )
        })
        .collect()
}

fn building_feature_space(c: &mut criterion::Criterion) {
    let items = catalog(500);
    c.bench_function("build a FeatureSpace over 500 items", |b| {
        b.iter(|| FeatureSpace::build(&items).unwrap())
    });
}

fn vectorizing_item(c: &mut criterion::Criterion) {
    let items = catalog(500);
    let space = FeatureSpace::build(&items).unwrap();
    let item = items[0].clone();
    c.bench_function("vectorize a single item", |b| {
        b.iter(|| space.vectorize(&item).unwrap())
    });
}

fn scoring_unused_items(c: &mut criterion::Criterion) {
    let items = catalog(500);
    let recommender = Recommender::refresh(&items).unwrap();
    let mut state = recommender.init_state();
    recommender.update_with_selection(&mut state, "p0", false);
    let used: std::collections::HashSet<String> = ["p0".to_string()].into_iter().collect();
    c.bench_function("rank 500 unused items by PCF score", |b| {
        b.iter(|| recommender.rank_unused(&state, &used))
    });
}

fn updating_pcf_state(c: &mut criterion::Criterion) {
    let items = catalog(500);
    let recommender = Recommender::refresh(&items).unwrap();
    c.bench_function("absorb one selection into PCF state", |b| {
        b.iter(|| {
            let mut state = recommender.init_state();
            recommender.update_with_selection(&mut state, "p10", false);
        })
    });
}

fn detecting_hidden_preferences(c: &mut criterion::Criterion) {
    let items = catalog(500);
    let recommender = Recommender::refresh(&items).unwrap();
    let mut state = recommender.init_state();
    let selected: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
    for id in &selected {
        recommender.update_with_selection(&mut state, id, false);
    }
    c.bench_function("detect hidden preferences over 10 selections", |b| {
        b.iter(|| recommender.hidden_preferences(&state, &selected, 3))
    });
}

fn training_pbcf_engine(c: &mut criterion::Criterion) {
    let ratings: Vec<RatingObservation> = (0..40)
        .flat_map(|u| {
            (0..10).map(move |p| RatingObservation {
                prefix_key: format!("prefix{p}"),
                user_id: format!("user{u}"),
                rating: 1.0 + ((u + p) % 5) as f32,
                timestamp: (u * 10 + p) as i64,
            })
        })
        .collect();
    c.bench_function("train PBCF over 40 users x 10 prefixes", |b| {
        b.iter(|| {
            let mut engine = PbcfEngine::new();
            engine.refresh(&ratings);
        })
    });
}

fn folding_in_pbcf_prediction(c: &mut criterion::Criterion) {
    let ratings: Vec<RatingObservation> = (0..40)
        .flat_map(|u| {
            (0..10).map(move |p| RatingObservation {
                prefix_key: format!("prefix{p}"),
                user_id: format!("user{u}"),
                rating: 1.0 + ((u + p) % 5) as f32,
                timestamp: (u * 10 + p) as i64,
            })
        })
        .collect();
    let mut engine = PbcfEngine::new();
    engine.refresh(&ratings);
    c.bench_function("fold in a PBCF prediction for a known user", |b| {
        b.iter(|| engine.predict_for_user("user3"))
    });
}

fn ranking_round_candidates(c: &mut criterion::Criterion) {
    let items = catalog(500);
    let vendor_of: std::collections::HashMap<String, Option<String>> = items
        .iter()
        .map(|i| (i.id.clone(), i.vendor.clone()))
        .collect();
    let recommender = Recommender::refresh(&items).unwrap();
    let state = recommender.init_state();
    let used = std::collections::HashSet::new();
    let ranked = recommender.rank_unused(&state, &used);
    c.bench_function("build a vendor-diverse round from 500 ranked items", |b| {
        b.iter(|| build_round_candidates(&ranked, &vendor_of, 7))
    });
}

use prefcraft::catalog::{Item, ItemValue};
use prefcraft::features::FeatureSpace;
use prefcraft::game::build_round_candidates;
use prefcraft::pbcf::{PbcfEngine, RatingObservation};
use prefcraft::recommender::Recommender;
