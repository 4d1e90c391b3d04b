use super::seed::derive_seed;
use crate::catalog::Item;
use crate::pcf::PcfState;
use crate::recommender::Recommender;
use crate::session::{PrefixRating, Selection};
use crate::Timestamp;
use crate::ONBOARDING_POOL_SIZE;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// builds the size-50 onboarding pool (spec §4.6). For catalogs at or
/// under the pool size, every item is returned, shuffled. Larger catalogs
/// are partitioned into low/mid/high price terciles (targets 17/17/16),
/// each filled by a round-robin draw across vendor buckets so no single
/// vendor dominates the pool.
pub fn build_onboarding_pool(items: &[Item], game_id: &str) -> Vec<String> {
    let seed = derive_seed(game_id, 0, "onboarding_pool");
    let mut rng = SmallRng::seed_from_u64(seed);

    if items.len() <= ONBOARDING_POOL_SIZE {
        let mut ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        ids.shuffle(&mut rng);
        return ids;
    }

    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| {
        a.price_min_or_zero()
            .partial_cmp(&b.price_min_or_zero())
            .unwrap()
            .then_with(|| a.id.cmp(&b.id))
    });
    let n = sorted.len();
    let cut1 = n / 3;
    let cut2 = 2 * n / 3;
    let low = &sorted[..cut1];
    let mid = &sorted[cut1..cut2];
    let high = &sorted[cut2..];

    let mut chosen: Vec<String> = Vec::with_capacity(ONBOARDING_POOL_SIZE);
    chosen.extend(round_robin_by_vendor(low, 17, &mut rng));
    chosen.extend(round_robin_by_vendor(mid, 17, &mut rng));
    chosen.extend(round_robin_by_vendor(high, 16, &mut rng));

    let mut seen: HashSet<String> = chosen.iter().cloned().collect();
    if chosen.len() < ONBOARDING_POOL_SIZE {
        let mut remaining: Vec<&Item> = items.iter().filter(|i| !seen.contains(&i.id)).collect();
        remaining.shuffle(&mut rng);
        for item in remaining {
            if chosen.len() >= ONBOARDING_POOL_SIZE {
                break;
            }
            if seen.insert(item.id.clone()) {
                chosen.push(item.id.clone());
            }
        }
    }

    chosen.truncate(ONBOARDING_POOL_SIZE);
    chosen.shuffle(&mut rng);
    chosen
}

fn round_robin_by_vendor(tercile: &[&Item], target: usize, rng: &mut SmallRng) -> Vec<String> {
    let mut groups: BTreeMap<String, Vec<&Item>> = BTreeMap::new();
    for item in tercile {
        groups
            .entry(item.vendor.clone().unwrap_or_default())
            .or_default()
            .push(item);
    }
    let mut vendor_order: Vec<String> = groups.keys().cloned().collect();
    vendor_order.shuffle(rng);
    for bucket in groups.values_mut() {
        bucket.shuffle(rng);
    }

    let mut picked = Vec::with_capacity(target);
    loop {
        if picked.len() >= target {
            break;
        }
        let mut progressed = false;
        for vendor in &vendor_order {
            if picked.len() >= target {
                break;
            }
            if let Some(item) = groups.get_mut(vendor).and_then(|bucket| bucket.pop()) {
                picked.push(item.id.clone());
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    picked
}

/// validates and absorbs the onboarding submission (spec §4.6): exactly
/// 10 distinct ids, all drawn from the pool. Each selection gets a
/// monotonically increasing timestamp (`base + i` ms) and the prefix
/// rating lands at `base + 1000 ms`, so prefix-key resolution orders
/// them deterministically.
pub fn submit_onboarding(
    recommender: &Recommender,
    state: &mut PcfState,
    session_id: &str,
    pool_ids: &[String],
    selected_ids: &[String],
    rating: u8,
    base_ts: Timestamp,
) -> crate::Result<(Vec<Selection>, PrefixRating)> {
    if selected_ids.len() != crate::ONBOARDING_PICK_COUNT {
        return Err(crate::Error::validation(format!(
            "expected {} picks, got {}",
            crate::ONBOARDING_PICK_COUNT,
            selected_ids.len()
        )));
    }
    let distinct: HashSet<&String> = selected_ids.iter().collect();
    if distinct.len() != selected_ids.len() {
        return Err(crate::Error::validation("onboarding picks must be distinct"));
    }
    let pool: HashSet<&String> = pool_ids.iter().collect();
    if !selected_ids.iter().all(|id| pool.contains(id)) {
        return Err(crate::Error::validation("onboarding pick outside the pool"));
    }
    if !(1..=5).contains(&rating) {
        return Err(crate::Error::validation("rating must be in 1..=5"));
    }

    let mut selections = Vec::with_capacity(selected_ids.len());
    for (i, item_id) in selected_ids.iter().enumerate() {
        let timestamp = base_ts + i as Timestamp;
        recommender.update_with_selection(state, item_id, false);
        selections.push(Selection {
            session_id: session_id.to_string(),
            item_id: item_id.clone(),
            is_exception: false,
            timestamp,
        });
    }

    recommender.update_with_prefix_rating(state, rating as f32);
    let prefix_rating = PrefixRating {
        session_id: session_id.to_string(),
        rating,
        tags: Vec::new(),
        timestamp: base_ts + 1000,
    };

    Ok((selections, prefix_rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemValue;

    fn pen(id: &str, vendor: &str, price: f64) -> Item {
        Item::new(id, "fountain_pens")
            .with_vendor(vendor)
            .with_price(price, price + 10.0)
            .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
    }

    #[test]
    fn small_catalog_returns_everything_shuffled() {
        let items: Vec<Item> = (0..10).map(|i| pen(&format!("p{i}"), "Pilot", 40.0)).collect();
        let pool = build_onboarding_pool(&items, "g1");
        assert_eq!(pool.len(), 10);
        let set: HashSet<&String> = pool.iter().collect();
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn large_catalog_caps_at_pool_size_and_is_deterministic() {
        let items: Vec<Item> = (0..300)
            .map(|i| pen(&format!("p{i}"), if i % 5 == 0 { "Pilot" } else { "Lamy" }, (i % 50) as f64 * 10.0))
            .collect();
        let a = build_onboarding_pool(&items, "g2");
        let b = build_onboarding_pool(&items, "g2");
        assert_eq!(a.len(), ONBOARDING_POOL_SIZE);
        assert_eq!(a, b);
    }

    #[test]
    fn submission_rejects_picks_outside_pool() {
        let items: Vec<Item> = (0..20).map(|i| pen(&format!("p{i}"), "Pilot", 40.0)).collect();
        let recommender = Recommender::refresh(&items).unwrap();
        let mut state = recommender.init_state();
        let pool: Vec<String> = items[..15].iter().map(|i| i.id.clone()).collect();
        let bad_picks: Vec<String> = vec!["p19".to_string()]
            .into_iter()
            .chain(pool.iter().take(9).cloned())
            .collect();
        let result = submit_onboarding(&recommender, &mut state, "s1", &pool, &bad_picks, 4, 0);
        assert!(result.is_err());
    }

    #[test]
    fn valid_submission_updates_state_and_timestamps() {
        let items: Vec<Item> = (0..20).map(|i| pen(&format!("p{i}"), "Pilot", 40.0)).collect();
        let recommender = Recommender::refresh(&items).unwrap();
        let mut state = recommender.init_state();
        let pool: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let picks: Vec<String> = pool.iter().take(10).cloned().collect();
        let (selections, rating) =
            submit_onboarding(&recommender, &mut state, "s1", &pool, &picks, 5, 1_000).unwrap();
        assert_eq!(selections.len(), 10);
        assert_eq!(selections[0].timestamp, 1_000);
        assert_eq!(selections[9].timestamp, 1_009);
        assert_eq!(rating.timestamp, 2_000);
        assert_eq!(state.count, 10);
    }
}
