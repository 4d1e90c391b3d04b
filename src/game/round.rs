use crate::pcf::PcfState;
use crate::recommender::{Recommender, ScoredItem};
use crate::ROUND_CANDIDATE_COUNT;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::collections::HashSet;

/// the outcome of resolving a round's human pick (spec §4.6).
#[derive(Debug, Clone)]
pub struct PickOutcome {
    pub ai_pick_id: String,
    pub ai_top_k: Vec<ScoredItem>,
    pub ai_correct: bool,
    pub ai_exact: bool,
    pub ai_rank_of_pick: u32,
    pub human_points: i64,
    pub ai_points: i64,
}

/// assembles a round's 10 candidates (spec §4.6): 6 from the top-20
/// ("likely"), 8 from ranks 20..120 ("near-boundary"), up to 10 from the
/// bottom half preferring a vendor that differs from any top-10 vendor
/// ("diverse"), then fills any shortage from the full ranking. The 6/8/10
/// are cumulative targets on the selected set's size, not per-pool counts --
/// each draw only tops up `chosen` to its target, matching `add_from_pool`
/// in the original.
pub fn build_round_candidates(
    ranked: &[ScoredItem],
    vendor_of: &HashMap<String, Option<String>>,
    seed: u64,
) -> Vec<String> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut chosen = Vec::with_capacity(ROUND_CANDIDATE_COUNT);
    let mut seen = HashSet::new();

    let top20 = &ranked[..ranked.len().min(20)];
    draw(top20, 6, &mut rng, &mut chosen, &mut seen);

    let boundary_end = ranked.len().min(120);
    let boundary = if boundary_end > 20 {
        &ranked[20..boundary_end]
    } else {
        &[]
    };
    draw(boundary, 8, &mut rng, &mut chosen, &mut seen);

    let bottom_half = &ranked[ranked.len() / 2..];
    let top_vendors: HashSet<String> = ranked
        .iter()
        .take(10)
        .filter_map(|item| vendor_of.get(&item.item_id).cloned().flatten())
        .collect();
    draw_diverse(bottom_half, vendor_of, &top_vendors, 10, &mut rng, &mut chosen, &mut seen);

    if chosen.len() < ROUND_CANDIDATE_COUNT {
        for item in ranked {
            if chosen.len() >= ROUND_CANDIDATE_COUNT {
                break;
            }
            if seen.insert(item.item_id.clone()) {
                chosen.push(item.item_id.clone());
            }
        }
    }

    chosen.truncate(ROUND_CANDIDATE_COUNT);
    chosen.shuffle(&mut rng);
    chosen
}

/// tops up `chosen` from `pool` until it reaches `target` elements. `target`
/// is the desired size of `chosen`, not how many to add from this pool.
fn draw(
    pool: &[ScoredItem],
    target: usize,
    rng: &mut SmallRng,
    chosen: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.shuffle(rng);
    for idx in order {
        if chosen.len() >= target {
            break;
        }
        let id = &pool[idx].item_id;
        if seen.insert(id.clone()) {
            chosen.push(id.clone());
        }
    }
}

/// as `draw`, but prefers items whose vendor isn't among `top_vendors`,
/// falling back to any unseen item in `pool` if that alone can't reach
/// `target`.
fn draw_diverse(
    pool: &[ScoredItem],
    vendor_of: &HashMap<String, Option<String>>,
    top_vendors: &HashSet<String>,
    target: usize,
    rng: &mut SmallRng,
    chosen: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.shuffle(rng);

    for &idx in &order {
        if chosen.len() >= target {
            break;
        }
        let id = &pool[idx].item_id;
        if seen.contains(id) {
            continue;
        }
        let vendor = vendor_of.get(id).cloned().flatten();
        let differs = vendor.map(|v| !top_vendors.contains(&v)).unwrap_or(true);
        if differs && seen.insert(id.clone()) {
            chosen.push(id.clone());
        }
    }

    if chosen.len() < target {
        for &idx in &order {
            if chosen.len() >= target {
                break;
            }
            let id = &pool[idx].item_id;
            if seen.insert(id.clone()) {
                chosen.push(id.clone());
            }
        }
    }
}

/// resolves a submitted pick against the round's candidate list (spec
/// §4.6). Rejects a pick that isn't a candidate; scores every candidate
/// with the *current* PCF state (before the human pick is absorbed).
pub fn resolve_pick(
    recommender: &Recommender,
    state: &PcfState,
    candidate_ids: &[String],
    human_pick_id: &str,
) -> crate::Result<PickOutcome> {
    if !candidate_ids.iter().any(|id| id == human_pick_id) {
        return Err(crate::Error::validation("pick is not a round candidate"));
    }

    let mut scored: Vec<ScoredItem> = candidate_ids
        .iter()
        .map(|id| ScoredItem {
            item_id: id.clone(),
            score: recommender.score_item(state, id),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then_with(|| a.item_id.cmp(&b.item_id))
    });

    let ai_pick_id = scored[0].item_id.clone();
    let ai_top3: HashSet<&str> = scored.iter().take(3).map(|s| s.item_id.as_str()).collect();
    let ai_correct = ai_top3.contains(human_pick_id);
    let ai_exact = ai_pick_id == human_pick_id;
    let ai_rank_of_pick = scored
        .iter()
        .position(|s| s.item_id == human_pick_id)
        .map(|i| (i + 1) as u32)
        .unwrap_or(0);
    let (human_points, ai_points) = if ai_correct { (0, 10) } else { (10, 0) };

    Ok(PickOutcome {
        ai_pick_id,
        ai_top_k: scored.into_iter().take(3).collect(),
        ai_correct,
        ai_exact,
        ai_rank_of_pick,
        human_points,
        ai_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(n: usize) -> Vec<ScoredItem> {
        (0..n)
            .map(|i| ScoredItem {
                item_id: format!("p{i}"),
                score: (n - i) as f32,
            })
            .collect()
    }

    #[test]
    fn candidates_are_ten_distinct_and_deterministic() {
        let ranked = ranked(200);
        let vendor_of: HashMap<String, Option<String>> =
            ranked.iter().map(|r| (r.item_id.clone(), Some("Pilot".to_string()))).collect();
        let a = build_round_candidates(&ranked, &vendor_of, 11);
        let b = build_round_candidates(&ranked, &vendor_of, 11);
        assert_eq!(a.len(), ROUND_CANDIDATE_COUNT);
        assert_eq!(a, b);
        let set: HashSet<&String> = a.iter().collect();
        assert_eq!(set.len(), ROUND_CANDIDATE_COUNT);
    }

    #[test]
    fn resolve_rejects_pick_outside_candidates() {
        let recommender = {
            let items = vec![crate::catalog::Item::new("p0", "fountain_pens")];
            Recommender::refresh(&items).unwrap()
        };
        let state = recommender.init_state();
        let result = resolve_pick(&recommender, &state, &["p0".to_string()], "p99");
        assert!(result.is_err());
    }
}
