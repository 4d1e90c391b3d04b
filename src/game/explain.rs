use crate::catalog::{self, CategoryProfile};
use crate::pcf::{HiddenPreference, PcfState};
use crate::recommender::Recommender;
use std::collections::HashMap;
use std::collections::HashSet;

const MIN_DIMENSION_WEIGHT: f32 = 0.05;

/// the "why" behind a round: the dimensions driving the current taste
/// model, features shared between the human and AI picks, and any hidden
/// preferences surfaced along the way (spec §4.6 "AI explanation").
#[derive(Debug, Clone, Default)]
pub struct Explanation {
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub shared_features: Vec<String>,
    pub hidden: Vec<HiddenPreference>,
}

/// top positive/negative dimensions of `user_vec` by absolute weight above
/// 0.05; numeric keys are excluded except price, which collapses to a
/// single "Higher/Lower Price Range" label keeping the larger-magnitude
/// sign. Labels are de-duplicated, keeping the strongest weight seen.
pub fn top_dimensions(
    state: &PcfState,
    recommender: &Recommender,
    profile: &CategoryProfile,
) -> (Vec<String>, Vec<String>) {
    let feature_space = recommender.feature_space();
    let mut labeled: HashMap<String, f32> = HashMap::new();
    let mut price_best: Option<(String, f32)> = None;

    for (i, &weight) in state.user_vec.iter().enumerate() {
        if weight.abs() < MIN_DIMENSION_WEIGHT {
            continue;
        }
        let Some(key) = feature_space.key_at(i) else {
            continue;
        };
        if feature_space.is_numeric_index(i) {
            if key.contains("price") {
                let stronger = price_best
                    .as_ref()
                    .map(|(_, existing)| weight.abs() > existing.abs())
                    .unwrap_or(true);
                if stronger {
                    price_best = Some((key.to_string(), weight));
                }
            }
            continue;
        }
        if let Some(label) = catalog::humanize_feature(key, profile) {
            labeled
                .entry(label)
                .and_modify(|existing| {
                    if weight.abs() > existing.abs() {
                        *existing = weight;
                    }
                })
                .or_insert(weight);
        }
    }

    if let Some((key, weight)) = price_best {
        let label = catalog::numeric_preference_label(&key, weight);
        labeled.insert(label, weight);
    }

    let mut entries: Vec<(String, f32)> = labeled.into_iter().collect();
    entries.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap());

    let likes = entries
        .iter()
        .filter(|(_, w)| *w > 0.0)
        .map(|(label, _)| label.clone())
        .collect();
    let dislikes = entries
        .iter()
        .filter(|(_, w)| *w < 0.0)
        .map(|(label, _)| label.clone())
        .collect();
    (likes, dislikes)
}

/// humanized feature keys present in both picks' vectors (redundant tokens
/// dropped), for the "you both liked..." line (spec §4.6).
pub fn shared_features(
    recommender: &Recommender,
    profile: &CategoryProfile,
    human_pick_id: &str,
    ai_pick_id: &str,
) -> Vec<String> {
    let feature_space = recommender.feature_space();
    let (Some(human_vec), Some(ai_vec)) = (
        recommender.item_vec(human_pick_id),
        recommender.item_vec(ai_pick_id),
    ) else {
        return Vec::new();
    };

    let mut shared: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for (i, (&h, &a)) in human_vec.iter().zip(ai_vec.iter()).enumerate() {
        if h == 0.0 || a == 0.0 || feature_space.is_numeric_index(i) {
            continue;
        }
        let Some(key) = feature_space.key_at(i) else {
            continue;
        };
        if let Some(label) = catalog::humanize_feature(key, profile) {
            if seen.insert(label.clone()) {
                shared.push(label);
            }
        }
    }
    shared
}

/// assembles a round's full explanation: top dimensions, shared features
/// between the two picks, and any hidden preferences.
pub fn explain_round(
    recommender: &Recommender,
    profile: &CategoryProfile,
    state: &PcfState,
    selected_ids: &[String],
    human_pick_id: &str,
    ai_pick_id: &str,
) -> Explanation {
    let (mut likes, mut dislikes) = top_dimensions(state, recommender, profile);
    likes.truncate(3);
    dislikes.truncate(3);
    let shared = shared_features(recommender, profile, human_pick_id, ai_pick_id);
    let hidden = recommender.hidden_preferences(state, selected_ids, 5);
    Explanation {
        likes,
        dislikes,
        shared_features: shared,
        hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryProfile, ItemValue};

    fn pen(id: &str, vendor: &str) -> crate::catalog::Item {
        crate::catalog::Item::new(id, "fountain_pens")
            .with_vendor(vendor)
            .with_price(80.0, 120.0)
            .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
            .with_field("tags", ItemValue::List(vec!["everyday".into()]))
    }

    #[test]
    fn likes_reflect_positive_reinforced_vendor() {
        let items = vec![pen("p0", "Pilot"), pen("p1", "Lamy"), pen("p2", "Pilot")];
        let recommender = Recommender::refresh(&items).unwrap();
        let mut state = recommender.init_state();
        recommender.update_with_selection(&mut state, "p0", false);
        recommender.update_with_selection(&mut state, "p2", false);

        let profile = CategoryProfile::fountain_pens();
        let (likes, _dislikes) = top_dimensions(&state, &recommender, &profile);
        assert!(likes.iter().any(|l| l.contains("Pilot")));
    }

    #[test]
    fn shared_features_nonempty_for_same_vendor_picks() {
        let items = vec![pen("p0", "Pilot"), pen("p1", "Pilot")];
        let recommender = Recommender::refresh(&items).unwrap();
        let shared = shared_features(
            &recommender,
            &CategoryProfile::fountain_pens(),
            "p0",
            "p1",
        );
        assert!(!shared.is_empty());
    }
}
