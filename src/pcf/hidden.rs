use super::cosine;
use super::PcfState;
use crate::features::FeatureSpace;
use crate::HIDDEN_MIN_LATENCY;
use crate::HIDDEN_MIN_SELECTIONS;
use crate::HIDDEN_MIN_WEIGHT;
use std::collections::HashSet;

/// a feature reinforced by co-occurrence more than by explicit selection
/// density (spec §4.3.1, glossary "Latency (hidden)").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HiddenPreference {
    pub feature: String,
    pub latency: f32,
    pub weight: f32,
}

fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}

/// spec §4.3.1. `selected_vecs` are the vectorized selections that fed
/// `state.user_vec`; numeric-feature indices are excluded from the result.
pub fn detect_hidden_preferences(
    state: &PcfState,
    feature_space: &FeatureSpace,
    selected_vecs: &[Vec<f32>],
    top_n: usize,
) -> Vec<HiddenPreference> {
    if state.count < HIDDEN_MIN_SELECTIONS || selected_vecs.is_empty() {
        return Vec::new();
    }
    let abs_vec: Vec<f32> = state.user_vec.iter().map(|v| v.abs()).collect();
    let max_val = abs_vec.iter().cloned().fold(0.0f32, f32::max);
    if max_val == 0.0 {
        return Vec::new();
    }
    let pref_weight: Vec<f32> = abs_vec.iter().map(|v| v / max_val).collect();

    let n_selected = selected_vecs.len() as f32;
    let width = state.user_vec.len();
    let mut freq_vec = vec![0.0f32; width];
    for vec in selected_vecs {
        for (i, x) in vec.iter().enumerate() {
            if *x != 0.0 {
                freq_vec[i] += 1.0;
            }
        }
    }
    for f in freq_vec.iter_mut() {
        *f /= n_selected;
    }

    let mut hidden: Vec<HiddenPreference> = (0..width)
        .filter(|&i| !feature_space.is_numeric_index(i))
        .filter_map(|i| {
            let latency = pref_weight[i] - freq_vec[i];
            if pref_weight[i] >= HIDDEN_MIN_WEIGHT && latency >= HIDDEN_MIN_LATENCY {
                feature_space.key_at(i).map(|key| HiddenPreference {
                    feature: key.to_string(),
                    latency: round4(latency),
                    weight: round4(pref_weight[i]),
                })
            } else {
                None
            }
        })
        .collect();

    hidden.sort_by(|a, b| b.latency.partial_cmp(&a.latency).unwrap());
    hidden.truncate(top_n);
    hidden
}

/// spec §4.3.2: mask `user_vec` to the hidden-feature indices, score every
/// non-selected catalog item by cosine similarity against that mask,
/// requiring at least one hidden feature present in the item.
pub fn get_hidden_gem_products(
    state: &PcfState,
    feature_space: &FeatureSpace,
    hidden: &[HiddenPreference],
    selected_ids: &HashSet<String>,
    catalog_vecs: &[(String, Vec<f32>)],
    top_n: usize,
) -> Vec<(String, f32)> {
    let hidden_indices: Vec<usize> = hidden
        .iter()
        .filter_map(|h| feature_space.index_of(&h.feature))
        .collect();
    if hidden_indices.is_empty() {
        return Vec::new();
    }
    let mut hidden_vec = vec![0.0f32; state.user_vec.len()];
    for &i in &hidden_indices {
        hidden_vec[i] = state.user_vec[i];
    }

    let mut scored: Vec<(String, f32)> = catalog_vecs
        .iter()
        .filter(|(id, _)| !selected_ids.contains(id))
        .filter(|(_, vec)| hidden_indices.iter().any(|&i| vec[i] != 0.0))
        .map(|(id, vec)| (id.clone(), cosine(&hidden_vec, vec)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
    scored.truncate(top_n);
    scored
}
