use crate::catalog::Item;
use crate::features::FeatureSpace;
use crate::pbcf::{PbcfEngine, RatingObservation};
use crate::pcf::{self, PcfModel, PcfState};
use crate::session::Selection;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// a scored candidate, returned from [`Recommender::recommend`].
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f32,
}

/// the result of a scoring pass: a ranked "strong" list, one "wildcard"
/// drawn from the tail, plus session-level diagnostics (spec §4.5).
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub strong: Vec<ScoredItem>,
    pub wildcard: Option<ScoredItem>,
    pub coherence_score: f32,
    pub predicted_prefix_rating: f32,
}

/// owns the live feature space, the stateless PCF model, a cached
/// vectorization of every catalog item, and the offline PBCF engine
/// (spec §4.5). One instance is shared across a category's games.
pub struct Recommender {
    feature_space: FeatureSpace,
    pcf: PcfModel,
    item_vecs: HashMap<String, Vec<f32>>,
    pbcf: PbcfEngine,
}

impl Recommender {
    /// builds a fresh feature space and item-vector cache from the given
    /// catalog; the PBCF engine starts untrained until [`Self::refresh_pbcf`]
    /// is called with rating observations.
    pub fn refresh(items: &[Item]) -> crate::Result<Self> {
        let feature_space = FeatureSpace::build(items)?;
        let mut item_vecs = HashMap::with_capacity(items.len());
        for item in items {
            item_vecs.insert(item.id.clone(), feature_space.vectorize(item)?);
        }
        Ok(Self {
            feature_space,
            pcf: PcfModel,
            item_vecs,
            pbcf: PbcfEngine::new(),
        })
    }

    pub fn feature_space(&self) -> &FeatureSpace {
        &self.feature_space
    }

    pub fn item_vec(&self, item_id: &str) -> Option<&Vec<f32>> {
        self.item_vecs.get(item_id)
    }

    pub fn pbcf(&self) -> &PbcfEngine {
        &self.pbcf
    }

    /// retrains the PBCF engine only when the observation count changed
    /// since the last call (spec §4.4 refresh policy).
    pub fn refresh_pbcf(&mut self, ratings: &[RatingObservation]) {
        self.pbcf.refresh(ratings);
    }

    pub fn init_state(&self) -> PcfState {
        self.pcf.init_state(self.feature_space.width())
    }

    pub fn update_with_selection(&self, state: &mut PcfState, item_id: &str, is_exception: bool) {
        let Some(item_vec) = self.item_vecs.get(item_id) else {
            return;
        };
        self.pcf.update_with_selection(state, item_vec, is_exception);
    }

    pub fn update_with_prefix_rating(&self, state: &mut PcfState, rating: f32) {
        self.pcf.update_with_prefix_rating(state, rating);
    }

    pub fn score_item(&self, state: &PcfState, item_id: &str) -> f32 {
        match self.item_vecs.get(item_id) {
            Some(vec) => self.pcf.score_item(state, vec),
            None => 0.0,
        }
    }

    /// every item not in `used`, scored by `PCF.score_item` and sorted
    /// descending with an item-id tiebreak (spec §4.6 round candidates).
    pub fn rank_unused(&self, state: &PcfState, used: &std::collections::HashSet<String>) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = self
            .item_vecs
            .keys()
            .filter(|id| !used.contains(id.as_str()))
            .map(|id| ScoredItem {
                item_id: id.clone(),
                score: self.score_item(state, id),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        scored
    }

    pub fn coherence_score(&self, selected_ids: &[String]) -> f32 {
        let vecs: Vec<Vec<f32>> = selected_ids
            .iter()
            .filter_map(|id| self.item_vecs.get(id).cloned())
            .collect();
        self.pcf.coherence_score(&vecs)
    }

    pub fn predict_prefix_rating(&self, state: &PcfState) -> f32 {
        self.pcf.predict_prefix_rating(state)
    }

    pub fn hidden_preferences(
        &self,
        state: &PcfState,
        selected_ids: &[String],
        top_n: usize,
    ) -> Vec<pcf::HiddenPreference> {
        let vecs: Vec<Vec<f32>> = selected_ids
            .iter()
            .filter_map(|id| self.item_vecs.get(id).cloned())
            .collect();
        pcf::detect_hidden_preferences(state, &self.feature_space, &vecs, top_n)
    }

    pub fn hidden_gems(
        &self,
        state: &PcfState,
        hidden: &[pcf::HiddenPreference],
        selected_ids: &std::collections::HashSet<String>,
        top_n: usize,
    ) -> Vec<(String, f32)> {
        let catalog_vecs: Vec<(String, Vec<f32>)> = self
            .item_vecs
            .iter()
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect();
        pcf::get_hidden_gem_products(
            state,
            &self.feature_space,
            hidden,
            selected_ids,
            &catalog_vecs,
            top_n,
        )
    }

    /// scores every item not yet selected in the session, substituting a
    /// PBCF fold-in prediction wherever `current_prefix + item_id` has one,
    /// and returns the top `limit` plus one wildcard drawn from the bottom
    /// eighth of the ranking (minimum pool of 10) (spec §4.5).
    pub fn recommend(
        &self,
        state: &PcfState,
        selections: &[Selection],
        user_id: &str,
        current_prefix: &str,
        limit: usize,
        rng_seed: u64,
    ) -> Recommendation {
        let selected_ids: std::collections::HashSet<&str> =
            selections.iter().map(|s| s.item_id.as_str()).collect();

        let pbcf_predictions = self.pbcf.predict_for_user(user_id);

        let mut scored: Vec<ScoredItem> = self
            .item_vecs
            .keys()
            .filter(|id| !selected_ids.contains(id.as_str()))
            .map(|id| {
                let pbcf_key = if current_prefix.is_empty() {
                    id.clone()
                } else {
                    format!("{current_prefix}-{id}")
                };
                let score = pbcf_predictions
                    .as_ref()
                    .and_then(|preds| preds.get(&pbcf_key))
                    .copied()
                    .unwrap_or_else(|| self.score_item(state, id));
                ScoredItem {
                    item_id: id.clone(),
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        let strong: Vec<ScoredItem> = scored.iter().take(limit).cloned().collect();

        let tail_size = (scored.len() / 8).max(10);
        let tail_start = scored.len().saturating_sub(tail_size);
        let wildcard = if scored.is_empty() {
            None
        } else {
            let mut rng = SmallRng::seed_from_u64(rng_seed);
            scored[tail_start..].choose(&mut rng).cloned()
        };

        let selected_vec: Vec<String> = selections.iter().map(|s| s.item_id.clone()).collect();

        Recommendation {
            strong,
            wildcard,
            coherence_score: self.coherence_score(&selected_vec),
            predicted_prefix_rating: self.predict_prefix_rating(state),
        }
    }
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
            .with_field("tags", ItemValue::List(vec!["everyday".into()]))
    }

    #[test]
    fn recommend_excludes_selected_and_honors_limit() {
        let items: Vec<Item> = (0..20)
            .map(|i| pen(&format!("p{i}"), if i % 2 == 0 { "Pilot" } else { "Lamy" }, 40.0 + i as f64))
            .collect();
        let recommender = Recommender::refresh(&items).unwrap();
        let mut state = recommender.init_state();
        recommender.update_with_selection(&mut state, "p0", false);

        let selections = vec![Selection {
            session_id: "s1".into(),
            item_id: "p0".into(),
            is_exception: false,
            timestamp: 1,
        }];
        let rec = recommender.recommend(&state, &selections, "s1", "p0", 5, 7);
        assert_eq!(rec.strong.len(), 5);
        assert!(rec.strong.iter().all(|s| s.item_id != "p0"));
        assert!((0.0..=1.0).contains(&rec.coherence_score) || rec.coherence_score == 0.0);
        assert!((1.0..=5.0).contains(&rec.predicted_prefix_rating));
    }
}
