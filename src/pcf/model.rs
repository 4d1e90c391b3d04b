use super::PcfState;

/// stateless PCF operations (spec §4.3); the mutable state lives in
/// [`PcfState`], one per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcfModel;

impl PcfModel {
    pub fn init_state(&self, width: usize) -> PcfState {
        PcfState::init(width)
    }

    /// `user_vec <- decay * user_vec + w * vectorize(item)`, `count += 1`,
    /// where `w = exception_weight` if `is_exception` else `1.0`.
    pub fn update_with_selection(&self, state: &mut PcfState, item_vec: &[f32], is_exception: bool) {
        let w = if is_exception {
            state.exception_weight
        } else {
            1.0
        };
        for (u, x) in state.user_vec.iter_mut().zip(item_vec.iter()) {
            *u = state.decay * *u + w * x;
        }
        state.count += 1;
    }

    /// `bias <- bias + 0.25 * (rating - predicted)`.
    pub fn update_with_prefix_rating(&self, state: &mut PcfState, rating: f32) {
        let predicted = self.predict_prefix_rating(state);
        state.bias += 0.25 * (rating - predicted);
    }

    /// `3.0 + 1.5 * tanh(||user_vec|| / 3.0) + bias`, clamped to [1.0, 5.0].
    pub fn predict_prefix_rating(&self, state: &PcfState) -> f32 {
        let raw = 3.0 + 1.5 * (state.norm() / 3.0).tanh() + state.bias;
        raw.clamp(1.0, 5.0)
    }

    /// cosine similarity rescaled into a 1-5 rating, clamped.
    pub fn score_item(&self, state: &PcfState, item_vec: &[f32]) -> f32 {
        let s = cosine(&state.user_vec, item_vec);
        (3.0 + 1.7 * s + state.bias).clamp(1.0, 5.0)
    }

    /// mean pairwise cosine over all unordered pairs, rescaled to [0,1] via
    /// `(mean + 1) / 2`. Returns 0 for fewer than two vectors.
    pub fn coherence_score(&self, item_vecs: &[Vec<f32>]) -> f32 {
        if item_vecs.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0f32;
        let mut pairs = 0usize;
        for i in 0..item_vecs.len() {
            for j in (i + 1)..item_vecs.len() {
                total += cosine(&item_vecs[i], &item_vecs[j]);
                pairs += 1;
            }
        }
        let mean = total / pairs as f32;
        (mean + 1.0) / 2.0
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_saturates_but_never_exceeds_bound() {
        let model = PcfModel;
        let mut state = model.init_state(4);
        let mut item_vec = vec![0.0; 4];
        item_vec[0] = 1.0;
        let mut prev = 0.0;
        for _ in 0..50 {
            model.update_with_selection(&mut state, &item_vec, false);
            let predicted = model.predict_prefix_rating(&state);
            assert!(predicted <= 5.0 - f32::EPSILON * 0.0 && predicted <= 5.0);
            assert!(predicted >= prev - 1e-4);
            prev = predicted;
        }
        assert!(prev < 5.0);
    }

    #[test]
    fn score_and_prediction_stay_in_bounds() {
        let model = PcfModel;
        let mut state = model.init_state(3);
        state.user_vec = vec![10.0, -5.0, 3.0];
        state.bias = 100.0;
        assert!((1.0..=5.0).contains(&model.predict_prefix_rating(&state)));
        assert!((1.0..=5.0).contains(&model.score_item(&state, &[1.0, 0.0, 0.0])));
    }

    #[test]
    fn bias_converges_toward_rating() {
        let model = PcfModel;
        let mut state = model.init_state(2);
        state.user_vec = vec![0.5, 0.5];
        let target = 5.0;
        let mut prev_err = (target - model.predict_prefix_rating(&state)).abs();
        for _ in 0..20 {
            model.update_with_prefix_rating(&mut state, target);
            let err = (target - model.predict_prefix_rating(&state)).abs();
            assert!(err <= prev_err + 1e-4);
            prev_err = err;
        }
    }

    #[test]
    fn coherence_is_bounded_and_one_when_identical() {
        let model = PcfModel;
        assert_eq!(model.coherence_score(&[vec![1.0, 0.0]]), 0.0);
        let v = vec![1.0, 2.0, 3.0];
        let score = model.coherence_score(&[v.clone(), v.clone(), v]);
        assert!((score - 1.0).abs() < 1e-5);
    }
}
