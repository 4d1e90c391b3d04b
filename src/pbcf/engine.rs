use super::matrix;
use super::matrix::Matrix;
use crate::Timestamp;
use crate::PBCF_DEFAULT_K;
use crate::PBCF_DEFAULT_SEED;
use crate::PBCF_EPSILON;
use crate::PBCF_TRAIN_ITERATIONS;
use std::collections::HashMap;

/// a single (prefix, user) -> rating observation, already resolved to a
/// timestamp-ordered prefix key (spec §4.4).
#[derive(Debug, Clone)]
pub struct RatingObservation {
    pub prefix_key: String,
    pub user_id: String,
    pub rating: f32,
    pub timestamp: Timestamp,
}

/// non-negative matrix factorization over a sparse (prefix, user) -> rating
/// matrix, refreshed on demand (spec §4.4).
#[derive(Debug, Default)]
pub struct PbcfEngine {
    prefix_index: HashMap<String, usize>,
    user_index: HashMap<String, usize>,
    prefix_order: Vec<String>,
    r: Matrix,
    mask: Vec<Vec<bool>>,
    w: Matrix,
    h: Matrix,
    k: usize,
    seed: u64,
    trained: bool,
    last_rating_count: usize,
}

impl PbcfEngine {
    pub fn new() -> Self {
        Self {
            k: PBCF_DEFAULT_K,
            seed: PBCF_DEFAULT_SEED,
            ..Default::default()
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn prefix_count(&self) -> usize {
        self.prefix_index.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_index.len()
    }

    pub fn missing_ratio(&self) -> f32 {
        let total = self.prefix_count() * self.user_count();
        if total == 0 {
            return 1.0;
        }
        let observed: usize = self.mask.iter().flatten().filter(|m| **m).count();
        1.0 - (observed as f32 / total as f32)
    }

    pub fn latent_dim(&self) -> usize {
        self.k
    }

    pub fn last_rating_count(&self) -> usize {
        self.last_rating_count
    }

    /// retrains on next access only when the observed rating count changes
    /// (spec §4.4 refresh policy).
    pub fn refresh(&mut self, ratings: &[RatingObservation]) {
        if ratings.len() == self.last_rating_count && self.trained {
            return;
        }
        self.build(ratings);
        self.train();
        self.last_rating_count = ratings.len();
    }

    fn build(&mut self, ratings: &[RatingObservation]) {
        // dedup by (prefix_key, user_id), keeping the latest timestamp,
        // ordered overall by creation time.
        let mut ordered: Vec<&RatingObservation> = ratings.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        let mut latest: HashMap<(String, String), &RatingObservation> = HashMap::new();
        for obs in ordered {
            let key = (obs.prefix_key.clone(), obs.user_id.clone());
            match latest.get(&key) {
                Some(existing) if existing.timestamp > obs.timestamp => {}
                _ => {
                    latest.insert(key, obs);
                }
            }
        }

        let mut prefix_keys: Vec<String> = latest.keys().map(|(p, _)| p.clone()).collect();
        prefix_keys.sort();
        prefix_keys.dedup();
        let mut user_ids: Vec<String> = latest.keys().map(|(_, u)| u.clone()).collect();
        user_ids.sort();
        user_ids.dedup();

        self.prefix_index = prefix_keys
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        self.user_index = user_ids
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), i))
            .collect();
        self.prefix_order = prefix_keys.clone();

        let p = prefix_keys.len();
        let u = user_ids.len();
        self.r = matrix::zeros(p, u);
        self.mask = vec![vec![false; u]; p];

        if p == 0 || u == 0 {
            self.trained = false;
            return;
        }

        for ((prefix, user), obs) in latest.iter() {
            let pi = self.prefix_index[prefix];
            let ui = self.user_index[user];
            self.r[pi][ui] = obs.rating;
            self.mask[pi][ui] = true;
        }

        self.k = self.k.max(2).min(p.min(u));
        self.k = self.k.max(1);
    }

    fn train(&mut self) {
        let p = self.prefix_index.len();
        let u = self.user_index.len();
        if p == 0 || u == 0 {
            self.trained = false;
            return;
        }
        self.w = matrix::positive_random(p, self.k, self.seed);
        self.h = matrix::positive_random(self.k, u, self.seed.wrapping_add(1));

        for _ in 0..PBCF_TRAIN_ITERATIONS {
            let mut r_prime = matrix::matmul(&self.w, &self.h);
            self.hard_impute(&mut r_prime);

            let wt = matrix::transpose(&self.w);
            let num_h = matrix::matmul(&wt, &r_prime);
            let den_h = matrix::matmul(&matrix::matmul(&wt, &self.w), &self.h);
            self.h = matrix::hadamard_div(&self.h, &num_h, &den_h, PBCF_EPSILON);

            let ht = matrix::transpose(&self.h);
            let num_w = matrix::matmul(&r_prime, &ht);
            let den_w = matrix::matmul(&matrix::matmul(&self.w, &self.h), &ht);
            self.w = matrix::hadamard_div(&self.w, &num_w, &den_w, PBCF_EPSILON);
        }
        self.trained = true;
    }

    fn hard_impute(&self, r_prime: &mut Matrix) {
        for (i, row) in r_prime.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                if self.mask[i][j] {
                    *cell = self.r[i][j];
                }
            }
        }
    }

    /// predicts ratings across every known prefix for a user already
    /// present in the training set, clipped to [1, 5] (spec §4.4).
    pub fn predict_for_user(&self, user_id: &str) -> Option<HashMap<String, f32>> {
        if !self.trained {
            return None;
        }
        let ui = *self.user_index.get(user_id)?;
        let p = self.prefix_index.len();
        let r0: Vec<f32> = (0..p).map(|i| self.r[i][ui]).collect();
        let mask: Vec<bool> = (0..p).map(|i| self.mask[i][ui]).collect();

        let mut rng_seed = self.seed.wrapping_add(ui as u64 + 2);
        let mut h = matrix::positive_random(self.k, 1, {
            rng_seed = rng_seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            rng_seed
        });

        for _ in 0..PBCF_TRAIN_ITERATIONS {
            let mut r_prime: Vec<f32> = self
                .w
                .iter()
                .map(|row| row.iter().zip(h.iter().map(|r| r[0])).map(|(a, b)| a * b).sum())
                .collect();
            for i in 0..p {
                if mask[i] {
                    r_prime[i] = r0[i];
                }
            }
            let wt = matrix::transpose(&self.w);
            let num: Vec<f32> = wt
                .iter()
                .map(|row| row.iter().zip(r_prime.iter()).map(|(a, b)| a * b).sum())
                .collect();
            let wtw = matrix::matmul(&wt, &self.w);
            let den: Vec<f32> = wtw
                .iter()
                .map(|row| row.iter().zip(h.iter().map(|r| r[0])).map(|(a, b)| a * b).sum())
                .collect();
            for k in 0..self.k {
                h[k][0] = h[k][0] * num[k] / (den[k] + PBCF_EPSILON);
            }
        }

        let predicted: Vec<f32> = self
            .w
            .iter()
            .map(|row| {
                row.iter()
                    .zip(h.iter().map(|r| r[0]))
                    .map(|(a, b)| a * b)
                    .sum::<f32>()
                    .clamp(1.0, 5.0)
            })
            .collect();

        Some(
            self.prefix_order
                .iter()
                .zip(predicted.iter())
                .map(|(key, score)| (key.clone(), *score))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(prefix: &str, user: &str, rating: f32, ts: i64) -> RatingObservation {
        RatingObservation {
            prefix_key: prefix.into(),
            user_id: user.into(),
            rating,
            timestamp: ts,
        }
    }

    #[test]
    fn untrained_without_observations() {
        let mut engine = PbcfEngine::new();
        engine.refresh(&[]);
        assert!(!engine.is_trained());
    }

    #[test]
    fn trains_and_predicts_within_bounds() {
        let ratings = vec![
            obs("a", "u1", 5.0, 1),
            obs("a-b", "u1", 4.0, 2),
            obs("a", "u2", 2.0, 3),
            obs("a-b", "u2", 3.0, 4),
            obs("c", "u1", 1.0, 5),
        ];
        let mut engine = PbcfEngine::new();
        engine.refresh(&ratings);
        assert!(engine.is_trained());
        assert_eq!(engine.prefix_count(), 3);
        assert_eq!(engine.user_count(), 2);

        let predicted = engine.predict_for_user("u1").unwrap();
        assert_eq!(predicted.len(), 3);
        for score in predicted.values() {
            assert!((1.0..=5.0).contains(score));
        }
    }

    #[test]
    fn retrains_only_when_rating_count_changes() {
        let ratings = vec![obs("a", "u1", 5.0, 1), obs("b", "u1", 3.0, 2)];
        let mut engine = PbcfEngine::new();
        engine.refresh(&ratings);
        let w_before = engine.w.clone();
        engine.refresh(&ratings);
        assert_eq!(engine.w, w_before);

        let mut more = ratings.clone();
        more.push(obs("c", "u1", 4.0, 3));
        engine.refresh(&more);
        assert_eq!(engine.last_rating_count(), 3);
    }

    #[test]
    fn dedups_by_prefix_and_user_keeping_latest() {
        let ratings = vec![
            obs("a", "u1", 1.0, 1),
            obs("a", "u1", 5.0, 10),
            obs("b", "u1", 2.0, 2),
        ];
        let mut engine = PbcfEngine::new();
        engine.refresh(&ratings);
        assert_eq!(engine.prefix_count(), 2);
        let pi = engine.prefix_index["a"];
        let ui = engine.user_index["u1"];
        assert_eq!(engine.r[pi][ui], 5.0);
    }
}
