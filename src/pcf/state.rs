use crate::PCF_DEFAULT_DECAY;
use crate::PCF_DEFAULT_EXCEPTION_WEIGHT;

/// per-session user profile, incrementally updated from each selection and
/// rating (spec §3). Invariant: `user_vec.len() == feature_space.width()` at
/// the moment of any scoring/update -- callers must re-initialize on a
/// feature-space rebuild (spec §5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PcfState {
    pub user_vec: Vec<f32>,
    pub bias: f32,
    pub count: u32,
    pub decay: f32,
    pub exception_weight: f32,
}

impl PcfState {
    pub fn init(width: usize) -> Self {
        Self {
            user_vec: vec![0.0; width],
            bias: 0.0,
            count: 0,
            decay: PCF_DEFAULT_DECAY,
            exception_weight: PCF_DEFAULT_EXCEPTION_WEIGHT,
        }
    }

    /// whether this state's vector width still matches a feature space --
    /// a mismatch is an invariant violation, not a warning (spec §9).
    pub fn matches_width(&self, width: usize) -> bool {
        self.user_vec.len() == width
    }

    pub fn norm(&self) -> f32 {
        self.user_vec.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_zeroed() {
        let state = PcfState::init(5);
        assert_eq!(state.user_vec, vec![0.0; 5]);
        assert_eq!(state.count, 0);
        assert_eq!(state.decay, 0.85);
        assert_eq!(state.exception_weight, 0.35);
    }
}
