pub mod catalog;
pub mod config;
pub mod dto;
pub mod error;
pub mod features;
pub mod game;
pub mod pbcf;
pub mod pcf;
pub mod recommender;
pub mod session;
pub mod store;

#[cfg(feature = "server")]
pub mod http;

pub use config::Config;
pub use error::Error;
pub use error::Result;

/// dimensional aliases, in the spirit of the type vocabulary a numeric
/// core accumulates over time (chips, equities, and the like elsewhere)
pub type Timestamp = i64;
pub type Score = f32;
pub type Weight = f32;

/// sizes baked into the product contract rather than left as magic numbers
pub const ONBOARDING_POOL_SIZE: usize = 50;
pub const ONBOARDING_PICK_COUNT: usize = 10;
pub const ROUND_CANDIDATE_COUNT: usize = 10;

/// PCF tunables (spec §3, §4.3)
pub const PCF_DEFAULT_DECAY: Weight = 0.85;
pub const PCF_DEFAULT_EXCEPTION_WEIGHT: Weight = 0.35;

/// hidden-preference thresholds (spec §4.3.1) -- the stricter of the two
/// values the source code toggled between; see DESIGN.md Open Question 1.
pub const HIDDEN_MIN_WEIGHT: Weight = 0.15;
pub const HIDDEN_MIN_LATENCY: Weight = 0.10;
pub const HIDDEN_MIN_SELECTIONS: u32 = 3;

/// PBCF tunables (spec §4.4)
pub const PBCF_DEFAULT_K: usize = 6;
pub const PBCF_DEFAULT_SEED: u64 = 42;
pub const PBCF_TRAIN_ITERATIONS: usize = 45;
pub const PBCF_EPSILON: f32 = 1e-6;

/// default game length when a caller doesn't specify one (spec §6 leaves
/// `total_rounds` unconstrained; ten rounds matches the ten onboarding
/// picks in weight).
pub const DEFAULT_TOTAL_ROUNDS: u32 = 10;

/// trait for deterministic fixture generation, mainly (strictly?) for tests
pub trait Arbitrary {
    fn random() -> Self;
}

/// initialize logging; call once from a binary's `main`
#[cfg(feature = "server")]
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
