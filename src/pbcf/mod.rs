mod engine;
mod matrix;

pub use engine::*;
