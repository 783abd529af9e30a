pub mod domain;
pub mod errors;
pub mod models;
pub mod processing;
pub mod repository;
pub mod sources;

/// Tolerance used when comparing similarity scores.
pub const SCORE_EPSILON: f32 = 1e-4;
