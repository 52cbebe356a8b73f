pub mod classify;
pub mod policy;
pub mod ratios;
pub mod score;
