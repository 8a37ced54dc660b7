//! Pure progression calculators.
//!
//! # Responsibility
//! - Turn raw activity into bounded XP, streak and goal-progress deltas
//!   without touching storage.
//!
//! # Invariants
//! - Everything in this module is a pure function of its inputs; services
//!   own all persistence and transaction boundaries.

pub mod goal_match;
pub mod scoring;
pub mod streak;
