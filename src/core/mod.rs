// src/core/mod.rs
//
// The assessment-and-progression engine: attempt lifecycle, scoring,
// XP/leveling, achievements and leaderboards. Handlers stay thin; everything
// with an invariant lives here.

pub mod achievements;
pub mod leaderboard;
pub mod notify;
pub mod progression;
pub mod questions;
pub mod scoring;
pub mod session;
