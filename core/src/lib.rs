//! Rural business simulator core.
//!
//! Players run a virtual rural enterprise through AI-generated decision
//! scenarios, bid in auctions, and compete on a leaderboard. All state
//! lives in one persisted document owned by `store::GameStore`.

pub mod admin;
pub mod ai;
pub mod auction;
pub mod command;
pub mod config;
pub mod error;
pub mod game;
pub mod lifecycle;
pub mod rng;
pub mod scenario;
pub mod scoring;
pub mod session;
pub mod store;
pub mod types;
