//! # Petden - Virtual Pet Simulation Server
//!
//! Petden is an authoritative server-side virtual-pet simulation. Each
//! player owns a pet whose vital gauges change through timed actions,
//! earns coins and experience, works through quests and achievements,
//! and trades items with other players on a shared marketplace.
//!
//! ## Features
//!
//! - **Stat Engine**: bounded gauge mutations (hunger, happiness,
//!   health, energy) with validate-then-commit discipline.
//! - **Progression**: experience thresholds with carry-over level-ups.
//! - **Economy Ledger**: non-negative coin balances, owned-item
//!   bookkeeping, and a full coin-movement audit log.
//! - **Quests & Achievements**: action-event tracking with
//!   reward-exactly-once semantics and monotonic completion flags.
//! - **Trade Marketplace**: escrowed offers settled in a single
//!   transactional Open→Sold commit, so concurrent buyers can never
//!   double-spend and a failure never leaves half a trade behind.
//! - **Async Gateway**: Tokio TCP front end speaking newline-delimited
//!   JSON; one request, one authoritative snapshot back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use petden::config::Config;
//! use petden::game::{GameEngine, GameSettings, GameStore};
//! use petden::server::GameServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = GameStore::open(&config.storage.data_dir)?;
//!     let engine = GameEngine::new(store, GameSettings::default());
//!     GameServer::new(engine, &config).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - The game-state engine: stats, progression, ledger,
//!   quests, marketplace, and sled-backed storage
//! - [`server`] - TCP gateway and wire-level request/response types
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log sanitization helpers

pub mod config;
pub mod game;
pub mod logutil;
pub mod server;
