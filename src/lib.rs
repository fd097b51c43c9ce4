//! # mushgrid - a player-built MUSH on a map grid
//!
//! mushgrid is a small multi-user text world that players extend as they
//! play. Walking off the edge of the known world with `explore <direction>`
//! creates a new room, names it, links it both ways and, for compass
//! directions, places it on an integer grid so `map` can draw the
//! neighbourhood.
//!
//! ## Features
//!
//! - **Exploration**: `explore` digs rooms with reciprocal exits and grid coordinates.
//! - **Map**: an ASCII grid of nearby rooms centred on the viewer.
//! - **Write-once lore**: `describe`, `taste`, `touch` and `smell` record a
//!   description once; afterwards the first text is shown instead.
//! - **Conjured items**: `get` on something that isn't there offers to create it.
//! - **Homes**: `home` builds or returns to a personal room; `sethome` adopts the current one.
//! - **Persistence**: rooms, items, players and a coordinate index live in `sled`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mushgrid::config::Config;
//! use mushgrid::mush::{MushProcessor, MushStore};
//! use mushgrid::session::SessionHub;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = MushStore::open(config.storage.world_db_path())?;
//!     let processor = MushProcessor::new(store, config.world.clone());
//!     let mut hub = SessionHub::new(processor, config.game.welcome_message.clone());
//!
//!     let (alice, greeting) = hub.connect("Alice")?;
//!     println!("{}", greeting);
//!     println!("{}", hub.handle_input(&alice, "explore north"));
//!     println!("{}", hub.handle_input(&alice, "Windy Ridge"));
//!     println!("{}", hub.handle_input(&alice, "map"));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`mush`] - World records, storage, grid, access checks and command processing
//! - [`session`] - Player sessions and room broadcast delivery
//! - [`config`] - Configuration management
//! - [`validation`] - Name and free-text validation
//! - [`logutil`] - Single-line escaping for logged player text
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   SessionHub    │ ← Sessions, pending prompts, broadcasts
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  MushProcessor  │ ← Command parsing and game rules
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    MushStore    │ ← sled trees and coordinate index
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod mush;
pub mod session;
pub mod validation;
