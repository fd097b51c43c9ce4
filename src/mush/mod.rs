//! World model, persistence and command handling for the grid MUSH.
//! Rooms may carry integer map coordinates; players extend the world by
//! exploring in a direction and naming what they find.

pub mod access;
pub mod building;
pub mod commands;
pub mod errors;
pub mod grid;
pub mod prompt;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod types;

pub use access::{can_perform, get_denied_message, Action, ObjectState};
pub use building::{
    create_item, create_room, dig, drop_item, link_rooms, move_player, pick_up, DigOutcome,
};
pub use commands::{parse_command, Broadcast, CommandResponse, MushCommand, MushProcessor};
pub use errors::MushError;
pub use grid::{nearby_rooms, plot, render, Grid, EMPTY_CELL, ROOM_CELL, VIEWER_CELL};
pub use prompt::PendingPrompt;
pub use resolver::{resolve_target, ResolveResult, SearchScope, Target};
pub use state::{canonical_world_seed, REQUIRED_START_LOCATION_ID};
pub use storage::{MushStore, MushStoreBuilder};
pub use types::{
    Attribute, Coords, Direction, ExitRecord, FlavourText, ItemLocation, ItemRecord,
    PlayerRecord, RoomRecord,
};
