//! Room creation, exit linking and object movement helpers.
//!
//! Every mutation here runs the matching hook, which logs the change and
//! appends it to the world audit trail.

use log::{info, warn};

use crate::logutil::escape_log;
use crate::mush::errors::MushError;
use crate::mush::storage::MushStore;
use crate::mush::types::{
    Direction, ExitRecord, ItemLocation, ItemRecord, PlayerRecord, RoomRecord,
};

/// Result of digging a new room off an existing one.
#[derive(Debug, Clone)]
pub struct DigOutcome {
    pub room: RoomRecord,
    pub outbound: ExitRecord,
    pub inbound: ExitRecord,
}

/// Creation hook for rooms and items.
fn at_object_creation(
    store: &MushStore,
    kind: &str,
    id: &str,
    name: &str,
    creator: &str,
) -> Result<(), MushError> {
    info!(
        "{} created: id={} name={} by={}",
        kind,
        id,
        escape_log(name),
        escape_log(creator)
    );
    store.append_log(&format!("create {} {} '{}' by {}", kind, id, name, creator))
}

/// Movement hook run after an item changes hands.
fn at_get(store: &MushStore, item: &ItemRecord, player: &PlayerRecord) -> Result<(), MushError> {
    info!(
        "item picked up: id={} name={} by={}",
        item.id,
        escape_log(&item.name),
        player.username
    );
    store.append_log(&format!("get {} '{}' by {}", item.id, item.name, player.username))
}

/// Create and persist a new unplaced room.
pub fn create_room(
    store: &MushStore,
    name: &str,
    description: Option<&str>,
    creator: &str,
) -> Result<RoomRecord, MushError> {
    let room = RoomRecord::new(name)
        .with_description(description.unwrap_or(""))
        .with_creator(creator);
    store.put_room(room.clone())?;
    at_object_creation(store, "room", &room.id, &room.name, creator)?;
    Ok(room)
}

/// Add an exit `direction` from `from_id` to `to_id` and the reciprocal exit back.
pub fn link_rooms(
    store: &MushStore,
    from_id: &str,
    to_id: &str,
    direction: Direction,
) -> Result<(ExitRecord, ExitRecord), MushError> {
    let outbound = ExitRecord::new(direction, to_id);
    let inbound = ExitRecord::new(direction.opposite(), from_id);

    let mut from = store.get_room(from_id)?;
    from.exits.push(outbound.clone());
    store.put_room(from)?;

    let mut to = store.get_room(to_id)?;
    to.exits.push(inbound.clone());
    store.put_room(to)?;

    store.append_log(&format!(
        "link {} -{}-> {} / {} -{}-> {}",
        from_id,
        outbound.alias(),
        to_id,
        to_id,
        inbound.alias(),
        from_id
    ))?;
    Ok((outbound, inbound))
}

/// Dig a room named `name` in `direction` from the player's room, link it both
/// ways and move the player in.
///
/// The new room is placed one cell over when the origin is on the map, the
/// direction is planar and the cell is free; otherwise it stays unplaced.
pub fn dig(
    store: &MushStore,
    player: &mut PlayerRecord,
    direction: Direction,
    name: &str,
) -> Result<DigOutcome, MushError> {
    let origin = store.get_room(&player.current_room)?;
    let mut room = create_room(store, name, None, &player.username)?;

    if let Some(target) = origin.coords.and_then(|coords| coords.step(direction)) {
        match store.place_room(&room.id, target) {
            Ok(placed) => room = placed,
            Err(MushError::CoordinatesTaken { x, y, occupant }) => {
                let held_by = match store.room_at(target).ok().flatten() {
                    Some(other) => format!("{} ({})", escape_log(&other.name), other.id),
                    None => occupant,
                };
                warn!(
                    "explore {} from {}: cell ({}, {}) held by {}; leaving {} unplaced",
                    direction.name(),
                    origin.id,
                    x,
                    y,
                    held_by,
                    room.id
                );
            }
            Err(e) => return Err(e),
        }
    }

    let (outbound, inbound) = link_rooms(store, &origin.id, &room.id, direction)?;
    let room = move_player(store, player, &room.id)?;
    Ok(DigOutcome {
        room,
        outbound,
        inbound,
    })
}

/// Move the player to `room_id` and persist them.
pub fn move_player(
    store: &MushStore,
    player: &mut PlayerRecord,
    room_id: &str,
) -> Result<RoomRecord, MushError> {
    let room = store.get_room(room_id)?;
    player.current_room = room.id.clone();
    store.put_player(player.clone())?;
    Ok(room)
}

/// Create an item lying in `room_id`.
pub fn create_item(
    store: &MushStore,
    name: &str,
    room_id: &str,
    creator: &str,
) -> Result<ItemRecord, MushError> {
    let item = ItemRecord::new(name, room_id).with_creator(creator);
    store.put_item(item.clone())?;

    let mut room = store.get_room(room_id)?;
    room.items.push(item.id.clone());
    store.put_room(room)?;

    at_object_creation(store, "item", &item.id, &item.name, creator)?;
    Ok(item)
}

/// Move an item from wherever it lies into the player's inventory.
pub fn pick_up(
    store: &MushStore,
    player: &mut PlayerRecord,
    item_id: &str,
) -> Result<ItemRecord, MushError> {
    let mut item = store.get_item(item_id)?;
    if let ItemLocation::Room { room_id } = &item.location {
        let mut room = store.get_room(room_id)?;
        room.items.retain(|id| id != item_id);
        store.put_room(room)?;
    }

    item.location = ItemLocation::Carried {
        username: player.username.clone(),
    };
    store.put_item(item.clone())?;

    if !player.inventory.iter().any(|id| id == item_id) {
        player.inventory.push(item.id.clone());
    }
    store.put_player(player.clone())?;

    at_get(store, &item, player)?;
    Ok(item)
}

/// Move an item from the player's inventory into their current room.
pub fn drop_item(
    store: &MushStore,
    player: &mut PlayerRecord,
    item_id: &str,
) -> Result<ItemRecord, MushError> {
    let mut item = store.get_item(item_id)?;
    player.inventory.retain(|id| id != item_id);
    store.put_player(player.clone())?;

    item.location = ItemLocation::Room {
        room_id: player.current_room.clone(),
    };
    store.put_item(item.clone())?;

    let mut room = store.get_room(&player.current_room)?;
    room.items.push(item.id.clone());
    store.put_room(room)?;

    store.append_log(&format!("drop {} '{}' by {}", item.id, item.name, player.username))?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mush::state::REQUIRED_START_LOCATION_ID;
    use crate::mush::storage::MushStoreBuilder;
    use crate::mush::types::Coords;
    use tempfile::TempDir;

    fn setup() -> (TempDir, MushStore, PlayerRecord) {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        let player = PlayerRecord::new("carol", "Carol", REQUIRED_START_LOCATION_ID);
        store.put_player(player.clone()).expect("player");
        (dir, store, player)
    }

    #[test]
    fn dig_links_both_ways_and_places_room() {
        let (_dir, store, mut player) = setup();
        let outcome = dig(&store, &mut player, Direction::East, "Orchard").expect("dig");

        assert_eq!(player.current_room, outcome.room.id);
        assert_eq!(outcome.room.coords, Some(Coords::new(1, 0)));
        assert_eq!(outcome.outbound.name(), "east");
        assert_eq!(outcome.inbound.name(), "west");

        let limbo = store.get_room(REQUIRED_START_LOCATION_ID).expect("limbo");
        assert_eq!(
            limbo.find_exit("e").map(|exit| exit.destination.as_str()),
            Some(outcome.room.id.as_str())
        );
        let orchard = store.get_room(&outcome.room.id).expect("orchard");
        assert_eq!(
            orchard.find_exit("west").map(|exit| exit.destination.as_str()),
            Some(REQUIRED_START_LOCATION_ID)
        );
    }

    #[test]
    fn vertical_digs_stay_off_the_map() {
        let (_dir, store, mut player) = setup();
        let outcome = dig(&store, &mut player, Direction::Up, "Cloud").expect("dig");
        assert_eq!(outcome.room.coords, None);
        assert_eq!(outcome.inbound.direction, Direction::Down);
    }

    #[test]
    fn occupied_cell_leaves_new_room_unplaced() {
        let (_dir, store, mut player) = setup();
        let first = dig(&store, &mut player, Direction::North, "Ridge").expect("dig");
        move_player(&store, &mut player, REQUIRED_START_LOCATION_ID).expect("back");
        let second = dig(&store, &mut player, Direction::North, "Other Ridge").expect("dig");

        assert_eq!(first.room.coords, Some(Coords::new(0, -1)));
        assert_eq!(second.room.coords, None);
        let holder = store.room_at(Coords::new(0, -1)).expect("lookup").expect("placed");
        assert_eq!(holder.id, first.room.id);
        let limbo = store.get_room(REQUIRED_START_LOCATION_ID).expect("limbo");
        let norths = limbo
            .exits
            .iter()
            .filter(|exit| exit.direction == Direction::North)
            .count();
        assert_eq!(norths, 2);
    }

    #[test]
    fn pick_up_and_drop_move_between_room_and_inventory() {
        let (_dir, store, mut player) = setup();
        let item = create_item(&store, "feather", REQUIRED_START_LOCATION_ID, "carol").expect("item");

        pick_up(&store, &mut player, &item.id).expect("get");
        assert!(player.inventory.contains(&item.id));
        assert!(!store
            .get_room(REQUIRED_START_LOCATION_ID)
            .expect("limbo")
            .items
            .contains(&item.id));

        drop_item(&store, &mut player, &item.id).expect("drop");
        assert!(player.inventory.is_empty());
        let dropped = store.get_item(&item.id).expect("item");
        assert_eq!(
            dropped.location,
            ItemLocation::Room {
                room_id: REQUIRED_START_LOCATION_ID.to_string()
            }
        );
    }

    #[test]
    fn hooks_write_the_audit_trail() {
        let (_dir, store, mut player) = setup();
        let item = create_item(&store, "quill", REQUIRED_START_LOCATION_ID, "carol").expect("item");
        pick_up(&store, &mut player, &item.id).expect("get");
        let logs = store.recent_logs(10).expect("logs");
        assert!(logs.iter().any(|line| line.starts_with("create item")));
        assert!(logs.iter().any(|line| line.starts_with("get ")));
    }
}
