use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use sled::IVec;

use crate::mush::errors::MushError;
use crate::mush::state::canonical_world_seed;
use crate::mush::types::{
    Attribute, Coords, ItemRecord, PlayerRecord, RoomRecord, ITEM_SCHEMA_VERSION,
    PLAYER_SCHEMA_VERSION, ROOM_SCHEMA_VERSION,
};

const TREE_PRIMARY: &str = "mush";
const TREE_ITEMS: &str = "mush_items";
const TREE_COORDS: &str = "mush_coords";
const TREE_LOGS: &str = "mush_logs";

fn next_timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000)
}

/// Order-preserving encoding of a signed coordinate for sled range scans.
fn encode_axis(value: i64) -> [u8; 8] {
    ((value as u64) ^ (1u64 << 63)).to_be_bytes()
}

fn decode_axis(bytes: &[u8]) -> Option<i64> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some((u64::from_be_bytes(raw) ^ (1u64 << 63)) as i64)
}

fn coords_key(coords: Coords) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&encode_axis(coords.x));
    key[8..].copy_from_slice(&encode_axis(coords.y));
    key
}

fn decode_coords_key(key: &[u8]) -> Option<Coords> {
    if key.len() != 16 {
        return None;
    }
    Some(Coords::new(decode_axis(&key[..8])?, decode_axis(&key[8..])?))
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct MushStoreBuilder {
    path: PathBuf,
    ensure_world_seed: bool,
}

impl MushStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ensure_world_seed: true,
        }
    }

    /// Opt out of seeding the starting room during initialization (useful for targeted tests).
    pub fn without_world_seed(mut self) -> Self {
        self.ensure_world_seed = false;
        self
    }

    pub fn open(self) -> Result<MushStore, MushError> {
        MushStore::open_with_options(self.path, self.ensure_world_seed)
    }
}

/// Sled-backed persistence for rooms, items, players and the coordinate index.
pub struct MushStore {
    db: sled::Db,
    primary: sled::Tree,
    items: sled::Tree,
    coords: sled::Tree,
    logs: sled::Tree,
}

impl MushStore {
    /// Open (or create) the store rooted at `path`, seeding Limbo if the world is empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MushError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, seed_world: bool) -> Result<Self, MushError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        let items = db.open_tree(TREE_ITEMS)?;
        let coords = db.open_tree(TREE_COORDS)?;
        let logs = db.open_tree(TREE_LOGS)?;
        let store = Self {
            db,
            primary,
            items,
            coords,
            logs,
        };

        if seed_world {
            store.seed_world_if_needed()?;
        }

        Ok(store)
    }

    fn players_key(username: &str) -> Vec<u8> {
        format!("players:{}", username.to_ascii_lowercase()).into_bytes()
    }

    fn room_key(room_id: &str) -> Vec<u8> {
        format!("rooms:{}", room_id).into_bytes()
    }

    fn item_key(item_id: &str) -> Vec<u8> {
        format!("items:{}", item_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, MushError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, MushError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a player record.
    pub fn put_player(&self, mut player: PlayerRecord) -> Result<(), MushError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.touch();
        let key = Self::players_key(&player.username);
        let bytes = Self::serialize(&player)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    /// Fetch a player record by username.
    pub fn get_player(&self, username: &str) -> Result<PlayerRecord, MushError> {
        let key = Self::players_key(username);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(MushError::NotFound(format!("player: {}", username)));
        };
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(MushError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// List all player usernames currently stored.
    pub fn list_player_ids(&self) -> Result<Vec<String>, MushError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(username) = text.strip_prefix("players:") {
                ids.push(username.to_string());
            }
        }
        Ok(ids)
    }

    /// Insert or update a room record. Coordinates are not indexed here; use
    /// [`MushStore::place_room`] to put a room on the map.
    pub fn put_room(&self, mut room: RoomRecord) -> Result<(), MushError> {
        room.schema_version = ROOM_SCHEMA_VERSION;
        let key = Self::room_key(&room.id);
        let bytes = Self::serialize(&room)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    pub fn get_room(&self, room_id: &str) -> Result<RoomRecord, MushError> {
        let Some(bytes) = self.primary.get(Self::room_key(room_id))? else {
            return Err(MushError::NotFound(format!("room: {}", room_id)));
        };
        let record: RoomRecord = Self::deserialize(bytes)?;
        if record.schema_version != ROOM_SCHEMA_VERSION {
            return Err(MushError::SchemaMismatch {
                entity: "room",
                expected: ROOM_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn room_exists(&self, room_id: &str) -> Result<bool, MushError> {
        Ok(self.primary.contains_key(Self::room_key(room_id))?)
    }

    pub fn count_rooms(&self) -> usize {
        self.primary.scan_prefix(b"rooms:").count()
    }

    /// Insert or update an item record.
    pub fn put_item(&self, mut item: ItemRecord) -> Result<(), MushError> {
        item.schema_version = ITEM_SCHEMA_VERSION;
        let key = Self::item_key(&item.id);
        let bytes = Self::serialize(&item)?;
        self.items.insert(key, bytes)?;
        self.items.flush()?;
        Ok(())
    }

    pub fn get_item(&self, item_id: &str) -> Result<ItemRecord, MushError> {
        let Some(bytes) = self.items.get(Self::item_key(item_id))? else {
            return Err(MushError::NotFound(format!("item: {}", item_id)));
        };
        let record: ItemRecord = Self::deserialize(bytes)?;
        if record.schema_version != ITEM_SCHEMA_VERSION {
            return Err(MushError::SchemaMismatch {
                entity: "item",
                expected: ITEM_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn count_items(&self) -> usize {
        self.items.scan_prefix(b"items:").count()
    }

    /// Claim the map cell at `coords` for `room_id` and record it on the room.
    ///
    /// Fails with [`MushError::CoordinatesTaken`] when another room holds the
    /// cell. A room that was already placed elsewhere releases its old cell.
    pub fn place_room(&self, room_id: &str, coords: Coords) -> Result<RoomRecord, MushError> {
        let mut room = self.get_room(room_id)?;
        let key = coords_key(coords);
        let claim = self
            .coords
            .compare_and_swap(key, None as Option<&[u8]>, Some(room_id.as_bytes()))?;
        if let Err(conflict) = claim {
            let occupant = conflict
                .current
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            if occupant != room_id {
                return Err(MushError::CoordinatesTaken {
                    x: coords.x,
                    y: coords.y,
                    occupant,
                });
            }
        }

        if let Some(previous) = room.coords.filter(|previous| *previous != coords) {
            self.coords.remove(coords_key(previous))?;
        }
        room.coords = Some(coords);
        self.put_room(room.clone())?;
        self.coords.flush()?;
        debug!("room {} placed at ({}, {})", room_id, coords.x, coords.y);
        Ok(room)
    }

    /// The room occupying `coords`, if any.
    pub fn room_at(&self, coords: Coords) -> Result<Option<RoomRecord>, MushError> {
        match self.coords.get(coords_key(coords))? {
            Some(bytes) => {
                let room_id = String::from_utf8_lossy(&bytes).into_owned();
                Ok(Some(self.get_room(&room_id)?))
            }
            None => Ok(None),
        }
    }

    /// All placed rooms whose x and y both fall inside the given ranges.
    pub fn rooms_in_range(
        &self,
        xs: RangeInclusive<i64>,
        ys: RangeInclusive<i64>,
    ) -> Result<Vec<(Coords, String)>, MushError> {
        let start = coords_key(Coords::new(*xs.start(), i64::MIN));
        let end = coords_key(Coords::new(*xs.end(), i64::MAX));
        let mut hits = Vec::new();
        for entry in self.coords.range(start..=end) {
            let (key, value) = entry?;
            let Some(coords) = decode_coords_key(&key) else {
                continue;
            };
            if ys.contains(&coords.y) {
                hits.push((coords, String::from_utf8_lossy(&value).into_owned()));
            }
        }
        Ok(hits)
    }

    /// Write a flavour attribute on a room unless it is already set.
    pub fn set_room_flavour_once(
        &self,
        room_id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<RoomRecord, MushError> {
        let mut room = self.get_room(room_id)?;
        if room.flavour.is_set(attribute) {
            return Err(MushError::AttributeAlreadySet {
                attribute: attribute.key(),
                target: room.name,
            });
        }
        room.flavour.set(attribute, value.to_string());
        self.put_room(room.clone())?;
        Ok(room)
    }

    /// Write a flavour attribute on an item unless it is already set.
    pub fn set_item_flavour_once(
        &self,
        item_id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<ItemRecord, MushError> {
        let mut item = self.get_item(item_id)?;
        if item.flavour.is_set(attribute) {
            return Err(MushError::AttributeAlreadySet {
                attribute: attribute.key(),
                target: item.name,
            });
        }
        item.flavour.set(attribute, value.to_string());
        self.put_item(item.clone())?;
        Ok(item)
    }

    pub fn seed_world_if_needed(&self) -> Result<usize, MushError> {
        if self.primary.scan_prefix(b"rooms:").next().is_some() {
            return Ok(0);
        }
        let now = Utc::now();
        let mut inserted = 0usize;
        for (room, coords) in canonical_world_seed(now) {
            let room_id = room.id.clone();
            self.put_room(room)?;
            if let Some(coords) = coords {
                self.place_room(&room_id, coords)?;
            }
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Append a line to the world audit log tree.
    pub fn append_log(&self, message: &str) -> Result<(), MushError> {
        // sled ids break ties between lines written in the same nanosecond
        let key = format!(
            "logs:{:020}:{:020}",
            next_timestamp_nanos(),
            self.db.generate_id()?
        )
        .into_bytes();
        self.logs.insert(key, message.as_bytes())?;
        self.logs.flush()?;
        Ok(())
    }

    /// Most recent audit lines, oldest first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<String>, MushError> {
        let mut lines = Vec::new();
        for entry in self.logs.scan_prefix(b"logs:").rev().take(limit) {
            let (_, value) = entry?;
            lines.push(String::from_utf8_lossy(&value).into_owned());
        }
        lines.reverse();
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mush::state::REQUIRED_START_LOCATION_ID;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_player() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        let mut player = PlayerRecord::new("alice", "Alice", REQUIRED_START_LOCATION_ID);
        player.inventory.push("lamp".into());
        store.put_player(player.clone()).expect("put");
        let fetched = store.get_player("ALICE").expect("get");
        assert_eq!(fetched.username, player.username);
        assert_eq!(fetched.inventory, vec!["lamp".to_string()]);
        assert_eq!(fetched.schema_version, PLAYER_SCHEMA_VERSION);
    }

    #[test]
    fn seeding_world_only_happens_once() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = MushStoreBuilder::new(dir.path()).open().expect("store");
            assert!(store.list_player_ids().expect("list players").is_empty());
            store.get_room(REQUIRED_START_LOCATION_ID).expect("limbo present");
        }

        let store = MushStoreBuilder::new(dir.path())
            .without_world_seed()
            .open()
            .expect("reopen store");
        let count = store.seed_world_if_needed().expect("seed check");
        assert_eq!(count, 0, "should not reseed when rooms already exist");
        let limbo = store
            .room_at(Coords::new(0, 0))
            .expect("lookup")
            .expect("limbo placed");
        assert_eq!(limbo.id, REQUIRED_START_LOCATION_ID);
    }

    #[test]
    fn axis_encoding_preserves_order() {
        let values = [i64::MIN, -5, -1, 0, 1, 7, i64::MAX];
        for pair in values.windows(2) {
            assert!(encode_axis(pair[0]) < encode_axis(pair[1]));
        }
        for value in values {
            assert_eq!(decode_axis(&encode_axis(value)), Some(value));
        }
    }

    #[test]
    fn placing_on_an_occupied_cell_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        let room = RoomRecord::new("Squatter");
        let room_id = room.id.clone();
        store.put_room(room).expect("put");

        let err = store
            .place_room(&room_id, Coords::new(0, 0))
            .expect_err("limbo holds the origin");
        assert!(matches!(err, MushError::CoordinatesTaken { x: 0, y: 0, .. }));
        assert_eq!(store.get_room(&room_id).expect("get").coords, None);
    }

    #[test]
    fn moving_a_room_releases_its_old_cell() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        let room = RoomRecord::new("Drifter");
        let room_id = room.id.clone();
        store.put_room(room).expect("put");

        store.place_room(&room_id, Coords::new(2, 2)).expect("place");
        store.place_room(&room_id, Coords::new(2, 2)).expect("re-place is idempotent");
        store.place_room(&room_id, Coords::new(-3, 4)).expect("move");

        assert!(store.room_at(Coords::new(2, 2)).expect("lookup").is_none());
        let moved = store.room_at(Coords::new(-3, 4)).expect("lookup").expect("placed");
        assert_eq!(moved.id, room_id);
    }

    #[test]
    fn range_query_filters_both_axes() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        for (x, y) in [(1, 1), (1, 9), (-2, -1), (5, 0)] {
            let room = RoomRecord::new(&format!("r{}_{}", x, y));
            let id = room.id.clone();
            store.put_room(room).expect("put");
            store.place_room(&id, Coords::new(x, y)).expect("place");
        }

        let mut hits: Vec<Coords> = store
            .rooms_in_range(-2..=2, -2..=2)
            .expect("range")
            .into_iter()
            .map(|(coords, _)| coords)
            .collect();
        hits.sort_by_key(|c| (c.x, c.y));
        assert_eq!(
            hits,
            vec![Coords::new(-2, -1), Coords::new(0, 0), Coords::new(1, 1)]
        );
    }

    #[test]
    fn flavour_is_write_once_at_the_store() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        let item = ItemRecord::new("pebble", REQUIRED_START_LOCATION_ID);
        let id = item.id.clone();
        store.put_item(item).expect("put");

        store
            .set_item_flavour_once(&id, Attribute::Smell, "wet stone")
            .expect("first write");
        let err = store
            .set_item_flavour_once(&id, Attribute::Smell, "roses")
            .expect_err("second write");
        assert!(matches!(err, MushError::AttributeAlreadySet { attribute: "smell", .. }));
        assert_eq!(
            store.get_item(&id).expect("get").flavour.get(Attribute::Smell),
            Some("wet stone")
        );
    }

    #[test]
    fn audit_log_keeps_order() {
        let dir = TempDir::new().expect("tempdir");
        let store = MushStoreBuilder::new(dir.path()).open().expect("store");
        store.append_log("first").expect("log");
        store.append_log("second").expect("log");
        assert_eq!(
            store.recent_logs(10).expect("logs"),
            vec!["first".to_string(), "second".to_string()]
        );
    }
}
