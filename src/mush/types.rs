use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const ROOM_SCHEMA_VERSION: u8 = 1;
pub const ITEM_SCHEMA_VERSION: u8 = 1;

/// The twelve exit directions players can explore in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    Up,
    Down,
    In,
    Out,
}

impl Direction {
    /// Table order, used for usage listings.
    pub const ALL: [Direction; 12] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
        Direction::Up,
        Direction::Down,
        Direction::In,
        Direction::Out,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::Northeast => "ne",
            Direction::East => "e",
            Direction::Southeast => "se",
            Direction::South => "s",
            Direction::Southwest => "sw",
            Direction::West => "w",
            Direction::Northwest => "nw",
            Direction::Up => "u",
            Direction::Down => "d",
            Direction::In => "i",
            Direction::Out => "o",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::Northeast => "northeast",
            Direction::East => "east",
            Direction::Southeast => "southeast",
            Direction::South => "south",
            Direction::Southwest => "southwest",
            Direction::West => "west",
            Direction::Northwest => "northwest",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// The reciprocal direction used for the return exit.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::Northeast => Direction::Southwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Northwest,
            Direction::South => Direction::North,
            Direction::Southwest => Direction::Northeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Southeast,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }

    /// Planar step on the map grid. North is y - 1 so it renders at the top.
    /// Up, down, in and out leave the grid and have no offset.
    pub fn offset(self) -> Option<(i64, i64)> {
        match self {
            Direction::North => Some((0, -1)),
            Direction::Northeast => Some((1, -1)),
            Direction::East => Some((1, 0)),
            Direction::Southeast => Some((1, 1)),
            Direction::South => Some((0, 1)),
            Direction::Southwest => Some((-1, 1)),
            Direction::West => Some((-1, 0)),
            Direction::Northwest => Some((-1, -1)),
            Direction::Up | Direction::Down | Direction::In | Direction::Out => None,
        }
    }

    /// Accepts an abbreviation or full name, case-insensitively.
    pub fn parse(token: &str) -> Option<Direction> {
        let token = token.trim().to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|dir| dir.abbrev() == token || dir.name() == token)
    }

    /// "n (north), ne (northeast), ..." for usage messages.
    pub fn valid_list() -> String {
        Direction::ALL
            .iter()
            .map(|dir| format!("{} ({})", dir.abbrev(), dir.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coords {
    pub x: i64,
    pub y: i64,
}

impl Coords {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell in `direction`, if the direction is planar.
    pub fn step(self, direction: Direction) -> Option<Coords> {
        let (dx, dy) = direction.offset()?;
        Some(Coords::new(self.x + dx, self.y + dy))
    }
}

/// The write-once flavour attributes shared by rooms and items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Desc,
    Taste,
    Touch,
    Smell,
}

impl Attribute {
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Desc => "desc",
            Attribute::Taste => "taste",
            Attribute::Touch => "touch",
            Attribute::Smell => "smell",
        }
    }

    /// Question put to the player when the attribute is still unset.
    pub fn prompt(self, target: &str) -> String {
        match self {
            Attribute::Desc => format!(
                "How would you describe {}? Add some flavour to your description.",
                target
            ),
            Attribute::Taste => format!("What does {} taste like?", target),
            Attribute::Touch => format!("What does {} feel like to the touch?", target),
            Attribute::Smell => format!("What does {} smell like?", target),
        }
    }

    /// How an already-set value reads back to the player.
    pub fn display(self, target: &str, value: &str) -> String {
        match self {
            Attribute::Desc => format!("{} has already been described:\n{}", target, value),
            Attribute::Taste => format!("You taste {}. {}", target, value),
            Attribute::Touch => format!("You touch {}. {}", target, value),
            Attribute::Smell => format!("You smell {}. {}", target, value),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlavourText {
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub taste: Option<String>,
    #[serde(default)]
    pub touch: Option<String>,
    #[serde(default)]
    pub smell: Option<String>,
}

impl FlavourText {
    /// Current value; empty strings count as unset.
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        let slot = match attribute {
            Attribute::Desc => &self.desc,
            Attribute::Taste => &self.taste,
            Attribute::Touch => &self.touch,
            Attribute::Smell => &self.smell,
        };
        slot.as_deref().filter(|value| !value.is_empty())
    }

    pub fn is_set(&self, attribute: Attribute) -> bool {
        self.get(attribute).is_some()
    }

    pub fn set(&mut self, attribute: Attribute, value: String) {
        let slot = match attribute {
            Attribute::Desc => &mut self.desc,
            Attribute::Taste => &mut self.taste,
            Attribute::Touch => &mut self.touch,
            Attribute::Smell => &mut self.smell,
        };
        *slot = Some(value);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExitRecord {
    pub id: String,
    pub direction: Direction,
    pub destination: String,
    pub created_at: DateTime<Utc>,
}

impl ExitRecord {
    pub fn new(direction: Direction, destination: &str) -> Self {
        Self {
            id: new_record_id(),
            direction,
            destination: destination.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Exit key; the abbreviation doubles as its alias.
    pub fn name(&self) -> &'static str {
        self.direction.name()
    }

    pub fn alias(&self) -> &'static str {
        self.direction.abbrev()
    }

    pub fn matches(&self, token: &str) -> bool {
        let token = token.trim();
        token.eq_ignore_ascii_case(self.name()) || token.eq_ignore_ascii_case(self.alias())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flavour: FlavourText,
    #[serde(default)]
    pub coords: Option<Coords>,
    #[serde(default)]
    pub exits: Vec<ExitRecord>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl RoomRecord {
    pub fn new(name: &str) -> Self {
        Self::with_id(&new_record_id(), name)
    }

    pub fn with_id(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            flavour: FlavourText::default(),
            coords: None,
            exits: Vec::new(),
            items: Vec::new(),
            created_by: None,
            created_at: Utc::now(),
            schema_version: ROOM_SCHEMA_VERSION,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.flavour.set(Attribute::Desc, description.to_string());
        }
        self
    }

    pub fn with_creator(mut self, username: &str) -> Self {
        self.created_by = Some(username.to_string());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn description(&self) -> &str {
        self.flavour.get(Attribute::Desc).unwrap_or("")
    }

    /// First exit whose name or alias matches `token`.
    pub fn find_exit(&self, token: &str) -> Option<&ExitRecord> {
        self.exits.iter().find(|exit| exit.matches(token))
    }

    /// Every exit leading `direction`, oldest first. Duplicates are numbered
    /// from 1 in this order.
    pub fn exits_toward(&self, direction: Direction) -> Vec<&ExitRecord> {
        self.exits
            .iter()
            .filter(|exit| exit.direction == direction)
            .collect()
    }

    pub fn has_exit(&self, direction: Direction) -> bool {
        self.exits.iter().any(|exit| exit.direction == direction)
    }

    /// Exit labels for the room header. A direction with several exits
    /// lists each one with its number ("north 1, north 2").
    pub fn exit_labels(&self) -> Vec<String> {
        self.exits
            .iter()
            .map(|exit| {
                let same_way = self.exits_toward(exit.direction);
                if same_way.len() < 2 {
                    return exit.name().to_string();
                }
                let position = same_way
                    .iter()
                    .position(|other| other.id == exit.id)
                    .unwrap_or(0);
                format!("{} {}", exit.name(), position + 1)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemLocation {
    Room { room_id: String },
    Carried { username: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flavour: FlavourText,
    pub location: ItemLocation,
    pub takeable: bool,
    /// Shown instead of the stock refusal when `get` is denied.
    #[serde(default)]
    pub get_err_msg: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl ItemRecord {
    pub fn new(name: &str, room_id: &str) -> Self {
        Self {
            id: new_record_id(),
            name: name.to_string(),
            flavour: FlavourText::default(),
            location: ItemLocation::Room {
                room_id: room_id.to_string(),
            },
            takeable: true,
            get_err_msg: None,
            created_by: None,
            created_at: Utc::now(),
            schema_version: ITEM_SCHEMA_VERSION,
        }
    }

    pub fn fixed(mut self, message: Option<&str>) -> Self {
        self.takeable = false;
        self.get_err_msg = message.map(str::to_string);
        self
    }

    pub fn with_creator(mut self, username: &str) -> Self {
        self.created_by = Some(username.to_string());
        self
    }

    pub fn description(&self) -> &str {
        self.flavour.get(Attribute::Desc).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub username: String,
    pub display_name: String,
    pub current_room: String,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub inventory: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(username: &str, display_name: &str, current_room: &str) -> Self {
        let now = Utc::now();
        Self {
            username: username.to_ascii_lowercase(),
            display_name: display_name.to_string(),
            current_room: current_room.to_string(),
            home: None,
            inventory: Vec::new(),
            created_at: now,
            last_active: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Names that refer to the player themself.
    pub fn is_self_reference(&self, token: &str) -> bool {
        let token = token.trim();
        token.eq_ignore_ascii_case("me")
            || token.eq_ignore_ascii_case("self")
            || token.eq_ignore_ascii_case(&self.username)
            || token.eq_ignore_ascii_case(&self.display_name)
    }
}

pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_direction_has_a_reciprocal_that_points_back() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
            if let (Some((dx, dy)), Some((ox, oy))) = (dir.offset(), dir.opposite().offset()) {
                assert_eq!((dx + ox, dy + oy), (0, 0), "{:?}", dir);
            }
        }
    }

    #[test]
    fn parse_accepts_abbreviations_and_names() {
        assert_eq!(Direction::parse("ne"), Some(Direction::Northeast));
        assert_eq!(Direction::parse("NE"), Some(Direction::Northeast));
        assert_eq!(Direction::parse("Southwest"), Some(Direction::Southwest));
        assert_eq!(Direction::parse(" o "), Some(Direction::Out));
        assert_eq!(Direction::parse("x"), None);
        assert_eq!(Direction::parse(""), None);
    }

    #[test]
    fn valid_list_names_all_twelve() {
        let list = Direction::valid_list();
        for dir in Direction::ALL {
            assert!(list.contains(dir.name()));
        }
        assert!(list.starts_with("n (north), ne (northeast)"));
    }

    #[test]
    fn empty_flavour_counts_as_unset() {
        let mut flavour = FlavourText::default();
        assert!(!flavour.is_set(Attribute::Taste));
        flavour.set(Attribute::Taste, String::new());
        assert!(!flavour.is_set(Attribute::Taste));
        flavour.set(Attribute::Taste, "salty".into());
        assert_eq!(flavour.get(Attribute::Taste), Some("salty"));
        assert_eq!(flavour.get(Attribute::Smell), None);
    }

    #[test]
    fn exits_match_name_or_alias() {
        let exit = ExitRecord::new(Direction::Northwest, "attic");
        assert!(exit.matches("nw"));
        assert!(exit.matches("NorthWest"));
        assert!(!exit.matches("north"));
    }

    #[test]
    fn duplicate_exits_are_numbered_in_dig_order() {
        let mut room = RoomRecord::with_id("limbo", "Limbo");
        room.exits.push(ExitRecord::new(Direction::North, "first"));
        room.exits.push(ExitRecord::new(Direction::South, "cellar"));
        room.exits.push(ExitRecord::new(Direction::North, "second"));

        let north: Vec<&str> = room
            .exits_toward(Direction::North)
            .into_iter()
            .map(|exit| exit.destination.as_str())
            .collect();
        assert_eq!(north, vec!["first", "second"]);
        assert_eq!(room.exit_labels(), vec!["north 1", "south", "north 2"]);
    }

    #[test]
    fn self_reference_covers_aliases() {
        let player = PlayerRecord::new("Alice", "Alice", "limbo");
        assert_eq!(player.username, "alice");
        assert!(player.is_self_reference("me"));
        assert!(player.is_self_reference("ALICE"));
        assert!(!player.is_self_reference("lamp"));
    }
}
