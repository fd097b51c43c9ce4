//! Canonical starting world.
//!
//! Everything beyond Limbo is dug by players with `explore` and `home`, so the
//! seed is deliberately a single placed room at the map origin.

use chrono::{DateTime, Utc};

use crate::mush::types::{Coords, RoomRecord};

/// Room every new player starts in. A home pointing here counts as "no home".
pub const REQUIRED_START_LOCATION_ID: &str = "limbo";

/// Rooms inserted into an empty store, with their map placement.
pub fn canonical_world_seed(now: DateTime<Utc>) -> Vec<(RoomRecord, Option<Coords>)> {
    let limbo = RoomRecord::with_id(REQUIRED_START_LOCATION_ID, "Limbo")
        .with_description(
            "A grey, formless expanse that hums faintly underfoot. Paths have yet to be \
walked from here; try EXPLORE <direction> to carve out somewhere new, or HOME to \
build yourself a place of your own.",
        )
        .with_created_at(now);

    vec![(limbo, Some(Coords::new(0, 0)))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_places_limbo_at_origin() {
        let seed = canonical_world_seed(Utc::now());
        assert_eq!(seed.len(), 1);
        let (limbo, coords) = &seed[0];
        assert_eq!(limbo.id, REQUIRED_START_LOCATION_ID);
        assert!(!limbo.description().is_empty());
        assert_eq!(*coords, Some(Coords::new(0, 0)));
    }
}
