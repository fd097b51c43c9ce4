//! Map grid around a viewer.
//!
//! Rooms carry optional integer coordinates; the map is a square window of
//! `(2 * dist + 1)` cells per side centred on the viewer. Row index grows with
//! y and column index with x, so north (y - 1) renders above the viewer.

use crate::mush::errors::MushError;
use crate::mush::storage::MushStore;
use crate::mush::types::Coords;

pub const EMPTY_CELL: &str = " · ";
pub const VIEWER_CELL: &str = " # ";
pub const ROOM_CELL: &str = " ■ ";

pub type Grid = Vec<Vec<&'static str>>;

/// Mark `rooms` on a fresh grid centred on `center`. Coordinates outside the
/// window are ignored and the centre cell always stays the viewer marker.
pub fn plot(center: Coords, dist: u32, rooms: impl IntoIterator<Item = Coords>) -> Grid {
    let side = 2 * dist as usize + 1;
    let mut grid = vec![vec![EMPTY_CELL; side]; side];
    let dist = i64::from(dist);
    grid[dist as usize][dist as usize] = VIEWER_CELL;

    for coords in rooms {
        let col = dist + coords.x - center.x;
        let row = dist + coords.y - center.y;
        if !(0..side as i64).contains(&col) || !(0..side as i64).contains(&row) {
            continue;
        }
        if col == dist && row == dist {
            continue;
        }
        grid[row as usize][col as usize] = ROOM_CELL;
    }
    grid
}

/// Grid of placed rooms within `dist` cells of (x, y) on both axes.
pub fn nearby_rooms(store: &MushStore, x: i64, y: i64, dist: u32) -> Result<Grid, MushError> {
    let reach = i64::from(dist);
    let hits = store.rooms_in_range(x - reach..=x + reach, y - reach..=y + reach)?;
    Ok(plot(
        Coords::new(x, y),
        dist,
        hits.into_iter().map(|(coords, _)| coords),
    ))
}

/// Join grid rows into display lines.
pub fn render(grid: &Grid) -> String {
    grid.iter()
        .map(|row| row.concat())
        .collect::<Vec<_>>()
        .join("\n")
}
