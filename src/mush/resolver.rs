//! Object Name Resolution
//!
//! Resolves what a player typed ("lamp", "rusty key", "here") to a room or
//! item record near them.
//!
//! ## Search order
//! 1. Special keyword `here` (or the room's own name) for the current room
//! 2. Items lying in the current room
//! 3. Items in the player's inventory
//!
//! Exact (case-insensitive, whitespace-normalized) matches win over partial
//! ones; several matches at the same strength are reported as ambiguous.
//! A trailing or leading number picks one of them: `apple 2`, `apple-2` or
//! `2-apple` is the second apple in search order.

use crate::mush::errors::MushError;
use crate::mush::storage::MushStore;
use crate::mush::types::{PlayerRecord, RoomRecord};

/// Where a lookup is allowed to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Items lying in the current room only (pickup).
    RoomItems,
    /// Inventory only (drop).
    Inventory,
    /// Current room, its items, then the inventory.
    Nearby,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Room(String),
    Item(String),
}

/// A single object match with its context
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMatch {
    pub target: Target,
    pub name: String,
    /// "room", "here" or "inventory"
    pub location: &'static str,
}

/// Result of object name resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveResult {
    Found(ObjectMatch),
    Ambiguous(Vec<ObjectMatch>),
    NotFound,
}

/// Lowercase, trim and collapse inner whitespace.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `query` for `player` standing in `room`.
pub fn resolve_target(
    store: &MushStore,
    player: &PlayerRecord,
    room: &RoomRecord,
    query: &str,
    scope: SearchScope,
) -> Result<ResolveResult, MushError> {
    let wanted = normalize_name(query);
    if wanted.is_empty() {
        return Ok(ResolveResult::NotFound);
    }

    if scope == SearchScope::Nearby && (wanted == "here" || wanted == normalize_name(&room.name)) {
        return Ok(ResolveResult::Found(ObjectMatch {
            target: Target::Room(room.id.clone()),
            name: room.name.clone(),
            location: "here",
        }));
    }

    let mut candidates: Vec<ObjectMatch> = Vec::new();
    if scope != SearchScope::Inventory {
        for item_id in &room.items {
            if let Ok(item) = store.get_item(item_id) {
                candidates.push(ObjectMatch {
                    target: Target::Item(item.id),
                    name: item.name,
                    location: "room",
                });
            }
        }
    }
    if scope != SearchScope::RoomItems {
        for item_id in &player.inventory {
            if let Ok(item) = store.get_item(item_id) {
                candidates.push(ObjectMatch {
                    target: Target::Item(item.id),
                    name: item.name,
                    location: "inventory",
                });
            }
        }
    }

    let matches = matching(&candidates, &wanted);
    if let [only] = matches.as_slice() {
        return Ok(ResolveResult::Found(only.clone()));
    }

    if let Some((base, pick)) = split_pick(&wanted) {
        let numbered = matching(&candidates, &base);
        if let Some(choice) = numbered.get(pick - 1) {
            return Ok(ResolveResult::Found(choice.clone()));
        }
        if matches.is_empty() && numbered.len() > 1 {
            return Ok(ResolveResult::Ambiguous(numbered));
        }
    }

    Ok(if matches.is_empty() {
        ResolveResult::NotFound
    } else {
        ResolveResult::Ambiguous(matches)
    })
}

/// Exact matches if there are any, otherwise partial ones.
fn matching(candidates: &[ObjectMatch], wanted: &str) -> Vec<ObjectMatch> {
    let exact: Vec<ObjectMatch> = candidates
        .iter()
        .filter(|candidate| normalize_name(&candidate.name) == wanted)
        .cloned()
        .collect();
    if !exact.is_empty() {
        return exact;
    }
    candidates
        .iter()
        .filter(|candidate| normalize_name(&candidate.name).contains(wanted))
        .cloned()
        .collect()
}

/// Splits a normalized query into a name and a 1-based pick.
fn split_pick(wanted: &str) -> Option<(String, usize)> {
    let pick = |number: &str| number.trim().parse::<usize>().ok().filter(|n| *n > 0);
    if let Some((number, name)) = wanted.split_once('-') {
        if let Some(n) = pick(number) {
            return Some((name.trim().to_string(), n)).filter(|(name, _)| !name.is_empty());
        }
    }
    let (name, number) = wanted.rsplit_once(|c: char| c == ' ' || c == '-')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), pick(number)?))
}

/// "Which lamp do you mean?" listing for ambiguous lookups.
pub fn format_disambiguation(query: &str, matches: &[ObjectMatch]) -> String {
    let mut text = format!("Which '{}' do you mean?\n", query.trim());
    for (idx, candidate) in matches.iter().enumerate() {
        text.push_str(&format!("  {}. {} ({})\n", idx + 1, candidate.name, candidate.location));
    }
    let name = split_pick(&normalize_name(query))
        .map(|(name, _)| name)
        .unwrap_or_else(|| query.trim().to_string());
    text.push_str(&format!(
        "Add a number to choose, like '{} 2' or '2-{}'.",
        name, name
    ));
    text
}
