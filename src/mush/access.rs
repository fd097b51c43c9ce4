//! Capability checks keyed by action.
//!
//! A single pure function decides whether an action may be performed on a
//! room or item, based only on that object's current state.

use crate::mush::types::{Attribute, FlavourText, ItemRecord, RoomRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Get,
    Describe,
    Taste,
    Touch,
    Smell,
}

impl Action {
    /// The write-once attribute an action sets, if it is a flavour action.
    pub fn attribute(self) -> Option<Attribute> {
        match self {
            Action::Get => None,
            Action::Describe => Some(Attribute::Desc),
            Action::Taste => Some(Attribute::Taste),
            Action::Touch => Some(Attribute::Touch),
            Action::Smell => Some(Attribute::Smell),
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Describe => "describe",
            Action::Taste => "taste",
            Action::Touch => "touch",
            Action::Smell => "smell",
        }
    }
}

/// Borrowed view of anything an action can target.
#[derive(Debug, Clone, Copy)]
pub enum ObjectState<'a> {
    Room(&'a RoomRecord),
    Item(&'a ItemRecord),
}

impl<'a> ObjectState<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            ObjectState::Room(room) => &room.name,
            ObjectState::Item(item) => &item.name,
        }
    }

    pub fn flavour(&self) -> &'a FlavourText {
        match self {
            ObjectState::Room(room) => &room.flavour,
            ObjectState::Item(item) => &item.flavour,
        }
    }
}

/// Whether `action` is currently permitted on `object`.
///
/// Flavour actions are allowed only while their attribute is unset. Rooms can
/// never be picked up; items only when takeable.
pub fn can_perform(object: ObjectState<'_>, action: Action) -> bool {
    if let Some(attribute) = action.attribute() {
        return !object.flavour().is_set(attribute);
    }
    match object {
        ObjectState::Room(_) => false,
        ObjectState::Item(item) => item.takeable,
    }
}

/// Refusal text for a failed `get`, preferring the object's own message.
pub fn get_denied_message(object: ObjectState<'_>) -> String {
    match object {
        ObjectState::Item(ItemRecord {
            get_err_msg: Some(message),
            ..
        }) if !message.trim().is_empty() => message.clone(),
        _ => "You can't get that.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavour_actions_close_once_set() {
        let mut item = ItemRecord::new("apple", "limbo");
        assert!(can_perform(ObjectState::Item(&item), Action::Taste));
        item.flavour.set(Attribute::Taste, "tart".into());
        assert!(!can_perform(ObjectState::Item(&item), Action::Taste));
        assert!(can_perform(ObjectState::Item(&item), Action::Smell));
        assert!(can_perform(ObjectState::Item(&item), Action::Describe));
    }

    #[test]
    fn rooms_cannot_be_taken_but_can_be_described_once() {
        let room = RoomRecord::new("Glade");
        assert!(!can_perform(ObjectState::Room(&room), Action::Get));
        assert!(can_perform(ObjectState::Room(&room), Action::Describe));
        let described = room.with_description("Ferns everywhere.");
        assert!(!can_perform(ObjectState::Room(&described), Action::Describe));
    }

    #[test]
    fn fixed_items_surface_their_message() {
        let statue = ItemRecord::new("statue", "limbo").fixed(Some("It is far too heavy."));
        assert!(!can_perform(ObjectState::Item(&statue), Action::Get));
        assert_eq!(get_denied_message(ObjectState::Item(&statue)), "It is far too heavy.");

        let anvil = ItemRecord::new("anvil", "limbo").fixed(None);
        assert_eq!(get_denied_message(ObjectState::Item(&anvil)), "You can't get that.");
    }
}
